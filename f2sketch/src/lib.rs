// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Exact and approximate computation of the second frequency moment of a stream.
//!
//! For a stream of `(key, delta)` updates with net frequencies `f(x)`, the second frequency
//! moment is `F2 = sum_x f(x)^2`. This crate computes it two ways:
//!
//! * exactly, by accumulating every key into a [`table::ChainedFrequencyTable`] bucketed by a
//!   2-universal hash, in memory proportional to the number of distinct keys;
//! * approximately, with a [`countsketch::CountSketchEstimator`] driven by a 4-universal hash
//!   pair, in memory fixed up front.
//!
//! The [`experiment`] module repeats independent sketch trials and compares them to the exact
//! value. The hash families live in [`hash`], built on the arithmetic modulo `2^89 - 1` in
//! [`field`].
//!
//! Randomness is always passed in explicitly. The accuracy guarantees assume a high-quality
//! source such as `rand::rng()`; seeded generators are reproducible and meant for testing.

pub mod countsketch;
pub mod error;
pub mod experiment;
pub mod field;
pub mod hash;
pub mod stream;
pub mod table;
