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

//! Count-Sketch estimator for the second frequency moment.
//!
//! A single row of `2^t` signed counters, driven by a bucket hash `h` and a sign hash `s` drawn
//! from the 4-universal [`Degree3Polynomial`](crate::hash::Degree3Polynomial) family. Each update
//! `(x, delta)` adds `s(x) * delta` to counter `h(x)`. Then
//!
//! * `s(x) * C[h(x)]` is an unbiased estimate of the frequency of `x`, and
//! * `sum_j C[j]^2` is an unbiased estimate of F2 with variance `O(F2^2 / 2^t)`.
//!
//! Build a fresh estimator, with fresh hashes, for every independent trial.
//!
//! # Usage
//!
//! ```rust
//! use f2sketch::countsketch::CountSketchEstimator;
//! use f2sketch::stream::Update;
//!
//! let mut sketch = CountSketchEstimator::with_random_hashes(&mut rand::rng(), 10).unwrap();
//! assert_eq!(sketch.estimate_square_sum(), 0);
//!
//! sketch.process(&[Update::new(1, 5), Update::new(2, -2), Update::new(3, 3)]);
//! assert_eq!(sketch.num_updates(), 3);
//! let _f2 = sketch.estimate_square_sum();
//! ```
//!
//! # Serialization
//!
//! ```rust
//! # use f2sketch::countsketch::CountSketchEstimator;
//! let mut sketch = CountSketchEstimator::with_random_hashes(&mut rand::rng(), 6).unwrap();
//! sketch.update(42, 7);
//!
//! let bytes = sketch.serialize();
//! let decoded = CountSketchEstimator::deserialize(&bytes).unwrap();
//! assert_eq!(decoded.estimate_frequency(42), sketch.estimate_frequency(42));
//! ```

mod serialization;

mod sketch;
pub use self::sketch::CountSketchEstimator;
pub use self::sketch::MAX_LG_WIDTH;
