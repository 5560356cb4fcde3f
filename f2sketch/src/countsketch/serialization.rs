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

pub(super) const SERIAL_VERSION: u8 = 1;
pub(super) const COUNTSKETCH_FAMILY_ID: u8 = 20;
pub(super) const FLAGS_IS_EMPTY: u8 = 1 << 0;

pub(super) const SERIAL_VERSION_BYTE: usize = 0;
pub(super) const FAMILY_BYTE: usize = 1;
pub(super) const LG_WIDTH_BYTE: usize = 2;
pub(super) const FLAGS_BYTE: usize = 3;
pub(super) const NUM_UPDATES_LONG: usize = 8;
pub(super) const COEFFICIENTS_OFFSET: usize = 16;

pub(super) const COEFFICIENT_SIZE_BYTES: usize = 16;
pub(super) const LONG_SIZE_BYTES: usize = 8;
pub(super) const PREAMBLE_SIZE_BYTES: usize = COEFFICIENTS_OFFSET + 4 * COEFFICIENT_SIZE_BYTES;
