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

use std::hash::Hash;
use std::io::Cursor;

use byteorder::ByteOrder;
use byteorder::LittleEndian;
use byteorder::ReadBytesExt;
use rand::Rng;

use crate::countsketch::serialization::*;
use crate::error::Error;
use crate::hash::Degree3Polynomial;
use crate::hash::SketchHashes;
use crate::hash::hash_item;
use crate::stream::Update;

/// Maximum log2 of the number of counters.
pub const MAX_LG_WIDTH: u8 = 30;

/// Single-row Count-Sketch over 64-bit keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountSketchEstimator {
    hashes: SketchHashes,
    counters: Vec<i64>,
    num_updates: u64,
}

impl CountSketchEstimator {
    /// Creates an empty sketch with `2^hashes.lg_width()` zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the hash width exceeds [`MAX_LG_WIDTH`].
    pub fn new(hashes: SketchHashes) -> Result<Self, Error> {
        let lg_width = hashes.lg_width();
        if lg_width > MAX_LG_WIDTH {
            return Err(Error::invalid_parameter(format!(
                "sketch width must be in [1, {MAX_LG_WIDTH}]"
            ))
            .with_context("lg_width", lg_width));
        }
        Ok(Self {
            hashes,
            counters: vec![0; 1 << lg_width],
            num_updates: 0,
        })
    }

    /// Creates an empty sketch with a freshly drawn hash pair of width `lg_width`.
    pub fn with_random_hashes<R: Rng + ?Sized>(rng: &mut R, lg_width: u8) -> Result<Self, Error> {
        Self::new(SketchHashes::random(rng, lg_width)?)
    }

    /// Returns the hash pair driving this sketch.
    pub fn hashes(&self) -> &SketchHashes {
        &self.hashes
    }

    /// Returns `t`, the log2 of the number of counters.
    pub fn lg_width(&self) -> u8 {
        self.hashes.lg_width()
    }

    /// Returns the counters `C[0..2^t]`.
    pub fn counters(&self) -> &[i64] {
        &self.counters
    }

    /// Returns the number of updates processed.
    pub fn num_updates(&self) -> u64 {
        self.num_updates
    }

    /// Returns true if no update has been processed.
    pub fn is_empty(&self) -> bool {
        self.num_updates == 0
    }

    /// Adds `delta` occurrences of `key`.
    ///
    /// Counters use wrapping two's-complement arithmetic, so any `i64` delta is accepted and the
    /// sketch stays linear modulo `2^64`. Estimates are meaningful only while every counter fits
    /// in an `i64`.
    #[inline]
    pub fn update(&mut self, key: u64, delta: i64) {
        let (bucket, sign) = self.hashes.bucket_and_sign(key);
        let counter = &mut self.counters[bucket as usize];
        *counter = counter.wrapping_add(sign.wrapping_mul(delta));
        self.num_updates += 1;
    }

    /// Adds `delta` occurrences of an arbitrary hashable item.
    pub fn update_item<T: Hash + ?Sized>(&mut self, item: &T, delta: i64) {
        self.update(hash_item(item), delta);
    }

    /// Replays a whole stream into the sketch.
    pub fn process(&mut self, updates: &[Update]) {
        for update in updates {
            self.update(update.key, update.delta);
        }
    }

    /// Returns the unbiased estimate `s(key) * C[h(key)]` of the frequency of `key`.
    pub fn estimate_frequency(&self, key: u64) -> i64 {
        let (bucket, sign) = self.hashes.bucket_and_sign(key);
        sign.wrapping_mul(self.counters[bucket as usize])
    }

    /// Returns the frequency estimate of an arbitrary hashable item.
    pub fn estimate_item_frequency<T: Hash + ?Sized>(&self, item: &T) -> i64 {
        self.estimate_frequency(hash_item(item))
    }

    /// Returns the unbiased F2 estimate `sum_j C[j]^2`, saturating at `u128::MAX`.
    pub fn estimate_square_sum(&self) -> u128 {
        self.counters.iter().fold(0u128, |sum, c| {
            let magnitude = c.unsigned_abs() as u128;
            sum.saturating_add(magnitude * magnitude)
        })
    }

    /// Merges another sketch built with the same hash pair into this one.
    ///
    /// The sketch is linear, so the result equals a sketch of both streams concatenated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the hash pairs differ.
    pub fn merge(&mut self, other: &Self) -> Result<(), Error> {
        if self.hashes != other.hashes {
            return Err(Error::invalid_parameter(
                "cannot merge sketches built with different hash functions",
            )
            .with_context("lg_width", self.lg_width())
            .with_context("other_lg_width", other.lg_width()));
        }
        for (left, right) in self.counters.iter_mut().zip(other.counters.iter()) {
            *left = left.wrapping_add(*right);
        }
        self.num_updates += other.num_updates;
        Ok(())
    }

    /// Serializes this sketch into a byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        let counters_bytes = if self.is_empty() {
            0
        } else {
            self.counters.len() * LONG_SIZE_BYTES
        };
        let mut out = vec![0u8; PREAMBLE_SIZE_BYTES + counters_bytes];
        out[SERIAL_VERSION_BYTE] = SERIAL_VERSION;
        out[FAMILY_BYTE] = COUNTSKETCH_FAMILY_ID;
        out[LG_WIDTH_BYTE] = self.lg_width();
        out[FLAGS_BYTE] = if self.is_empty() { FLAGS_IS_EMPTY } else { 0 };
        LittleEndian::write_u64(&mut out[NUM_UPDATES_LONG..], self.num_updates);

        let mut offset = COEFFICIENTS_OFFSET;
        for coefficient in self.hashes.polynomial().coefficients() {
            LittleEndian::write_u128(&mut out[offset..], coefficient);
            offset += COEFFICIENT_SIZE_BYTES;
        }
        if counters_bytes > 0 {
            LittleEndian::write_i64_into(&self.counters, &mut out[offset..]);
        }
        out
    }

    /// Deserializes a sketch from bytes.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDeserializeData` if the bytes are truncated, come from another sketch
    /// family or version, or carry out-of-range parameters.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |err| Error::deserial(format!("insufficient data: {tag}")).set_source(err)
        }

        let mut cursor = Cursor::new(bytes);
        let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
        let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
        let lg_width = cursor.read_u8().map_err(make_error("lg_width"))?;
        let flags = cursor.read_u8().map_err(make_error("flags"))?;
        cursor.read_u32::<LittleEndian>().map_err(make_error("<unused>"))?;

        if serial_version != SERIAL_VERSION {
            return Err(Error::deserial(format!(
                "unsupported serial version: expected {SERIAL_VERSION}, got {serial_version}"
            )));
        }
        if family_id != COUNTSKETCH_FAMILY_ID {
            return Err(Error::deserial(format!(
                "invalid family: expected {COUNTSKETCH_FAMILY_ID}, got {family_id}"
            )));
        }

        let num_updates = cursor
            .read_u64::<LittleEndian>()
            .map_err(make_error("num_updates"))?;
        let mut coefficients = [0u128; 4];
        for coefficient in coefficients.iter_mut() {
            *coefficient = cursor
                .read_u128::<LittleEndian>()
                .map_err(make_error("coefficients"))?;
        }

        let is_empty = flags & FLAGS_IS_EMPTY != 0;
        if is_empty != (num_updates == 0) {
            return Err(Error::deserial(format!(
                "empty flag does not match number of updates: {num_updates}"
            )));
        }
        if lg_width > MAX_LG_WIDTH {
            return Err(Error::deserial(format!(
                "sketch width out of range: lg_width={lg_width}"
            )));
        }
        if !is_empty {
            let expected = PREAMBLE_SIZE_BYTES + (LONG_SIZE_BYTES << lg_width);
            if bytes.len() < expected {
                return Err(Error::deserial(format!(
                    "insufficient data: counters, expected {expected} bytes, got {}",
                    bytes.len()
                )));
            }
        }

        let hashes = Degree3Polynomial::new(coefficients)
            .and_then(|polynomial| SketchHashes::new(polynomial, lg_width))
            .map_err(|err| Error::deserial("invalid sketch hash parameters").set_source(err))?;
        let mut sketch = Self::new(hashes)?;
        if !is_empty {
            cursor
                .read_i64_into::<LittleEndian>(&mut sketch.counters)
                .map_err(make_error("counters"))?;
        }
        sketch.num_updates = num_updates;
        Ok(sketch)
    }
}
