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

//! Chained hash table from 64-bit keys to signed counts.
//!
//! The table has a fixed number of buckets, `2^l`, where `l` is the output width of the supplied
//! [`KeyHasher`]. Each bucket is a chain of `(key, value)` entries; a key appears in at most one
//! entry across the whole table. There is no removal and no resizing: the caller picks `l` up
//! front to match the expected number of distinct keys.
//!
//! Summing the squares of all values gives the exact second frequency moment of the stream that
//! was accumulated into the table.
//!
//! # Usage
//!
//! ```rust
//! use f2sketch::hash::MultiplyShift;
//! use f2sketch::table::ChainedFrequencyTable;
//!
//! let hasher = MultiplyShift::random(&mut rand::rng(), 8).unwrap();
//! let mut table = ChainedFrequencyTable::new(hasher).unwrap();
//!
//! table.increment(7, 5);
//! table.increment(9, -2);
//! table.increment(7, -1);
//!
//! assert_eq!(table.get(7), 4);
//! assert_eq!(table.get(8), 0);
//! assert_eq!(table.square_sum(), 16 + 4);
//! ```

use crate::error::Error;
use crate::hash::KeyHasher;
use crate::stream::Update;

/// Maximum log2 of the number of buckets.
pub const MAX_LG_BUCKETS: u8 = 32;

/// Fixed-size chained hash table of signed counts.
#[derive(Debug, Clone)]
pub struct ChainedFrequencyTable<H> {
    hasher: H,
    buckets: Vec<Vec<(u64, i64)>>,
    num_entries: usize,
}

impl<H: KeyHasher> ChainedFrequencyTable<H> {
    /// Creates an empty table with `2^hasher.output_bits()` buckets.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the hasher's width is zero or exceeds [`MAX_LG_BUCKETS`].
    pub fn new(hasher: H) -> Result<Self, Error> {
        let lg_buckets = hasher.output_bits();
        if lg_buckets == 0 || lg_buckets > MAX_LG_BUCKETS {
            return Err(Error::invalid_parameter(format!(
                "table hash width must be in [1, {MAX_LG_BUCKETS}]"
            ))
            .with_context("lg_buckets", lg_buckets));
        }
        let num_buckets = usize::try_from(1u64 << lg_buckets).map_err(|err| {
            Error::invalid_parameter("bucket count does not fit in memory")
                .with_context("lg_buckets", lg_buckets)
                .set_source(err)
        })?;
        Ok(Self {
            hasher,
            buckets: vec![Vec::new(); num_buckets],
            num_entries: 0,
        })
    }

    /// Creates a table and accumulates every update of `updates` into it.
    pub fn from_updates(hasher: H, updates: &[Update]) -> Result<Self, Error> {
        let mut table = Self::new(hasher)?;
        for update in updates {
            table.increment(update.key, update.delta);
        }
        Ok(table)
    }

    /// Returns the value stored for `key`, or 0 if the key was never inserted.
    pub fn get(&self, key: u64) -> i64 {
        self.buckets[self.bucket_index(key)]
            .iter()
            .find(|(k, _)| *k == key)
            .map_or(0, |(_, v)| *v)
    }

    /// Stores `value` for `key`, replacing any previous value.
    pub fn set(&mut self, key: u64, value: i64) {
        *self.entry(key) = value;
    }

    /// Adds `delta` to the value of `key`, inserting the key with value `delta` if absent.
    ///
    /// Values wrap on `i64` overflow.
    pub fn increment(&mut self, key: u64, delta: i64) {
        let value = self.entry(key);
        *value = value.wrapping_add(delta);
    }

    /// Returns the number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.num_entries
    }

    /// Returns true if no key has been stored.
    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    /// Returns the number of buckets, `2^l`.
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the number of non-empty buckets.
    pub fn used_bucket_count(&self) -> usize {
        self.buckets.iter().filter(|chain| !chain.is_empty()).count()
    }

    /// Returns the sum over buckets of `max(0, chain length - 1)`.
    pub fn collision_count(&self) -> usize {
        self.buckets
            .iter()
            .map(|chain| chain.len().saturating_sub(1))
            .sum()
    }

    /// Returns the length of the longest chain.
    pub fn max_chain_length(&self) -> usize {
        self.buckets.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns the hash function that buckets this table.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Iterates over all `(key, value)` entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, i64)> + '_ {
        self.buckets.iter().flat_map(|chain| chain.iter().copied())
    }

    /// Returns the sum of squared values, i.e. the exact F2 of the accumulated stream.
    ///
    /// The sum saturates at `u128::MAX`.
    pub fn square_sum(&self) -> u128 {
        self.iter().fold(0u128, |sum, (_, value)| {
            let magnitude = value.unsigned_abs() as u128;
            sum.saturating_add(magnitude * magnitude)
        })
    }

    fn bucket_index(&self, key: u64) -> usize {
        // the mask keeps misbehaving hashers inside the table
        (self.hasher.hash(key) as usize) & (self.buckets.len() - 1)
    }

    fn entry(&mut self, key: u64) -> &mut i64 {
        let index = self.bucket_index(key);
        let chain = &mut self.buckets[index];
        let position = match chain.iter().position(|(k, _)| *k == key) {
            Some(position) => position,
            None => {
                chain.push((key, 0));
                self.num_entries += 1;
                chain.len() - 1
            }
        };
        &mut chain[position].1
    }
}
