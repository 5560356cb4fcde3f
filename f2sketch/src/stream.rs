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

//! Keyed update streams and a synthetic stream generator.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::Error;

/// One streaming event: add `delta` to the frequency of `key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Update {
    pub key: u64,
    pub delta: i64,
}

impl Update {
    /// Creates an update of `delta` for `key`.
    pub const fn new(key: u64, delta: i64) -> Self {
        Self { key, delta }
    }

    /// Creates a `+1` update.
    pub const fn increment(key: u64) -> Self {
        Self::new(key, 1)
    }

    /// Creates a `-1` update.
    pub const fn decrement(key: u64) -> Self {
        Self::new(key, -1)
    }
}

impl From<(u64, i64)> for Update {
    fn from((key, delta): (u64, i64)) -> Self {
        Self::new(key, delta)
    }
}

/// Generates synthetic streams of `+1`/`-1` updates.
///
/// Keys are spread approximately uniformly over the `u64` range: the `i`-th key lies in the
/// `i`-th of `num_keys` equal slices, at a random offset within it. Every key receives up to
/// `max_count` increments and up to `max_count` decrements, and the whole stream is shuffled.
///
/// # Usage
///
/// ```rust
/// use f2sketch::stream::StreamGenerator;
///
/// let generator = StreamGenerator::new(100, 5).unwrap();
/// let updates = generator.generate(&mut rand::rng());
/// assert!(updates.iter().all(|u| u.delta == 1 || u.delta == -1));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StreamGenerator {
    num_keys: u64,
    max_count: u32,
}

impl StreamGenerator {
    /// Creates a generator for `num_keys` distinct keys.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `num_keys` or `max_count` is zero.
    pub fn new(num_keys: u64, max_count: u32) -> Result<Self, Error> {
        if num_keys == 0 {
            return Err(Error::invalid_parameter("num_keys must be positive"));
        }
        if max_count == 0 {
            return Err(Error::invalid_parameter("max_count must be positive"));
        }
        Ok(Self {
            num_keys,
            max_count,
        })
    }

    /// Returns the number of distinct keys the generator draws from.
    pub fn num_keys(&self) -> u64 {
        self.num_keys
    }

    /// Generates a shuffled stream.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Update> {
        let spacing = u64::MAX / self.num_keys;
        let mut updates = Vec::new();
        for i in 0..self.num_keys {
            let key = i * spacing + rng.random_range(0..spacing.max(1));
            let increments = rng.random_range(0..=self.max_count);
            let decrements = rng.random_range(0..=self.max_count);
            updates.extend((0..increments).map(|_| Update::increment(key)));
            updates.extend((0..decrements).map(|_| Update::decrement(key)));
        }
        updates.shuffle(rng);
        updates
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_generate_spreads_keys() {
        let generator = StreamGenerator::new(64, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let updates = generator.generate(&mut rng);
        let keys: HashSet<u64> = updates.iter().map(|u| u.key).collect();
        assert!(keys.len() <= 64);

        let spacing = u64::MAX / 64;
        for key in keys {
            assert!(key / spacing < 64);
        }
    }

    #[test]
    fn test_invalid_generator() {
        assert!(StreamGenerator::new(0, 1).is_err());
        assert!(StreamGenerator::new(1, 0).is_err());
    }

    #[test]
    fn test_update_constructors() {
        assert_eq!(Update::from((7, -3)), Update::new(7, -3));
        assert_eq!(Update::increment(1).delta, 1);
        assert_eq!(Update::decrement(1).delta, -1);
    }
}
