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

//! Universal hash families over 64-bit keys.
//!
//! Two strengths are provided:
//!
//! * 2-universal: [`MultiplyShift`] (Dietzfelbinger's multiply-shift on raw 64-bit words) and
//!   [`MultiplyModPrime`] (`((a * x + b) mod p) mod 2^l` over the Mersenne field). They implement
//!   [`KeyHasher`] and are suitable for bucketing a [`ChainedFrequencyTable`].
//! * 4-universal: [`Degree3Polynomial`], from which [`SketchHashes`] derives the bucket and sign
//!   hashes of a Count-Sketch. Bounding the variance of the F2 estimator needs this stronger
//!   family; the 2-universal ones are not enough.
//!
//! None of these are cryptographic hashes.
//!
//! # Usage
//!
//! ```rust
//! use f2sketch::hash::KeyHasher;
//! use f2sketch::hash::MultiplyShift;
//! use f2sketch::hash::SketchHashes;
//!
//! let mut rng = rand::rng();
//!
//! let h = MultiplyShift::random(&mut rng, 10).unwrap();
//! assert!(h.hash(42) < 1 << 10);
//!
//! let pair = SketchHashes::random(&mut rng, 8).unwrap();
//! let (bucket, sign) = pair.bucket_and_sign(42);
//! assert!(bucket < 1 << 8);
//! assert!(sign == 1 || sign == -1);
//! ```
//!
//! [`ChainedFrequencyTable`]: crate::table::ChainedFrequencyTable

use std::hash::Hash;

mod polynomial;
pub use self::polynomial::Degree3Polynomial;
pub use self::polynomial::SketchHashes;

mod universal;
pub use self::universal::MultiplyModPrime;
pub use self::universal::MultiplyShift;

/// Seed used to map arbitrary items to 64-bit keys.
pub const DEFAULT_ITEM_SEED: u32 = 9001;

/// A hash function from 64-bit keys to `output_bits()`-bit values.
///
/// Implementations are immutable once built: the same key always hashes to the same value.
pub trait KeyHasher {
    /// Hashes `key` into `[0, 2^output_bits())`.
    fn hash(&self, key: u64) -> u64;

    /// Width of the output range in bits.
    fn output_bits(&self) -> u8;
}

impl<H: KeyHasher + ?Sized> KeyHasher for &H {
    fn hash(&self, key: u64) -> u64 {
        (**self).hash(key)
    }

    fn output_bits(&self) -> u8 {
        (**self).output_bits()
    }
}

/// Maps an arbitrary hashable item to a 64-bit key with MurmurHash3 x64-128.
pub fn hash_item<T: Hash + ?Sized>(item: &T) -> u64 {
    let mut hasher = mur3::Hasher128::with_seed(DEFAULT_ITEM_SEED);
    item.hash(&mut hasher);
    let (lo, _) = hasher.finish128();
    lo
}
