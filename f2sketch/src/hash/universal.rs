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

use rand::Rng;

use crate::error::Error;
use crate::field;
use crate::field::MERSENNE_PRIME;
use crate::hash::KeyHasher;

/// Largest output width of [`MultiplyShift`]; a shift by zero would make the family degenerate.
pub const MAX_MULTIPLY_SHIFT_BITS: u8 = 63;

/// Largest output width of [`MultiplyModPrime`].
pub const MAX_MULTIPLY_MOD_PRIME_BITS: u8 = 64;

/// 2-universal multiply-shift hash: `h(x) = (a * x mod 2^64) >> (64 - l)` with `a` odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplyShift {
    a: u64,
    output_bits: u8,
}

impl MultiplyShift {
    /// Creates the hash with multiplier `a` (forced odd) and `output_bits` in `(0, 64)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `output_bits` is out of range.
    pub fn new(a: u64, output_bits: u8) -> Result<Self, Error> {
        if output_bits == 0 || output_bits > MAX_MULTIPLY_SHIFT_BITS {
            return Err(Error::invalid_parameter(format!(
                "multiply-shift output bits must be in [1, {MAX_MULTIPLY_SHIFT_BITS}]"
            ))
            .with_context("output_bits", output_bits));
        }
        Ok(Self {
            a: a | 1,
            output_bits,
        })
    }

    /// Creates the hash with a random odd multiplier.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, output_bits: u8) -> Result<Self, Error> {
        Self::new(rng.random(), output_bits)
    }

    /// Returns the (odd) multiplier.
    pub fn multiplier(&self) -> u64 {
        self.a
    }
}

impl KeyHasher for MultiplyShift {
    #[inline]
    fn hash(&self, key: u64) -> u64 {
        self.a.wrapping_mul(key) >> (64 - self.output_bits)
    }

    fn output_bits(&self) -> u8 {
        self.output_bits
    }
}

/// 2-universal hash over the Mersenne field: `h(x) = ((a * x + b) mod p) mod 2^l`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplyModPrime {
    a: u128,
    b: u128,
    output_bits: u8,
    mask: u128,
}

impl MultiplyModPrime {
    /// Creates the hash with coefficients `a, b < p` and `output_bits` in `(0, 64]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if a coefficient is not a field element or `output_bits` is
    /// out of range.
    pub fn new(a: u128, b: u128, output_bits: u8) -> Result<Self, Error> {
        if output_bits == 0 || output_bits > MAX_MULTIPLY_MOD_PRIME_BITS {
            return Err(Error::invalid_parameter(format!(
                "multiply-mod-p output bits must be in [1, {MAX_MULTIPLY_MOD_PRIME_BITS}]"
            ))
            .with_context("output_bits", output_bits));
        }
        if a >= MERSENNE_PRIME || b >= MERSENNE_PRIME {
            return Err(Error::invalid_parameter(
                "multiply-mod-p coefficients must be below 2^89 - 1",
            )
            .with_context("a", a)
            .with_context("b", b));
        }
        Ok(Self {
            a,
            b,
            output_bits,
            mask: (1u128 << output_bits) - 1,
        })
    }

    /// Creates the hash with coefficients drawn uniformly from the field.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, output_bits: u8) -> Result<Self, Error> {
        let a = field::random_coefficient(rng);
        let b = field::random_coefficient(rng);
        Self::new(a, b, output_bits)
    }
}

impl KeyHasher for MultiplyModPrime {
    #[inline]
    fn hash(&self, key: u64) -> u64 {
        let y = field::add_mod(field::mul_mod(self.a, key as u128), self.b);
        (y & self.mask) as u64
    }

    fn output_bits(&self) -> u8 {
        self.output_bits
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_multiply_shift_forces_odd_multiplier() {
        let h = MultiplyShift::new(10, 8).unwrap();
        assert_eq!(h.multiplier(), 11);
        let h = MultiplyShift::new(11, 8).unwrap();
        assert_eq!(h.multiplier(), 11);
    }

    #[test]
    fn test_multiply_shift_known_values() {
        let h = MultiplyShift::new(3, 2).unwrap();
        assert_eq!(h.hash(0), 0);
        // 3 * 2^62 = 2^63 + 2^62, top two bits are 0b11
        assert_eq!(h.hash(1 << 62), 3);
        let h = MultiplyShift::new(1, 63).unwrap();
        assert_eq!(h.hash(u64::MAX), u64::MAX >> 1);
    }

    #[test]
    fn test_multiply_mod_prime_known_values() {
        let h = MultiplyModPrime::new(2, 5, 64).unwrap();
        assert_eq!(h.hash(7), 19);
        // 2 * (2^64 - 1) + 5 = 2^65 + 3 is below p, truncated to the low 64 bits
        assert_eq!(h.hash(u64::MAX), 3);
        let h = MultiplyModPrime::new(2, 5, 3).unwrap();
        assert_eq!(h.hash(7), 19 & 0b111);
    }

    #[test]
    fn test_random_constructors_respect_width() {
        let mut rng = StdRng::seed_from_u64(1);
        for bits in 1..=MAX_MULTIPLY_SHIFT_BITS {
            let h = MultiplyShift::random(&mut rng, bits).unwrap();
            assert_eq!(h.output_bits(), bits);
            assert!(h.hash(rng.random()) < 1u64 << bits);
        }
        for bits in 1..MAX_MULTIPLY_MOD_PRIME_BITS {
            let h = MultiplyModPrime::random(&mut rng, bits).unwrap();
            assert!(h.hash(rng.random()) < 1u64 << bits);
        }
    }
}
