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

//! Arithmetic modulo the Mersenne prime `p = 2^89 - 1`.
//!
//! Field elements are stored in `u128`. Products of two elements need up to 178 bits, so
//! multiplication widens into a pair of `u128` limbs and then folds the result back below `p`
//! using the identity `y mod (2^q - 1) = (y & (2^q - 1)) + (y >> q)`.

use rand::Rng;

/// Exponent `q` of the Mersenne prime `2^q - 1`.
pub const MERSENNE_EXPONENT: u32 = 89;

/// The field modulus `p = 2^89 - 1`.
pub const MERSENNE_PRIME: u128 = (1 << MERSENNE_EXPONENT) - 1;

/// Number of random bits drawn per coefficient; must cover `MERSENNE_EXPONENT`.
const COEFFICIENT_BITS: u32 = 96;

const LOW_64_MASK: u128 = u64::MAX as u128;

/// Reduces any `u128` value modulo [`MERSENNE_PRIME`].
///
/// Two folds bring the value to at most `p`; the final comparison maps `p` itself to zero.
#[inline]
pub fn reduce(y: u128) -> u128 {
    let y = (y & MERSENNE_PRIME) + (y >> MERSENNE_EXPONENT);
    let y = (y & MERSENNE_PRIME) + (y >> MERSENNE_EXPONENT);
    if y >= MERSENNE_PRIME {
        y - MERSENNE_PRIME
    } else {
        y
    }
}

/// Reduces the 256-bit value `hi * 2^128 + lo` modulo [`MERSENNE_PRIME`].
///
/// The value must be below `2^217`, which covers every product of two field elements.
#[inline]
pub fn reduce_wide(hi: u128, lo: u128) -> u128 {
    debug_assert!(
        hi >> MERSENNE_EXPONENT == 0,
        "wide value out of range: hi={hi:#x}"
    );
    // Split at bit 89: the high part straddles both limbs.
    let shifted = (hi << (128 - MERSENNE_EXPONENT)) | (lo >> MERSENNE_EXPONENT);
    reduce((lo & MERSENNE_PRIME) + shifted)
}

/// Returns `(a * b) mod p` for field elements `a, b < p`.
#[inline]
pub fn mul_mod(a: u128, b: u128) -> u128 {
    let (hi, lo) = widening_mul(a, b);
    reduce_wide(hi, lo)
}

/// Returns `(a + b) mod p` for field elements `a, b < p`.
#[inline]
pub fn add_mod(a: u128, b: u128) -> u128 {
    reduce(a + b)
}

/// Draws a coefficient uniformly from `[0, p)`.
///
/// The quality of every hash built on top of this depends on `rng`; a seeded generator makes the
/// draws reproducible and should only be used for testing.
pub fn random_coefficient<R: Rng + ?Sized>(rng: &mut R) -> u128 {
    let bits = rng.random::<u128>() >> (128 - COEFFICIENT_BITS);
    bits % MERSENNE_PRIME
}

/// Full 128x128 -> 256-bit multiplication, returned as `(hi, lo)`.
#[inline]
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & LOW_64_MASK);
    let (b_hi, b_lo) = (b >> 64, b & LOW_64_MASK);

    let lo_lo = a_lo * b_lo;
    let hi_lo = a_hi * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_hi = a_hi * b_hi;

    // at most 3 * (2^64 - 1), no overflow
    let middle = (lo_lo >> 64) + (hi_lo & LOW_64_MASK) + (lo_hi & LOW_64_MASK);
    let lo = (lo_lo & LOW_64_MASK) | (middle << 64);
    let hi = hi_hi + (hi_lo >> 64) + (lo_hi >> 64) + (middle >> 64);
    (hi, lo)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn shift_and_add_mul(a: u128, b: u128) -> u128 {
        let mut result = 0;
        let mut base = a % MERSENNE_PRIME;
        let mut exponent = b;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = (result + base) % MERSENNE_PRIME;
            }
            base = (base << 1) % MERSENNE_PRIME;
            exponent >>= 1;
        }
        result
    }

    #[test]
    fn test_reduce_edges() {
        assert_eq!(reduce(0), 0);
        assert_eq!(reduce(MERSENNE_PRIME - 1), MERSENNE_PRIME - 1);
        assert_eq!(reduce(MERSENNE_PRIME), 0);
        assert_eq!(reduce(MERSENNE_PRIME + 1), 1);
        assert_eq!(reduce(2 * MERSENNE_PRIME), 0);
        assert_eq!(reduce(u128::MAX), u128::MAX % MERSENNE_PRIME);
    }

    #[test]
    fn test_reduce_matches_remainder() {
        let mut rng = StdRng::seed_from_u64(89);
        for _ in 0..10_000 {
            let y: u128 = rng.random();
            let reduced = reduce(y);
            assert!(reduced < MERSENNE_PRIME);
            assert_eq!(reduced, y % MERSENNE_PRIME, "y={y:#x}");
        }
    }

    #[test]
    fn test_widening_mul() {
        assert_eq!(widening_mul(0, u128::MAX), (0, 0));
        assert_eq!(widening_mul(1 << 64, 1 << 64), (1, 0));
        assert_eq!(widening_mul(u128::MAX, u128::MAX), (u128::MAX - 1, 1));
        assert_eq!(widening_mul(u64::MAX as u128, 3), (0, 3 * u64::MAX as u128));
    }

    #[test]
    fn test_mul_mod_matches_reference() {
        let mut rng = StdRng::seed_from_u64(2_u64.pow(31) - 1);
        for _ in 0..2_000 {
            let a = random_coefficient(&mut rng);
            let b = random_coefficient(&mut rng);
            let product = mul_mod(a, b);
            assert!(product < MERSENNE_PRIME);
            assert_eq!(product, shift_and_add_mul(a, b), "a={a:#x}, b={b:#x}");
        }

        let max = MERSENNE_PRIME - 1;
        // (p - 1)^2 = 1 mod p
        assert_eq!(mul_mod(max, max), 1);
        assert_eq!(mul_mod(max, 1), max);
        assert_eq!(mul_mod(max, 0), 0);
    }

    #[test]
    fn test_reduce_wide_of_square_below_p_squared() {
        let (hi, lo) = widening_mul(MERSENNE_PRIME, MERSENNE_PRIME);
        assert_eq!(reduce_wide(hi, lo), 0);
        let (hi, lo) = widening_mul(MERSENNE_PRIME, MERSENNE_PRIME - 1);
        assert_eq!(reduce_wide(hi, lo), 0);
    }

    #[test]
    fn test_add_mod_wraps() {
        assert_eq!(add_mod(MERSENNE_PRIME - 1, 1), 0);
        assert_eq!(add_mod(MERSENNE_PRIME - 1, MERSENNE_PRIME - 1), MERSENNE_PRIME - 2);
    }

    #[test]
    fn test_random_coefficient_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut high_bit_seen = false;
        for _ in 0..1_000 {
            let c = random_coefficient(&mut rng);
            assert!(c < MERSENNE_PRIME);
            high_bit_seen |= c >> (MERSENNE_EXPONENT - 1) == 1;
        }
        assert!(high_bit_seen, "draws must cover the top field bit");
    }
}
