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
use crate::field::MERSENNE_EXPONENT;
use crate::field::MERSENNE_PRIME;
use crate::hash::KeyHasher;

/// Largest bucket width of [`SketchHashes`].
pub const MAX_SKETCH_BITS: u8 = 64;

/// Bit of `g(x)` that decides the sign hash: the most significant bit of a field element.
const SIGN_BIT: u32 = MERSENNE_EXPONENT - 1;

/// 4-universal hash `g(x) = a3*x^3 + a2*x^2 + a1*x + a0 (mod p)`.
///
/// For uniformly drawn coefficients, the images of any four distinct keys are independent and
/// uniform over `[0, p)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Degree3Polynomial {
    coefficients: [u128; 4],
}

impl Degree3Polynomial {
    /// Creates the polynomial from `[a0, a1, a2, a3]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if any coefficient is not below `p`.
    pub fn new(coefficients: [u128; 4]) -> Result<Self, Error> {
        if let Some(index) = coefficients.iter().position(|&c| c >= MERSENNE_PRIME) {
            return Err(
                Error::invalid_parameter("polynomial coefficients must be below 2^89 - 1")
                    .with_context("index", index)
                    .with_context("coefficient", coefficients[index]),
            );
        }
        Ok(Self { coefficients })
    }

    /// Draws four independent coefficients uniformly from the field.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let coefficients = std::array::from_fn(|_| field::random_coefficient(rng));
        Self { coefficients }
    }

    /// Returns the coefficients `[a0, a1, a2, a3]`.
    pub fn coefficients(&self) -> [u128; 4] {
        self.coefficients
    }

    /// Evaluates `g(key)` by Horner's rule, reducing after every step.
    #[inline]
    pub fn evaluate(&self, key: u64) -> u128 {
        let x = key as u128;
        let [a0, a1, a2, a3] = self.coefficients;
        let mut acc = a3;
        for c in [a2, a1, a0] {
            acc = field::add_mod(field::mul_mod(acc, x), c);
        }
        acc
    }
}

/// Bucket hash `h` and sign hash `s` of a Count-Sketch, both derived from one
/// [`Degree3Polynomial`] `g`:
///
/// * `h(x) = g(x) mod 2^t`
/// * `s(x) = +1` if bit 88 of `g(x)` is zero, `-1` otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SketchHashes {
    polynomial: Degree3Polynomial,
    lg_width: u8,
    mask: u128,
}

impl SketchHashes {
    /// Creates the pair from an explicit polynomial and bucket width `lg_width` in `(0, 64]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `lg_width` is out of range.
    pub fn new(polynomial: Degree3Polynomial, lg_width: u8) -> Result<Self, Error> {
        if lg_width == 0 || lg_width > MAX_SKETCH_BITS {
            return Err(Error::invalid_parameter(format!(
                "sketch hash width must be in [1, {MAX_SKETCH_BITS}]"
            ))
            .with_context("lg_width", lg_width));
        }
        Ok(Self {
            polynomial,
            lg_width,
            mask: (1u128 << lg_width) - 1,
        })
    }

    /// Draws a fresh, independent pair. Every call uses new coefficients.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, lg_width: u8) -> Result<Self, Error> {
        Self::new(Degree3Polynomial::random(rng), lg_width)
    }

    /// Returns the underlying polynomial.
    pub fn polynomial(&self) -> &Degree3Polynomial {
        &self.polynomial
    }

    /// Returns `t`, the log2 of the number of buckets.
    pub fn lg_width(&self) -> u8 {
        self.lg_width
    }

    /// Returns `h(key)`.
    #[inline]
    pub fn bucket(&self, key: u64) -> u64 {
        self.bucket_of(self.polynomial.evaluate(key))
    }

    /// Returns `s(key)`, either `1` or `-1`.
    #[inline]
    pub fn sign(&self, key: u64) -> i64 {
        sign_of(self.polynomial.evaluate(key))
    }

    /// Returns `(h(key), s(key))` from a single evaluation of `g`.
    #[inline]
    pub fn bucket_and_sign(&self, key: u64) -> (u64, i64) {
        let g = self.polynomial.evaluate(key);
        (self.bucket_of(g), sign_of(g))
    }

    #[inline]
    fn bucket_of(&self, g: u128) -> u64 {
        (g & self.mask) as u64
    }
}

#[inline]
fn sign_of(g: u128) -> i64 {
    if (g >> SIGN_BIT) & 1 == 0 { 1 } else { -1 }
}

impl KeyHasher for SketchHashes {
    fn hash(&self, key: u64) -> u64 {
        self.bucket(key)
    }

    fn output_bits(&self) -> u8 {
        self.lg_width
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_evaluate_small_polynomial() {
        // 1 + 2x + 3x^2 + 4x^3 at x = 2
        let g = Degree3Polynomial::new([1, 2, 3, 4]).unwrap();
        assert_eq!(g.evaluate(2), 1 + 4 + 12 + 32);
        assert_eq!(g.evaluate(0), 1);
    }

    #[test]
    fn test_evaluate_wraps_modulo_p() {
        // g(x) = (p - 1) * x^3, at x = 1 this is p - 1, at x = 2 it is -8 mod p
        let g = Degree3Polynomial::new([0, 0, 0, MERSENNE_PRIME - 1]).unwrap();
        assert_eq!(g.evaluate(1), MERSENNE_PRIME - 1);
        assert_eq!(g.evaluate(2), MERSENNE_PRIME - 8);
    }

    #[test]
    fn test_coefficients_must_be_field_elements() {
        assert!(Degree3Polynomial::new([0, MERSENNE_PRIME, 0, 0]).is_err());
        assert!(Degree3Polynomial::new([0, 0, 0, MERSENNE_PRIME - 1]).is_ok());
    }

    #[test]
    fn test_sign_uses_bit_88() {
        // constant polynomial: g(x) = a0
        let low = Degree3Polynomial::new([(1 << 88) - 1, 0, 0, 0]).unwrap();
        let high = Degree3Polynomial::new([1 << 88, 0, 0, 0]).unwrap();
        let low = SketchHashes::new(low, 4).unwrap();
        let high = SketchHashes::new(high, 4).unwrap();
        assert_eq!(low.sign(123), 1);
        assert_eq!(high.sign(123), -1);
        assert_eq!(low.bucket(123), 0b1111);
        assert_eq!(high.bucket(123), 0);
    }

    #[test]
    fn test_width_bounds() {
        let g = Degree3Polynomial::new([1, 2, 3, 4]).unwrap();
        assert!(SketchHashes::new(g, 0).is_err());
        assert!(SketchHashes::new(g, 65).is_err());
        assert!(SketchHashes::new(g, 1).is_ok());
        assert!(SketchHashes::new(g, 64).is_ok());
    }

    #[test]
    fn test_random_pairs_are_independent_draws() {
        let mut rng = StdRng::seed_from_u64(4);
        let first = SketchHashes::random(&mut rng, 10).unwrap();
        let second = SketchHashes::random(&mut rng, 10).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_signs_are_balanced() {
        let mut rng = StdRng::seed_from_u64(16);
        let pair = SketchHashes::random(&mut rng, 6).unwrap();
        let total: i64 = (0..20_000u64).map(|x| pair.sign(x)).sum();
        // 20_000 fair signs have standard deviation ~141
        assert!(total.abs() < 1_000, "sign sum {total}");
    }
}
