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

use f2sketch::error::ErrorKind;
use f2sketch::hash::Degree3Polynomial;
use f2sketch::hash::KeyHasher;
use f2sketch::hash::MultiplyModPrime;
use f2sketch::hash::MultiplyShift;
use f2sketch::hash::SketchHashes;
use googletest::assert_that;
use googletest::prelude::le;
use googletest::prelude::lt;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

const NUM_PAIRS: usize = 100_000;

fn collision_rate<H: KeyHasher>(hasher: &H, rng: &mut StdRng) -> f64 {
    let mut collisions = 0;
    let mut pairs = 0;
    while pairs < NUM_PAIRS {
        let x: u64 = rng.random();
        let y: u64 = rng.random();
        if x == y {
            continue;
        }
        pairs += 1;
        if hasher.hash(x) == hasher.hash(y) {
            collisions += 1;
        }
    }
    collisions as f64 / NUM_PAIRS as f64
}

#[test]
fn test_multiply_shift_range() {
    let mut rng = StdRng::seed_from_u64(11);
    for bits in [1u8, 2, 7, 16, 32, 63] {
        let hasher = MultiplyShift::random(&mut rng, bits).unwrap();
        for key in [0, 1, u64::MAX, u64::MAX / 3, rng.random()] {
            assert_that!(hasher.hash(key), lt(1u64 << bits));
        }
    }
}

#[test]
fn test_multiply_shift_rejects_invalid_width() {
    for bits in [0u8, 64, 200] {
        let err = MultiplyShift::new(1, bits).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }
}

#[test]
fn test_multiply_mod_prime_range() {
    let mut rng = StdRng::seed_from_u64(12);
    for bits in [1u8, 5, 31, 63] {
        let hasher = MultiplyModPrime::random(&mut rng, bits).unwrap();
        for _ in 0..1_000 {
            assert_that!(hasher.hash(rng.random()), lt(1u64 << bits));
        }
    }

    // l = 64 must not overflow the output mask
    let hasher = MultiplyModPrime::random(&mut rng, 64).unwrap();
    assert_eq!(hasher.output_bits(), 64);
    let mut seen_high_bit = false;
    for _ in 0..1_000 {
        seen_high_bit |= hasher.hash(rng.random()) >> 63 == 1;
    }
    assert!(seen_high_bit);
}

#[test]
fn test_multiply_mod_prime_rejects_invalid_parameters() {
    assert_eq!(
        MultiplyModPrime::new(1, 1, 0).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
    assert_eq!(
        MultiplyModPrime::new(1, 1, 65).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
    let p = f2sketch::field::MERSENNE_PRIME;
    assert_eq!(
        MultiplyModPrime::new(p, 0, 8).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
    assert!(MultiplyModPrime::new(p - 1, p - 1, 8).is_ok());
}

#[test]
fn test_two_universal_collision_rate() {
    let mut rng = StdRng::seed_from_u64(2);
    let bits = 8;
    let bound = 1.0 / (1u64 << bits) as f64;

    let shift = MultiplyShift::random(&mut rng, bits).unwrap();
    assert_that!(collision_rate(&shift, &mut rng), le(1.2 * bound));

    let mod_prime = MultiplyModPrime::random(&mut rng, bits).unwrap();
    assert_that!(collision_rate(&mod_prime, &mut rng), le(1.2 * bound));
}

#[test]
fn test_sketch_hash_pair_ranges() {
    let mut rng = StdRng::seed_from_u64(13);
    for lg_width in [1u8, 6, 10, 64] {
        let pair = SketchHashes::random(&mut rng, lg_width).unwrap();
        for _ in 0..1_000 {
            let key = rng.random();
            let (bucket, sign) = pair.bucket_and_sign(key);
            if lg_width < 64 {
                assert_that!(bucket, lt(1u64 << lg_width));
            }
            assert!(sign == 1 || sign == -1);
            assert_eq!(bucket, pair.bucket(key));
            assert_eq!(sign, pair.sign(key));
        }
    }
    assert_eq!(
        SketchHashes::random(&mut rng, 0).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
    assert_eq!(
        SketchHashes::random(&mut rng, 65).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
}

#[test]
fn test_polynomial_values_are_spread_over_field() {
    let mut rng = StdRng::seed_from_u64(14);
    let g = Degree3Polynomial::random(&mut rng);
    let p = f2sketch::field::MERSENNE_PRIME;
    let mut top_half = 0;
    for key in 0..10_000u64 {
        let value = g.evaluate(key);
        assert!(value < p);
        if value >= p / 2 {
            top_half += 1;
        }
    }
    // roughly half the images land in the upper half of [0, p)
    assert!((4_500..5_500).contains(&top_half), "top_half={top_half}");
}
