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

//! Repeated-trial evaluation of the Count-Sketch F2 estimator.
//!
//! An [`ExperimentRunner`] borrows one replayable stream, computes its exact F2 once through a
//! [`ChainedFrequencyTable`], and then runs independent Count-Sketch trials, each with freshly
//! drawn hashes and a full replay of the stream. The resulting [`TrialResults`] report the
//! mean-squared error against the exact value and the per-group medians used by the
//! median-of-means construction.
//!
//! # Usage
//!
//! ```rust
//! use f2sketch::experiment::ExperimentConfig;
//! use f2sketch::experiment::ExperimentRunner;
//! use f2sketch::stream::Update;
//!
//! let updates = [Update::new(1, 5), Update::new(2, -2), Update::new(3, 3)];
//! let config = ExperimentConfig::new(8, 10, 16).unwrap();
//! let mut runner = ExperimentRunner::new(&updates, config);
//!
//! let mut rng = rand::rng();
//! let results = runner.run_trials(&mut rng).unwrap();
//! assert_eq!(results.exact(), 38);
//! assert_eq!(results.estimates().len(), 16);
//!
//! let medians = results.group_medians(4, 4).unwrap();
//! assert_eq!(medians.len(), 4);
//! ```

use rand::Rng;

use crate::countsketch::CountSketchEstimator;
use crate::countsketch::MAX_LG_WIDTH;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hash::KeyHasher;
use crate::hash::MultiplyShift;
use crate::stream::Update;
use crate::table::ChainedFrequencyTable;
use crate::table::MAX_LG_BUCKETS;

/// Parameters of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperimentConfig {
    lg_table_size: u8,
    lg_width: u8,
    num_trials: usize,
}

impl ExperimentConfig {
    /// Creates a configuration.
    ///
    /// * `lg_table_size`: log2 of the bucket count of the exact table, in `[1, 32]`.
    /// * `lg_width`: log2 of the counter count of each sketch, in `[1, 30]`.
    /// * `num_trials`: number of independent sketch trials, at least one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if any value is out of range.
    pub fn new(lg_table_size: u8, lg_width: u8, num_trials: usize) -> Result<Self, Error> {
        if lg_table_size == 0 || lg_table_size > MAX_LG_BUCKETS {
            return Err(Error::invalid_parameter(format!(
                "lg_table_size must be in [1, {MAX_LG_BUCKETS}]"
            ))
            .with_context("lg_table_size", lg_table_size));
        }
        if lg_width == 0 || lg_width > MAX_LG_WIDTH {
            return Err(Error::invalid_parameter(format!(
                "lg_width must be in [1, {MAX_LG_WIDTH}]"
            ))
            .with_context("lg_width", lg_width));
        }
        if num_trials == 0 {
            return Err(Error::invalid_parameter("num_trials must be positive"));
        }
        Ok(Self {
            lg_table_size,
            lg_width,
            num_trials,
        })
    }

    /// Returns the log2 of the bucket count of the exact table.
    pub fn lg_table_size(&self) -> u8 {
        self.lg_table_size
    }

    /// Returns the log2 of the counter count of each sketch.
    pub fn lg_width(&self) -> u8 {
        self.lg_width
    }

    /// Returns the number of sketch trials per run.
    pub fn num_trials(&self) -> usize {
        self.num_trials
    }
}

/// Runs exact and sketched F2 computations over one stream.
#[derive(Debug)]
pub struct ExperimentRunner<'a> {
    updates: &'a [Update],
    config: ExperimentConfig,
    exact: Option<u128>,
    last_sketch: Option<CountSketchEstimator>,
}

impl<'a> ExperimentRunner<'a> {
    /// Creates a runner over a replayable stream.
    pub fn new(updates: &'a [Update], config: ExperimentConfig) -> Self {
        Self {
            updates,
            config,
            exact: None,
            last_sketch: None,
        }
    }

    /// Returns the parameters this runner was built with.
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Returns the exact F2, computing it on first use with a random multiply-shift table hash.
    pub fn exact_f2<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<u128, Error> {
        if let Some(exact) = self.exact {
            return Ok(exact);
        }
        let hasher = MultiplyShift::random(rng, self.config.lg_table_size)?;
        self.exact_f2_with(hasher)
    }

    /// Computes the exact F2 with a caller-supplied table hash and caches it.
    pub fn exact_f2_with<H: KeyHasher>(&mut self, hasher: H) -> Result<u128, Error> {
        let table = ChainedFrequencyTable::from_updates(hasher, self.updates)?;
        let exact = table.square_sum();
        tracing::info!(
            num_updates = self.updates.len(),
            distinct_keys = table.len(),
            used_buckets = table.used_bucket_count(),
            collisions = table.collision_count(),
            max_chain_length = table.max_chain_length(),
            exact = %exact,
            "computed exact F2"
        );
        self.exact = Some(exact);
        Ok(exact)
    }

    /// Runs one trial: a fresh sketch with fresh hashes over the whole stream.
    ///
    /// The sketch is kept and can be inspected with [`last_sketch`](Self::last_sketch).
    pub fn run_trial<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<u128, Error> {
        let mut sketch = CountSketchEstimator::with_random_hashes(rng, self.config.lg_width)?;
        sketch.process(self.updates);
        let estimate = sketch.estimate_square_sum();
        self.last_sketch = Some(sketch);
        Ok(estimate)
    }

    /// Runs `num_trials` independent trials against the exact value.
    pub fn run_trials<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<TrialResults, Error> {
        let exact = self.exact_f2(rng)?;
        let mut estimates = Vec::with_capacity(self.config.num_trials);
        for trial in 0..self.config.num_trials {
            let estimate = self.run_trial(rng)?;
            tracing::debug!(trial, estimate = %estimate, "count-sketch trial finished");
            estimates.push(estimate);
        }
        let results = TrialResults::new(exact, estimates)?;
        tracing::info!(
            num_trials = self.config.num_trials,
            lg_width = self.config.lg_width,
            exact = %exact,
            mean = results.mean(),
            mse = results.mse(),
            "count-sketch trials finished"
        );
        Ok(results)
    }

    /// Returns the sketch of the most recent trial.
    ///
    /// # Errors
    ///
    /// Returns `UninitializedEstimator` if no trial has run yet.
    pub fn last_sketch(&self) -> Result<&CountSketchEstimator, Error> {
        self.last_sketch.as_ref().ok_or_else(|| {
            Error::new(
                ErrorKind::UninitializedEstimator,
                "no count-sketch trial has been run",
            )
        })
    }
}

/// F2 estimates of independent trials together with the exact value.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResults {
    exact: u128,
    estimates: Vec<u128>,
}

impl TrialResults {
    /// Creates a result set from at least one estimate.
    pub fn new(exact: u128, estimates: Vec<u128>) -> Result<Self, Error> {
        if estimates.is_empty() {
            return Err(Error::invalid_parameter(
                "trial results need at least one estimate",
            ));
        }
        Ok(Self { exact, estimates })
    }

    /// Returns the exact F2.
    pub fn exact(&self) -> u128 {
        self.exact
    }

    /// Returns the estimates in trial order.
    pub fn estimates(&self) -> &[u128] {
        &self.estimates
    }

    /// Returns the mean estimate.
    pub fn mean(&self) -> f64 {
        mean(self.values())
    }

    /// Returns the mean squared error `mean((estimate - exact)^2)`.
    pub fn mse(&self) -> f64 {
        let exact = self.exact as f64;
        mean(self.values().map(|estimate| {
            let error = estimate - exact;
            error * error
        }))
    }

    /// Returns the mean squared error divided by `exact^2`, or `None` if the exact value is zero.
    pub fn relative_mse(&self) -> Option<f64> {
        if self.exact == 0 {
            return None;
        }
        let exact = self.exact as f64;
        Some(self.mse() / (exact * exact))
    }

    /// Returns the smallest estimate.
    pub fn min(&self) -> u128 {
        self.estimates.iter().copied().min().unwrap_or_default()
    }

    /// Returns the largest estimate.
    pub fn max(&self) -> u128 {
        self.estimates.iter().copied().max().unwrap_or_default()
    }

    /// Returns `max() - min()`.
    pub fn spread(&self) -> u128 {
        self.max() - self.min()
    }

    /// Splits the first `group_count * group_size` estimates into consecutive groups and returns
    /// the median of each group.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if either argument is zero or there are fewer estimates than
    /// requested.
    pub fn group_medians(&self, group_count: usize, group_size: usize) -> Result<Vec<f64>, Error> {
        Ok(self
            .groups(group_count, group_size)?
            .map(|group| median(group.iter().map(|&e| e as f64).collect()))
            .collect())
    }

    /// Returns the median of the group means, with groups formed as in
    /// [`group_medians`](Self::group_medians).
    pub fn median_of_means(&self, group_count: usize, group_size: usize) -> Result<f64, Error> {
        let means = self
            .groups(group_count, group_size)?
            .map(|group| mean(group.iter().map(|&e| e as f64)))
            .collect();
        Ok(median(means))
    }

    fn groups(
        &self,
        group_count: usize,
        group_size: usize,
    ) -> Result<std::slice::Chunks<'_, u128>, Error> {
        if group_count == 0 || group_size == 0 {
            return Err(Error::invalid_parameter(
                "group count and group size must be positive",
            )
            .with_context("group_count", group_count)
            .with_context("group_size", group_size));
        }
        let needed = group_count.checked_mul(group_size);
        match needed {
            Some(needed) if needed <= self.estimates.len() => {
                Ok(self.estimates[..needed].chunks(group_size))
            }
            _ => Err(Error::invalid_parameter("not enough estimates for grouping")
                .with_context("group_count", group_count)
                .with_context("group_size", group_size)
                .with_context("num_estimates", self.estimates.len())),
        }
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.estimates.iter().map(|&e| e as f64)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Median of a non-empty sample; the two middle values are averaged for even sizes.
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
