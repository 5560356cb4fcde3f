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

//! Compares exact and Count-Sketch F2 on a synthetic stream.
//!
//! ```text
//! cargo run -p demos --bin f2_experiment -- --num-keys 100000 --lg-width 12 --seed 7
//! ```

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use f2sketch::error::Error;
use f2sketch::experiment::ExperimentConfig;
use f2sketch::experiment::ExperimentRunner;
use f2sketch::experiment::TrialResults;
use f2sketch::stream::StreamGenerator;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(about = "Estimate the second frequency moment of a synthetic stream")]
struct Args {
    /// Number of distinct keys in the generated stream.
    #[arg(long, default_value_t = 10_000)]
    num_keys: u64,

    /// Maximum number of increments (and of decrements) per key.
    #[arg(long, default_value_t = 10)]
    max_count: u32,

    /// Log2 of the bucket count of the exact table.
    #[arg(long, default_value_t = 14)]
    lg_table_size: u8,

    /// Log2 of the counter count of each sketch.
    #[arg(long, default_value_t = 10)]
    lg_width: u8,

    /// Number of independent sketch trials.
    #[arg(long, default_value_t = 100)]
    num_trials: usize,

    /// Number of median-of-means groups.
    #[arg(long, default_value_t = 10)]
    group_count: usize,

    /// Number of trials per group.
    #[arg(long, default_value_t = 10)]
    group_size: usize,

    /// Seed for a reproducible run. Seeded runs are for testing; omit for OS entropy.
    #[arg(long)]
    seed: Option<u64>,

    /// Print per-trial results as CSV; the summary goes to the log on stderr.
    #[arg(long)]
    csv: bool,

    /// Log every trial.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let generator = StreamGenerator::new(args.num_keys, args.max_count)?;
    let updates = generator.generate(&mut rng);
    tracing::info!(num_updates = updates.len(), "generated stream");

    let config = ExperimentConfig::new(args.lg_table_size, args.lg_width, args.num_trials)?;
    let mut runner = ExperimentRunner::new(&updates, config);

    let start = Instant::now();
    let exact = runner.exact_f2(&mut rng)?;
    let exact_elapsed = start.elapsed();

    let start = Instant::now();
    let results = runner.run_trials(&mut rng)?;
    let sketch_elapsed = start.elapsed().div_f64(args.num_trials as f64);

    let medians = results.group_medians(args.group_count, args.group_size)?;
    let median_of_means = results.median_of_means(args.group_count, args.group_size)?;

    if args.csv {
        print_csv(&results);
        tracing::info!(
            exact,
            mse = results.mse(),
            relative_mse = results.relative_mse(),
            group_medians = ?medians,
            median_of_means,
            "trial summary"
        );
    } else {
        println!("stream updates:        {}", updates.len());
        println!("exact F2:              {exact} ({exact_elapsed:?})");
        println!("sketch counters:       {}", 1u64 << args.lg_width);
        println!("trial estimates:       {:?}", results.estimates());
        println!("mean estimate:         {:.2} ({sketch_elapsed:?} per trial)", results.mean());
        println!("mean squared error:    {:.4e}", results.mse());
        if let Some(relative) = results.relative_mse() {
            println!("relative MSE:          {relative:.4e}");
        }
        println!("group medians:         {medians:.2?}");
        println!("median of means:       {median_of_means:.2}");
    }
    Ok(())
}

fn print_csv(results: &TrialResults) {
    println!("trial,estimate,exact,squared_error");
    let exact = results.exact();
    for (trial, estimate) in results.estimates().iter().enumerate() {
        let error = estimate.abs_diff(exact) as f64;
        println!("{trial},{estimate},{exact},{}", error * error);
    }
}
