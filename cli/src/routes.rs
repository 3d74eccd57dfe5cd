use chrono::Weekday;
use indexmap::IndexMap;
use log::info;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::Serialize;
use shoprate::stats::PosteriorSummary;
use shoprate::utils::round_to;
use shoprate::{infer_weekday, SimulatorBuilder};

use crate::opt;
use crate::utils::print_table;

#[derive(Serialize)]
struct IntervalRow {
    median: f64,
    lower: f64,
    upper: f64,
}

impl IntervalRow {
    fn new(summary: &PosteriorSummary, precision: u32) -> Self {
        let (lower, upper) = summary.credible_interval();
        Self {
            median: round_to(summary.median(), precision),
            lower: round_to(lower, precision),
            upper: round_to(upper, precision),
        }
    }
}

#[derive(Serialize)]
struct PosteriorReport {
    n_samples: usize,
    level: f64,
    mean: f64,
    median: f64,
    std: f64,
    lower: f64,
    upper: f64,
    frequencies: Vec<(f64, usize)>,
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(err) => {
            eprintln!("Failed to serialize output: {err}");
            1
        }
    }
}

pub fn simulate(cmd: opt::SimulateArgs) -> i32 {
    let config = match cmd.simulator_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return 1;
        }
    };

    let history = match cmd.purchase_history() {
        Ok(history) => history,
        Err(err) => {
            eprintln!("Could not load purchase history: {err}");
            return 1;
        }
    };
    info!("bucketing weeks before {}", history.as_of);

    let simulator = match SimulatorBuilder::new(history).config(config).build()
    {
        Ok(simulator) => simulator,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return 1;
        }
    };

    let result = match simulator.simulate_summaries(&cmd.user_id) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Simulation failed: {err}");
            return 1;
        }
    };

    let precision = simulator.config().result_precision;

    if cmd.intervals {
        let rows: IndexMap<Weekday, IntervalRow> = result
            .iter()
            .map(|(&weekday, summary)| {
                (weekday, IntervalRow::new(summary, precision))
            })
            .collect();

        if cmd.json {
            return print_json(&rows);
        }

        let level = 100.0 * simulator.config().credible_level;
        let low = format!("{level}% low");
        let high = format!("{level}% high");
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|(weekday, row)| {
                vec![
                    format!("{weekday}"),
                    format!("{}", row.median),
                    format!("{}", row.lower),
                    format!("{}", row.upper),
                ]
            })
            .collect();
        print_table(&["Weekday", "Median", low.as_str(), high.as_str()], &rows);
        return 0;
    }

    let medians = result.medians(precision);
    if cmd.json {
        return print_json(&medians);
    }

    medians
        .iter()
        .for_each(|(weekday, median)| println!("{weekday}: {median}"));
    0
}

pub fn posterior(cmd: opt::PosteriorArgs) -> i32 {
    let config = cmd.simulator_config();

    let mut rng = match config.seed {
        Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
        None => Xoshiro256Plus::from_entropy(),
    };

    let summary = match infer_weekday(&cmd.counts, &config, &mut rng) {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("Error: {err}");
            return 1;
        }
    };

    let (lower, upper) = summary.credible_interval();
    let frequencies = summary.frequency_table(config.frequency_precision);

    if cmd.json {
        let report = PosteriorReport {
            n_samples: summary.n_samples(),
            level: summary.level(),
            mean: summary.mean(),
            median: summary.median(),
            std: summary.std(),
            lower,
            upper,
            frequencies,
        };
        return print_json(&report);
    }

    print_table(
        &["Samples", "Mean", "Median", "Std", "Lower", "Upper"],
        &[vec![
            format!("{}", summary.n_samples()),
            format!("{:.4}", summary.mean()),
            format!("{:.4}", summary.median()),
            format!("{:.4}", summary.std()),
            format!("{lower:.4}"),
            format!("{upper:.4}"),
        ]],
    );
    println!();

    let n = summary.n_samples() as f64;
    let decimals = config.frequency_precision as usize;
    let rows: Vec<Vec<String>> = frequencies
        .iter()
        .map(|&(value, count)| {
            vec![
                format!("{value:.decimals$}"),
                format!("{count}"),
                format!("{:.4}", count as f64 / n),
            ]
        })
        .collect();
    print_table(&["Rate", "Count", "Share"], &rows);
    0
}
