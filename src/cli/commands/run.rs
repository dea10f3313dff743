use anyhow::Result;
use clap::{Args, ValueEnum};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::cli::Output;
use crate::compute::factorial;
use crate::config::TaskpoolConfig;
use crate::parallel::WorkerReport;
use crate::pipeline::{Pipeline, RunReport};
use crate::task::{Outcome, TaskResult, TaskSource};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Number of tasks to generate
    #[arg(short = 'n', long)]
    pub tasks: Option<usize>,

    /// Worker threads (0 = available parallelism + 1)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Smallest generated value (inclusive)
    #[arg(long)]
    pub min: Option<i64>,

    /// Largest generated value (inclusive)
    #[arg(long)]
    pub max: Option<i64>,

    /// Seed for a reproducible workload
    #[arg(long)]
    pub seed: Option<u64>,

    /// Explicit task values, replacing the generated workload
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        conflicts_with_all = ["tasks", "seed", "min", "max"]
    )]
    pub values: Vec<i64>,

    /// Recent durations each worker averages over
    #[arg(long)]
    pub history: Option<usize>,

    /// Percentage over the average tolerated before a task is flagged
    #[arg(long)]
    pub slack: Option<u32>,

    /// Artificial per-task latency in milliseconds
    #[arg(long = "delay-ms")]
    pub delay_ms: Option<u64>,

    /// Only print computed values whose last digit is even
    #[arg(long)]
    pub even_only: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: RunFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum RunFormat {
    #[default]
    Text,
    Json,
}

/// CLI flags as a config layer; unset flags are left out
#[derive(Serialize)]
struct RunOverrides {
    pool: PoolOverrides,
    anomaly: AnomalyOverrides,
    tasks: TaskOverrides,
}

#[derive(Serialize)]
struct PoolOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    simulated_delay_ms: Option<u64>,
}

#[derive(Serialize)]
struct AnomalyOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    history_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slack_percent: Option<u32>,
}

#[derive(Serialize)]
struct TaskOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

impl From<&RunArgs> for RunOverrides {
    fn from(args: &RunArgs) -> Self {
        Self {
            pool: PoolOverrides {
                workers: args.workers,
                simulated_delay_ms: args.delay_ms,
            },
            anomaly: AnomalyOverrides {
                history_capacity: args.history,
                slack_percent: args.slack,
            },
            tasks: TaskOverrides {
                count: args.tasks,
                min: args.min,
                max: args.max,
                seed: args.seed,
            },
        }
    }
}

pub fn execute(args: RunArgs, custom_config: Option<&Path>, output: &Output) -> Result<()> {
    let config = TaskpoolConfig::load(custom_config, Some(RunOverrides::from(&args)))?;

    let source = if args.values.is_empty() {
        config.task_source()?
    } else {
        TaskSource::fixed(args.values.clone())
    };

    let pipeline = Pipeline::new(config.pool_settings());
    output.verbose(&format!(
        "Dispatching {} tasks to {} workers",
        source.len(),
        pipeline.settings().workers
    ));

    let report = pipeline.run(source, factorial)?;

    match args.format {
        RunFormat::Text => print_text(&report, args.even_only, output),
        RunFormat::Json => {
            let json = JsonReport::new(&report, args.even_only);
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

fn print_text(report: &RunReport, even_only: bool, output: &Output) {
    for result in report.results.iter().filter(|r| keep(r, even_only)) {
        output.line(&result_line(result));
    }

    output.header("Summary");
    output.table_row("Run", &report.run_id.to_string());
    output.table_row("Tasks", &report.results.len().to_string());
    output.table_row("Workers", &report.workers.len().to_string());
    output.count_row("Anomalies", report.anomaly_count());
    output.count_row("Failures", report.failure_count());
    output.table_row("Elapsed", &format!("{:.2?}", report.elapsed));

    if output.is_verbose() {
        for worker in &report.workers {
            output.verbose(&format!(
                "worker {}: {} processed, {} anomalies, {} failures, avg {:?}, exit {:?}",
                worker.worker_id,
                worker.processed,
                worker.anomalies,
                worker.failures,
                worker.average,
                worker.exit
            ));
        }
    }

    if report.cancelled {
        output.warning(&format!(
            "Run was shut down early, {} tasks have no result",
            report.missing.len()
        ));
    } else {
        output.success("All tasks accounted for");
    }
}

fn result_line(result: &TaskResult) -> String {
    let TaskResult { task, outcome, .. } = result;
    match outcome {
        Outcome::Value(value) => format!("{}. task: {}! = {}", task.id, task.value, value),
        Outcome::Anomaly { elapsed, threshold } => format!(
            "{}. task: {}! timed out (took {:?}, limit {:?})",
            task.id, task.value, elapsed, threshold
        ),
        Outcome::Failed(err) => format!("{}. task: {}! failed: {}", task.id, task.value, err),
    }
}

/// Parity filter; only genuine values are ever filtered out
fn keep(result: &TaskResult, even_only: bool) -> bool {
    match result.outcome.value() {
        Some(value) if even_only => is_even(value),
        _ => true,
    }
}

fn is_even(value: &BigUint) -> bool {
    (value % 2u32).is_zero()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    run_id: Uuid,
    cancelled: bool,
    elapsed_ms: u128,
    anomalies: usize,
    failures: usize,
    results: Vec<JsonResult>,
    missing: &'a [usize],
    workers: &'a [WorkerReport],
}

#[derive(Serialize)]
struct JsonResult {
    id: usize,
    value: i64,
    worker_id: usize,
    elapsed_us: u128,
    #[serde(flatten)]
    outcome: JsonOutcome,
}

/// Big integers are rendered as decimal strings
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum JsonOutcome {
    Value { result: String },
    Anomaly { threshold_us: u128 },
    Failed { error: String },
}

impl<'a> JsonReport<'a> {
    fn new(report: &'a RunReport, even_only: bool) -> Self {
        let results = report
            .results
            .iter()
            .filter(|r| keep(r, even_only))
            .map(|r| JsonResult {
                id: r.task.id,
                value: r.task.value,
                worker_id: r.worker_id,
                elapsed_us: r.elapsed.as_micros(),
                outcome: match &r.outcome {
                    Outcome::Value(value) => JsonOutcome::Value {
                        result: value.to_string(),
                    },
                    Outcome::Anomaly { threshold, .. } => JsonOutcome::Anomaly {
                        threshold_us: threshold.as_micros(),
                    },
                    Outcome::Failed(err) => JsonOutcome::Failed {
                        error: err.to_string(),
                    },
                },
            })
            .collect();

        Self {
            run_id: report.run_id,
            cancelled: report.cancelled,
            elapsed_ms: report.elapsed.as_millis(),
            anomalies: report.anomaly_count(),
            failures: report.failure_count(),
            results,
            missing: &report.missing,
            workers: &report.workers,
        }
    }
}
