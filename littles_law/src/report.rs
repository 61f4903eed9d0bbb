//! Reduction of a finished run into the Little's Law report

use std::fmt;

use serde::Serialize;

use crate::config::ModelConfig;
use crate::stats::Statistics;

/// Arithmetic mean, `None` for an empty sequence
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn mean_count(values: &[usize]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
}

/// Time-averaged population against arrival rate × mean sojourn for one subsystem
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Subsystem {
    /// L, from the sampled sequence
    pub mean_population: Option<f64>,
    /// W, from the event sequence
    pub mean_time: Option<f64>,
    /// λ·W
    pub predicted_population: Option<f64>,
}

impl Subsystem {
    fn new(mean_population: Option<f64>, mean_time: Option<f64>, arrival_rate: Option<f64>) -> Self {
        let predicted_population = match (arrival_rate, mean_time) {
            (Some(lambda), Some(w)) => Some(lambda * w),
            _ => None,
        };
        Subsystem {
            mean_population,
            mean_time,
            predicted_population,
        }
    }

    /// |L − λW| / L
    pub fn relative_error(&self) -> Option<f64> {
        match (self.mean_population, self.predicted_population) {
            (Some(l), Some(p)) if l > 0.0 => Some((l - p).abs() / l),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub config: ModelConfig,
    pub completed_requests: usize,
    pub samples: usize,
    /// 1 / mean inter-arrival time
    pub arrival_rate: Option<f64>,
    pub queue: Subsystem,
    pub servers: Subsystem,
    pub system: Subsystem,
}

impl Report {
    pub fn new(config: &ModelConfig, stats: &Statistics) -> Report {
        let arrival_rate = mean(stats.interarrival_times())
            .filter(|m| *m > 0.0)
            .map(|m| 1.0 / m);

        Report {
            config: config.clone(),
            completed_requests: stats.completed().len(),
            samples: stats.sample_times().len(),
            arrival_rate,
            queue: Subsystem::new(
                mean_count(stats.queue_lengths()),
                mean(stats.queueing_times()),
                arrival_rate,
            ),
            servers: Subsystem::new(
                mean_count(stats.busy_servers()),
                mean(stats.service_times()),
                arrival_rate,
            ),
            system: Subsystem::new(
                mean_count(stats.users_in_system()),
                mean(stats.response_times()),
                arrival_rate,
            ),
        }
    }
}

struct Value(Option<f64>);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.4}", v),
            None => write!(f, "n/a"),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rate = Value(self.arrival_rate);
        let sections = [
            ("Queueing system", "queue length", "queueing time", &self.queue),
            ("Server system", "busy servers", "service time", &self.servers),
            ("Complete system", "users in system", "response time", &self.system),
        ];
        for (title, population, time, subsystem) in sections {
            writeln!(f, "---- {} -----", title)?;
            writeln!(f, "Mean {}: {}", population, Value(subsystem.mean_population))?;
            writeln!(f, "Arrival rate: {}", rate)?;
            writeln!(f, "Mean {}: {} s", time, Value(subsystem.mean_time))?;
            writeln!(f, "Little's Law λ·W: {}", Value(subsystem.predicted_population))?;
        }
        write!(
            f,
            "({} completed requests, {} samples)",
            self.completed_requests, self.samples
        )
    }
}

/// Spread of one metric across replications
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl MeanStd {
    fn from_values(values: &[f64]) -> Option<MeanStd> {
        let mean = mean(values)?;
        let variance = if values.len() > 1 {
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
        } else {
            0.0
        };
        Some(MeanStd {
            mean,
            std: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationSummary {
    pub replications: usize,
    pub arrival_rate: Option<MeanStd>,
    pub mean_queue_length: Option<MeanStd>,
    pub mean_queueing_time: Option<MeanStd>,
    pub mean_users_in_system: Option<MeanStd>,
    pub mean_response_time: Option<MeanStd>,
    pub system_relative_error: Option<MeanStd>,
}

impl ReplicationSummary {
    pub fn from_reports(reports: &[Report]) -> ReplicationSummary {
        let collect = |pick: fn(&Report) -> Option<f64>| -> Option<MeanStd> {
            let values: Vec<f64> = reports.iter().filter_map(pick).collect();
            MeanStd::from_values(&values)
        };

        ReplicationSummary {
            replications: reports.len(),
            arrival_rate: collect(|r| r.arrival_rate),
            mean_queue_length: collect(|r| r.queue.mean_population),
            mean_queueing_time: collect(|r| r.queue.mean_time),
            mean_users_in_system: collect(|r| r.system.mean_population),
            mean_response_time: collect(|r| r.system.mean_time),
            system_relative_error: collect(|r| r.system.relative_error()),
        }
    }
}

impl fmt::Display for ReplicationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---- {} replications -----", self.replications)?;
        let rows = [
            ("Arrival rate", &self.arrival_rate),
            ("Mean queue length", &self.mean_queue_length),
            ("Mean queueing time", &self.mean_queueing_time),
            ("Mean users in system", &self.mean_users_in_system),
            ("Mean response time", &self.mean_response_time),
            ("Little's Law relative error", &self.system_relative_error),
        ];
        for (label, metric) in rows {
            match metric {
                Some(m) => writeln!(
                    f,
                    "{}: {:.4} ± {:.4} [{:.4}, {:.4}]",
                    label, m.mean, m.std, m.min, m.max
                )?,
                None => writeln!(f, "{}: n/a", label)?,
            }
        }
        Ok(())
    }
}
