//! Multi-server queue simulation demonstrating Little's Law
//!
//! Requests arrive with Uniform(0, 2·Ta) gaps, wait for one of `k` identical
//! servers, are served for Uniform(0, 2·S) and leave. The run collects the
//! event-based delays (queueing, service, response) and the time-sampled
//! populations (queue, busy servers, users), whose means satisfy L = λ·W for
//! each of the three subsystems.
//!
//! Activities:
//! - ArrivalGenerator: draws gaps and spawns one RequestHandler per arrival
//! - RequestHandler: request a server, hold it for the service time, release it
//! - StatisticsSampler: snapshots the pool on its own fixed cadence (PASTA only
//!   holds for Poisson arrivals, so sampling at arrival instants would be biased)

pub mod config;
pub mod error;
pub mod generator;
pub mod handler;
pub mod logging;
pub mod random;
pub mod report;
pub mod sampler;
pub mod stats;

use des::parallel::{ParallelRunner, simple_progress_reporter};
use des::pool::ServerPool;
use des::{EventLoop, RunOutcome};
use tracing::info;

pub use config::ModelConfig;
pub use error::{ConfigError, SimulationError};
pub use generator::ArrivalGenerator;
pub use handler::RequestHandler;
pub use random::{Midpoint, SeededUniform, UniformSource};
pub use report::{ReplicationSummary, Report};
pub use sampler::StatisticsSampler;
pub use stats::{RequestRecord, Statistics};

/// State shared by every activity of one run
pub struct Model<R> {
    pub(crate) config: ModelConfig,
    pub(crate) pool: ServerPool,
    pub(crate) stats: Statistics,
    pub(crate) source: R,
}

impl<R: UniformSource> Model<R> {
    pub fn new(config: ModelConfig, source: R) -> Result<Model<R>, ConfigError> {
        config.validate()?;
        let pool = ServerPool::new(config.capacity()?);
        Ok(Model {
            config,
            pool,
            stats: Statistics::new(),
            source,
        })
    }

    pub(crate) fn draw_interarrival(&mut self) -> f64 {
        self.source
            .uniform(0.0, 2.0 * self.config.mean_interarrival_time)
    }

    pub(crate) fn draw_service(&mut self) -> f64 {
        self.source.uniform(0.0, 2.0 * self.config.mean_service_time)
    }
}

impl<R> Model<R> {
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn pool(&self) -> &ServerPool {
        &self.pool
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn report(&self) -> Report {
        Report::new(&self.config, &self.stats)
    }
}

/// One run of the queue model on its own event loop
pub struct Simulation<R> {
    event_loop: EventLoop<Model<R>>,
}

impl<R: UniformSource + 'static> Simulation<R> {
    /// Validate `config` and start the generator and the sampler at t=0.
    pub fn new(config: ModelConfig, source: R) -> Result<Simulation<R>, ConfigError> {
        let model = Model::new(config, source)?;
        let mut event_loop = EventLoop::new(model);
        event_loop.spawn(ArrivalGenerator::new());
        event_loop.spawn(StatisticsSampler::new());
        Ok(Simulation { event_loop })
    }

    pub fn now(&self) -> f64 {
        self.event_loop.now()
    }

    pub fn model(&self) -> &Model<R> {
        self.event_loop.world()
    }

    pub fn into_event_loop(self) -> EventLoop<Model<R>> {
        self.event_loop
    }

    /// Run to `horizon`, which may be earlier than the configured one.
    pub fn run_until(&mut self, horizon: f64) -> Result<(), SimulationError> {
        match self.event_loop.run_until(horizon)? {
            RunOutcome::HorizonReached => Ok(()),
            RunOutcome::Exhausted { at } => Err(SimulationError::Exhausted { at }),
        }
    }

    /// Run to the configured horizon and hand back the finished model.
    pub fn run(mut self) -> Result<Model<R>, SimulationError> {
        let horizon = self.model().config.run_horizon;
        self.run_until(horizon)?;
        info!(
            t = self.now(),
            events = self.event_loop.events_processed(),
            completed = self.model().stats.completed().len(),
            "simulation finished"
        );
        Ok(self.event_loop.into_world())
    }
}

/// Run `count` independent replications seeded `base_seed`, `base_seed + 1`, ...
///
/// Every replication owns its loop, pool and statistics. Reports come back in
/// replication order; the first failed replication fails the batch.
pub fn replicate(
    config: &ModelConfig,
    base_seed: u64,
    count: usize,
    threads: Option<usize>,
) -> Result<Vec<Report>, SimulationError> {
    config.validate()?;

    let mut runner = ParallelRunner::new(count, |replication| {
        let source = SeededUniform::new(base_seed.wrapping_add(replication as u64));
        Simulation::new(config.clone(), source).map(Simulation::into_event_loop)
    })
    .progress(simple_progress_reporter((count / 10).max(1)));
    if let Some(n) = threads {
        runner = runner.num_threads(n);
    }

    runner
        .run(config.run_horizon)
        .into_iter()
        .enumerate()
        .map(|(index, result)| match result {
            Ok(completed) => match completed.outcome {
                RunOutcome::HorizonReached => Ok(completed.world.report()),
                RunOutcome::Exhausted { at } => Err(SimulationError::Exhausted { at }),
            },
            Err(source) => Err(SimulationError::Replication { index, source }),
        })
        .collect()
}
