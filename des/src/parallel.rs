//! Parallel execution of independent EventLoop scenarios
//!
//! Each scenario builds its own [`EventLoop`] from a scenario id, runs it on the
//! rayon pool and hands back its world. Nothing is shared between scenarios, so
//! results only depend on what the builder does with the id.
//!
//! # Example: ten seeded replications
//!
//! ```rust
//! use des::parallel::ParallelRunner;
//! # use des::{Activity, ActivityId, Error, EventLoop, Response};
//! # struct Tick;
//! # impl Activity<u64> for Tick {
//! #     fn act(&mut self, _t: f64, _me: ActivityId, count: &mut u64) -> Result<Response<u64>, Error> {
//! #         *count += 1;
//! #         Ok(Response::after(1.0))
//! #     }
//! # }
//!
//! let results = ParallelRunner::new(10, |scenario_id| {
//!     let mut event_loop = EventLoop::new(scenario_id as u64);
//!     event_loop.spawn(Tick);
//!     Ok::<_, Error>(event_loop)
//! })
//! .num_threads(4)
//! .run(100.0);
//!
//! assert_eq!(results.len(), 10);
//! assert!(results.iter().all(|r| r.is_ok()));
//! ```
//!
//! # Determinism
//!
//! Results come back in scenario_id order regardless of thread count. They are
//! reproducible when the builder derives any seed from `scenario_id`.
//!
//! # Error Handling
//!
//! A scenario that fails to build, fails while running, or panics yields an
//! `Err` in its own slot. Other scenarios keep running.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::info;

use crate::{Error, EventLoop, RunOutcome};

/// Why one scenario produced no result
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario could not be built: {0}")]
    Build(String),

    #[error("scenario failed: {0}")]
    Failed(#[from] Error),

    #[error("scenario panicked: {0}")]
    Panicked(String),

    #[error("could not create thread pool: {0}")]
    ThreadPool(String),
}

/// A scenario that ran up to its horizon (or ran dry)
#[derive(Debug, Clone, PartialEq)]
pub struct Completed<W> {
    pub outcome: RunOutcome,
    pub world: W,
}

/// Executes multiple EventLoop scenarios in parallel
///
/// The builder `F` takes a scenario id and returns a fresh loop. It is
/// called from worker threads, so it must be `Send + Sync`; the loop itself
/// never leaves the thread that built it, only the world `W` does.
pub struct ParallelRunner<W, E, F>
where
    F: Fn(usize) -> Result<EventLoop<W>, E> + Send + Sync,
    W: Send,
    E: std::fmt::Display,
{
    num_scenarios: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<Arc<dyn Fn(usize, usize) + Send + Sync>>,
    _scenario: PhantomData<fn() -> (W, E)>,
}

impl<W, E, F> ParallelRunner<W, E, F>
where
    F: Fn(usize) -> Result<EventLoop<W>, E> + Send + Sync,
    W: Send,
    E: std::fmt::Display,
{
    pub fn new(num_scenarios: usize, builder: F) -> Self {
        ParallelRunner {
            num_scenarios,
            builder,
            num_threads: None,
            progress_callback: None,
            _scenario: PhantomData,
        }
    }

    /// Set number of threads (defaults to rayon's global pool)
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set progress callback, called with `(completed, total)` after each scenario
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    fn run_one(&self, scenario_id: usize, horizon: f64) -> Result<Completed<W>, ScenarioError> {
        let mut event_loop =
            (self.builder)(scenario_id).map_err(|e| ScenarioError::Build(e.to_string()))?;
        let outcome = event_loop.run_until(horizon)?;
        Ok(Completed {
            outcome,
            world: event_loop.into_world(),
        })
    }

    /// Execute all scenarios up to `horizon` and return results in scenario_id order
    pub fn run(self, horizon: f64) -> Vec<Result<Completed<W>, ScenarioError>> {
        let progress_counter = AtomicUsize::new(0);

        let execute = || {
            (0..self.num_scenarios)
                .into_par_iter()
                .map(|scenario_id| {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        self.run_one(scenario_id, horizon)
                    }));

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, self.num_scenarios);
                    }

                    result.unwrap_or_else(|panic| {
                        let message = if let Some(s) = panic.downcast_ref::<&str>() {
                            s.to_string()
                        } else if let Some(s) = panic.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "Unknown panic".to_string()
                        };
                        Err(ScenarioError::Panicked(message))
                    })
                })
                .collect()
        };

        match self.num_threads {
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(execute),
                Err(e) => (0..self.num_scenarios)
                    .map(|_| Err(ScenarioError::ThreadPool(e.to_string())))
                    .collect(),
            },
            None => execute(),
        }
    }
}

/// Run scenarios in parallel on the global pool
pub fn run_parallel<W, E, F>(
    num_scenarios: usize,
    builder: F,
    horizon: f64,
) -> Vec<Result<Completed<W>, ScenarioError>>
where
    F: Fn(usize) -> Result<EventLoop<W>, E> + Send + Sync,
    W: Send,
    E: std::fmt::Display,
{
    ParallelRunner::new(num_scenarios, builder).run(horizon)
}

/// Progress callback that logs every `interval` completed scenarios
pub fn simple_progress_reporter(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    move |completed, total| {
        if completed % interval.max(1) == 0 || completed == total {
            info!(completed, total, "scenarios completed");
        }
    }
}
