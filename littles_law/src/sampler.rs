use des::{Activity, ActivityId, Error, Response};

use crate::{Model, UniformSource};

/// Snapshots the server pool every `sampling_interval`.
///
/// The cadence is fixed and unrelated to arrivals or departures, so the
/// sample means estimate time averages whatever the arrival process is.
#[derive(Debug, Default)]
pub struct StatisticsSampler {
    started: bool,
}

impl StatisticsSampler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: UniformSource + 'static> Activity<Model<R>> for StatisticsSampler {
    fn act(
        &mut self,
        current_t: f64,
        _me: ActivityId,
        model: &mut Model<R>,
    ) -> Result<Response<Model<R>>, Error> {
        if self.started {
            let queue_length = model.pool.queue_length();
            let busy = model.pool.busy_count();
            model.stats.record_sample(current_t, queue_length, busy);
        } else {
            self.started = true;
        }
        Ok(Response::after(model.config.sampling_interval))
    }

    fn name(&self) -> &'static str {
        "statistics-sampler"
    }
}
