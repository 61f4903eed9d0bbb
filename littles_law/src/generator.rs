use des::{Activity, ActivityId, Error, Response};
use tracing::trace;

use crate::handler::RequestHandler;
use crate::{Model, UniformSource};

/// Produces arrivals forever.
///
/// Every activation first turns the previous gap into an arrival (except the
/// very first one at t=0), then draws and records the next gap and sleeps
/// through it. The spawned handler runs on its own; the generator never waits
/// for it.
#[derive(Debug, Default)]
pub struct ArrivalGenerator {
    arrivals: u64,
    started: bool,
}

impl ArrivalGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: UniformSource + 'static> Activity<Model<R>> for ArrivalGenerator {
    fn act(
        &mut self,
        current_t: f64,
        _me: ActivityId,
        model: &mut Model<R>,
    ) -> Result<Response<Model<R>>, Error> {
        let interarrival = model.draw_interarrival();
        model.stats.record_interarrival(interarrival);
        let response = Response::after(interarrival);

        if !self.started {
            self.started = true;
            return Ok(response);
        }

        self.arrivals += 1;
        trace!(t = current_t, arrival = self.arrivals, next_in = interarrival, "request arrived");
        Ok(response.spawn(RequestHandler::new()))
    }

    fn name(&self) -> &'static str {
        "arrival-generator"
    }
}
