use des::pool::{Acquire, PoolError, Ticket};
use des::{Activity, ActivityId, Error, Response};
use tracing::trace;

use crate::stats::RequestRecord;
use crate::{Model, UniformSource};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Arriving,
    Queued {
        arrival: f64,
        ticket: Ticket,
    },
    InService {
        arrival: f64,
        service_start: f64,
        ticket: Ticket,
    },
    Finished,
}

/// One request, from arrival to release.
///
/// Holds at most one server unit. If the activity is aborted at any point the
/// unit is released (or the waiting ticket withdrawn) before it is dropped.
#[derive(Debug)]
pub struct RequestHandler {
    phase: Phase,
}

impl Default for RequestHandler {
    fn default() -> Self {
        RequestHandler {
            phase: Phase::Arriving,
        }
    }
}

impl RequestHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    fn begin_service<R: UniformSource>(
        &mut self,
        current_t: f64,
        arrival: f64,
        ticket: Ticket,
        model: &mut Model<R>,
    ) -> Response<Model<R>> {
        let duration = model.draw_service();
        trace!(t = current_t, %ticket, waited = current_t - arrival, duration, "service started");
        self.phase = Phase::InService {
            arrival,
            service_start: current_t,
            ticket,
        };
        Response::after(duration)
    }
}

impl<R: UniformSource + 'static> Activity<Model<R>> for RequestHandler {
    fn act(
        &mut self,
        current_t: f64,
        me: ActivityId,
        model: &mut Model<R>,
    ) -> Result<Response<Model<R>>, Error> {
        match self.phase {
            Phase::Arriving => match model.pool.request(me) {
                Acquire::Granted(ticket) => {
                    Ok(self.begin_service(current_t, current_t, ticket, model))
                }
                Acquire::Queued(ticket) => {
                    self.phase = Phase::Queued {
                        arrival: current_t,
                        ticket,
                    };
                    Ok(Response::park())
                }
            },
            Phase::Queued { arrival, ticket } => {
                // only a release that handed us the unit may wake us
                if !model.pool.is_held(ticket) {
                    return Err(PoolError::NotHeld(ticket).into());
                }
                Ok(self.begin_service(current_t, arrival, ticket, model))
            }
            Phase::InService {
                arrival,
                service_start,
                ticket,
            } => {
                let granted = model.pool.release(ticket)?;
                self.phase = Phase::Finished;
                model.stats.record_completion(RequestRecord {
                    arrival,
                    service_start,
                    release: current_t,
                });

                let response = Response::done();
                Ok(match granted {
                    Some(next) => response.wake(next),
                    None => response,
                })
            }
            Phase::Finished => Ok(Response::done()),
        }
    }

    fn abort(&mut self, current_t: f64, model: &mut Model<R>) -> Vec<ActivityId> {
        let ticket = match self.phase {
            Phase::Queued { ticket, .. } | Phase::InService { ticket, .. } => ticket,
            Phase::Arriving | Phase::Finished => return Vec::new(),
        };
        self.phase = Phase::Finished;

        if model.pool.withdraw(ticket) {
            trace!(t = current_t, %ticket, "waiting request withdrawn");
            return Vec::new();
        }
        match model.pool.release(ticket) {
            Ok(granted) => granted.into_iter().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn name(&self) -> &'static str {
        "request-handler"
    }
}
