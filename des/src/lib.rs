use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use ordered_float::NotNan;
use tracing::{debug, info, trace, warn};

pub mod error;
pub mod parallel;
pub mod pool;

pub use error::Error;

/// Identifies one activity for the lifetime of an event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityId(pub u64);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "activity#{}", self.0)
    }
}

struct Event<W> {
    t: NotNan<f64>,
    seq: u64,
    id: ActivityId,
    activity: Box<dyn Activity<W>>,
}

impl<W> PartialEq for Event<W> {
    fn eq(&self, other: &Self) -> bool {
        self.t == other.t && self.seq == other.seq
    }
}

impl<W> Eq for Event<W> {}

impl<W> Ord for Event<W> {
    // Reversed so the BinaryHeap pops the earliest (t, seq) first
    fn cmp(&self, other: &Self) -> Ordering {
        other.t.cmp(&self.t).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<W> PartialOrd for Event<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// What an activity does after returning from [`Activity::act`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Next {
    /// Resume again once `delay` has elapsed
    After(f64),
    /// Sleep until some other activity wakes this one
    Park,
    /// Finished, drop the activity
    Done,
}

pub struct Response<W> {
    pub next: Next,
    pub spawned: Vec<Box<dyn Activity<W>>>,
    pub woken: Vec<ActivityId>,
}

impl<W> Response<W> {
    fn with_next(next: Next) -> Response<W> {
        Response {
            next,
            spawned: Vec::new(),
            woken: Vec::new(),
        }
    }

    pub fn after(delay: f64) -> Response<W> {
        Response::with_next(Next::After(delay))
    }

    pub fn park() -> Response<W> {
        Response::with_next(Next::Park)
    }

    pub fn done() -> Response<W> {
        Response::with_next(Next::Done)
    }

    /// Start `activity` at the current time, independent of this one
    pub fn spawn(mut self, activity: impl Activity<W> + 'static) -> Response<W> {
        self.spawned.push(Box::new(activity));
        self
    }

    /// Wake a parked activity at the current time
    pub fn wake(mut self, id: ActivityId) -> Response<W> {
        self.woken.push(id);
        self
    }
}

/// A logical process on the simulation timeline.
///
/// `act` runs until the next suspension point and says how to continue. The
/// world `W` is the state shared by every activity of one loop; only the running
/// activity can touch it, so no locking is involved.
pub trait Activity<W> {
    fn act(&mut self, current_t: f64, me: ActivityId, world: &mut W) -> Result<Response<W>, Error>;

    /// Called once when `act` fails, before the activity is dropped. Whatever the
    /// activity holds in `world` should be given back here. Returned ids are
    /// woken at the current time.
    fn abort(&mut self, _current_t: f64, _world: &mut W) -> Vec<ActivityId> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "activity"
    }
}

/// How [`EventLoop::run_until`] stopped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    HorizonReached,
    /// Nothing left to resume while the horizon was still ahead
    Exhausted { at: f64 },
}

pub struct EventLoop<W> {
    queue: BinaryHeap<Event<W>>,
    parked: HashMap<ActivityId, Box<dyn Activity<W>>>,
    current_t: NotNan<f64>,
    next_seq: u64,
    next_id: u64,
    events_processed: u64,
    world: W,
}

impl<W> EventLoop<W> {
    pub fn new(world: W) -> EventLoop<W> {
        EventLoop {
            queue: BinaryHeap::new(),
            parked: HashMap::new(),
            current_t: NotNan::default(),
            next_seq: 0,
            next_id: 0,
            events_processed: 0,
            world,
        }
    }

    pub fn now(&self) -> f64 {
        self.current_t.into_inner()
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn into_world(self) -> W {
        self.world
    }

    /// Sleeping plus parked activities
    pub fn pending(&self) -> usize {
        self.queue.len() + self.parked.len()
    }

    pub fn parked(&self) -> usize {
        self.parked.len()
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.queue.peek().map(|event| event.t.into_inner())
    }

    /// Register a new activity to begin at the current time.
    pub fn spawn(&mut self, activity: impl Activity<W> + 'static) -> ActivityId {
        self.start(Box::new(activity))
    }

    /// Register a new activity to begin `delay` after the current time.
    pub fn schedule_after(
        &mut self,
        delay: f64,
        activity: impl Activity<W> + 'static,
    ) -> Result<ActivityId, Error> {
        let t = self.deadline(delay)?;
        let id = self.allocate_id();
        self.push(t, id, Box::new(activity));
        Ok(id)
    }

    fn allocate_id(&mut self) -> ActivityId {
        let id = ActivityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn start(&mut self, activity: Box<dyn Activity<W>>) -> ActivityId {
        let id = self.allocate_id();
        debug!(%id, name = activity.name(), t = self.now(), "activity spawned");
        self.push(self.current_t, id, activity);
        id
    }

    fn deadline(&self, delay: f64) -> Result<NotNan<f64>, Error> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(Error::InvalidDelay { delay });
        }
        NotNan::new(self.now() + delay).map_err(|_| Error::InvalidDelay { delay })
    }

    fn push(&mut self, t: NotNan<f64>, id: ActivityId, activity: Box<dyn Activity<W>>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Event {
            t,
            seq,
            id,
            activity,
        });
    }

    fn wake(&mut self, id: ActivityId) -> Result<(), Error> {
        let activity = self.parked.remove(&id).ok_or(Error::NotParked(id))?;
        debug!(%id, name = activity.name(), t = self.now(), "activity woken");
        self.push(self.current_t, id, activity);
        Ok(())
    }

    /// Resume the earliest pending activity.
    ///
    /// Ties on time resume in scheduling order. Fails with
    /// [`Error::Exhausted`] when nothing is scheduled.
    pub fn advance(&mut self) -> Result<(), Error> {
        let Some(Event {
            t, id, mut activity, ..
        }) = self.queue.pop()
        else {
            return Err(Error::Exhausted { at: self.now() });
        };
        self.current_t = t;
        self.events_processed += 1;
        let now = self.now();
        trace!(%id, name = activity.name(), t = now, "resuming");

        let response = match activity.act(now, id, &mut self.world) {
            Ok(response) => response,
            Err(error) => return Err(self.fail(id, activity, error)),
        };

        for woken in response.woken {
            if let Err(error) = self.wake(woken) {
                return Err(self.fail(id, activity, error));
            }
        }
        for spawned in response.spawned {
            self.start(spawned);
        }
        match response.next {
            Next::After(delay) => match self.deadline(delay) {
                Ok(t) => self.push(t, id, activity),
                Err(error) => return Err(self.fail(id, activity, error)),
            },
            Next::Park => {
                debug!(%id, name = activity.name(), t = now, "activity parked");
                self.parked.insert(id, activity);
            }
            Next::Done => {
                trace!(%id, name = activity.name(), t = now, "activity finished");
            }
        }

        Ok(())
    }

    fn fail(&mut self, id: ActivityId, mut activity: Box<dyn Activity<W>>, error: Error) -> Error {
        let now = self.now();
        warn!(%id, name = activity.name(), t = now, %error, "activity aborted");
        for woken in activity.abort(now, &mut self.world) {
            if let Err(wake_error) = self.wake(woken) {
                warn!(%woken, error = %wake_error, "could not wake after abort");
            }
        }
        error
    }

    /// Advance until the next event lies beyond `horizon`.
    ///
    /// Events scheduled exactly at `horizon` are executed. On a clean stop the
    /// clock is left at `horizon`.
    pub fn run_until(&mut self, horizon: f64) -> Result<RunOutcome, Error> {
        let stop = match NotNan::new(horizon) {
            Ok(stop) if stop >= self.current_t => stop,
            _ => {
                return Err(Error::InvalidHorizon {
                    horizon,
                    now: self.now(),
                });
            }
        };
        info!(horizon, t = self.now(), pending = self.pending(), "run started");

        loop {
            match self.peek_time() {
                Some(t) if t <= horizon => self.advance()?,
                Some(_) => break,
                None => {
                    warn!(t = self.now(), parked = self.parked(), "event queue exhausted");
                    return Ok(RunOutcome::Exhausted { at: self.now() });
                }
            }
        }

        self.current_t = stop;
        info!(
            t = horizon,
            events = self.events_processed,
            pending = self.pending(),
            "run stopped at horizon"
        );
        Ok(RunOutcome::HorizonReached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Appends its label to the log every time it runs
    struct Ticker {
        label: u8,
        period: f64,
        remaining: usize,
    }

    impl Activity<Vec<(f64, u8)>> for Ticker {
        fn act(
            &mut self,
            current_t: f64,
            _me: ActivityId,
            log: &mut Vec<(f64, u8)>,
        ) -> Result<Response<Vec<(f64, u8)>>, Error> {
            log.push((current_t, self.label));
            if self.remaining == 0 {
                return Ok(Response::done());
            }
            self.remaining -= 1;
            Ok(Response::after(self.period))
        }
    }

    fn ticker(label: u8, period: f64, remaining: usize) -> Ticker {
        Ticker {
            label,
            period,
            remaining,
        }
    }

    #[test]
    fn min_queue_with_fifo_ties() {
        let mut event_loop = EventLoop::new(Vec::new());
        event_loop.schedule_after(2.0, ticker(2, 1.0, 0)).unwrap();
        event_loop.schedule_after(1.0, ticker(1, 1.0, 0)).unwrap();
        event_loop.schedule_after(1.0, ticker(3, 1.0, 0)).unwrap();

        event_loop.run_until(10.0).unwrap();

        assert_eq!(event_loop.world(), &vec![(1.0, 1), (1.0, 3), (2.0, 2)]);
    }

    #[test]
    fn interleaves_periodic_activities() {
        let mut event_loop = EventLoop::new(Vec::new());
        event_loop.spawn(ticker(1, 2.0, 10));
        event_loop.spawn(ticker(2, 3.0, 10));

        event_loop.run_until(6.0).unwrap();

        assert_eq!(
            event_loop.world(),
            &vec![
                (0.0, 1),
                (0.0, 2),
                (2.0, 1),
                (3.0, 2),
                (4.0, 1),
                (6.0, 2),
                (6.0, 1),
            ]
        );
        let times: Vec<f64> = event_loop.world().iter().map(|(t, _)| *t).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn stops_at_horizon_without_running_later_events() {
        let mut event_loop = EventLoop::new(Vec::new());
        event_loop.spawn(ticker(1, 4.0, 10));

        let outcome = event_loop.run_until(10.0).unwrap();

        assert_eq!(outcome, RunOutcome::HorizonReached);
        assert_eq!(event_loop.now(), 10.0);
        assert_eq!(event_loop.world().len(), 3);
        assert_eq!(event_loop.peek_time(), Some(12.0));
    }

    #[test]
    fn reports_exhaustion_before_horizon() {
        let mut event_loop = EventLoop::new(Vec::new());
        event_loop.spawn(ticker(1, 1.0, 2));

        let outcome = event_loop.run_until(100.0).unwrap();

        assert_eq!(outcome, RunOutcome::Exhausted { at: 2.0 });
        assert_eq!(event_loop.advance(), Err(Error::Exhausted { at: 2.0 }));
    }

    #[test]
    fn rejects_negative_delay_and_past_horizon() {
        let mut event_loop = EventLoop::new(Vec::new());
        assert_eq!(
            event_loop.schedule_after(-1.0, ticker(1, 1.0, 0)).unwrap_err(),
            Error::InvalidDelay { delay: -1.0 }
        );
        assert!(event_loop.schedule_after(f64::NAN, ticker(1, 1.0, 0)).is_err());

        event_loop.spawn(ticker(1, 1.0, 10));
        event_loop.run_until(5.0).unwrap();
        assert!(matches!(
            event_loop.run_until(4.0),
            Err(Error::InvalidHorizon { .. })
        ));
    }

    /// Parks on first activation, finishes when woken
    struct Sleeper;

    impl Activity<Vec<(f64, u8)>> for Sleeper {
        fn act(
            &mut self,
            current_t: f64,
            _me: ActivityId,
            log: &mut Vec<(f64, u8)>,
        ) -> Result<Response<Vec<(f64, u8)>>, Error> {
            log.push((current_t, 0));
            if log.len() == 1 {
                Ok(Response::park())
            } else {
                Ok(Response::done())
            }
        }
    }

    struct Waker {
        target: ActivityId,
    }

    impl Activity<Vec<(f64, u8)>> for Waker {
        fn act(
            &mut self,
            current_t: f64,
            _me: ActivityId,
            log: &mut Vec<(f64, u8)>,
        ) -> Result<Response<Vec<(f64, u8)>>, Error> {
            log.push((current_t, 9));
            Ok(Response::done().wake(self.target))
        }
    }

    #[test]
    fn parked_activity_resumes_when_woken() {
        let mut event_loop = EventLoop::new(Vec::new());
        let sleeper = event_loop.spawn(Sleeper);
        event_loop.schedule_after(5.0, Waker { target: sleeper }).unwrap();

        event_loop.advance().unwrap();
        assert_eq!(event_loop.parked(), 1);

        let outcome = event_loop.run_until(10.0).unwrap();

        assert_eq!(outcome, RunOutcome::Exhausted { at: 5.0 });
        assert_eq!(event_loop.world(), &vec![(0.0, 0), (5.0, 9), (5.0, 0)]);
        assert_eq!(event_loop.pending(), 0);
    }

    #[test]
    fn waking_an_unparked_activity_fails() {
        let mut event_loop = EventLoop::new(Vec::new());
        let running = event_loop.schedule_after(10.0, ticker(1, 1.0, 0)).unwrap();
        event_loop.spawn(Waker { target: running });

        assert_eq!(event_loop.advance(), Err(Error::NotParked(running)));
    }

    struct Failing;

    impl Activity<Vec<(f64, u8)>> for Failing {
        fn act(
            &mut self,
            _current_t: f64,
            _me: ActivityId,
            _log: &mut Vec<(f64, u8)>,
        ) -> Result<Response<Vec<(f64, u8)>>, Error> {
            Err(Error::InvalidDelay { delay: -3.0 })
        }

        fn abort(&mut self, current_t: f64, log: &mut Vec<(f64, u8)>) -> Vec<ActivityId> {
            log.push((current_t, 7));
            Vec::new()
        }
    }

    #[test]
    fn failing_activity_is_aborted_and_error_surfaces() {
        let mut event_loop = EventLoop::new(Vec::new());
        event_loop.schedule_after(1.5, Failing).unwrap();

        let result = event_loop.run_until(10.0);

        assert_eq!(result, Err(Error::InvalidDelay { delay: -3.0 }));
        assert_eq!(event_loop.world(), &vec![(1.5, 7)]);
        assert_eq!(event_loop.pending(), 0);
    }

    #[test]
    fn spawned_activities_start_at_current_time() {
        struct Spawner;
        impl Activity<Vec<(f64, u8)>> for Spawner {
            fn act(
                &mut self,
                current_t: f64,
                _me: ActivityId,
                log: &mut Vec<(f64, u8)>,
            ) -> Result<Response<Vec<(f64, u8)>>, Error> {
                log.push((current_t, 5));
                Ok(Response::done()
                    .spawn(ticker(1, 1.0, 0))
                    .spawn(ticker(2, 1.0, 0)))
            }
        }

        let mut event_loop = EventLoop::new(Vec::new());
        event_loop.schedule_after(3.0, Spawner).unwrap();
        event_loop.run_until(3.0).unwrap();

        assert_eq!(event_loop.world(), &vec![(3.0, 5), (3.0, 1), (3.0, 2)]);
        assert_eq!(event_loop.events_processed(), 3);
    }
}
