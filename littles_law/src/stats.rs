use serde::Serialize;

/// Lifecycle of one request, filled in as the handler moves through it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RequestRecord {
    pub arrival: f64,
    pub service_start: f64,
    pub release: f64,
}

impl RequestRecord {
    pub fn queueing_time(&self) -> f64 {
        self.service_start - self.arrival
    }

    pub fn service_time(&self) -> f64 {
        self.release - self.service_start
    }

    /// Sum of the two phases, so that it splits exactly into them
    pub fn response_time(&self) -> f64 {
        self.queueing_time() + self.service_time()
    }
}

/// Everything one run measures.
///
/// Event sequences grow once per completed request (the inter-arrival
/// sequence once per draw); sampled sequences grow once per sampler tick.
/// Only the model appends, everyone else reads slices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    interarrival_times: Vec<f64>,
    queueing_times: Vec<f64>,
    service_times: Vec<f64>,
    response_times: Vec<f64>,
    completed: Vec<RequestRecord>,

    sample_times: Vec<f64>,
    queue_lengths: Vec<usize>,
    busy_servers: Vec<usize>,
    users_in_system: Vec<usize>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_interarrival(&mut self, interval: f64) {
        self.interarrival_times.push(interval);
    }

    pub(crate) fn record_completion(&mut self, record: RequestRecord) {
        self.queueing_times.push(record.queueing_time());
        self.service_times.push(record.service_time());
        self.response_times.push(record.response_time());
        self.completed.push(record);
    }

    pub(crate) fn record_sample(&mut self, t: f64, queue_length: usize, busy: usize) {
        self.sample_times.push(t);
        self.queue_lengths.push(queue_length);
        self.busy_servers.push(busy);
        self.users_in_system.push(queue_length + busy);
    }

    pub fn interarrival_times(&self) -> &[f64] {
        &self.interarrival_times
    }

    pub fn queueing_times(&self) -> &[f64] {
        &self.queueing_times
    }

    pub fn service_times(&self) -> &[f64] {
        &self.service_times
    }

    pub fn response_times(&self) -> &[f64] {
        &self.response_times
    }

    pub fn completed(&self) -> &[RequestRecord] {
        &self.completed
    }

    pub fn sample_times(&self) -> &[f64] {
        &self.sample_times
    }

    pub fn queue_lengths(&self) -> &[usize] {
        &self.queue_lengths
    }

    pub fn busy_servers(&self) -> &[usize] {
        &self.busy_servers
    }

    pub fn users_in_system(&self) -> &[usize] {
        &self.users_in_system
    }
}
