use std::sync::Arc;
use std::time::Duration;

use mars_core::{MessageRouter, StatusMessage};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, instrument, warn};

use crate::config::{AsynchConfig, MAX_TIME_TO_LIVE};
use crate::handle::{JobHandle, JobReply, ReplySender};
use crate::observability::{MetricsSnapshot, Observability};
use crate::pending::{PendingJob, PendingJobs};
use crate::poller::{self, PollerHandle};
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::transport::{
    form, header_key_extractor, KeyExtractor, RequestBody, Transport, TransportRequest,
    CONTENT_TYPE, FORM_CONTENT_TYPE, JOB_HEADER,
};
use crate::{AsynchError, AsynchResult, JobEvent, PollRate, PollState, ProcessKey, SubmitOptions};

#[derive(Default)]
struct ClientState {
    rate: PollRate,
    expect_count: u32,
    jobs: PendingJobs,
    parameters: Map<String, Value>,
}

/// Submits asynchronous jobs and polls for their status messages.
///
/// Clones share the same pending table, parameters and poll state, so a
/// client can be handed to every part of an application that submits jobs.
/// Submissions run on the tokio runtime; `submit` must be called from
/// within one.
#[derive(Clone)]
pub struct JobClient {
    transport: Arc<dyn Transport>,
    scheduler: Arc<dyn Scheduler>,
    key_extractor: KeyExtractor,
    config: Arc<RwLock<AsynchConfig>>,
    state: Arc<Mutex<ClientState>>,
    broker: Arc<RwLock<Option<Arc<dyn MessageRouter>>>>,
    wake: Arc<Notify>,
    observability: Observability,
}

impl JobClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            scheduler: Arc::new(TokioScheduler),
            key_extractor: header_key_extractor(),
            config: Arc::new(RwLock::new(AsynchConfig::default())),
            state: Arc::new(Mutex::new(ClientState::default())),
            broker: Arc::new(RwLock::new(None)),
            wake: Arc::new(Notify::new()),
            observability: Observability::new(),
        }
    }

    pub fn with_config(self, config: AsynchConfig) -> Self {
        self.configure(config);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Replace the default `processkey` header lookup.
    pub fn with_key_extractor(mut self, key_extractor: KeyExtractor) -> Self {
        self.key_extractor = key_extractor;
        self
    }

    pub fn with_broker(self, broker: Arc<dyn MessageRouter>) -> Self {
        self.set_broker(broker);
        self
    }

    /// Swap in new endpoints and intervals.
    ///
    /// Intended for setup. A running poll loop picks the new intervals up on
    /// its next cycle.
    pub fn configure(&self, config: AsynchConfig) {
        debug!(
            job_endpoint = %config.job_endpoint,
            status_endpoint = %config.status_endpoint,
            "job client configured"
        );
        *self.config.write() = config;
    }

    pub fn config(&self) -> AsynchConfig {
        self.config.read().clone()
    }

    /// Install the fallback for messages no pending job is waiting on.
    pub fn set_broker(&self, broker: Arc<dyn MessageRouter>) {
        *self.broker.write() = Some(broker);
    }

    pub fn clear_broker(&self) {
        *self.broker.write() = None;
    }

    /// Add a parameter sent with every later submission and status poll.
    pub fn add_parameter(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.state.lock().parameters.insert(name.into(), value.into());
    }

    pub fn parameters(&self) -> Map<String, Value> {
        self.state.lock().parameters.clone()
    }

    /// Announce activity that will arrive without a submission of ours.
    ///
    /// Keeps polling fast for the configured lookahead number of cycles.
    pub fn expect(&self) {
        let lookahead = self.config.read().expect_lookahead;
        self.state.lock().expect_count = lookahead;
        debug!(cycles = lookahead, "expecting activity");
        self.speed_up();
    }

    /// Submit `job_name` with `data` merged over the named parameters.
    ///
    /// Returns at once; the POST runs on a spawned task. `data` must
    /// serialize to an object or to `null`.
    pub fn submit<T: Serialize>(
        &self,
        job_name: impl Into<String>,
        data: T,
        options: SubmitOptions,
    ) -> JobHandle {
        let job_name = job_name.into();
        let data = match payload_object(&job_name, data) {
            Ok(data) => data,
            Err(error) => {
                warn!(job = %job_name, error = %error, "rejecting job payload");
                self.observability
                    .record_submission_failed(&job_name, &error.to_string());
                return JobHandle::rejected(error);
            }
        };

        let (reply, handle) = JobHandle::channel();
        let client = self.clone();
        tokio::spawn(client.run_submission(job_name, data, options, reply));
        handle
    }

    #[instrument(skip_all, fields(job = %job_name))]
    async fn run_submission(
        self,
        job_name: String,
        data: Map<String, Value>,
        options: SubmitOptions,
        reply: ReplySender,
    ) {
        let (url, time_to_live) = {
            let config = self.config.read();
            (
                config.job_endpoint.clone(),
                options.time_to_live.unwrap_or(config.default_time_to_live),
            )
        };

        let mut payload = self.parameters();
        payload.extend(data);

        let mut headers = vec![(JOB_HEADER.to_string(), job_name.clone())];
        let body = if options.url_encoded {
            headers.push((CONTENT_TYPE.to_string(), FORM_CONTENT_TYPE.to_string()));
            RequestBody::Form(form::encode(&payload))
        } else {
            RequestBody::Json(Value::Object(payload))
        };

        let response = match self
            .transport
            .post(TransportRequest { url, headers, body })
            .await
        {
            Ok(response) => response,
            Err(source) => {
                warn!(error = %source, "job submission failed");
                self.observability
                    .record_submission_failed(&job_name, &source.to_string());
                let _ = reply.send(Err(AsynchError::Submission { job_name, source }));
                return;
            }
        };

        if options.no_wait {
            debug!("no-wait job answered");
            self.observability.record_submitted(&job_name, None);
            let _ = reply.send(Ok(JobReply::Immediate(response.body)));
            return;
        }

        let Some(key) = (self.key_extractor)(&response) else {
            warn!("submission response carried no process key");
            let error = AsynchError::MissingProcessKey {
                job_name: job_name.clone(),
            };
            self.observability
                .record_submission_failed(&job_name, &error.to_string());
            let _ = reply.send(Err(error));
            return;
        };

        let process_key = ProcessKey::from(key);
        let now = self.scheduler.now();
        let job = PendingJob::new(
            process_key.clone(),
            job_name.clone(),
            now,
            deadline(now, time_to_live),
            reply,
        );

        let displaced = self.state.lock().jobs.insert(job);
        if let Some(displaced) = displaced {
            warn!(
                process_key = %process_key,
                job = %displaced.job_name,
                "process key issued twice; rejecting earlier job"
            );
            displaced.reject(AsynchError::DuplicateProcessKey {
                process_key: process_key.to_string(),
            });
        }

        info!(process_key = %process_key, ttl_secs = time_to_live.as_secs(), "job pending");
        self.observability.record_submitted(&job_name, Some(&process_key));
        self.speed_up();
    }

    /// Run one poll cycle and return the delay until the next one.
    #[instrument(skip(self))]
    pub async fn check_status(&self) -> Duration {
        let (url, slow_poll, fast_poll) = {
            let config = self.config.read();
            (
                config.status_endpoint.clone(),
                config.slow_poll,
                config.fast_poll,
            )
        };
        let request = TransportRequest {
            url,
            headers: vec![(CONTENT_TYPE.to_string(), FORM_CONTENT_TYPE.to_string())],
            body: RequestBody::Form(form::encode(&self.parameters())),
        };

        self.observability.record_poll_cycle();
        match self.transport.post(request).await {
            Ok(response) => {
                self.consume_expectation();
                let messages = parse_messages(&response.body);
                debug!(messages = messages.len(), "status poll answered");
                self.deliver(messages).await;

                match self.settle() {
                    PollRate::Fast => fast_poll,
                    PollRate::Slow => slow_poll,
                }
            }
            Err(error) => {
                self.consume_expectation();
                warn!(error = %error, "status poll failed; backing off");
                self.observability.record_poll_failed(&error.to_string());
                self.settle();
                slow_poll
            }
        }
    }

    /// Match `messages` against pending jobs, in order.
    ///
    /// A message whose key answers a pending job resolves it. Anything else
    /// goes to the broker, or is logged and dropped when none is installed.
    /// Push transports can feed messages here instead of polling.
    pub async fn deliver(&self, messages: Vec<StatusMessage>) {
        for message in messages {
            let job = match message.process_key.as_deref() {
                Some(key) => self.state.lock().jobs.take(key),
                None => None,
            };

            match job {
                Some(job) => self.resolve(job, message),
                None => self.route_unsolicited(message).await,
            }
        }
    }

    fn resolve(&self, job: PendingJob, message: StatusMessage) {
        let process_key = job.process_key.clone();
        let job_name = job.job_name.clone();
        let waited = self
            .scheduler
            .now()
            .saturating_duration_since(job.submitted_at);

        info!(
            process_key = %process_key,
            job = %job_name,
            waited_ms = waited.as_millis() as u64,
            "job resolved"
        );
        self.observability.record_resolved(&process_key, &job_name);
        if !job.resolve(message) {
            debug!(process_key = %process_key, "job handle already dropped");
        }
    }

    async fn route_unsolicited(&self, message: StatusMessage) {
        let broker = self.broker.read().clone();
        let job_name = message.job_name.clone();
        let process_key = message.process_key.clone();

        match broker {
            Some(broker) => {
                debug!(job = ?job_name, process_key = ?process_key, "routing unsolicited message");
                self.observability
                    .record_routed(job_name.as_deref(), process_key.as_deref());
                broker.route(message).await;
            }
            None => {
                info!(
                    job = ?job_name,
                    process_key = ?process_key,
                    "no broker installed; dropping unsolicited message"
                );
                self.observability
                    .record_dropped(job_name.as_deref(), process_key.as_deref());
            }
        }
    }

    fn consume_expectation(&self) {
        let mut state = self.state.lock();
        state.expect_count = state.expect_count.saturating_sub(1);
    }

    fn speed_up(&self) {
        let previous = std::mem::replace(&mut self.state.lock().rate, PollRate::Fast);
        if previous != PollRate::Fast {
            debug!("poll rate slow -> fast");
            self.observability
                .record_rate_changed(previous, PollRate::Fast);
            self.wake.notify_one();
        }
    }

    /// End-of-cycle bookkeeping: drop to slow when idle, otherwise sweep
    /// expired jobs. Returns the rate the next cycle runs at.
    fn settle(&self) -> PollRate {
        let now = self.scheduler.now();
        let (previous, rate, expired) = {
            let mut state = self.state.lock();
            let previous = state.rate;
            let expired = if state.jobs.is_empty() && state.expect_count == 0 {
                Vec::new()
            } else {
                state.jobs.sweep_expired(now)
            };
            if state.jobs.is_empty() && state.expect_count == 0 {
                state.rate = PollRate::Slow;
            }
            (previous, state.rate, expired)
        };

        for job in expired {
            info!(process_key = %job.process_key, job = %job.job_name, "job expired");
            self.observability
                .record_expired(&job.process_key, &job.job_name);
            let error = job.expired_error();
            job.reject(error);
        }

        if previous != rate {
            debug!("poll rate {previous} -> {rate}");
            self.observability.record_rate_changed(previous, rate);
        }
        rate
    }

    /// Spawn the poll loop.
    ///
    /// The loop runs until [`PollerHandle::shutdown`] is called or the
    /// handle is dropped.
    pub fn start(&self) -> PollerHandle {
        poller::spawn(self.clone())
    }

    pub fn poll_state(&self) -> PollState {
        let state = self.state.lock();
        PollState {
            rate: state.rate,
            pending_count: state.jobs.len(),
            expect_count: state.expect_count,
        }
    }

    pub fn pending_keys(&self) -> Vec<ProcessKey> {
        self.state.lock().jobs.keys()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.observability.metrics().snapshot()
    }

    /// Stream of lifecycle events from this point on.
    pub fn events(&self) -> BroadcastStream<JobEvent> {
        BroadcastStream::new(self.observability.subscribe())
    }

    pub(crate) fn current_interval(&self) -> Duration {
        let config = self.config.read();
        match self.state.lock().rate {
            PollRate::Fast => config.fast_poll,
            PollRate::Slow => config.slow_poll,
        }
    }

    pub(crate) fn fast_interval(&self) -> Duration {
        self.config.read().fast_poll
    }

    pub(crate) fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub(crate) fn wake(&self) -> &Notify {
        &self.wake
    }
}

// Instant + Duration panics on overflow.
fn deadline(now: Instant, time_to_live: Duration) -> Instant {
    now.checked_add(time_to_live.min(MAX_TIME_TO_LIVE)).unwrap_or(now)
}

fn payload_object<T: Serialize>(job_name: &str, data: T) -> AsynchResult<Map<String, Value>> {
    let invalid = |message: String| AsynchError::InvalidPayload {
        job_name: job_name.to_string(),
        message,
    };

    match serde_json::to_value(data) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(invalid(format!("expected an object, got {other}"))),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Pull `messages` out of a status response. A missing array is empty.
fn parse_messages(body: &Value) -> Vec<StatusMessage> {
    match body.get("messages") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                serde_json::from_value::<StatusMessage>(item.clone())
                    .map_err(|e| warn!(error = %e, "skipping malformed status message"))
                    .ok()
            })
            .collect(),
        Some(other) => {
            warn!(found = %other, "status response messages is not an array");
            Vec::new()
        }
    }
}
