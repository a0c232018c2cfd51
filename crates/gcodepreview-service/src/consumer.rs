//! Queue consumer: lifecycle state machine and the job loop.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use gcodepreview_core::RenderJobRequest;
use gcodepreview_renderer::RenderError;

use crate::pipeline::{JobHandler, ServiceError};

/// Lifecycle states of the consumer.
///
/// `Draining` is the window between a shutdown request arriving while a
/// job is in flight and that job finishing; no new job is started in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Disconnected,
    Connected,
    Processing,
    Draining,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerEvent {
    ConnectionEstablished,
    ConnectionLost,
    JobStarted,
    JobFinished,
    ShutdownRequested,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid consumer transition: {event:?} in state {from:?}")]
pub struct StateError {
    pub from: ConsumerState,
    pub event: ConsumerEvent,
}

impl ConsumerState {
    /// Apply one lifecycle event; events that make no sense in the current
    /// state are hard errors, not silent no-ops.
    pub fn apply(self, event: ConsumerEvent) -> Result<ConsumerState, StateError> {
        use ConsumerEvent::*;
        use ConsumerState::*;
        let next = match (self, event) {
            (Disconnected, ConnectionEstablished) => Connected,
            (Connected, JobStarted) => Processing,
            (Processing, JobFinished) => Connected,
            (Disconnected | Connected, ShutdownRequested) => Stopped,
            (Processing, ShutdownRequested) => Draining,
            (Draining, JobFinished) => Stopped,
            (Connected | Processing | Draining, ConnectionLost) => Disconnected,
            (from, event) => return Err(StateError { from, event }),
        };
        Ok(next)
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("connection to the job source lost: {0}")]
    ConnectionLost(String),
    #[error("malformed job message: {0}")]
    Malformed(String),
}

/// Decode a raw queue payload into a job request.
pub fn parse_job(payload: &[u8]) -> Result<RenderJobRequest, SourceError> {
    serde_json::from_slice(payload).map_err(|err| SourceError::Malformed(err.to_string()))
}

/// A stream of validated render-job messages with acknowledgement.
///
/// `next_job` returning `Ok(None)` means the source is exhausted and the
/// consumer should shut down cleanly.
#[async_trait]
pub trait JobSource: Send {
    async fn next_job(&mut self) -> Result<Option<RenderJobRequest>, SourceError>;
    async fn ack(&mut self, job: &RenderJobRequest);
    async fn nack(&mut self, job: &RenderJobRequest, requeue: bool);
}

/// Pulls jobs from a source, hands them to a handler, and acknowledges
/// them based on the outcome.
pub struct JobConsumer<J, H> {
    source: J,
    handler: H,
    state: ConsumerState,
    shutdown: mpsc::Receiver<()>,
}

impl<J, H> JobConsumer<J, H>
where
    J: JobSource,
    H: JobHandler,
{
    pub fn new(source: J, handler: H, shutdown: mpsc::Receiver<()>) -> Self {
        Self {
            source,
            handler,
            state: ConsumerState::Disconnected,
            shutdown,
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Run until the source is exhausted, the connection drops, or a
    /// shutdown is requested. Returns the final state.
    pub async fn run(mut self) -> Result<ConsumerState, StateError> {
        self.apply(ConsumerEvent::ConnectionEstablished)?;
        info!("consumer connected");

        loop {
            let next = tokio::select! {
                _ = self.shutdown.recv() => {
                    self.apply(ConsumerEvent::ShutdownRequested)?;
                    break;
                }
                next = self.source.next_job() => next,
            };

            match next {
                Ok(Some(job)) => {
                    if let Err(err) = job.validate() {
                        warn!("dropping invalid job message: {err}");
                        self.source.nack(&job, false).await;
                        continue;
                    }

                    self.apply(ConsumerEvent::JobStarted)?;
                    self.handle_job(&job).await;

                    // A shutdown that arrived mid-job moves us through
                    // Draining so the in-flight job still gets settled.
                    if self.shutdown.try_recv().is_ok() {
                        self.apply(ConsumerEvent::ShutdownRequested)?;
                    }
                    self.apply(ConsumerEvent::JobFinished)?;
                    if self.state == ConsumerState::Stopped {
                        break;
                    }
                }
                Ok(None) => {
                    info!("job source exhausted, shutting down");
                    self.apply(ConsumerEvent::ShutdownRequested)?;
                    break;
                }
                Err(err) => {
                    error!("job source failed: {err}");
                    self.apply(ConsumerEvent::ConnectionLost)?;
                    break;
                }
            }
        }

        info!(state = ?self.state, "consumer stopped");
        Ok(self.state)
    }

    async fn handle_job(&mut self, job: &RenderJobRequest) {
        match self.handler.handle(job).await {
            Ok(outcome) if outcome.is_success() => {
                info!(
                    job_id = %job.job_id,
                    stored = outcome.stored,
                    total = outcome.total,
                    "job completed"
                );
                self.source.ack(job).await;
            }
            Ok(outcome) => {
                warn!(
                    job_id = %job.job_id,
                    total = outcome.total,
                    "no frames stored, requeueing job"
                );
                self.source.nack(job, true).await;
            }
            Err(ServiceError::Render(RenderError::NoGeometry)) => {
                // Nothing to render is terminal, not transient.
                warn!(job_id = %job.job_id, "job has no renderable geometry");
                self.source.nack(job, false).await;
            }
            Err(err) => {
                error!(job_id = %job.job_id, "job failed: {err}");
                self.source.nack(job, true).await;
            }
        }
    }

    fn apply(&mut self, event: ConsumerEvent) -> Result<(), StateError> {
        let next = self.state.apply(event)?;
        debug!(from = ?self.state, ?event, to = ?next, "consumer transition");
        self.state = next;
        Ok(())
    }
}
