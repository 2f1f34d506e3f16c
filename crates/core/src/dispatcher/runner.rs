//! Dispatcher implementation.
//!
//! - Intake: one mpsc channel shared by every submitter
//! - Pull loop: spawns one allocation task per request into a `JoinSet`
//! - Shutdown: closes the intake, then drains queued and in-flight requests

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, Notify};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::metrics::{
    ALLOCATIONS, ALLOCATION_WAIT, REQUESTS_IN_FLIGHT, REQUESTS_SUBMITTED, SUBMISSIONS_REFUSED,
    TICKETS_AVAILABLE,
};
use crate::outcome::{OutcomeEnvelope, OutcomeEvent, OutcomeSink, RejectReason};
use crate::pool::{AllocationError, RequesterId, TicketStore};

use super::config::DispatcherConfig;
use super::types::{DispatcherError, DispatcherStatus, PurchaseRequest};

/// Sending half of the intake.
#[derive(Clone)]
enum IntakeSender {
    Bounded(mpsc::Sender<PurchaseRequest>),
    Unbounded(mpsc::UnboundedSender<PurchaseRequest>),
}

impl IntakeSender {
    async fn send(&self, request: PurchaseRequest) -> Result<(), DispatcherError> {
        match self {
            Self::Bounded(tx) => tx.send(request).await.map_err(|_| DispatcherError::Closed),
            Self::Unbounded(tx) => tx.send(request).map_err(|_| DispatcherError::Closed),
        }
    }
}

/// Receiving half of the intake, owned by the pull loop.
enum IntakeReceiver {
    Bounded(mpsc::Receiver<PurchaseRequest>),
    Unbounded(mpsc::UnboundedReceiver<PurchaseRequest>),
}

impl IntakeReceiver {
    async fn recv(&mut self) -> Option<PurchaseRequest> {
        match self {
            Self::Bounded(rx) => rx.recv().await,
            Self::Unbounded(rx) => rx.recv().await,
        }
    }
}

fn intake(capacity: Option<usize>) -> (IntakeSender, IntakeReceiver) {
    match capacity {
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            (IntakeSender::Bounded(tx), IntakeReceiver::Bounded(rx))
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (IntakeSender::Unbounded(tx), IntakeReceiver::Unbounded(rx))
        }
    }
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    in_flight: AtomicU64,
    allocated: AtomicU64,
    rejected: AtomicU64,
}

/// State shared by the pull loop and every allocation task.
struct Shared {
    config: DispatcherConfig,
    store: Arc<TicketStore>,
    sink: Arc<dyn OutcomeSink>,
    counters: Counters,
    running: AtomicBool,
    idle: Notify,
}

impl Shared {
    /// Uniform random delay in the configured range.
    fn processing_delay(&self) -> Duration {
        let low = self.config.min_delay_ms.min(self.config.max_delay_ms);
        let high = self.config.min_delay_ms.max(self.config.max_delay_ms);
        Duration::from_millis(rand::thread_rng().gen_range(low..=high))
    }

    fn deadline(&self, request: &PurchaseRequest) -> Option<Instant> {
        self.config
            .request_timeout()
            .map(|timeout| request.submitted_at + timeout)
    }

    /// Resolve one request: wait, then allocate or give up at the deadline.
    async fn process(&self, request: PurchaseRequest) {
        let ready_at = Instant::now() + self.processing_delay();

        let event = match self.deadline(&request) {
            Some(deadline) if deadline < ready_at => {
                tokio::time::sleep_until(deadline).await;
                OutcomeEvent::Rejected {
                    requester_id: request.requester_id,
                    reason: RejectReason::RequestTimedOut,
                }
            }
            _ => {
                tokio::time::sleep_until(ready_at).await;
                self.allocate(request.requester_id)
            }
        };

        self.report(&request, event);
    }

    // Synchronous: the store lock is never held across an await point.
    fn allocate(&self, requester_id: RequesterId) -> OutcomeEvent {
        match self.store.try_allocate(requester_id) {
            Ok(allocation) => {
                TICKETS_AVAILABLE.set(allocation.remaining as i64);
                OutcomeEvent::Allocated {
                    requester_id,
                    ticket_id: allocation.ticket_id,
                    remaining: allocation.remaining,
                }
            }
            Err(AllocationError::NoTicketsAvailable) => OutcomeEvent::Rejected {
                requester_id,
                reason: RejectReason::NoTicketsAvailable,
            },
        }
    }

    fn report(&self, request: &PurchaseRequest, event: OutcomeEvent) {
        let result = event.result_label();
        ALLOCATIONS.with_label_values(&[result]).inc();
        ALLOCATION_WAIT
            .with_label_values(&[result])
            .observe(request.submitted_at.elapsed().as_secs_f64());

        if event.is_allocated() {
            self.counters.allocated.fetch_add(1, Ordering::SeqCst);
        } else {
            self.counters.rejected.fetch_add(1, Ordering::SeqCst);
        }

        self.sink.record(&OutcomeEnvelope::now(event));

        self.leave_flight();
    }

    fn leave_flight(&self) {
        REQUESTS_IN_FLIGHT.dec();
        if self.counters.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Accepts purchase requests from any number of concurrent callers and
/// resolves each one against the [`TicketStore`].
///
/// Submission order does not imply allocation order: every request waits
/// its own random processing delay before it reaches the store. The only
/// guarantee is that store allocations never overlap.
pub struct Dispatcher {
    shared: Arc<Shared>,
    intake: Mutex<Option<IntakeSender>>,
    pending: Mutex<Option<IntakeReceiver>>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Create a dispatcher in front of `store`, reporting every outcome to `sink`.
    ///
    /// Requests may be submitted before [`start`](Self::start); they wait in
    /// the intake until the pull loop runs.
    pub fn new(
        config: DispatcherConfig,
        store: Arc<TicketStore>,
        sink: Arc<dyn OutcomeSink>,
    ) -> Self {
        let (tx, rx) = intake(config.intake_capacity);
        TICKETS_AVAILABLE.set(store.available() as i64);

        Self {
            shared: Arc::new(Shared {
                config,
                store,
                sink,
                counters: Counters::default(),
                running: AtomicBool::new(false),
                idle: Notify::new(),
            }),
            intake: Mutex::new(Some(tx)),
            pending: Mutex::new(Some(rx)),
            worker: tokio::sync::Mutex::new(None),
        }
    }

    /// Start pulling requests from the intake (spawns the pull loop).
    pub async fn start(&self) -> Result<(), DispatcherError> {
        let mut worker = self.worker.lock().await;
        self.spawn_loop(&mut worker)
    }

    /// Queue a purchase request for `requester_id`.
    ///
    /// Waits only while a bounded intake is full. Returns
    /// [`DispatcherError::Closed`] once the dispatcher has been closed. The
    /// outcome is delivered to the sink, not to the caller.
    pub async fn submit(&self, requester_id: RequesterId) -> Result<(), DispatcherError> {
        let intake = self
            .intake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let Some(intake) = intake else {
            SUBMISSIONS_REFUSED.inc();
            debug!(requester_id, "Submission refused: dispatcher closed");
            return Err(DispatcherError::Closed);
        };

        // Counted before sending so an outcome can never be reported for a
        // request that is not yet in flight.
        self.shared.counters.in_flight.fetch_add(1, Ordering::SeqCst);
        REQUESTS_IN_FLIGHT.inc();

        if let Err(e) = intake.send(PurchaseRequest::new(requester_id)).await {
            self.shared.leave_flight();
            SUBMISSIONS_REFUSED.inc();
            return Err(e);
        }

        self.shared.counters.submitted.fetch_add(1, Ordering::SeqCst);
        REQUESTS_SUBMITTED.inc();
        debug!(requester_id, "Purchase request queued");
        Ok(())
    }

    /// Stop accepting submissions.
    ///
    /// Requests already in the intake or in flight still run to an outcome.
    /// Returns false if the intake was already closed.
    pub fn close(&self) -> bool {
        let closed = self
            .intake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if closed {
            info!("Dispatcher intake closed");
        }
        closed
    }

    /// Close the intake and wait until every accepted request has an outcome.
    ///
    /// If the pull loop was never started it is started here so that
    /// requests queued before shutdown are still resolved.
    pub async fn shutdown(&self) {
        self.close();

        let mut worker = self.worker.lock().await;
        if self.spawn_loop(&mut worker).is_ok() {
            debug!("Dispatcher started during shutdown to drain queued requests");
        }

        if let Some(handle) = worker.take() {
            if let Err(e) = handle.await {
                error!("Dispatcher loop failed: {}", e);
            }
        }
    }

    /// Wait until no accepted request is left without an outcome.
    ///
    /// Unlike [`shutdown`](Self::shutdown) the intake stays open, so a later
    /// `submit` makes the dispatcher busy again. Returns immediately when
    /// nothing is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.counters.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Current counters and lifecycle flags.
    pub fn status(&self) -> DispatcherStatus {
        let counters = &self.shared.counters;
        DispatcherStatus {
            running: self.shared.running.load(Ordering::SeqCst),
            accepting: self.is_accepting(),
            submitted: counters.submitted.load(Ordering::SeqCst),
            in_flight: counters.in_flight.load(Ordering::SeqCst),
            allocated: counters.allocated.load(Ordering::SeqCst),
            rejected: counters.rejected.load(Ordering::SeqCst),
        }
    }

    /// Whether `submit` currently accepts requests.
    pub fn is_accepting(&self) -> bool {
        self.intake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The store this dispatcher allocates from.
    pub fn store(&self) -> &Arc<TicketStore> {
        &self.shared.store
    }

    fn spawn_loop(&self, worker: &mut Option<JoinHandle<()>>) -> Result<(), DispatcherError> {
        let receiver = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(DispatcherError::AlreadyStarted)?;

        self.shared.running.store(true, Ordering::SeqCst);
        *worker = Some(tokio::spawn(run_loop(receiver, Arc::clone(&self.shared))));
        Ok(())
    }
}

async fn run_loop(mut intake: IntakeReceiver, shared: Arc<Shared>) {
    info!(
        total_tickets = shared.store.total(),
        "Dispatcher started"
    );

    let mut units = JoinSet::new();
    loop {
        tokio::select! {
            request = intake.recv() => match request {
                Some(request) => {
                    debug!(requester_id = request.requester_id, "Purchase request received");
                    let shared = Arc::clone(&shared);
                    units.spawn(async move { shared.process(request).await });
                }
                None => break,
            },
            Some(result) = units.join_next(), if !units.is_empty() => {
                if let Err(e) = result {
                    error!("Allocation task failed: {}", e);
                }
            }
        }
    }

    info!(in_flight = units.len(), "Dispatcher intake drained, waiting for in-flight requests");
    while let Some(result) = units.join_next().await {
        if let Err(e) = result {
            error!("Allocation task failed: {}", e);
        }
    }

    shared.running.store(false, Ordering::SeqCst);
    info!("Dispatcher stopped");
}
