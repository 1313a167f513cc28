//! Bounded-concurrency scan coordinator.
//!
//! A fixed pool of long-lived workers pulls [`ScanTask`]s from a shared
//! queue, runs each through a [`Prober`], and pushes the [`PortResult`] onto
//! a single channel that the caller drains as a [`ScanStream`]. Results come
//! out in completion order.
//!
//! Each worker runs at most one probe at a time, so the pool size bounds the
//! number of sockets open at once.
//!
//! Cancellation is cooperative. Once the [`CancelHandle`] fires, no new task
//! starts and in-flight probes are abandoned, which drops and closes their
//! sockets. Results delivered before the cancel stay in the stream. Nothing
//! completed afterwards is delivered.

use crate::scanner::traits::{PortResult, Prober};
use crate::types::ScanTask;
use futures::{FutureExt, Stream};
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default size of the worker pool.
pub const DEFAULT_WORKERS: usize = 200;

/// Largest accepted worker pool.
pub const MAX_WORKERS: usize = 1000;

/// Snapshot of a running scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanProgress {
    /// Number of tasks submitted.
    pub total: usize,
    /// Results delivered so far. Never decreases.
    pub completed: usize,
    /// Delivered results that were `OPEN` or `OPEN|FILTERED`.
    pub open: usize,
}

impl ScanProgress {
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// State shared by the workers of one scan.
struct ScanSession {
    queue: Mutex<VecDeque<ScanTask>>,
    cancel: CancellationToken,
    /// Serializes "check cancelled, count, send" against cancellation.
    delivery: Mutex<ScanProgress>,
    progress_tx: watch::Sender<ScanProgress>,
}

impl ScanSession {
    fn next_task(&self) -> Option<ScanTask> {
        lock(&self.queue).pop_front()
    }

    /// Deliver a finished result unless the scan was cancelled first.
    /// Returns `false` when the worker should stop.
    fn deliver(&self, result: PortResult, tx: &mpsc::UnboundedSender<PortResult>) -> bool {
        let mut progress = lock(&self.delivery);
        if self.cancel.is_cancelled() {
            tracing::trace!(task = %result.task(), "discarding result completed after cancel");
            return false;
        }

        let open = result.is_open();
        if tx.send(result).is_err() {
            // Consumer went away; nobody is left to read further results.
            self.cancel.cancel();
            return false;
        }

        progress.completed += 1;
        if open {
            progress.open += 1;
        }
        self.progress_tx.send_replace(*progress);
        true
    }

    fn stop(&self) {
        let _progress = lock(&self.delivery);
        self.cancel.cancel();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable handle that stops a running scan.
#[derive(Clone)]
pub struct CancelHandle {
    session: Arc<ScanSession>,
}

impl CancelHandle {
    /// Stop the scan. Idempotent.
    pub fn cancel(&self) {
        if !self.session.cancel.is_cancelled() {
            tracing::info!("scan cancellation requested");
        }
        self.session.stop();
    }

    pub fn is_cancelled(&self) -> bool {
        self.session.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Results of a running scan, in completion order.
///
/// Dropping the stream cancels the scan.
pub struct ScanStream {
    rx: mpsc::UnboundedReceiver<PortResult>,
    handle: CancelHandle,
    progress_rx: watch::Receiver<ScanProgress>,
    workers: Vec<JoinHandle<()>>,
}

impl ScanStream {
    /// Next result, or `None` once every worker has finished.
    pub async fn next(&mut self) -> Option<PortResult> {
        self.rx.recv().await
    }

    /// Stop the scan.
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// A handle that can stop the scan from elsewhere, e.g. a signal task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Current progress.
    pub fn progress(&self) -> ScanProgress {
        *self.progress_rx.borrow()
    }

    /// Subscribe to progress updates, published on every delivered result.
    pub fn watch_progress(&self) -> watch::Receiver<ScanProgress> {
        self.progress_rx.clone()
    }

    /// Number of workers spawned for this scan.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Stream for ScanStream {
    type Item = PortResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ScanStream {
    fn drop(&mut self) {
        self.handle.session.stop();
    }
}

/// Dispatches scan tasks to a fixed-size worker pool.
pub struct ScanCoordinator<P> {
    prober: Arc<P>,
    workers: usize,
}

impl<P: Prober> ScanCoordinator<P> {
    /// Create a coordinator running at most `workers` probes at once.
    /// A pool size of zero is treated as one.
    pub fn new(prober: P, workers: usize) -> Self {
        Self {
            prober: Arc::new(prober),
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start scanning `tasks`. Must be called within a tokio runtime.
    pub fn run(&self, tasks: Vec<ScanTask>) -> ScanStream {
        let total = tasks.len();
        let initial = ScanProgress {
            total,
            ..ScanProgress::default()
        };
        let (progress_tx, progress_rx) = watch::channel(initial);
        let session = Arc::new(ScanSession {
            queue: Mutex::new(tasks.into()),
            cancel: CancellationToken::new(),
            delivery: Mutex::new(initial),
            progress_tx,
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let pool = self.workers.min(total);
        tracing::info!(tasks = total, workers = pool, "starting scan");

        let workers = (0..pool)
            .map(|id| {
                let session = Arc::clone(&session);
                let prober = Arc::clone(&self.prober);
                let tx = tx.clone();
                tokio::spawn(worker(id, session, prober, tx))
            })
            .collect();

        ScanStream {
            rx,
            handle: CancelHandle { session },
            progress_rx,
            workers,
        }
    }
}

async fn worker<P: Prober>(
    id: usize,
    session: Arc<ScanSession>,
    prober: Arc<P>,
    tx: mpsc::UnboundedSender<PortResult>,
) {
    let mut done = 0usize;
    loop {
        if session.cancel.is_cancelled() {
            break;
        }
        let Some(task) = session.next_task() else {
            break;
        };

        let result = tokio::select! {
            biased;
            _ = session.cancel.cancelled() => {
                tracing::trace!(worker = id, %task, "abandoning in-flight probe");
                break;
            }
            outcome = AssertUnwindSafe(prober.probe(task)).catch_unwind() => match outcome {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(worker = id, %task, "probe panicked");
                    PortResult::error(task, "probe panicked")
                }
            },
        };

        if !session.deliver(result, &tx) {
            break;
        }
        done += 1;
    }
    tracing::debug!(worker = id, completed = done, "worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::traits::PortStatus;
    use crate::types::Protocol;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn tasks(ports: std::ops::Range<u32>) -> Vec<ScanTask> {
        ports.map(|p| ScanTask::new(Protocol::Tcp, p)).collect()
    }

    /// Sleeps `port` milliseconds, then reports open on even ports.
    struct DelayProber;

    #[async_trait]
    impl Prober for DelayProber {
        async fn probe(&self, task: ScanTask) -> PortResult {
            tokio::time::sleep(Duration::from_millis(u64::from(task.port))).await;
            let status = if task.port % 2 == 0 {
                PortStatus::Open
            } else {
                PortStatus::Closed
            };
            PortResult::new(task, status)
        }
    }

    /// Tracks the peak number of concurrent probes.
    #[derive(Default)]
    struct CountingProber {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Prober for Arc<CountingProber> {
        async fn probe(&self, task: ScanTask) -> PortResult {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            PortResult::new(task, PortStatus::Closed)
        }
    }

    /// Ports below 5 finish at once; the rest hang far beyond any test timeout.
    struct StallingProber;

    #[async_trait]
    impl Prober for StallingProber {
        async fn probe(&self, task: ScanTask) -> PortResult {
            if task.port >= 5 {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            PortResult::new(task, PortStatus::Open)
        }
    }

    /// Fails every third port.
    struct FlakyProber;

    #[async_trait]
    impl Prober for FlakyProber {
        async fn probe(&self, task: ScanTask) -> PortResult {
            if task.port % 3 == 0 {
                PortResult::error(task, "network unreachable")
            } else {
                PortResult::new(task, PortStatus::OpenFiltered)
            }
        }
    }

    /// Panics on port 3.
    struct PanickingProber;

    #[async_trait]
    impl Prober for PanickingProber {
        async fn probe(&self, task: ScanTask) -> PortResult {
            if task.port == 3 {
                panic!("prober bug");
            }
            PortResult::new(task, PortStatus::Closed)
        }
    }

    #[tokio::test]
    async fn test_every_task_delivered_once() {
        let coordinator = ScanCoordinator::new(DelayProber, 8);
        let results: Vec<PortResult> = coordinator.run(tasks(0..40)).collect().await;

        assert_eq!(results.len(), 40);
        let seen: HashSet<u32> = results.iter().map(|r| r.port).collect();
        assert_eq!(seen.len(), 40);
    }

    #[tokio::test]
    async fn test_results_arrive_in_completion_order() {
        // Submitted slowest first; with one worker per task the fast ones win.
        let slow_first: Vec<ScanTask> = (0..6)
            .rev()
            .map(|p| ScanTask::new(Protocol::Tcp, p * 20))
            .collect();
        let coordinator = ScanCoordinator::new(DelayProber, 6);
        let ports: Vec<u32> = coordinator
            .run(slow_first)
            .map(|r| r.port)
            .collect()
            .await;

        assert_eq!(ports, vec![0, 20, 40, 60, 80, 100]);
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_workers() {
        for workers in [1, 3, 16, 1000] {
            let prober = Arc::new(CountingProber::default());
            let coordinator = ScanCoordinator::new(Arc::clone(&prober), workers);
            let stream = coordinator.run(tasks(0..64));
            assert_eq!(stream.worker_count(), workers.min(64));

            let results: Vec<PortResult> = stream.collect().await;
            assert_eq!(results.len(), 64);
            let peak = prober.peak.load(Ordering::SeqCst);
            assert!(peak <= workers, "peak {} exceeded {} workers", peak, workers);
            assert!(peak >= 1);
        }
    }

    #[tokio::test]
    async fn test_cancel_delivers_only_completed_results() {
        let coordinator = ScanCoordinator::new(StallingProber, 20);
        let mut stream = coordinator.run(tasks(0..20));

        let mut progress = stream.watch_progress();
        progress.wait_for(|p| p.completed == 5).await.unwrap();

        let start = Instant::now();
        stream.cancel();
        assert!(stream.is_cancelled());

        let mut delivered = Vec::new();
        let drained = tokio::time::timeout(Duration::from_secs(2), async {
            while let Some(result) = stream.next().await {
                delivered.push(result);
            }
        })
        .await;

        assert!(drained.is_ok(), "stream did not terminate after cancel");
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(delivered.len(), 5);
        assert!(delivered.iter().all(|r| r.port < 5));
        assert_eq!(stream.progress().completed, 5);
    }

    #[tokio::test]
    async fn test_cancel_handle_from_another_task() {
        let coordinator = ScanCoordinator::new(StallingProber, 2);
        let mut stream = coordinator.run(tasks(5..50));
        let handle = stream.cancel_handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let finished = tokio::time::timeout(Duration::from_secs(2), stream.next()).await;
        assert_eq!(finished.unwrap(), None);
    }

    #[tokio::test]
    async fn test_errors_do_not_abort_siblings() {
        let coordinator = ScanCoordinator::new(FlakyProber, 4);
        let stream = coordinator.run(tasks(1..31));
        let watch = stream.watch_progress();
        let results: Vec<PortResult> = stream.collect().await;

        assert_eq!(results.len(), 30);
        let errors = results.iter().filter(|r| r.status.is_error()).count();
        assert_eq!(errors, 10);

        let progress = *watch.borrow();
        assert_eq!(progress.completed, 30);
        assert_eq!(progress.open, 20);
        assert!(progress.is_complete());
    }

    #[tokio::test]
    async fn test_panicking_prober_yields_error_result() {
        let coordinator = ScanCoordinator::new(PanickingProber, 2);
        let stream = coordinator.run(tasks(1..6));
        let watch = stream.watch_progress();
        let results: Vec<PortResult> = stream.collect().await;

        assert_eq!(results.len(), 5);
        let failed: Vec<&PortResult> = results.iter().filter(|r| r.status.is_error()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].port, 3);
        assert_eq!(failed[0].status, PortStatus::Error("probe panicked".to_string()));
        assert!(watch.borrow().is_complete());
    }

    #[tokio::test]
    async fn test_progress_counts_open_results() {
        let coordinator = ScanCoordinator::new(DelayProber, 10);
        let mut stream = coordinator.run(tasks(0..10));
        let mut last = 0;
        while stream.next().await.is_some() {
            let progress = stream.progress();
            assert!(progress.completed >= last);
            last = progress.completed;
        }
        let progress = stream.progress();
        assert_eq!(progress, ScanProgress { total: 10, completed: 10, open: 5 });
    }

    #[tokio::test]
    async fn test_empty_task_list_finishes_immediately() {
        let coordinator = ScanCoordinator::new(DelayProber, DEFAULT_WORKERS);
        let mut stream = coordinator.run(Vec::new());
        assert_eq!(stream.worker_count(), 0);
        assert_eq!(stream.next().await, None);
        assert!(stream.progress().is_complete());
    }

    #[tokio::test]
    async fn test_dropping_stream_cancels() {
        let coordinator = ScanCoordinator::new(StallingProber, 4);
        let stream = coordinator.run(tasks(5..10));
        let handle = stream.cancel_handle();
        drop(stream);
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_zero_workers_treated_as_one() {
        assert_eq!(ScanCoordinator::new(DelayProber, 0).workers(), 1);
    }
}
