//! Job module - Runs one ingestion off the UI thread
//!
//! The worker never touches UI state. It reports through a channel of
//! [`JobEvent`]s which the UI drains with [`JobRunner::poll`] every frame.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use thiserror::Error;

use crate::ingest::{DigestOutput, DigestRequest, Ingestor};

/// Message from the worker to the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Status(String),
    Completed(DigestOutput),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("A digest is already running")]
    AlreadyRunning,

    #[error("Failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Called after every event so the UI wakes up and polls
pub type Waker = Arc<dyn Fn() + Send + Sync>;

pub struct JobRunner {
    ingestor: Arc<dyn Ingestor>,
    waker: Waker,
    state: JobState,
    receiver: Option<Receiver<JobEvent>>,
    handle: Option<JoinHandle<()>>,
}

impl JobRunner {
    pub fn new(ingestor: Arc<dyn Ingestor>, waker: Waker) -> Self {
        Self {
            ingestor,
            waker,
            state: JobState::Idle,
            receiver: None,
            handle: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    /// Return a finished runner to `Idle`. No-op while running.
    pub fn reset(&mut self) {
        if !self.is_running() {
            self.state = JobState::Idle;
        }
    }

    /// Spawn the worker for `request`
    pub fn start(&mut self, request: DigestRequest) -> Result<(), JobError> {
        if self.is_running() {
            log::warn!("Rejected start: a digest is already running");
            return Err(JobError::AlreadyRunning);
        }

        let (sender, receiver) = unbounded();
        let ingestor = Arc::clone(&self.ingestor);
        let waker = Arc::clone(&self.waker);

        log::info!(
            "Starting digest of {} -> {}",
            request.source.display(),
            request.output.display()
        );

        let handle = thread::Builder::new()
            .name("digest-worker".to_string())
            .spawn(move || run_job(ingestor.as_ref(), &request, &sender, waker.as_ref()))?;

        self.receiver = Some(receiver);
        self.handle = Some(handle);
        self.state = JobState::Running;
        Ok(())
    }

    /// Drain pending events without blocking
    pub fn poll(&mut self) -> Vec<JobEvent> {
        let mut events = Vec::new();
        let Some(receiver) = self.receiver.as_ref() else {
            return events;
        };

        loop {
            match receiver.try_recv() {
                Ok(event) => {
                    let terminal = !matches!(event, JobEvent::Status(_));
                    match event {
                        JobEvent::Completed(_) => self.state = JobState::Completed,
                        JobEvent::Failed(_) => self.state = JobState::Failed,
                        JobEvent::Status(_) => {}
                    }
                    events.push(event);
                    if terminal {
                        self.finish();
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    let reason = self.finish().unwrap_or_else(|| {
                        "Worker stopped without reporting a result".to_string()
                    });
                    log::error!("Digest worker failed: {}", reason);
                    self.state = JobState::Failed;
                    events.push(JobEvent::Failed(reason));
                    break;
                }
            }
        }

        events
    }

    /// Join the worker; returns the panic message if it panicked
    fn finish(&mut self) -> Option<String> {
        self.receiver = None;
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(()) => None,
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Some(format!("Worker panicked: {}", msg))
            }
        }
    }
}

fn run_job(
    ingestor: &dyn Ingestor,
    request: &DigestRequest,
    sender: &Sender<JobEvent>,
    waker: &(dyn Fn() + Send + Sync),
) {
    let send = |event: JobEvent| {
        // The UI may have gone away; nothing left to report to then
        if sender.send(event).is_ok() {
            waker();
        }
    };

    send(JobEvent::Status(format!("Processing: {}", request.source.display())));
    send(JobEvent::Status(format!("Output: {}", request.output.display())));

    let status = |line: String| send(JobEvent::Status(line));
    match ingestor.ingest(request, &status) {
        Ok(output) => {
            log::info!("Digest completed: {}", request.output.display());
            send(JobEvent::Completed(output));
        }
        Err(e) => {
            log::error!("Digest failed: {}", e);
            send(JobEvent::Failed(e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Condvar, Mutex};
    use std::time::{Duration, Instant};

    struct FakeIngestor {
        fail: bool,
    }

    impl Ingestor for FakeIngestor {
        fn ingest(
            &self,
            request: &DigestRequest,
            status: &dyn Fn(String),
        ) -> Result<DigestOutput, IngestError> {
            status("halfway".to_string());
            if self.fail {
                return Err(IngestError::SourceMissing(request.source.clone()));
            }
            Ok(DigestOutput {
                summary: "summary".into(),
                tree: "tree".into(),
                content: "content".into(),
            })
        }
    }

    struct PanickingIngestor;

    impl Ingestor for PanickingIngestor {
        fn ingest(
            &self,
            _request: &DigestRequest,
            _status: &dyn Fn(String),
        ) -> Result<DigestOutput, IngestError> {
            panic!("boom");
        }
    }

    /// Blocks inside `ingest` until the test opens the gate
    #[derive(Default)]
    struct GatedIngestor {
        open: Mutex<bool>,
        cvar: Condvar,
    }

    impl GatedIngestor {
        fn release(&self) {
            *self.open.lock().unwrap() = true;
            self.cvar.notify_all();
        }
    }

    impl Ingestor for GatedIngestor {
        fn ingest(
            &self,
            _request: &DigestRequest,
            _status: &dyn Fn(String),
        ) -> Result<DigestOutput, IngestError> {
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.cvar.wait(open).unwrap();
            }
            Ok(DigestOutput::default())
        }
    }

    fn noop_waker() -> Waker {
        Arc::new(|| {})
    }

    fn request() -> DigestRequest {
        DigestRequest::new("/src", "/out.txt")
    }

    /// Poll until the runner leaves `Running`
    fn drain(runner: &mut JobRunner) -> Vec<JobEvent> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();
        while runner.is_running() {
            assert!(Instant::now() < deadline, "job did not finish");
            events.extend(runner.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn test_success_flow() {
        let mut runner = JobRunner::new(Arc::new(FakeIngestor { fail: false }), noop_waker());
        assert_eq!(runner.state(), JobState::Idle);

        runner.start(request()).unwrap();
        assert!(runner.is_running());

        let events = drain(&mut runner);
        assert_eq!(runner.state(), JobState::Completed);
        assert_eq!(
            events,
            vec![
                JobEvent::Status("Processing: /src".into()),
                JobEvent::Status("Output: /out.txt".into()),
                JobEvent::Status("halfway".into()),
                JobEvent::Completed(DigestOutput {
                    summary: "summary".into(),
                    tree: "tree".into(),
                    content: "content".into(),
                }),
            ]
        );

        runner.reset();
        assert_eq!(runner.state(), JobState::Idle);
    }

    #[test]
    fn test_failure_flow() {
        let mut runner = JobRunner::new(Arc::new(FakeIngestor { fail: true }), noop_waker());
        runner.start(request()).unwrap();

        let events = drain(&mut runner);
        assert_eq!(runner.state(), JobState::Failed);
        match events.last() {
            Some(JobEvent::Failed(reason)) => assert!(reason.contains("/src")),
            other => panic!("expected failure, got {:?}", other),
        }

        // A failed runner accepts a new start
        runner.start(request()).unwrap();
        drain(&mut runner);
    }

    #[test]
    fn test_panic_is_reported_as_failure() {
        let mut runner = JobRunner::new(Arc::new(PanickingIngestor), noop_waker());
        runner.start(request()).unwrap();

        let events = drain(&mut runner);
        assert_eq!(runner.state(), JobState::Failed);
        match events.last() {
            Some(JobEvent::Failed(reason)) => assert!(reason.contains("boom")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_second_start_rejected_while_running() {
        let gate = Arc::new(GatedIngestor::default());
        let mut runner = JobRunner::new(gate.clone(), noop_waker());

        runner.start(request()).unwrap();
        assert!(matches!(
            runner.start(request()),
            Err(JobError::AlreadyRunning)
        ));
        runner.reset();
        assert!(runner.is_running());

        gate.release();
        drain(&mut runner);
        assert_eq!(runner.state(), JobState::Completed);
    }

    #[test]
    fn test_waker_called_per_event() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let waker: Waker = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut runner = JobRunner::new(Arc::new(FakeIngestor { fail: false }), waker);
        runner.start(request()).unwrap();
        let events = drain(&mut runner);

        assert_eq!(wakes.load(Ordering::SeqCst), events.len());
    }

    #[test]
    fn test_poll_when_idle_is_empty() {
        let mut runner = JobRunner::new(Arc::new(FakeIngestor { fail: false }), noop_waker());
        assert!(runner.poll().is_empty());
    }
}
