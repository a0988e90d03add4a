//! End-to-end orchestrator scenarios against an in-memory backend.

mod support;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use corpora_client::{
    FileRepository, OrchestratorConfig, ProgressHandler, ProgressSnapshot, UploadOrchestrator,
    UploadSource,
};
use corpora_core::{JobPhase, UploadError, UploadMetadata, UploadMode};

use support::{status, status_done, status_failed, MockBackend};

const TICK: Duration = Duration::from_millis(10);

fn config(mode: UploadMode) -> OrchestratorConfig {
    OrchestratorConfig {
        mode,
        poll_interval: TICK,
        poll_retry_budget: 0,
        job_timeout: Duration::from_secs(5),
    }
}

fn pdf_source() -> UploadSource {
    UploadSource::from_bytes("report.pdf", Bytes::from_static(b"%PDF-1.4 test"))
}

fn metadata() -> UploadMetadata {
    let mut metadata = UploadMetadata::new("finance");
    metadata.add_tag("q1").unwrap();
    metadata
}

fn recording_handler() -> (ProgressHandler, Arc<Mutex<Vec<ProgressSnapshot>>>) {
    let seen: Arc<Mutex<Vec<ProgressSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: ProgressHandler = Arc::new(move |snapshot| {
        sink.lock().unwrap().push(snapshot);
    });
    (handler, seen)
}

#[tokio::test]
async fn polled_upload_walks_the_documented_progress_sequence() {
    let backend = MockBackend::new();
    backend.push_status(Ok(status(40.0)));
    backend.push_status(Ok(status_done(Some(1), Some(1))));

    let mirror = Arc::new(FileRepository::new(backend.clone()));
    let orchestrator = UploadOrchestrator::new(backend.clone(), config(UploadMode::Polled))
        .with_file_mirror(mirror);
    let (handler, seen) = recording_handler();

    let report = orchestrator
        .submit(vec![pdf_source()], metadata(), handler)
        .await
        .unwrap();

    assert_eq!(report.file_id.as_deref(), Some("abc"));
    assert_eq!(report.completed, Some(1));

    let seen = seen.lock().unwrap();
    let percents: Vec<f64> = seen.iter().map(|s| s.percent).collect();
    assert_eq!(percents, vec![0.0, 50.0, 70.0, 100.0]);
    assert_eq!(seen[0].phase, JobPhase::Uploading);
    assert_eq!(seen[1].phase, JobPhase::Uploading);
    assert_eq!(seen[2].phase, JobPhase::Processing);
    assert_eq!(seen[3].phase, JobPhase::Completed);
    assert_eq!(seen[3].filename, "report.pdf");
    drop(seen);

    // Polling stopped after the terminal response, and the file mirror was
    // refreshed exactly once.
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 2);
    assert_eq!(backend.file_list_calls.load(Ordering::SeqCst), 1);
    tokio::time::sleep(TICK * 3).await;
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn sync_upload_completes_without_polling() {
    let backend = MockBackend::with_transport_fractions(vec![0.5, 1.0]);
    let mirror = Arc::new(FileRepository::new(backend.clone()));
    let orchestrator =
        UploadOrchestrator::new(backend.clone(), config(UploadMode::Sync)).with_file_mirror(mirror);
    let (handler, seen) = recording_handler();

    let report = orchestrator
        .submit(vec![pdf_source()], metadata(), handler)
        .await
        .unwrap();

    assert_eq!(report.file_id, None);
    assert_eq!(report.files.len(), 1);
    assert_eq!(orchestrator.phase(), JobPhase::Completed);

    let percents: Vec<f64> = seen.lock().unwrap().iter().map(|s| s.percent).collect();
    assert_eq!(percents, vec![0.0, 25.0, 50.0, 100.0]);

    assert_eq!(backend.sync_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.file_list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transport_failure_reaches_failed_without_any_poll() {
    let backend = MockBackend::new();
    backend.fail_polled_submit(500);

    let orchestrator = UploadOrchestrator::new(backend.clone(), config(UploadMode::Polled));
    let (handler, seen) = recording_handler();

    let err = orchestrator
        .submit(vec![pdf_source()], metadata(), handler)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Transport { status: 500, .. }));
    assert_eq!(orchestrator.phase(), JobPhase::Failed);
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 0);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.last().unwrap().phase, JobPhase::Failed);
}

#[tokio::test]
async fn second_submission_is_rejected_while_a_job_is_active() {
    // An empty status queue keeps the first job processing forever.
    let backend = MockBackend::new();
    let orchestrator = Arc::new(UploadOrchestrator::new(
        backend.clone(),
        config(UploadMode::Polled),
    ));

    let first = {
        let orchestrator = orchestrator.clone();
        let (handler, _) = recording_handler();
        tokio::spawn(async move {
            orchestrator
                .submit(vec![pdf_source()], metadata(), handler)
                .await
        })
    };
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(orchestrator.phase(), JobPhase::Processing);

    let (handler, _) = recording_handler();
    let err = orchestrator
        .submit(vec![pdf_source()], metadata(), handler)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::JobActive));

    orchestrator.cancel();
    let first = first.await.unwrap();
    assert!(matches!(first, Err(UploadError::Cancelled)));
}

#[tokio::test]
async fn cancellation_stops_polling_and_progress_updates() {
    let backend = MockBackend::new();
    let orchestrator = Arc::new(UploadOrchestrator::new(
        backend.clone(),
        config(UploadMode::Polled),
    ));
    let (handler, seen) = recording_handler();

    let task = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .submit(vec![pdf_source()], metadata(), handler)
                .await
        })
    };
    tokio::time::sleep(TICK * 5).await;
    orchestrator.cancel();
    let result = task.await.unwrap();
    assert!(matches!(result, Err(UploadError::Cancelled)));

    let polls_at_cancel = backend.status_calls.load(Ordering::SeqCst);
    let updates_at_cancel = seen.lock().unwrap().len();
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), polls_at_cancel);
    assert_eq!(seen.lock().unwrap().len(), updates_at_cancel);
}

#[tokio::test]
async fn first_poll_error_fails_the_job_by_default() {
    let backend = MockBackend::new();
    backend.push_status(Err("connection reset"));

    let orchestrator = UploadOrchestrator::new(backend.clone(), config(UploadMode::Polled));
    let (handler, _) = recording_handler();

    let err = orchestrator
        .submit(vec![pdf_source()], metadata(), handler)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Poll(_)));
    assert_eq!(orchestrator.phase(), JobPhase::Failed);
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn poll_retry_budget_survives_transient_errors() {
    let backend = MockBackend::new();
    backend.push_status(Err("blip"));
    backend.push_status(Err("blip again"));
    backend.push_status(Ok(status_done(None, None)));

    let mut config = config(UploadMode::Polled);
    config.poll_retry_budget = 2;
    let orchestrator = UploadOrchestrator::new(backend.clone(), config);
    let (handler, _) = recording_handler();

    orchestrator
        .submit(vec![pdf_source()], metadata(), handler)
        .await
        .unwrap();
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 3);
    assert_eq!(orchestrator.phase(), JobPhase::Completed);
}

#[tokio::test]
async fn server_reported_failure_fails_the_job() {
    let backend = MockBackend::new();
    backend.push_status(Ok(status_failed()));

    let orchestrator = UploadOrchestrator::new(backend.clone(), config(UploadMode::Polled));
    let (handler, _) = recording_handler();

    let err = orchestrator
        .submit(vec![pdf_source()], metadata(), handler)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Poll(_)));
    assert_eq!(orchestrator.phase(), JobPhase::Failed);
}

#[tokio::test]
async fn job_exceeding_the_time_limit_fails_with_timeout() {
    let backend = MockBackend::new();
    let mut config = config(UploadMode::Polled);
    config.job_timeout = Duration::from_millis(80);
    let orchestrator = UploadOrchestrator::new(backend.clone(), config);
    let (handler, _) = recording_handler();

    let err = orchestrator
        .submit(vec![pdf_source()], metadata(), handler)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Timeout(_)));
    assert_eq!(orchestrator.phase(), JobPhase::Failed);
}

#[tokio::test]
async fn incomplete_metadata_is_rejected_before_any_request() {
    let backend = MockBackend::new();
    let orchestrator = UploadOrchestrator::new(backend.clone(), config(UploadMode::Polled));
    let (handler, seen) = recording_handler();

    let err = orchestrator
        .submit(vec![pdf_source()], UploadMetadata::new(""), handler)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::MissingMetadata(_)));
    assert_eq!(backend.polled_calls.load(Ordering::SeqCst), 0);
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(orchestrator.phase(), JobPhase::Idle);
}

#[tokio::test]
async fn empty_validated_set_is_rejected() {
    let backend = MockBackend::new();
    let orchestrator = UploadOrchestrator::new(backend.clone(), config(UploadMode::Polled));
    let (handler, _) = recording_handler();

    let err = orchestrator
        .submit(Vec::new(), metadata(), handler)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::NoValidFiles));
    assert_eq!(backend.polled_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn acknowledge_returns_a_finished_job_to_idle() {
    let backend = MockBackend::new();
    let orchestrator = UploadOrchestrator::new(backend.clone(), config(UploadMode::Sync));
    let (handler, _) = recording_handler();

    orchestrator
        .submit(vec![pdf_source()], metadata(), handler)
        .await
        .unwrap();
    assert_eq!(orchestrator.phase(), JobPhase::Completed);
    assert!(orchestrator.acknowledge());
    assert_eq!(orchestrator.phase(), JobPhase::Idle);
    assert!(!orchestrator.acknowledge());
}
