mod common;

use common::{pdf, sample_result, Gate, ScriptedJobClient, Step};
use resume_upload::models::{JobState, StatusResponse, UNKNOWN_ERROR};
use resume_upload::workflow::{job_event_channel, JobEvent, JobEventReceiver};
use resume_upload::{JobTracker, RemoteJobClient};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const POLL: Duration = Duration::from_secs(1);

/// 收集事件直到跟踪器退出（发送端随跟踪器一起释放）
async fn collect(mut rx: JobEventReceiver) -> Vec<JobEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn test_processing_then_completed_emits_result() {
    let client = ScriptedJobClient::new();
    client.script(
        "resume.pdf",
        "abc123",
        vec![Step::processing(40), Step::completed()],
    );
    client.set_result(sample_result("abc123", "resume.pdf"));

    let (tx, rx) = job_event_channel();
    let tracker = assert_ok!(JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL).await);
    assert_eq!(tracker.job().state, JobState::Uploaded);
    assert_eq!(tracker.job().progress, 0);
    tracker.spawn();

    let events = collect(rx).await;
    assert_eq!(events.len(), 2);

    match &events[0] {
        JobEvent::Progress(job) => {
            assert_eq!(job.state, JobState::Processing);
            assert_eq!(job.progress, 40);
        }
        other => panic!("期望 Progress，实际 {:?}", other),
    }
    match &events[1] {
        JobEvent::Completed { job, result } => {
            assert_eq!(job.state, JobState::Completed);
            assert_eq!(job.progress, 100);
            assert_eq!(result, &sample_result("abc123", "resume.pdf"));
        }
        other => panic!("期望 Completed，实际 {:?}", other),
    }
    assert_eq!(client.status_calls("abc123"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_submit_failure_creates_no_tracker() {
    let client = ScriptedJobClient::new();
    client.fail_submit("resume.pdf");

    let (tx, _rx) = job_event_channel();
    let submitted = JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL).await;
    assert!(submitted.is_err());
    assert_eq!(client.status_calls("abc123"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_remote_error_without_detail_uses_fallback() {
    let client = ScriptedJobClient::new();
    client.script("resume.pdf", "abc123", vec![Step::error(None)]);

    let (tx, rx) = job_event_channel();
    JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL)
        .await
        .unwrap()
        .spawn();

    let events = collect(rx).await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        JobEvent::Failed { job, message } => {
            assert_eq!(job.state, JobState::Error);
            assert_eq!(job.error_detail.as_deref(), Some(UNKNOWN_ERROR));
            assert_eq!(message, "处理 resume.pdf 出错: Unknown error");
        }
        other => panic!("期望 Failed，实际 {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_remote_error_detail_is_kept() {
    let client = ScriptedJobClient::new();
    client.script(
        "resume.pdf",
        "abc123",
        vec![Step::processing(10), Step::error(Some("PDF is encrypted"))],
    );

    let (tx, rx) = job_event_channel();
    JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL)
        .await
        .unwrap()
        .spawn();

    let events = collect(rx).await;
    let last = events.last().unwrap();
    assert!(last.is_terminal());
    match last {
        JobEvent::Failed { job, message } => {
            assert_eq!(job.error_detail.as_deref(), Some("PDF is encrypted"));
            assert!(message.contains("PDF is encrypted"));
        }
        other => panic!("期望 Failed，实际 {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_single_poll_failure_is_fatal() {
    let client = ScriptedJobClient::new();
    client.script(
        "resume.pdf",
        "abc123",
        vec![Step::Transport, Step::completed()],
    );
    client.set_result(sample_result("abc123", "resume.pdf"));

    let (tx, rx) = job_event_channel();
    JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL)
        .await
        .unwrap()
        .spawn();

    let events = collect(rx).await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        JobEvent::Failed { job, message } => {
            assert_eq!(job.state, JobState::Error);
            assert!(message.starts_with("无法查询 resume.pdf 的处理状态"));
        }
        other => panic!("期望 Failed，实际 {:?}", other),
    }

    tokio::time::sleep(POLL * 5).await;
    assert_eq!(client.status_calls("abc123"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_result_fetch_failure_becomes_error() {
    let client = ScriptedJobClient::new();
    client.script("resume.pdf", "abc123", vec![Step::completed()]);
    assert_err!(client.fetch_result("abc123").await);

    let (tx, rx) = job_event_channel();
    JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL)
        .await
        .unwrap()
        .spawn();

    let events = collect(rx).await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        JobEvent::Failed { job, message } => {
            assert_eq!(job.state, JobState::Error);
            assert!(job.error_detail.is_some());
            assert!(message.contains("无法获取 resume.pdf 的分类结果"));
        }
        other => panic!("期望 Failed，实际 {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_unknown_status_is_skipped() {
    let client = ScriptedJobClient::new();
    client.script(
        "resume.pdf",
        "abc123",
        vec![Step::raw("queued", 5), Step::processing(50), Step::completed()],
    );
    client.set_result(sample_result("abc123", "resume.pdf"));

    let (tx, rx) = job_event_channel();
    JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL)
        .await
        .unwrap()
        .spawn();

    let events = collect(rx).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].job().progress, 50);
    assert!(matches!(events[1], JobEvent::Completed { .. }));
    assert_eq!(client.status_calls("abc123"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_progress_regression_is_reported_as_is() {
    let client = ScriptedJobClient::new();
    client.script(
        "resume.pdf",
        "abc123",
        vec![
            Step::processing(70),
            Step::processing(30),
            Step::processing(30),
            Step::completed(),
        ],
    );
    client.set_result(sample_result("abc123", "resume.pdf"));

    let (tx, rx) = job_event_channel();
    JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL)
        .await
        .unwrap()
        .spawn();

    let progress: Vec<u32> = collect(rx)
        .await
        .iter()
        .filter(|e| !e.is_terminal())
        .map(|e| e.job().progress)
        .collect();
    assert_eq!(progress, vec![70, 30]);
}

#[tokio::test(start_paused = true)]
async fn test_mismatched_result_id_uses_job_id() {
    let client = ScriptedJobClient::new();
    client.script("resume.pdf", "abc123", vec![Step::completed()]);
    let mut result = sample_result("abc123", "resume.pdf");
    result.confidence = 1.7;
    result.timestamp = 0;
    client.set_result(result);
    // 服务端返回的 id 与任务 id 不一致
    client.rename_result("abc123", "other");

    let (tx, rx) = job_event_channel();
    JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL)
        .await
        .unwrap()
        .spawn();

    let events = collect(rx).await;
    match &events[0] {
        JobEvent::Completed { result, .. } => {
            assert_eq!(result.id, "abc123");
            assert_eq!(result.confidence, 1.0);
            assert!(result.timestamp > 0);
        }
        other => panic!("期望 Completed，实际 {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_response() {
    let gate = Gate::new();
    let client = ScriptedJobClient::new();
    client.script(
        "resume.pdf",
        "abc123",
        vec![gate.hold(StatusResponse::new(JobState::Completed, 100))],
    );
    client.set_result(sample_result("abc123", "resume.pdf"));

    let (tx, mut rx) = job_event_channel();
    let tracker = JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL)
        .await
        .unwrap();
    let handle = tracker.handle();
    let task = tracker.spawn();

    gate.entered.notified().await;
    handle.stop();
    handle.stop();
    assert!(handle.is_stopped());
    gate.release.notify_one();

    task.await.unwrap();
    assert!(rx.recv().await.is_none());
    assert_eq!(client.status_calls("abc123"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_first_poll() {
    let client = ScriptedJobClient::new();
    client.script("resume.pdf", "abc123", vec![Step::completed()]);
    client.set_result(sample_result("abc123", "resume.pdf"));

    let (tx, mut rx) = job_event_channel();
    let tracker = JobTracker::submit(client.clone(), &pdf("resume.pdf"), tx, POLL)
        .await
        .unwrap();
    tracker.handle().stop();
    tracker.spawn().await.unwrap();

    assert!(rx.recv().await.is_none());
    assert_eq!(client.status_calls("abc123"), 0);
}
