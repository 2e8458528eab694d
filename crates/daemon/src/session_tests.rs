use super::*;
use crate::transport::fake::FakeConnector;
use sbw_adapters::{FakeContainerRuntime, FakeDownloader, FakeReporter};
use sbw_engine::{ArtifactCache, BuildEngine, JudgeConfig, JudgeEngine, PathManager};
use std::time::Duration;

type TestSession = CoordinatorSession<FakeDownloader, FakeContainerRuntime, FakeReporter, FakeConnector>;

fn test_ctx(tmp: &std::path::Path) -> Arc<TaskContext<FakeDownloader, FakeContainerRuntime, FakeReporter>> {
    let downloader = FakeDownloader::new();
    let runtime = FakeContainerRuntime::new();
    let paths = PathManager::new(tmp);
    let config = JudgeConfig {
        agent_cpus: 1.0,
        agent_mem_limit_bytes: 1 << 30,
        game_host_cpus: 1.0,
        game_host_mem_limit_bytes: 1 << 30,
        judge_timeout: Duration::from_secs(5),
    };

    Arc::new(TaskContext::new(
        "https://example.test",
        Arc::new(ArtifactCache::new(downloader, paths.clone())),
        Arc::new(BuildEngine::new(runtime.clone(), Duration::from_secs(60))),
        Arc::new(JudgeEngine::new(runtime, paths, config)),
        Arc::new(FakeReporter::new()),
    ))
}

fn test_session(tmp: &std::path::Path, connector: FakeConnector) -> TestSession {
    CoordinatorSession::new(
        "worker-1",
        "wss://coordinator.example/ws",
        Image::new("host-image:latest"),
        TaskScheduler::new(),
        test_ctx(tmp),
        connector,
    )
}

#[tokio::test]
async fn init_frame_is_sent_first_on_every_connection() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let connector = FakeConnector::new();
    connector.push_connection(vec![]);
    let session = test_session(tmp.path(), connector.clone());

    let _ = tokio::time::timeout(Duration::from_millis(100), session.run()).await;

    let sent = connector.sent();
    assert!(!sent.is_empty());
    assert_eq!(sent[0]["type"], "init");
    assert_eq!(sent[0]["data"]["description"], "worker-1");
}

#[tokio::test]
async fn redials_with_backoff_and_resends_init_each_time() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let connector = FakeConnector::new();
    connector.push_connection(vec![]);
    connector.push_connection(vec![]);
    let session = test_session(tmp.path(), connector.clone());

    let _ = tokio::time::timeout(Duration::from_millis(900), session.run()).await;

    assert!(connector.connect_count() >= 2);
    let init_count = connector.sent().iter().filter(|f| f["type"] == "init").count();
    assert!(init_count >= 2);
}

#[tokio::test]
async fn connect_failure_is_retried() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let connector = FakeConnector::new();
    connector.push_connect_failure("refused");
    connector.push_connection(vec![]);
    let session = test_session(tmp.path(), connector.clone());

    let _ = tokio::time::timeout(Duration::from_millis(900), session.run()).await;

    assert!(connector.connect_count() >= 2);
    assert!(connector.sent().iter().any(|f| f["type"] == "init"));
}

#[tokio::test]
async fn compilation_task_frame_schedules_a_build_task() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let connector = FakeConnector::new();
    connector.push_connection(vec![
        r#"{"type":"compilation_task","data":{"code_id":"c1"}}"#.to_string(),
    ]);
    let session = test_session(tmp.path(), connector);

    let _ = tokio::time::timeout(Duration::from_millis(100), session.run()).await;

    assert!(!session.scheduler().idle());
}

#[tokio::test]
async fn judge_task_frame_schedules_a_judge_task_carrying_its_match_id() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let connector = FakeConnector::new();
    connector.push_connection(vec![
        r#"{"type":"judge_task","data":{"match_id":"m1","players":[{"code_id":"c1"},{"code_id":null}]}}"#
            .to_string(),
    ]);
    let session = test_session(tmp.path(), connector);

    let scheduler = session.scheduler().clone();
    let worker = scheduler.clone();
    tokio::spawn(async move { worker.start().await });

    let _ = tokio::time::timeout(Duration::from_millis(100), session.run()).await;

    let done = tokio::time::timeout(Duration::from_secs(2), scheduler.pop_done_task())
        .await
        .expect("a task finished");
    assert_eq!(done.match_id(), Some(&sbw_core::MatchId::new("m1")));
}

#[tokio::test]
async fn unrecognized_frame_type_does_not_break_the_receive_loop() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let connector = FakeConnector::new();
    connector.push_connection(vec![
        r#"{"type":"ping"}"#.to_string(),
        r#"{"type":"compilation_task","data":{"code_id":"c1"}}"#.to_string(),
    ]);
    let session = test_session(tmp.path(), connector);

    let _ = tokio::time::timeout(Duration::from_millis(100), session.run()).await;

    assert!(!session.scheduler().idle());
}
