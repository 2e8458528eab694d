use super::*;
use crate::build_engine::BuildEngine;
use crate::cache::ArtifactCache;
use crate::judge_engine::{JudgeConfig, JudgeEngine};
use crate::paths::PathManager;
use crate::task::{BuildTask, Task, TaskContext};
use sbw_adapters::{FakeContainerRuntime, FakeDownloader, FakeReporter};
use sbw_core::CodeId;
use std::time::Duration;

type TestScheduler = TaskScheduler<FakeDownloader, FakeContainerRuntime, FakeReporter>;
type TestCtx = Arc<TaskContext<FakeDownloader, FakeContainerRuntime, FakeReporter>>;

fn test_ctx(tmp: &std::path::Path) -> TestCtx {
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

fn build_task(id: &str, ctx: &TestCtx) -> Task<FakeDownloader, FakeContainerRuntime, FakeReporter> {
    Task::Build(BuildTask::new(CodeId::new(id), Arc::clone(ctx)))
}

#[tokio::test]
async fn idle_is_true_only_when_pending_queue_is_empty() {
    let scheduler = TestScheduler::new();
    let tmp = tempfile::tempdir().expect("tempdir");
    let ctx = test_ctx(tmp.path());

    assert!(scheduler.idle());
    scheduler.schedule(build_task("c1", &ctx));
    assert!(!scheduler.idle());

    let worker = scheduler.clone();
    tokio::spawn(async move { worker.start().await });

    let done = scheduler.pop_done_task().await;
    assert_eq!(done.match_id(), None);
    assert!(scheduler.idle());
}

#[tokio::test]
async fn completion_order_matches_schedule_order() {
    let scheduler = TestScheduler::new();
    let tmp = tempfile::tempdir().expect("tempdir");
    let ctx = test_ctx(tmp.path());

    scheduler.schedule(build_task("c1", &ctx));
    scheduler.schedule(build_task("c2", &ctx));
    scheduler.schedule(build_task("c3", &ctx));

    let worker = scheduler.clone();
    tokio::spawn(async move { worker.start().await });

    let mut ids = Vec::new();
    for _ in 0..3 {
        let task = scheduler.pop_done_task().await;
        if let Task::Build(b) = task {
            ids.push(b.code_id().clone());
        }
    }

    assert_eq!(
        ids,
        vec![CodeId::new("c1"), CodeId::new("c2"), CodeId::new("c3")]
    );
}

#[tokio::test]
async fn clean_drains_pending_without_executing() {
    let scheduler = TestScheduler::new();
    let tmp = tempfile::tempdir().expect("tempdir");
    let ctx = test_ctx(tmp.path());

    scheduler.schedule(build_task("c1", &ctx));
    scheduler.schedule(build_task("c2", &ctx));
    assert!(!scheduler.idle());

    scheduler.clean();
    assert!(scheduler.idle());
}
