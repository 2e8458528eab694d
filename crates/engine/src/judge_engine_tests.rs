use super::*;
use sbw_adapters::{ContainerCall, FakeContainerRuntime};
use sbw_core::AgentStatus;
use std::time::Duration;

fn test_config() -> JudgeConfig {
    JudgeConfig {
        agent_cpus: 1.0,
        agent_mem_limit_bytes: 1 << 30,
        game_host_cpus: 1.0,
        game_host_mem_limit_bytes: 1 << 30,
        judge_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn normal_match_reports_ok_and_cancel_slots() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let runtime = FakeContainerRuntime::new();
    let engine = JudgeEngine::new(runtime, PathManager::new(tmp.path()), test_config());

    let slots = vec![Some(Image::new("saiblo-worker-image:agent")), None];
    let result = engine
        .judge(&MatchId::new("m1"), &Image::new("host-image:latest"), &slots)
        .await
        .expect("judge");

    assert!(result.is_success());
    assert_eq!(result.agent_results.len(), 2);
    assert_eq!(result.agent_results[0].status, AgentStatus::Ok);
    assert_eq!(result.agent_results[0].exit_code, 0);
    assert_eq!(result.agent_results[1].status, AgentStatus::Cancel);
    assert_eq!(result.agent_results[1].exit_code, 0);
    assert!(result.replay_path.is_some());
}

#[tokio::test]
async fn cleanup_removes_every_container_and_network_from_this_call() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let runtime = FakeContainerRuntime::new();
    let engine = JudgeEngine::new(runtime.clone(), PathManager::new(tmp.path()), test_config());

    let slots = vec![Some(Image::new("saiblo-worker-image:agent"))];
    engine
        .judge(&MatchId::new("m2"), &Image::new("host-image:latest"), &slots)
        .await
        .expect("judge");

    assert!(runtime.list_containers("saiblo-worker-game-host-m2").await.expect("list").is_empty());
    assert!(runtime.list_containers("saiblo-worker-agent-m2").await.expect("list").is_empty());
    assert!(runtime.list_networks("saiblo-worker-network-m2").await.expect("list").is_empty());
}

#[tokio::test]
async fn judging_twice_is_idempotent_and_starts_no_containers_the_second_time() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let runtime = FakeContainerRuntime::new();
    let engine = JudgeEngine::new(runtime.clone(), PathManager::new(tmp.path()), test_config());

    let slots: Vec<AgentSlot> = vec![];
    let first = engine
        .judge(&MatchId::new("m3"), &Image::new("host-image:latest"), &slots)
        .await
        .expect("first judge");

    let run_calls_before = runtime.calls().iter().filter(|c| matches!(c, ContainerCall::Run { .. })).count();

    let second = engine
        .judge(&MatchId::new("m3"), &Image::new("host-image:latest"), &slots)
        .await
        .expect("second judge");

    let run_calls_after = runtime.calls().iter().filter(|c| matches!(c, ContainerCall::Run { .. })).count();

    assert_eq!(first, second);
    assert_eq!(run_calls_before, run_calls_after);
}

#[tokio::test]
async fn host_timeout_fails_the_match_without_a_replay() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let runtime = FakeContainerRuntime::new();
    runtime.never_exit_containers_matching("saiblo-worker-game-host-m4");
    let mut config = test_config();
    config.judge_timeout = Duration::from_millis(50);
    let engine = JudgeEngine::new(runtime.clone(), PathManager::new(tmp.path()), config);

    let slots: Vec<AgentSlot> = vec![];
    let result = engine
        .judge(&MatchId::new("m4"), &Image::new("host-image:latest"), &slots)
        .await
        .expect("judge never errors at the call boundary");

    assert!(!result.is_success());
    assert!(!result.error_message.is_empty());
    assert!(result.replay_path.is_none());
    assert!(runtime.list_containers("saiblo-worker-game-host-m4").await.expect("list").is_empty());
}

#[tokio::test]
async fn agent_tokens_are_unique_within_a_match() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let runtime = FakeContainerRuntime::new();
    let engine = JudgeEngine::new(runtime.clone(), PathManager::new(tmp.path()), test_config());

    let slots = vec![
        Some(Image::new("saiblo-worker-image:a")),
        Some(Image::new("saiblo-worker-image:b")),
    ];
    engine
        .judge(&MatchId::new("m5"), &Image::new("host-image:latest"), &slots)
        .await
        .expect("judge");

    let host_spec = runtime
        .calls()
        .into_iter()
        .find_map(|c| match c {
            ContainerCall::Run { spec_name, .. } if spec_name == "saiblo-worker-game-host-m5" => Some(spec_name),
            _ => None,
        });
    assert!(host_spec.is_some());
}

#[tokio::test]
async fn agent_that_already_exited_nonzero_is_reported_as_re() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let runtime = FakeContainerRuntime::new();
    // The agent container crashes and exits on its own, before the judger
    // ever force-stops it: exit-code settlement must still see the real
    // (nonzero) code rather than the force-stop fallback of 0.
    runtime.preset_exit_code_for_matching("saiblo-worker-agent-m8", 7);
    let engine = JudgeEngine::new(runtime.clone(), PathManager::new(tmp.path()), test_config());

    let slots = vec![Some(Image::new("saiblo-worker-image:agent"))];
    let result = engine
        .judge(&MatchId::new("m8"), &Image::new("host-image:latest"), &slots)
        .await
        .expect("judge");

    assert_eq!(result.agent_results[0].exit_code, 7);
    assert_eq!(result.agent_results[0].status, AgentStatus::Re);
}

#[tokio::test]
async fn list_returns_every_persisted_result() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let runtime = FakeContainerRuntime::new();
    let engine = JudgeEngine::new(runtime, PathManager::new(tmp.path()), test_config());

    let slots: Vec<AgentSlot> = vec![];
    engine
        .judge(&MatchId::new("m6"), &Image::new("host-image:latest"), &slots)
        .await
        .expect("judge");

    let all = engine.list().await.expect("list");
    assert_eq!(all.len(), 1);
    assert!(all.contains_key(&MatchId::new("m6")));
}

#[tokio::test]
async fn clean_wipes_replay_and_result_directories() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let runtime = FakeContainerRuntime::new();
    let engine = JudgeEngine::new(runtime, PathManager::new(tmp.path()), test_config());

    let slots: Vec<AgentSlot> = vec![];
    engine
        .judge(&MatchId::new("m7"), &Image::new("host-image:latest"), &slots)
        .await
        .expect("judge");

    engine.clean().await.expect("clean");
    assert!(engine.list().await.expect("list").is_empty());
}
