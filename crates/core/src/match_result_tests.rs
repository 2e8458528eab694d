use super::*;

#[test]
fn success_has_empty_error_message() {
    let r = MatchResult {
        match_id: MatchId::new("m1"),
        agent_results: vec![AgentResult {
            exit_code: 0,
            score: 1.0,
            status: AgentStatus::Ok,
            stderr: String::new(),
        }],
        error_message: String::new(),
        replay_path: Some(PathBuf::from("data/match_replays/m1.dat")),
        host_stderr: String::new(),
    };
    assert!(r.is_success());
}

#[test]
fn failure_carries_message_and_no_replay() {
    let r = MatchResult {
        match_id: MatchId::new("m1"),
        agent_results: vec![AgentResult::unknown_error("host crashed")],
        error_message: "game host exited unexpectedly".to_string(),
        replay_path: None,
        host_stderr: "panic: out of memory".to_string(),
    };
    assert!(!r.is_success());
    assert!(r.replay_path.is_none());
}

#[test]
fn cancelled_slot_has_zero_score() {
    let a = AgentResult::cancelled();
    assert_eq!(a.status, AgentStatus::Cancel);
    assert_eq!(a.score, 0.0);
}

#[test]
fn present_classifies_by_exit_code() {
    assert_eq!(AgentResult::present(0, 1.0, "").status, AgentStatus::Ok);
    assert_eq!(AgentResult::present(1, 0.0, "").status, AgentStatus::Re);
}
