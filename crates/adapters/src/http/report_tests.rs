use super::*;
use sbw_core::{AgentResult, AgentStatus, CodeId, Image, MatchId};

#[test]
fn build_result_body_uses_chinese_status_tags() {
    let success = BuildResult::success(CodeId::new("c1"), Image::new("img:c1"), "ok");
    let body = build_result_body(&success);
    assert_eq!(body["compile_status"], COMPILE_SUCCESS);

    let failure = BuildResult::failure(CodeId::new("c1"), "bad");
    let body = build_result_body(&failure);
    assert_eq!(body["compile_status"], COMPILE_FAILURE);
}

#[test]
fn match_result_states_carry_position_and_base64_stderr() {
    let result = MatchResult {
        match_id: MatchId::new("m1"),
        agent_results: vec![
            AgentResult::present(0, 1.0, "hi"),
            AgentResult::present(1, 0.0, ""),
        ],
        error_message: String::new(),
        replay_path: None,
        host_stderr: String::new(),
    };

    let states = match_result_states(&result);
    assert_eq!(states[0].position, 0);
    assert_eq!(states[0].status, "OK");
    assert_eq!(states[0].code, 0);
    assert_eq!(
        states[0].stderr,
        base64::engine::general_purpose::STANDARD.encode("hi")
    );
    assert_eq!(states[1].status, "RE");

    assert_eq!(match_result_scores(&result), vec![1.0, 0.0]);
}
