use super::*;

#[test]
fn init_frame_omits_no_fields() {
    let frame = OutboundFrame::Init { description: "worker-1".to_string() };
    assert_eq!(
        frame.to_json(),
        json!({"type": "init", "data": {"description": "worker-1", "address": ""}})
    );
}

#[test]
fn heart_beat_frame_has_no_data_key() {
    let value = OutboundFrame::HeartBeat.to_json();
    assert_eq!(value, json!({"type": "heart_beat"}));
    assert!(value.get("data").is_none());
}

#[test]
fn request_judge_task_frame_shape() {
    let value = OutboundFrame::RequestJudgeTask.to_json();
    assert_eq!(value, json!({"type": "request_judge_task", "data": {"queue": 0}}));
}

#[test]
fn finish_judge_task_frame_shape() {
    let value = OutboundFrame::FinishJudgeTask { match_id: MatchId::new("m1") }.to_json();
    assert_eq!(value, json!({"type": "finish_judge_task", "data": {"match_id": "m1"}}));
}

#[test]
fn decodes_compilation_task() {
    let raw = r#"{"type":"compilation_task","data":{"code_id":"c1"}}"#;
    let frame = decode(raw).expect("decode").expect("recognized");
    assert_eq!(frame, InboundFrame::CompilationTask { code_id: CodeId::new("c1") });
}

#[test]
fn decodes_judge_task_with_mixed_slots() {
    let raw = r#"{"type":"judge_task","data":{"match_id":"m1","players":[{"code_id":"c1"},{"code_id":null}]}}"#;
    let frame = decode(raw).expect("decode").expect("recognized");
    assert_eq!(
        frame,
        InboundFrame::JudgeTask {
            match_id: MatchId::new("m1"),
            agent_code_ids: vec![Some(CodeId::new("c1")), None],
        }
    );
}

#[test]
fn unknown_frame_type_is_ignored_not_an_error() {
    let raw = r#"{"type":"something_new","data":{"whatever":1}}"#;
    let frame = decode(raw).expect("decode");
    assert!(frame.is_none());
}

#[test]
fn malformed_json_is_an_error() {
    assert!(decode("not json").is_err());
}
