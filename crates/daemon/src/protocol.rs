// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON frame shapes for the coordinator control channel: `{"type": ..,
//! "data": ..}`, with `data` omitted entirely for frames that carry none
//! (`heart_beat`). Grounded in `saiblo_client.py`'s literal frame
//! construction.

use sbw_core::{CodeId, MatchId};
use serde::Deserialize;
use serde_json::{json, Value};

/// A frame this worker sends to the coordinator.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    Init { description: String },
    HeartBeat,
    RequestJudgeTask,
    FinishJudgeTask { match_id: MatchId },
}

impl OutboundFrame {
    pub fn to_json(&self) -> Value {
        match self {
            OutboundFrame::Init { description } => json!({
                "type": "init",
                "data": { "description": description, "address": "" },
            }),
            OutboundFrame::HeartBeat => json!({ "type": "heart_beat" }),
            OutboundFrame::RequestJudgeTask => json!({
                "type": "request_judge_task",
                "data": { "queue": 0 },
            }),
            OutboundFrame::FinishJudgeTask { match_id } => json!({
                "type": "finish_judge_task",
                "data": { "match_id": match_id.as_str() },
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlayerRef {
    code_id: Option<CodeId>,
}

#[derive(Debug, Deserialize)]
struct CompilationTaskData {
    code_id: CodeId,
}

#[derive(Debug, Deserialize)]
struct JudgeTaskData {
    match_id: MatchId,
    players: Vec<PlayerRef>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    data: Option<Value>,
}

/// A frame received from the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    CompilationTask { code_id: CodeId },
    JudgeTask { match_id: MatchId, agent_code_ids: Vec<Option<CodeId>> },
}

/// Decode a coordinator frame. Returns `Ok(None)` for a well-formed frame of
/// an unrecognized `type` — those are ignored, not errors — and `Err` only
/// for malformed JSON or a recognized type with the wrong shape.
pub fn decode(raw: &str) -> Result<Option<InboundFrame>, serde_json::Error> {
    let envelope: Envelope = serde_json::from_str(raw)?;

    match envelope.kind.as_str() {
        "compilation_task" => {
            let data = envelope.data.unwrap_or(Value::Null);
            let data: CompilationTaskData = serde_json::from_value(data)?;
            Ok(Some(InboundFrame::CompilationTask { code_id: data.code_id }))
        }
        "judge_task" => {
            let data = envelope.data.unwrap_or(Value::Null);
            let data: JudgeTaskData = serde_json::from_value(data)?;
            Ok(Some(InboundFrame::JudgeTask {
                match_id: data.match_id,
                agent_code_ids: data.players.into_iter().map(|p| p.code_id).collect(),
            }))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
