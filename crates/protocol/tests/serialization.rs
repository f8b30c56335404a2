//! Wire-format round-trip tests for the shared protocol types.

use sr_protocol::{
    ApprovalStatus, BlockType, DraftBlock, Event, Op, PipelinePhase, PipelineState,
    ResearchDossier, ScriptBlock, Stage, TopicSuggestion,
};
use uuid::Uuid;

#[test]
fn test_op_start_pipeline_tagged_shape() {
    let op = Op::StartPipeline {
        topic: "Why this port went silent".to_string(),
    };
    let json = serde_json::to_value(&op).unwrap();
    assert_eq!(json["type"], "startPipeline");
    assert_eq!(json["payload"]["topic"], "Why this port went silent");

    let back: Op = serde_json::from_value(json).unwrap();
    assert!(matches!(back, Op::StartPipeline { topic } if topic.contains("port")));
}

#[test]
fn test_op_approve_stage_with_edit() {
    let op = Op::ApproveStage {
        edited_output: Some("operator-edited brief".to_string()),
    };
    let json = serde_json::to_string(&op).unwrap();
    let back: Op = serde_json::from_str(&json).unwrap();
    assert!(matches!(back, Op::ApproveStage { edited_output: Some(s) } if s.starts_with("operator")));
}

#[test]
fn test_stage_wire_names_are_lowercase() {
    assert_eq!(serde_json::to_string(&Stage::Scout).unwrap(), "\"scout\"");
    assert_eq!(serde_json::to_string(&Stage::Narrate).unwrap(), "\"narrate\"");
    let back: Stage = serde_json::from_str("\"architect\"").unwrap();
    assert_eq!(back, Stage::Architect);
}

#[test]
fn test_approval_status_screaming_snake_case() {
    let json = serde_json::to_string(&ApprovalStatus::WaitingForApproval).unwrap();
    assert_eq!(json, "\"WAITING_FOR_APPROVAL\"");
}

#[test]
fn test_pipeline_state_round_trip() {
    let mut state = PipelineState::new(true);
    state.phase = PipelinePhase::Stage(Stage::Research);
    state.is_processing = true;
    state.topic = "Topic".to_string();
    state.logs.push("[scout] done".to_string());
    state.outputs.scout = Some(vec![TopicSuggestion {
        title: "T".to_string(),
        hook: "H".to_string(),
        viral_factor: "Fear/FOMO".to_string(),
    }]);

    let json = serde_json::to_string(&state).unwrap();
    let back: PipelineState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
}

#[test]
fn test_event_state_changed_round_trip() {
    let event = Event::StateChanged {
        run_id: Uuid::new_v4(),
        state: PipelineState::default(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "stateChanged");
    let back: Event = serde_json::from_value(json).unwrap();
    assert!(matches!(back, Event::StateChanged { .. }));
}

#[test]
fn test_script_block_camel_case_fields() {
    let block = ScriptBlock {
        block_type: BlockType::Outro,
        raw_text: "And that is the real story.".to_string(),
        visual_description: "Smash cut to black.".to_string(),
        secondary_text: "THE END?".to_string(),
        timecode_start: 700,
        timecode_end: 703,
        media_ref: None,
    };
    let json = serde_json::to_value(&block).unwrap();
    assert_eq!(json["blockType"], "OUTRO");
    assert_eq!(json["rawText"], "And that is the real story.");
    assert_eq!(json["timecodeStart"], 700);
    // An unset media reference stays off the wire entirely.
    assert!(json.get("mediaRef").is_none());
}

#[test]
fn test_draft_block_rejects_narration_with_extra_fields() {
    // The narration model occasionally invents fields; strict decoding has
    // to reject them rather than guess.
    let raw = r#"[{"blockType":"BODY","audioScript":"Look at this.","visualCue":"[MAP]","mood":"tense"}]"#;
    assert!(serde_json::from_str::<Vec<DraftBlock>>(raw).is_err());
}

#[test]
fn test_research_dossier_rejects_unknown_fields() {
    let raw = r#"{"topic":"t","claims":[],"counterClaims":[],"visualAnchors":[],"summary":"x"}"#;
    assert!(serde_json::from_str::<ResearchDossier>(raw).is_err());

    let ok = r#"{"topic":"t","claims":["a"],"counterClaims":[],"visualAnchors":["v"]}"#;
    let dossier: ResearchDossier = serde_json::from_str(ok).unwrap();
    assert!(dossier.data_points.is_empty());
}
