//! End-to-end conversation tests against the fixture campus

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use campus_nav::conversation::{
    ConversationMachine, ConversationPhase, NavResponseKind, NavigationOrchestrator,
};
use campus_nav::locale::{LocaleDataset, LocaleStore};
use campus_nav::{NavError, ReversePolicy};

fn fixture_store() -> Arc<LocaleStore> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/campus.yaml");
    let dataset = LocaleDataset::load_from_file(&path).unwrap();
    Arc::new(LocaleStore::from_datasets(vec![dataset], "en").unwrap())
}

fn orchestrator() -> NavigationOrchestrator {
    NavigationOrchestrator::new(ConversationMachine::new(fixture_store()))
}

#[tokio::test]
async fn test_main_building_to_library() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;

    orch.select_origin(id, "Main Building").await.unwrap();
    let resp = orch.select_destination(id, "Library").await.unwrap();
    assert!(matches!(
        resp.kind,
        NavResponseKind::RouteStarted { total_steps: 6, .. }
    ));

    // Six controls, honouring the milestone on the third step
    let mut calls = 0;
    loop {
        let session = orch.get_session(id).await.unwrap();
        if session.phase != ConversationPhase::Navigating {
            break;
        }
        if session.waiting_for_milestone {
            orch.confirm_milestone(id).await.unwrap();
        } else {
            orch.request_advance(id).await.unwrap();
        }
        calls += 1;
        assert!(calls <= 6, "route did not finish");
    }
    assert_eq!(calls, 6);

    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.phase, ConversationPhase::AwaitingPostArrivalChoice);
    assert_eq!(session.current_location.as_deref(), Some("Library"));
    assert!(session.destination.is_none());
    assert!(session.resolved_path.is_none());
    assert_eq!(
        session.last_message().unwrap().content,
        "You've reached your destination: Library! Would you like to get directions to somewhere else or end the navigation?"
    );
}

#[tokio::test]
async fn test_milestone_step_waits_for_confirmation() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;
    orch.select_origin(id, "Main Building").await.unwrap();
    orch.select_destination(id, "Library").await.unwrap();
    orch.request_advance(id).await.unwrap();

    let resp = orch.request_advance(id).await.unwrap();
    match resp.kind {
        NavResponseKind::Step { step } => {
            assert_eq!(step.index, 2);
            assert!(step.milestone);
            assert_eq!(step.direction, "Pass by the fountain (milestone)");
            assert_eq!(step.display, "Pass by the fountain");
        }
        other => panic!("unexpected kind: {:?}", other),
    }
    assert!(resp.waiting_for_milestone);

    let resp = orch.request_advance(id).await.unwrap();
    assert!(resp.is_error());
    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.step_index, 2);
}

#[tokio::test]
async fn test_destination_equal_to_origin_is_rejected() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;
    orch.select_origin(id, "Library").await.unwrap();

    for _ in 0..2 {
        let resp = orch.select_destination(id, "library").await.unwrap();
        assert!(matches!(resp.kind, NavResponseKind::AlreadyThere { .. }));
        assert_eq!(
            resp.bot_messages().collect::<Vec<_>>(),
            vec!["You're already at that location! Please choose a different destination."]
        );
    }

    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.phase, ConversationPhase::CollectingDestination);
    assert!(session.destination.is_none());
}

#[tokio::test]
async fn test_unconnected_destination_reprompts() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;
    orch.select_origin(id, "Dormitory A").await.unwrap();
    let resp = orch.select_destination(id, "Parking Lot").await.unwrap();

    assert_eq!(
        resp.error,
        Some(NavError::NoPathFound {
            from: "Dormitory A".to_string(),
            to: "Parking Lot".to_string()
        })
    );
    assert_eq!(resp.phase, ConversationPhase::CollectingDestination);
}

#[tokio::test]
async fn test_free_text_conversation() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;

    orch.submit_text(id, "hi").await.unwrap();
    orch.submit_text(id, "main building").await.unwrap();
    let resp = orch.submit_text(id, "science").await.unwrap();
    assert!(matches!(resp.kind, NavResponseKind::RouteStarted { .. }));

    orch.submit_text(id, "next").await.unwrap();
    orch.submit_text(id, "continue").await.unwrap();
    let session = orch.get_session(id).await.unwrap();
    assert!(session.waiting_for_milestone);

    // Navigation phrases are ignored while a landmark is pending
    let resp = orch.submit_text(id, "next").await.unwrap();
    assert!(matches!(resp.kind, NavResponseKind::Clarification { .. }));

    orch.submit_text(id, "I'm here").await.unwrap();
    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.step_index, 3);
    assert!(!session.waiting_for_milestone);
}

#[tokio::test(start_paused = true)]
async fn test_end_session_resets_after_delay() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;
    walk_to_library(&orch, id).await;

    let resp = orch.end_session(id).await.unwrap();
    assert_eq!(
        resp.kind,
        NavResponseKind::SessionEnded {
            reset_after_ms: 3000
        }
    );

    tokio::time::sleep(Duration::from_millis(3100)).await;
    tokio::task::yield_now().await;

    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.phase, ConversationPhase::CollectingOrigin);
    assert_eq!(session.messages.len(), 1);
    assert!(session.pending_reset.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stale_reset_does_not_wipe_new_conversation() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;
    walk_to_library(&orch, id).await;

    orch.end_session(id).await.unwrap();
    orch.select_origin(id, "Student Union").await.unwrap();
    let transcript_len = orch.get_session(id).await.unwrap().messages.len();

    tokio::time::sleep(Duration::from_secs(10)).await;
    tokio::task::yield_now().await;

    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.phase, ConversationPhase::CollectingDestination);
    assert_eq!(session.current_location.as_deref(), Some("Student Union"));
    assert_eq!(session.messages.len(), transcript_len);
}

#[tokio::test(start_paused = true)]
async fn test_locale_switch_after_end_still_resets() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;
    walk_to_library(&orch, id).await;

    orch.end_session(id).await.unwrap();
    let resp = orch.set_locale(id, "en").await.unwrap();
    assert!(resp.scheduled_reset.is_none());

    tokio::time::sleep(Duration::from_secs(10)).await;
    tokio::task::yield_now().await;

    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.messages.len(), 1);
    assert!(session.pending_reset.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unrecognized_text_after_end_still_resets() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;
    walk_to_library(&orch, id).await;

    orch.end_session(id).await.unwrap();
    let resp = orch.submit_text(id, "ok thanks").await.unwrap();
    assert!(matches!(resp.kind, NavResponseKind::Clarification { .. }));

    tokio::time::sleep(Duration::from_secs(10)).await;
    tokio::task::yield_now().await;

    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.phase, ConversationPhase::CollectingOrigin);
    assert_eq!(session.messages.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_typed_origin_after_end_survives_reset() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;
    walk_to_library(&orch, id).await;

    orch.end_session(id).await.unwrap();
    orch.submit_text(id, "student union").await.unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    tokio::task::yield_now().await;

    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.phase, ConversationPhase::CollectingDestination);
    assert_eq!(session.current_location.as_deref(), Some("Student Union"));
}

#[tokio::test(start_paused = true)]
async fn test_reset_timer_for_deleted_session_is_harmless() {
    let orch = orchestrator();
    let id = orch.create_session("en").await;
    walk_to_library(&orch, id).await;
    orch.end_session(id).await.unwrap();
    assert!(orch.delete_session(id).await);

    tokio::time::sleep(Duration::from_secs(5)).await;
    tokio::task::yield_now().await;
    assert_eq!(orch.session_count().await, 0);
}

#[tokio::test]
async fn test_mirrored_reverse_route_in_conversation() {
    let machine = ConversationMachine::new(fixture_store()).with_policy(ReversePolicy::ReverseAndMirror);
    let orch = NavigationOrchestrator::new(machine);
    let id = orch.create_session("en").await;

    orch.select_origin(id, "Library").await.unwrap();
    let resp = orch.select_destination(id, "Main Building").await.unwrap();
    match resp.kind {
        NavResponseKind::RouteStarted { step, .. } => {
            assert_eq!(step.direction, "The Library will be on your left");
        }
        other => panic!("unexpected kind: {:?}", other),
    }
}

async fn walk_to_library(orch: &NavigationOrchestrator, id: uuid::Uuid) {
    orch.select_origin(id, "Main Building").await.unwrap();
    orch.select_destination(id, "Library").await.unwrap();
    orch.request_advance(id).await.unwrap();
    orch.request_advance(id).await.unwrap();
    orch.confirm_milestone(id).await.unwrap();
    orch.request_advance(id).await.unwrap();
    orch.request_advance(id).await.unwrap();
    orch.request_advance(id).await.unwrap();
    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.phase, ConversationPhase::AwaitingPostArrivalChoice);
}
