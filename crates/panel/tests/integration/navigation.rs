use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use stepdeck_bus::LocalBroker;
use stepdeck_panel::{FocusTracker, Intent, Interaction, LoadPhase, PanelView};
use stepdeck_wire::{Command, StateChannel};

use crate::common::{Views, init_tracing, open, publish_protocol};

#[tokio::test]
async fn advance_at_last_step_inserts_a_step() {
	init_tracing();
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 2, 1);
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	panel.drain_inbound();

	panel.handle_intent(Intent::Advance).await.unwrap();
	assert_eq!(broker.take_published(), [Command::insert_step(1)]);
}

#[tokio::test]
async fn retreat_from_first_step_wraps_to_last() {
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 2, 0);
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	panel.drain_inbound();

	panel.handle_intent(Intent::Retreat).await.unwrap();
	assert_eq!(broker.take_published(), [Command::step_number(1)]);
}

#[tokio::test]
async fn local_actions_wait_for_republication() {
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 3, 0);
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	panel.drain_inbound();

	panel.handle_intent(Intent::Advance).await.unwrap();
	panel.handle_intent(Intent::Advance).await.unwrap();
	assert_eq!(panel.state().current_step_index(), Some(0));
	assert_eq!(broker.take_published(), [Command::step_number(1)], "second put coalesced");

	broker.publish_json(StateChannel::StepNumber, &json!({ "stepNumber": 1 }));
	panel.drain_inbound();
	assert_eq!(panel.state().current_step_index(), Some(1));
	panel.handle_intent(Intent::Advance).await.unwrap();
	assert_eq!(broker.take_published(), [Command::step_number(2)]);
}

#[tokio::test]
async fn editing_a_row_other_than_current_selects_it() {
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 2, 0);
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	panel.drain_inbound();

	panel
		.handle_intent(Intent::BeginEdit {
			step: 1,
			key: "volts".into(),
		})
		.await
		.unwrap();
	assert_eq!(broker.take_published(), [Command::step_number(1)]);
	assert!(panel.editing().is_none());
}

#[tokio::test]
async fn committed_edit_sends_update_step() {
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 2, 1);
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	panel.drain_inbound();

	panel
		.handle_intent(Intent::BeginEdit {
			step: 1,
			key: "volts".into(),
		})
		.await
		.unwrap();
	assert_eq!(panel.editing().map(|s| s.original.clone()), Some(json!(2)));

	panel.handle_intent(Intent::CommitEdit { value: json!("4.5") }).await.unwrap();
	assert_eq!(broker.take_published(), [Command::update_step(1, "volts", json!(4.5))]);
	assert!(panel.editing().is_none());
}

#[tokio::test]
async fn editor_closes_when_current_step_moves() {
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 2, 1);
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	panel.drain_inbound();

	panel
		.handle_intent(Intent::BeginEdit {
			step: 1,
			key: "volts".into(),
		})
		.await
		.unwrap();
	assert!(panel.editing().is_some());

	broker.publish_json(StateChannel::StepNumber, &json!({ "stepNumber": 0 }));
	panel.drain_inbound();
	assert!(panel.editing().is_none());
}

#[tokio::test]
async fn nothing_renders_or_navigates_before_readiness() {
	let broker = Arc::new(LocalBroker::new());
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	assert_eq!(views.last(), Some(PanelView::Loading(LoadPhase::Empty)));

	broker.publish_json(StateChannel::ProtocolSkeleton, &json!({ "name": "A" }));
	broker.publish_json(StateChannel::StepNumber, &json!({ "stepNumber": 0 }));
	panel.drain_inbound();
	assert_eq!(views.last(), Some(PanelView::Loading(LoadPhase::PartiallyLoaded)));

	panel.handle_intent(Intent::Advance).await.unwrap();
	panel.handle_intent(Intent::RemoveCurrent).await.unwrap();
	assert!(broker.published().is_empty());

	broker.publish_json(StateChannel::Steps, &json!([{ "step": 0 }]));
	broker.publish_json(StateChannel::Schema, &json!([{ "step": {} }]));
	panel.drain_inbound();
	assert!(matches!(views.last(), Some(PanelView::Grid(_))));
}

#[tokio::test]
async fn background_panel_ignores_navigation() {
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "B", 2, 0);
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	panel.drain_inbound();

	let Some(PanelView::Grid(grid)) = views.last() else {
		panic!("expected a grid");
	};
	assert_eq!(grid.interaction, Interaction::Background);

	for intent in [
		Intent::Advance,
		Intent::Retreat,
		Intent::RemoveCurrent,
		Intent::BeginEdit {
			step: 1,
			key: "volts".into(),
		},
	] {
		panel.handle_intent(intent).await.unwrap();
	}
	assert!(broker.published().is_empty());
}

#[tokio::test]
async fn identical_views_are_presented_once() {
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 2, 0);
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	panel.drain_inbound();
	let presented = views.len();

	broker.publish_json(StateChannel::StepNumber, &json!({ "stepNumber": 0 }));
	broker.publish_json(StateChannel::Steps, &json!([{ "step": 0, "volts": 1 }, { "step": 1, "volts": 2 }]));
	panel.drain_inbound();
	assert_eq!(views.len(), presented);
}
