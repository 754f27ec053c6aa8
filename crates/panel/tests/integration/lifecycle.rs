use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use stepdeck_bus::{LocalBroker, TransportError};
use stepdeck_panel::{FocusTracker, Intent, PanelError, PanelId, PanelRecord, PanelView};
use stepdeck_wire::{Command, Request, StateChannel};
use tokio::sync::mpsc;

use crate::common::{Views, init_tracing, open, publish_protocol, wait_until};

#[tokio::test]
async fn unbound_panel_binds_to_new_protocol() {
	init_tracing();
	let broker = Arc::new(LocalBroker::new());
	broker.respond("protocol-model/new-protocol", |_| Ok(json!({ "name": "Protocol 3" })));
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", None, &views);

	let record = panel.bootstrap().await.unwrap();
	assert_eq!(
		record,
		PanelRecord {
			id: PanelId::new("p"),
			bound_protocol: Some("Protocol 3".into()),
		}
	);
	assert_eq!(broker.requests(), [Request::new_protocol()]);
	assert!(broker.published().is_empty(), "unfocused panel does not switch");
}

#[tokio::test]
async fn focused_new_panel_switches_to_its_protocol() {
	let broker = Arc::new(LocalBroker::new());
	broker.respond("protocol-model/new-protocol", |_| {
		Ok(Value::String(r#"{"name":"Protocol 3"}"#.into()))
	});
	publish_protocol(&broker, "A", 1, 0);
	let focus = FocusTracker::new();
	focus.focus(PanelId::new("p"));
	let views = Views::default();
	let mut panel = open(&broker, &focus, "p", None, &views);
	panel.drain_inbound();

	panel.bootstrap().await.unwrap();
	assert_eq!(panel.state().bound_protocol(), Some("Protocol 3"));
	assert_eq!(broker.take_published(), [Command::change_protocol("Protocol 3")]);
}

#[tokio::test]
async fn bound_panel_requests_its_protocol_before_readiness() {
	let broker = Arc::new(LocalBroker::new());
	let focus = FocusTracker::new();
	let views = Views::default();
	let mut panel = open(&broker, &focus, "p", Some("A"), &views);

	let record = panel.bootstrap().await.unwrap();
	assert_eq!(record.bound_protocol.as_deref(), Some("A"));
	assert_eq!(broker.take_published(), [Command::change_protocol("A")]);
	assert!(broker.requests().is_empty());

	focus.focus(PanelId::new("p"));
	panel.handle_focus_change().unwrap();
	assert!(broker.published().is_empty(), "bootstrap switch already covers this observation");
}

#[tokio::test]
async fn failed_new_protocol_request_leaves_panel_unbound() {
	let broker = Arc::new(LocalBroker::new());
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", None, &views);

	let err = panel.bootstrap().await.unwrap_err();
	assert!(matches!(err, PanelError::Dispatch(_)));
	assert_eq!(panel.state().bound_protocol(), None);

	broker.respond("protocol-model/new-protocol", |_| Ok(json!({ "title": "no name" })));
	assert!(matches!(panel.bootstrap().await, Err(PanelError::NewProtocol(_))));
}

#[tokio::test]
async fn disposed_panel_ignores_everything() {
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 2, 0);
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	panel.drain_inbound();
	let snapshot = panel.state().clone();
	let presented = views.len();

	panel.dispose();
	panel.dispose();
	assert!(panel.is_disposed());
	for channel in StateChannel::PANEL {
		assert_eq!(broker.subscriber_count(&channel.topic()), 0);
	}

	publish_protocol(&broker, "B", 5, 3);
	assert_eq!(panel.drain_inbound(), 0);
	panel.handle_intent(Intent::Advance).await.unwrap();
	panel.handle_intent(Intent::Save).await.unwrap();
	panel.present();

	assert_eq!(panel.state(), &snapshot);
	assert_eq!(views.len(), presented);
	assert!(broker.published().is_empty());
	assert!(broker.requests().is_empty());
}

#[tokio::test]
async fn closed_transport_surfaces_as_dispatch_error() {
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 2, 0);
	let views = Views::default();
	let mut panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	panel.drain_inbound();

	broker.close();
	let err = panel.handle_intent(Intent::Advance).await.unwrap_err();
	let PanelError::Dispatch(stepdeck_panel::DispatchError::Send { source, .. }) = err else {
		panic!("unexpected error {err:?}");
	};
	assert_eq!(source, TransportError::Closed);
}

#[tokio::test]
async fn event_loop_applies_state_and_intents_until_cancelled() {
	init_tracing();
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 2, 0);
	let focus = FocusTracker::new();
	let views = Views::default();
	let panel = open(&broker, &focus, "p", Some("A"), &views);
	let lifecycle = panel.lifecycle();
	let (intents, rx) = mpsc::channel(8);
	let task = tokio::spawn(panel.run(rx));

	wait_until(|| matches!(views.last(), Some(PanelView::Grid(ref grid)) if grid.highlighted == Some(0))).await;

	intents.send(Intent::Advance).await.unwrap();
	wait_until(|| broker.published() == [Command::step_number(1)]).await;

	broker.publish_json(StateChannel::StepNumber, &json!({ "stepNumber": 1 }));
	wait_until(|| matches!(views.last(), Some(PanelView::Grid(ref grid)) if grid.highlighted == Some(1))).await;

	focus.focus(PanelId::new("p"));
	broker.publish_json(StateChannel::ProtocolSkeleton, &json!({ "name": "B" }));
	wait_until(|| broker.published().last() == Some(&Command::change_protocol("A"))).await;

	lifecycle.cancel();
	task.await.unwrap();
	assert_eq!(broker.subscriber_count(&StateChannel::Steps.topic()), 0);
}

#[tokio::test]
async fn event_loop_stops_when_intents_close() {
	let broker = Arc::new(LocalBroker::new());
	let views = Views::default();
	let panel = open(&broker, &FocusTracker::new(), "p", Some("A"), &views);
	let (intents, rx) = mpsc::channel(8);
	let task = tokio::spawn(panel.run(rx));

	drop(intents);
	task.await.unwrap();
	assert_eq!(broker.subscriber_count(&StateChannel::Schema.topic()), 0);
}
