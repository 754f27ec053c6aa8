use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use stepdeck_bus::{LocalBroker, Transport};
use stepdeck_panel::{Intent, PanelError, PanelId, PanelRecord};
use stepdeck_wire::{Command, Request, StateChannel};
use stepdeck_workbench::{PanelRegistry, PanelSurface, RestorationStore, WorkbenchError};

use crate::common::{Counter, init_tracing, publish_protocol, surface, wait_until, workbench};

fn record(id: &str, bound: &str) -> PanelRecord {
	PanelRecord {
		id: PanelId::new(id),
		bound_protocol: Some(bound.into()),
	}
}

#[tokio::test]
async fn launch_waits_for_the_transport() {
	init_tracing();
	let broker = Arc::new(LocalBroker::pending());
	let registry = PanelRegistry::new();
	let mut bench = workbench(&broker, &registry);

	let early = tokio::time::timeout(Duration::from_millis(30), bench.launch(None, Some("A".into()), surface())).await;
	assert!(early.is_err());
	assert!(broker.published().is_empty());
	assert!(registry.records().is_empty());

	broker.ready().open();
	let handle = bench.launch(None, Some("A".into()), surface()).await.unwrap();
	assert_eq!(broker.take_published(), [Command::change_protocol("A")]);
	assert_eq!(bench.open_panels(), [handle.id().clone()]);
}

#[tokio::test]
async fn unbound_launch_records_the_new_protocol() {
	let broker = Arc::new(LocalBroker::new());
	broker.respond("protocol-model/new-protocol", |_| Ok(json!({ "name": "Protocol 1" })));
	let registry = PanelRegistry::new();
	let mut bench = workbench(&broker, &registry);

	let handle = bench.launch(Some(PanelId::new("p")), None, surface()).await.unwrap();
	assert_eq!(handle.record(), &record("p", "Protocol 1"));
	assert_eq!(bench.records(), [record("p", "Protocol 1")]);
	assert_eq!(broker.requests(), [Request::new_protocol()]);
	assert_eq!(bench.focus().current(), Some(PanelId::new("p")));
	assert_eq!(broker.take_published(), [Command::change_protocol("Protocol 1")]);
}

#[tokio::test]
async fn failed_bootstrap_leaves_nothing_behind() {
	let broker = Arc::new(LocalBroker::new());
	let registry = PanelRegistry::new();
	let mut bench = workbench(&broker, &registry);

	let err = bench.launch(Some(PanelId::new("p")), None, surface()).await.unwrap_err();
	assert!(matches!(err, WorkbenchError::Panel(PanelError::Dispatch(_))));
	assert!(bench.open_panels().is_empty());
	assert!(registry.records().is_empty());
	assert_eq!(bench.focus().current(), None);
	assert_eq!(broker.subscriber_count(&StateChannel::Steps.topic()), 0);
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
	let broker = Arc::new(LocalBroker::new());
	let registry = PanelRegistry::new();
	let mut bench = workbench(&broker, &registry);

	bench.launch(Some(PanelId::new("p")), Some("A".into()), surface()).await.unwrap();
	let err = bench.launch(Some(PanelId::new("p")), Some("B".into()), surface()).await.unwrap_err();
	assert!(matches!(err, WorkbenchError::Duplicate(id) if id == PanelId::new("p")));
	assert_eq!(registry.records(), [record("p", "A")]);
}

#[tokio::test]
async fn restore_relaunches_each_record() {
	let broker = Arc::new(LocalBroker::new());
	let registry = PanelRegistry::new();
	let mut bench = workbench(&broker, &registry);

	let mounts = vec![Counter::default(), Counter::default()];
	let mut next = mounts.clone().into_iter();
	let handles = bench
		.restore(vec![record("p1", "A"), record("p2", "B")], |_| {
			PanelSurface::new(Box::new(next.next().unwrap_or_default()))
		})
		.await;

	assert_eq!(handles.len(), 2);
	assert_eq!(bench.open_panels(), [PanelId::new("p1"), PanelId::new("p2")]);
	assert_eq!(registry.records(), [record("p1", "A"), record("p2", "B")]);
	assert_eq!(
		broker.take_published(),
		[Command::change_protocol("A"), Command::change_protocol("B")]
	);
	assert!(mounts.iter().all(|mount| mount.get() > 0));
}

#[tokio::test]
async fn intents_reach_the_running_panel() {
	let broker = Arc::new(LocalBroker::new());
	publish_protocol(&broker, "A", 3);
	let registry = PanelRegistry::new();
	let mut bench = workbench(&broker, &registry);

	let handle = bench.launch(None, Some("A".into()), surface()).await.unwrap();
	broker.take_published();

	handle.send(Intent::Advance).await.unwrap();
	wait_until(|| broker.published().contains(&Command::step_number(1))).await;
}

#[tokio::test]
async fn close_forgets_the_panel() {
	let broker = Arc::new(LocalBroker::new());
	let registry = PanelRegistry::new();
	let mut bench = workbench(&broker, &registry);
	let handle = bench.launch(Some(PanelId::new("p")), Some("A".into()), surface()).await.unwrap();

	bench.close(handle.id()).await.unwrap();
	assert!(handle.is_closed());
	assert!(bench.open_panels().is_empty());
	assert!(registry.records().is_empty());
	assert_eq!(bench.focus().current(), None);
	for channel in StateChannel::PANEL {
		assert_eq!(broker.subscriber_count(&channel.topic()), 0);
	}
	assert!(matches!(handle.send(Intent::Advance).await, Err(WorkbenchError::Closed(_))));
	assert!(matches!(
		bench.close(&PanelId::new("p")).await,
		Err(WorkbenchError::UnknownPanel(_))
	));
}

#[tokio::test]
async fn shutdown_keeps_restoration_records() {
	let broker = Arc::new(LocalBroker::new());
	let registry = PanelRegistry::new();
	let mut bench = workbench(&broker, &registry);
	let first = bench.launch(Some(PanelId::new("p1")), Some("A".into()), surface()).await.unwrap();
	let second = bench.launch(Some(PanelId::new("p2")), Some("B".into()), surface()).await.unwrap();

	bench.shutdown().await;
	assert!(first.is_closed() && second.is_closed());
	assert!(bench.open_panels().is_empty());
	assert_eq!(registry.records(), [record("p1", "A"), record("p2", "B")]);
}

#[tokio::test]
async fn dropping_every_handle_stops_the_panel() {
	let broker = Arc::new(LocalBroker::new());
	let registry = PanelRegistry::new();
	let mut bench = workbench(&broker, &registry);
	let handle = bench.launch(Some(PanelId::new("p")), Some("A".into()), surface()).await.unwrap();
	let observer = handle.clone();
	drop(handle);

	assert!(!observer.is_closed());
	drop(observer);
	wait_until(|| broker.subscriber_count(&StateChannel::Steps.topic()) == 0).await;
}

#[tokio::test]
async fn finished_panel_can_be_relaunched() {
	let broker = Arc::new(LocalBroker::new());
	let registry = PanelRegistry::new();
	let mut bench = workbench(&broker, &registry);
	let handle = bench.launch(Some(PanelId::new("p")), Some("A".into()), surface()).await.unwrap();
	drop(handle);

	wait_until(|| bench.open_panels().is_empty()).await;
	assert_eq!(registry.records(), [record("p", "A")]);

	let relaunched = bench.launch(Some(PanelId::new("p")), Some("A".into()), surface()).await.unwrap();
	assert_eq!(relaunched.id(), &PanelId::new("p"));
	assert_eq!(bench.open_panels(), [PanelId::new("p")]);
}
