use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use stepdeck_bus::LocalBroker;
use stepdeck_wire::StateChannel;
use stepdeck_workbench::PanelRegistry;

use crate::common::{Menu, wait_until, workbench};

#[tokio::test]
async fn catalog_follows_published_protocols() {
	let broker = Arc::new(LocalBroker::new());
	broker.publish_json(StateChannel::ProtocolSkeletons, &json!([{ "name": "A" }]));
	let mut bench = workbench(&broker, &PanelRegistry::new());
	let menu = Menu::default();

	let task = bench.spawn_catalog(menu.clone()).unwrap();
	assert_eq!(menu.command_ids(), ["stepdeck:open"]);
	wait_until(|| menu.rebuilds() == 1).await;
	assert_eq!(menu.entries(), ["stepdeck:A"]);

	broker.publish_json(StateChannel::ProtocolSkeletons, &json!([{ "name": "A" }, { "name": "B" }]));
	wait_until(|| menu.rebuilds() == 2).await;
	assert_eq!(menu.entries(), ["stepdeck:A", "stepdeck:B"]);
	assert_eq!(menu.command_ids(), ["stepdeck:A", "stepdeck:B", "stepdeck:open"]);

	broker.publish_state(&StateChannel::ProtocolSkeletons.topic(), "not json");
	broker.publish_json(StateChannel::ProtocolSkeletons, &json!([{ "name": "B" }]));
	wait_until(|| menu.rebuilds() == 3).await;
	assert_eq!(menu.entries(), ["stepdeck:B"]);
	assert_eq!(menu.command_ids().len(), 3, "commands are never unregistered");

	bench.shutdown().await;
	task.await.unwrap();
	assert_eq!(broker.subscriber_count(&StateChannel::ProtocolSkeletons.topic()), 0);
}

#[tokio::test]
async fn catalog_stops_when_the_transport_closes() {
	let broker = Arc::new(LocalBroker::new());
	let bench = workbench(&broker, &PanelRegistry::new());
	let task = bench.spawn_catalog(Menu::default()).unwrap();

	broker.close();
	let menu = task.await.unwrap();
	assert_eq!(menu.rebuilds(), 0);
	assert!(bench.spawn_catalog(Menu::default()).is_err());
}
