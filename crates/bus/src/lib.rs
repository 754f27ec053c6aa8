//! Transport seam between stepdeck panels and the remote protocol store.
//!
//! This crate provides transport-agnostic primitives:
//! * [`Transport`]: subscribe/publish/request surface a pub/sub client implements
//! * [`ReadyGate`]: one-shot gate held closed until the transport can carry commands
//! * [`LocalBroker`]: in-process broker with retained state, used by tests and demos

#![warn(missing_docs)]

pub mod error;
pub mod local;
pub mod ready_gate;
pub mod transport;

pub use error::{Result, TransportError};
pub use local::{LocalBroker, Responder};
pub use ready_gate::ReadyGate;
pub use transport::{Inbound, SubscriptionId, SubscriptionIds, Transport};
