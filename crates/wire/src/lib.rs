//! Wire vocabulary shared by every stepdeck component.
//!
//! This crate names the channels the remote protocol store publishes on and
//! accepts commands on, and decodes their JSON payloads:
//! * [`StateChannel`]: inbound broadcast state (`<domain>/<key>`)
//! * [`Command`]: outbound idempotent puts and fire-and-forget triggers
//! * [`Request`]: request/response exchanges with the protocol service
//! * [`payload`]: fragment merging and typed decoding of state payloads
//! * [`schema`]: closed field-type variant and per-field descriptors

#![warn(missing_docs)]

pub mod channel;
pub mod command;
pub mod error;
pub mod payload;
pub mod schema;

pub use channel::{Action, RequestKind, StateChannel};
pub use command::{Command, CommandKind, Request};
pub use error::{PayloadError, Result};
pub use payload::{ProtocolSkeleton, StateUpdate, Step, decode, decode_schema, decode_steps};
pub use schema::{STEP_FIELD, Schema, SchemaFieldDescriptor, SchemaFieldType};
