//! Protocol panel engine.
//!
//! A [`PanelInstance`] is one open view of a step protocol. It keeps a local
//! read model ([`ProtocolState`]) consistent with the remote store by
//! observing broadcast state channels, and routes every mutation through
//! unacknowledged commands:
//!
//! * [`StateMirror`] installs inbound state and tracks the [`LoadPhase`]
//! * [`CommandDispatcher`] sends puts and triggers, gated on readiness
//! * [`StepNavigator`] maps next/previous/insert/delete onto commands
//! * [`ActiveInstanceArbiter`] lets only the focused, out-of-sync view request a protocol switch
//! * [`SchemaGridProjector`] turns the schema into table columns and intercepts edits
//!
//! Local actions never mutate the snapshot directly. Their effect is observed
//! only once the remote store republishes the affected channel.

#![warn(missing_docs)]

pub mod arbiter;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod focus;
pub mod grid;
pub mod instance;
pub mod mirror;
pub mod navigator;
pub mod record;
pub mod state;

pub use arbiter::{ActiveInstanceArbiter, Arbitration};
pub use config::PanelConfig;
pub use dispatcher::{CommandDispatcher, Dispatch, Suppression};
pub use error::{DispatchError, EditError, PanelError, SaveError};
pub use focus::FocusTracker;
pub use grid::{CellKind, Column, EditEntry, EditOutcome, EditSession, GridView, Interaction, Row, SchemaGridProjector};
pub use instance::{Intent, PanelInstance, PanelMount, PanelView, ProtocolFile};
pub use mirror::{Applied, StateMirror};
pub use navigator::StepNavigator;
pub use record::{PanelId, PanelRecord};
pub use state::{LoadPhase, ProtocolState, ReadyState};
