//! Host side of the step protocol panels.
//!
//! [`Workbench`] launches [`PanelInstance`](stepdeck_panel::PanelInstance)s
//! over a shared transport, [`ProtocolCatalog`] mirrors the published protocol
//! list into host commands, and [`PanelRegistry`] keeps the tuples needed to
//! restore panels in a later session.

#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod registry;
pub mod workbench;

pub use catalog::{CommandRegistry, LaunchCommand, ProtocolCatalog};
pub use config::WorkbenchConfig;
pub use error::{ConfigError, Result, WorkbenchError};
pub use registry::{PanelRegistry, RestorationStore};
pub use workbench::{PanelHandle, PanelSurface, Workbench};
