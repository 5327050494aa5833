//! Reconciler for warehouse shares.
//!
//! Maps a declarative share definition (name, comment, granted accounts) onto
//! statements against a data-warehouse control plane and reads the observed
//! state back. The host orchestrator owns planning, diffing and state
//! persistence; this crate owns statement construction and row decoding.

pub mod config;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod resource;
pub mod schema;
pub mod statement;
pub mod warehouse;

pub use error::{ShareError, ShareResult};
pub use resource::{Resource, ResourceData, ShareConfig, ShareResource, ShareState};
pub use warehouse::{Row, Warehouse, WarehouseError};
