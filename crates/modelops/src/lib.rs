//! Model-domain types shared by the orchestrator: roles, the required model
//! set, installed-model snapshots, and provisioning progress records.
//!
//! Nothing here does I/O.

pub mod error;
pub mod progress;
pub mod pull;
pub mod required;
pub mod schema;

pub use error::*;
pub use progress::*;
pub use pull::*;
pub use required::*;
pub use schema::*;
