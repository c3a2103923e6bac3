//! Template materialization into the workspace
//!
//! This module provides:
//! - Bulk placement of the fetched template payload (with the conditional
//!   notifications-stack removal)
//! - Literal placeholder substitution across the config directory

pub mod organize;
pub mod substitute;
