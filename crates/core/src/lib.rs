//! `ecowiser-core` — shared client-side building blocks.
//!
//! This crate contains **pure** primitives (no I/O, no HTTP, no storage).

pub mod error;
pub mod id;
pub mod pagination;

pub use error::{CoreError, CoreResult};
pub use id::{ProjectId, ResourceId, TenantId, UserId};
pub use pagination::{PageState, Pagination};
