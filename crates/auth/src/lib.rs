//! `ecowiser-auth` — who the signed-in user is and what the UI lets them do.
//!
//! Everything here is a client-side reflection of server policy. The server
//! enforces roles; this crate only decides what to offer.

pub mod authorize;
pub mod navigation;
pub mod permissions;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, assignable_roles, authorize, can_delete_upload, can_manage_member};
pub use navigation::{NavEntry, navigation};
pub use permissions::Capability;
pub use roles::Role;
pub use user::{TenantRef, TenantSummary, UserProfile};
