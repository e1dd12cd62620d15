//! # dcert-state: Revocation State Machine
//!
//! Each certificate carries a two-state revocation lifecycle:
//!
//! ```text
//! Active ──revoke(reason, at)──▶ Revoked (terminal)
//! ```
//!
//! The transition is guarded (a non-blank reason is required) and there is
//! no way back. The machine is pure data and can be exercised without any
//! store; persistence layers apply the same transition atomically.

pub mod revocation;

pub use revocation::{RevocationError, RevocationRecord, RevocationStatus};
