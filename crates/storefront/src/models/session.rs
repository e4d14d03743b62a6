//! Session-related types.
//!
//! Types stored in the session for identity and synchronization state.

use serde::{Deserialize, Serialize};

use gemcase_core::UserId;

/// Session-stored user identity.
///
/// Written by the external sign-in flow. Minimal data to identify the
/// signed-in shopper; its presence is the identity signal collections
/// reconcile against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity provider user id.
    pub id: UserId,
}

/// Session keys for identity and synchronization data.
///
/// The local collection keys themselves come from
/// [`CollectionKind::local_key`](gemcase_core::CollectionKind::local_key).
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the owner this session's collections were last reconciled for.
    pub const SYNC_OWNER: &str = "sync_owner";
}
