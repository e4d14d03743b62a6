//! Collection ownership.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Who owns a collection's durable state.
///
/// Anonymous collections live in the device-scoped local store; a signed-in
/// user's collections live in the remote store keyed by their id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    /// Scoped to the local device/browser profile.
    #[default]
    Anonymous,
    /// An authenticated user.
    User(UserId),
}

impl Owner {
    /// The authenticated user id, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(*id),
        }
    }

    /// Whether this is the anonymous owner.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}
