//! Per-request access to a shopper's collections.
//!
//! Each request rebuilds the collection service from its session. The
//! `sync_owner` session key remembers which owner the collections were last
//! reconciled for, so a sign-in or sign-out that happened between requests
//! shows up as an identity edge here.

use gemcase_core::{Owner, UserId};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::models::session_keys;
use crate::sync::{CollectionSync, PendingWrite, RemoteStore, SessionLocalStore};

/// Collection service backed by the request's session.
pub type ShopperCollections<R> = CollectionSync<SessionLocalStore, R>;

/// Open the shopper's collections and reconcile them with `identity`.
///
/// # Errors
///
/// Returns an error if the reconciled owner cannot be written back to the
/// session.
#[instrument(skip(session, remote), fields(signed_in = identity.is_some()))]
pub async fn open_collections<R: RemoteStore>(
    session: &Session,
    remote: R,
    identity: Option<UserId>,
) -> Result<ShopperCollections<R>, tower_sessions::session::Error> {
    let observed = match session.get::<Owner>(session_keys::SYNC_OWNER).await {
        Ok(owner) => owner.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Unreadable sync owner, treating session as anonymous");
            Owner::Anonymous
        }
    };

    let (collections, reports) = CollectionSync::open(
        SessionLocalStore::new(session.clone()),
        remote,
        observed,
        identity,
    )
    .await;

    for report in &reports {
        info!(
            kind = report.kind.as_str(),
            owner = %report.owner,
            migrated = report.migrated,
            failed = report.failed.len(),
            local_cleared = report.local_cleared,
            "Reconciled collection"
        );
    }

    let owner = collections.owner();
    if owner != observed {
        session.insert(session_keys::SYNC_OWNER, owner).await?;
    }

    Ok(collections)
}

/// Wait for a write before responding.
///
/// A failed write has already queued a notice, so the error itself is only
/// logged.
pub async fn settle(write: PendingWrite) {
    let kind = write.kind();
    if let Err(e) = write.wait().await {
        warn!(kind = kind.as_str(), error = %e, "Collection write failed");
    }
}
