//! Session transitions and sign-in migration.
//!
//! The phase machine is explicit: the identity provider reports who is signed
//! in, [`Transition::between`] turns that into an edge (or nothing), and the
//! service runs the edge. Only sign-in does real work; it copies the local
//! collection into the owner's remote rows and clears local.
//!
//! ```text
//! Anonymous --SignIn(U)--> Migrating(U) --done--> Authenticated(U)
//!     ^                                                |
//!     +------------------------SignOut-----------------+
//! ```

use gemcase_core::{CollectionKind, Owner, ProductId, UserId};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::kind::Kind;
use super::local::{LocalCollections, LocalStore};
use super::notice::{Notice, Notices};
use super::remote::{RemoteCollections, RemoteStore};

/// Where a session stands relative to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Collections live in the local store.
    #[default]
    Anonymous,
    /// Local items are being copied to `owner`.
    Migrating { owner: UserId },
    /// Collections live in the remote store under `owner`.
    Authenticated { owner: UserId },
}

impl SessionPhase {
    /// The settled phase for an owner (never `Migrating`).
    #[must_use]
    pub const fn for_owner(owner: Owner) -> Self {
        match owner {
            Owner::Anonymous => Self::Anonymous,
            Owner::User(owner) => Self::Authenticated { owner },
        }
    }

    /// Owner whose store mutations currently target.
    #[must_use]
    pub const fn owner(&self) -> Owner {
        match *self {
            Self::Anonymous => Owner::Anonymous,
            Self::Migrating { owner } | Self::Authenticated { owner } => Owner::User(owner),
        }
    }
}

/// An identity edge the service must react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Anonymous to signed in.
    SignIn(UserId),
    /// Signed in to anonymous.
    SignOut,
    /// One account replaced by another without passing through anonymous.
    SwitchUser { from: UserId, to: UserId },
}

impl Transition {
    /// Edge from `phase` given the identity now reported by the provider.
    ///
    /// Returns `None` when nothing changed, so repeated notifications for the
    /// same identity are ignored.
    #[must_use]
    pub fn between(phase: &SessionPhase, identity: Option<UserId>) -> Option<Self> {
        match (phase.owner().user_id(), identity) {
            (None, None) => None,
            (None, Some(user)) => Some(Self::SignIn(user)),
            (Some(_), None) => Some(Self::SignOut),
            (Some(current), Some(user)) if current == user => None,
            (Some(from), Some(to)) => Some(Self::SwitchUser { from, to }),
        }
    }
}

/// One local item that could not be copied to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationFailure {
    pub product_id: ProductId,
    pub error: String,
}

/// Outcome of migrating one collection on sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub kind: CollectionKind,
    pub owner: UserId,
    /// Whether the local store held residual items.
    pub had_local: bool,
    /// Items upserted successfully.
    pub migrated: usize,
    /// Items whose upsert failed. Earlier successes are not rolled back.
    pub failed: Vec<MigrationFailure>,
    /// Whether the local key was removed afterwards.
    pub local_cleared: bool,
}

impl MigrationReport {
    fn new(kind: CollectionKind, owner: UserId) -> Self {
        Self {
            kind,
            owner,
            had_local: false,
            migrated: 0,
            failed: Vec::new(),
            local_cleared: false,
        }
    }

    /// Whether every local item reached the remote store.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs loads and migrations against both stores, reporting failures as
/// notices instead of errors.
pub(crate) struct Reconciler<'a, L, R> {
    local: &'a LocalCollections<L>,
    remote: &'a RemoteCollections<R>,
    notices: &'a Notices,
}

impl<'a, L: LocalStore, R: RemoteStore> Reconciler<'a, L, R> {
    pub(crate) const fn new(
        local: &'a LocalCollections<L>,
        remote: &'a RemoteCollections<R>,
        notices: &'a Notices,
    ) -> Self {
        Self {
            local,
            remote,
            notices,
        }
    }

    /// Load the anonymous collection. Malformed data is discarded with a
    /// notice.
    pub(crate) async fn load_local<K: Kind>(&self) -> Vec<K::Item> {
        match self.local.try_load::<K>().await {
            Ok(items) => items,
            Err(e) => {
                warn!(kind = K::KIND.as_str(), error = %e, "Local collection unreadable");
                self.notices.push(Notice::local_unreadable(K::KIND));
                Vec::new()
            }
        }
    }

    /// Load an owner's collection. Failure yields an empty collection and a
    /// notice.
    pub(crate) async fn load_remote<K: Kind>(&self, owner: UserId) -> Vec<K::Item> {
        self.fetch_remote::<K>(owner).await.unwrap_or_else(|| {
            self.notices.push(Notice::load_failed(K::KIND));
            Vec::new()
        })
    }

    async fn fetch_remote<K: Kind>(&self, owner: UserId) -> Option<Vec<K::Item>> {
        match self.remote.load_for_owner::<K>(owner).await {
            Ok(items) => Some(items),
            Err(e) => {
                error!(kind = K::KIND.as_str(), owner = %owner, error = %e, "Failed to load remote collection");
                None
            }
        }
    }

    /// Reconcile one collection for a shopper who just signed in.
    ///
    /// Local items overwrite remote rows with the same product id; remote-only
    /// rows are kept. Returns the collection to show and what happened.
    #[instrument(skip(self), fields(kind = K::KIND.as_str()))]
    pub(crate) async fn sign_in<K: Kind>(&self, owner: UserId) -> (Vec<K::Item>, MigrationReport) {
        let mut report = MigrationReport::new(K::KIND, owner);

        let baseline = self.fetch_remote::<K>(owner).await;
        let baseline_failed = baseline.is_none();
        if baseline_failed {
            self.notices.push(Notice::load_failed(K::KIND));
        }

        report.had_local = match self.local.has_residual::<K>().await {
            Ok(residual) => residual,
            Err(e) => {
                warn!(error = %e, "Could not inspect local store, skipping migration");
                false
            }
        };
        if !report.had_local {
            return (baseline.unwrap_or_default(), report);
        }

        for item in self.load_local::<K>().await {
            match self.remote.upsert_item::<K>(owner, &item).await {
                Ok(()) => report.migrated += 1,
                Err(e) => {
                    let product_id = K::product_id(&item).clone();
                    error!(product_id = %product_id, error = %e, "Failed to migrate item");
                    report.failed.push(MigrationFailure {
                        product_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        match self.local.clear::<K>().await {
            Ok(()) => report.local_cleared = true,
            Err(e) => error!(error = %e, "Failed to clear local collection after migration"),
        }

        if !report.is_complete() {
            self.notices.push(Notice::transfer_failed(K::KIND));
        } else if report.migrated > 0 {
            self.notices.push(Notice::transferred(K::KIND));
        }
        info!(
            migrated = report.migrated,
            failed = report.failed.len(),
            "Migrated local collection"
        );

        // One load failure notice per collection, even if both loads fail.
        let items = match self.fetch_remote::<K>(owner).await {
            Some(items) => items,
            None => {
                if !baseline_failed {
                    self.notices.push(Notice::load_failed(K::KIND));
                }
                Vec::new()
            }
        };
        (items, report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gemcase_core::{CartItem, Price, Product, Quantity};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::sync::kind::{Cart, Wishlist};
    use crate::sync::memory::{MemoryLocalStore, MemoryRemoteStore};

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::parse(id).unwrap(),
            name: format!("Piece {id}"),
            price: Price::from_cents(cents),
            image: format!("https://images.example.com/{id}.jpg"),
            description: String::new(),
            category: "Earrings".to_owned(),
            material: "Gold".to_owned(),
            color: "Yellow".to_owned(),
        }
    }

    fn user() -> UserId {
        UserId::new(Uuid::new_v4())
    }

    struct Fixture {
        local: LocalCollections<MemoryLocalStore>,
        remote: RemoteCollections<MemoryRemoteStore>,
        notices: Notices,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                local: LocalCollections::new(MemoryLocalStore::new()),
                remote: RemoteCollections::new(MemoryRemoteStore::new()),
                notices: Notices::new(),
            }
        }

        fn reconciler(&self) -> Reconciler<'_, MemoryLocalStore, MemoryRemoteStore> {
            Reconciler::new(&self.local, &self.remote, &self.notices)
        }
    }

    #[test]
    fn test_transition_reports_only_real_edges() {
        let alice = user();
        let bob = user();
        let anonymous = SessionPhase::Anonymous;
        let signed_in = SessionPhase::Authenticated { owner: alice };

        assert_eq!(Transition::between(&anonymous, None), None);
        assert_eq!(
            Transition::between(&anonymous, Some(alice)),
            Some(Transition::SignIn(alice))
        );
        assert_eq!(Transition::between(&signed_in, Some(alice)), None);
        assert_eq!(
            Transition::between(&signed_in, None),
            Some(Transition::SignOut)
        );
        assert_eq!(
            Transition::between(&signed_in, Some(bob)),
            Some(Transition::SwitchUser {
                from: alice,
                to: bob
            })
        );
    }

    #[test]
    fn test_phase_owner() {
        let alice = user();
        assert!(SessionPhase::for_owner(Owner::Anonymous).owner().is_anonymous());
        assert_eq!(
            SessionPhase::for_owner(Owner::User(alice)),
            SessionPhase::Authenticated { owner: alice }
        );
        assert_eq!(
            SessionPhase::Migrating { owner: alice }.owner().user_id(),
            Some(alice)
        );
    }

    #[tokio::test]
    async fn test_sign_in_copies_local_into_empty_remote() {
        let fx = Fixture::new();
        let owner = user();
        fx.local
            .save::<Cart>(&[CartItem::new(product("1", 100)), CartItem::new(product("2", 200))])
            .await
            .unwrap();

        let (items, report) = fx.reconciler().sign_in::<Cart>(owner).await;

        assert_eq!(items.len(), 2);
        assert!(report.had_local);
        assert_eq!(report.migrated, 2);
        assert!(report.local_cleared);
        assert_eq!(fx.remote.store().rows(CollectionKind::Cart, owner).len(), 2);
        assert!(!fx.local.store().contains_key("jewelry-cart"));

        let notices = fx.notices.drain();
        assert_eq!(notices, vec![Notice::transferred(CollectionKind::Cart)]);
    }

    #[tokio::test]
    async fn test_sign_in_local_wins_and_unions() {
        let fx = Fixture::new();
        let owner = user();
        fx.remote
            .replace_for_owner::<Wishlist>(owner, &[product("A", 100), product("D", 400)])
            .await
            .unwrap();
        fx.local
            .save::<Wishlist>(&[product("A", 150), product("C", 300)])
            .await
            .unwrap();

        let (items, _) = fx.reconciler().sign_in::<Wishlist>(owner).await;

        let mut prices: Vec<(String, String)> = items
            .iter()
            .map(|p| (p.id.to_string(), p.price.to_fixed()))
            .collect();
        prices.sort();
        assert_eq!(
            prices,
            vec![
                ("A".to_owned(), "1.50".to_owned()),
                ("C".to_owned(), "3.00".to_owned()),
                ("D".to_owned(), "4.00".to_owned()),
            ]
        );
        assert!(!fx.local.has_residual::<Wishlist>().await.unwrap());
    }

    #[tokio::test]
    async fn test_sign_in_without_local_adopts_baseline() {
        let fx = Fixture::new();
        let owner = user();
        let mut item = CartItem::new(product("9", 900));
        item.quantity = Quantity::new(4).unwrap();
        fx.remote.replace_for_owner::<Cart>(owner, &[item]).await.unwrap();

        let (items, report) = fx.reconciler().sign_in::<Cart>(owner).await;

        assert!(!report.had_local);
        assert_eq!(report.migrated, 0);
        assert_eq!(items[0].quantity.get(), 4);
        assert!(fx.notices.is_empty());
    }

    #[tokio::test]
    async fn test_item_failure_does_not_abort_migration() {
        let fx = Fixture::new();
        let owner = user();
        fx.remote
            .store()
            .fail_upsert_of(ProductId::parse("2").unwrap());
        fx.local
            .save::<Wishlist>(&[product("1", 100), product("2", 200), product("3", 300)])
            .await
            .unwrap();

        let (items, report) = fx.reconciler().sign_in::<Wishlist>(owner).await;

        assert_eq!(report.migrated, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].product_id.as_str(), "2");
        assert!(report.local_cleared);
        assert_eq!(items.len(), 2);
        assert_eq!(
            fx.notices.drain(),
            vec![Notice::transfer_failed(CollectionKind::Wishlist)]
        );
    }

    #[tokio::test]
    async fn test_remote_load_failure_leaves_collection_empty() {
        let fx = Fixture::new();
        fx.remote.store().fail_loads(true);

        let (items, _) = fx.reconciler().sign_in::<Cart>(user()).await;

        assert!(items.is_empty());
        assert_eq!(
            fx.notices.drain(),
            vec![Notice::load_failed(CollectionKind::Cart)]
        );
    }

    #[tokio::test]
    async fn test_load_failure_with_local_items_notifies_once() {
        let fx = Fixture::new();
        let owner = user();
        fx.remote.store().fail_loads(true);
        fx.local
            .save::<Cart>(&[CartItem::new(product("1", 100))])
            .await
            .unwrap();

        let (items, report) = fx.reconciler().sign_in::<Cart>(owner).await;

        assert!(items.is_empty());
        assert_eq!(report.migrated, 1);
        assert_eq!(
            fx.notices.drain(),
            vec![
                Notice::load_failed(CollectionKind::Cart),
                Notice::transferred(CollectionKind::Cart)
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_local_is_cleared_on_sign_in() {
        let fx = Fixture::new();
        fx.local
            .store()
            .insert_raw("jewelry-wishlist", json!("not a list"));

        let (items, report) = fx.reconciler().sign_in::<Wishlist>(user()).await;

        assert!(items.is_empty());
        assert!(report.had_local);
        assert_eq!(report.migrated, 0);
        assert!(!fx.local.store().contains_key("jewelry-wishlist"));
        assert_eq!(
            fx.notices.drain(),
            vec![Notice::local_unreadable(CollectionKind::Wishlist)]
        );
    }
}
