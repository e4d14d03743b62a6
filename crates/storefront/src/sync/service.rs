//! The collection service.
//!
//! [`CollectionSync`] owns both collection states, the session phase and the
//! injected adapters. It is the only type the presentation layer talks to.

use std::future::Future;

use gemcase_core::{CollectionKind, Owner, Product, ProductId, UserId};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use super::error::SyncError;
use super::kind::{Cart, Kind, Wishlist};
use super::local::{LocalCollections, LocalStore};
use super::notice::{Notice, Notices};
use super::reconciler::{MigrationReport, Reconciler, SessionPhase, Transition};
use super::remote::{RemoteCollections, RemoteStore};
use super::state::CollectionState;

/// Handle to a persistence write running in the background.
///
/// Dropping it detaches the write, which still runs to completion and still
/// reports failure as a notice. Awaiting [`PendingWrite::wait`] yields the
/// write's result.
#[derive(Debug)]
#[must_use = "dropping a PendingWrite detaches the write; call `wait` or `detach`"]
pub struct PendingWrite {
    kind: CollectionKind,
    handle: Option<JoinHandle<Result<(), SyncError>>>,
}

impl PendingWrite {
    fn spawn<F>(kind: CollectionKind, write: F) -> Self
    where
        F: Future<Output = Result<(), SyncError>> + Send + 'static,
    {
        Self {
            kind,
            handle: Some(tokio::spawn(write)),
        }
    }

    /// A write that was not needed because nothing changed.
    pub const fn unchanged(kind: CollectionKind) -> Self {
        Self { kind, handle: None }
    }

    /// Collection being written.
    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Whether a write was actually issued.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        self.handle.is_some()
    }

    /// Wait for the write to finish.
    ///
    /// # Errors
    ///
    /// Returns the store error if the write failed, or `SyncError::Aborted`
    /// if the task panicked or the runtime shut down first.
    pub async fn wait(self) -> Result<(), SyncError> {
        match self.handle {
            Some(handle) => handle
                .await
                .map_err(|e| SyncError::Aborted(e.to_string()))?,
            None => Ok(()),
        }
    }

    /// Let the write finish on its own.
    pub fn detach(self) {}
}

/// Cart and wishlist for one shopper, kept in sync with the stores.
///
/// Mutations apply to memory immediately and return a [`PendingWrite`] for
/// the persistence that follows. Writes target the local store while
/// anonymous and the owner's remote rows once authenticated. Failures never
/// roll back memory; they are logged and queued on [`CollectionSync::notices`].
///
/// Mutations spawn onto the current Tokio runtime. Writes issued back to
/// back are not ordered against each other unless the caller waits.
pub struct CollectionSync<L, R> {
    local: LocalCollections<L>,
    remote: RemoteCollections<R>,
    notices: Notices,
    phase: SessionPhase,
    cart: CollectionState<Cart>,
    wishlist: CollectionState<Wishlist>,
}

impl<L: LocalStore, R: RemoteStore> CollectionSync<L, R> {
    fn resume(local: L, remote: R, owner: Owner) -> Self {
        Self {
            local: LocalCollections::new(local),
            remote: RemoteCollections::new(remote),
            notices: Notices::new(),
            phase: SessionPhase::for_owner(owner),
            cart: CollectionState::new(),
            wishlist: CollectionState::new(),
        }
    }

    /// Restore the service for an owner that was already reconciled, loading
    /// both collections from that owner's store.
    ///
    /// No transition runs; call [`handle_identity`](Self::handle_identity)
    /// with the current identity afterwards.
    pub async fn start(local: L, remote: R, owner: Owner) -> Self {
        let mut sync = Self::resume(local, remote, owner);
        sync.reload().await;
        sync
    }

    /// Restore the service for `observed` and immediately reconcile it with
    /// the current `identity`.
    ///
    /// Equivalent to [`start`](Self::start) followed by
    /// [`handle_identity`](Self::handle_identity), except that collections are
    /// loaded once, for the owner that ends up in charge.
    pub async fn open(
        local: L,
        remote: R,
        observed: Owner,
        identity: Option<UserId>,
    ) -> (Self, Vec<MigrationReport>) {
        let mut sync = Self::resume(local, remote, observed);
        let reports = match Transition::between(&sync.phase, identity) {
            Some(transition) => sync.apply(transition).await,
            None => {
                sync.reload().await;
                Vec::new()
            }
        };
        (sync, reports)
    }

    /// React to the identity the provider currently reports.
    ///
    /// Only real edges do anything: sign-in migrates both collections and
    /// returns one report per kind, sign-out reloads the local collections.
    /// A change of account is a sign-out followed by a sign-in.
    #[instrument(skip(self), fields(phase = ?self.phase))]
    pub async fn handle_identity(&mut self, identity: Option<UserId>) -> Vec<MigrationReport> {
        match Transition::between(&self.phase, identity) {
            Some(transition) => self.apply(transition).await,
            None => Vec::new(),
        }
    }

    async fn apply(&mut self, transition: Transition) -> Vec<MigrationReport> {
        match transition {
            Transition::SignIn(owner) => self.sign_in(owner).await,
            Transition::SignOut => {
                self.sign_out().await;
                Vec::new()
            }
            Transition::SwitchUser { to, .. } => {
                self.sign_out().await;
                self.sign_in(to).await
            }
        }
    }

    async fn sign_in(&mut self, owner: UserId) -> Vec<MigrationReport> {
        self.phase = SessionPhase::Migrating { owner };
        info!(owner = %owner, "Signed in, reconciling collections");

        let reconciler = Reconciler::new(&self.local, &self.remote, &self.notices);
        let (cart, cart_report) = reconciler.sign_in::<Cart>(owner).await;
        let (wishlist, wishlist_report) = reconciler.sign_in::<Wishlist>(owner).await;

        self.cart.replace(cart);
        self.wishlist.replace(wishlist);
        self.phase = SessionPhase::Authenticated { owner };
        vec![cart_report, wishlist_report]
    }

    async fn sign_out(&mut self) {
        self.phase = SessionPhase::Anonymous;
        info!("Signed out, detaching remote collections");
        self.reload().await;
    }

    /// Reload both collections from the current owner's store.
    pub async fn reload(&mut self) {
        let reconciler = Reconciler::new(&self.local, &self.remote, &self.notices);
        match self.phase.owner() {
            Owner::Anonymous => {
                self.cart.replace(reconciler.load_local::<Cart>().await);
                self.wishlist.replace(reconciler.load_local::<Wishlist>().await);
            }
            Owner::User(owner) => {
                self.cart.replace(reconciler.load_remote::<Cart>(owner).await);
                self.wishlist
                    .replace(reconciler.load_remote::<Wishlist>(owner).await);
            }
        }
    }

    /// Current session phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Owner whose store receives writes.
    #[must_use]
    pub const fn owner(&self) -> Owner {
        self.phase.owner()
    }

    /// The cart.
    #[must_use]
    pub const fn cart(&self) -> &CollectionState<Cart> {
        &self.cart
    }

    /// The wishlist.
    #[must_use]
    pub const fn wishlist(&self) -> &CollectionState<Wishlist> {
        &self.wishlist
    }

    /// Queue of notices for the shopper.
    #[must_use]
    pub const fn notices(&self) -> &Notices {
        &self.notices
    }

    /// Remove and return all queued notices.
    #[must_use]
    pub fn take_notices(&self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Add a product to the cart, or one more unit if already there.
    pub fn add_to_cart(&mut self, product: Product) -> PendingWrite {
        let changed = self.cart.add(product);
        self.persist_if::<Cart>(changed, self.cart.snapshot())
    }

    /// Remove a product from the cart.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) -> PendingWrite {
        let changed = self.cart.remove(product_id);
        self.persist_if::<Cart>(changed, self.cart.snapshot())
    }

    /// Set a cart line's quantity. Zero removes the line.
    pub fn set_cart_quantity(&mut self, product_id: &ProductId, quantity: u32) -> PendingWrite {
        let changed = self.cart.set_quantity(product_id, quantity);
        self.persist_if::<Cart>(changed, self.cart.snapshot())
    }

    /// Add a product to the wishlist. Adding twice is a no-op.
    pub fn add_to_wishlist(&mut self, product: Product) -> PendingWrite {
        let changed = self.wishlist.add(product);
        self.persist_if::<Wishlist>(changed, self.wishlist.snapshot())
    }

    /// Remove a product from the wishlist.
    pub fn remove_from_wishlist(&mut self, product_id: &ProductId) -> PendingWrite {
        let changed = self.wishlist.remove(product_id);
        self.persist_if::<Wishlist>(changed, self.wishlist.snapshot())
    }

    /// Whether a product is on the wishlist.
    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.wishlist.contains(product_id)
    }

    fn persist_if<K: Kind>(&self, changed: bool, items: Vec<K::Item>) -> PendingWrite {
        if !changed {
            return PendingWrite::unchanged(K::KIND);
        }

        let local = self.local.clone();
        let remote = self.remote.clone();
        let notices = self.notices.clone();
        let owner = self.phase.owner();

        PendingWrite::spawn(K::KIND, async move {
            let result = match owner {
                Owner::Anonymous => local.save::<K>(&items).await.map_err(SyncError::from),
                Owner::User(id) => remote
                    .replace_for_owner::<K>(id, &items)
                    .await
                    .map_err(SyncError::from),
            };
            if let Err(e) = &result {
                error!(kind = K::KIND.as_str(), owner = %owner, error = %e, "Failed to save collection");
                notices.push(Notice::save_failed(K::KIND));
            }
            result
        })
    }
}

impl<L, R> std::fmt::Debug for CollectionSync<L, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSync")
            .field("phase", &self.phase)
            .field("cart", &self.cart)
            .field("wishlist", &self.wishlist)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gemcase_core::Price;
    use uuid::Uuid;

    use super::*;
    use crate::sync::memory::{MemoryLocalStore, MemoryRemoteStore};

    type TestSync = CollectionSync<MemoryLocalStore, MemoryRemoteStore>;

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::parse(id).unwrap(),
            name: format!("Piece {id}"),
            price: Price::from_cents(cents),
            image: format!("https://images.example.com/{id}.jpg"),
            description: "Handcrafted".to_owned(),
            category: "Necklace".to_owned(),
            material: "Silver".to_owned(),
            color: "Silver".to_owned(),
        }
    }

    fn id(raw: &str) -> ProductId {
        ProductId::parse(raw).unwrap()
    }

    fn cart_ids(sync: &TestSync) -> Vec<String> {
        let mut ids: Vec<String> = sync
            .cart()
            .list()
            .iter()
            .map(|item| item.product.id.to_string())
            .collect();
        ids.sort();
        ids
    }

    async fn anonymous(local: &MemoryLocalStore, remote: &MemoryRemoteStore) -> TestSync {
        CollectionSync::start(local.clone(), remote.clone(), Owner::Anonymous).await
    }

    #[tokio::test]
    async fn test_anonymous_mutations_write_local() {
        let local = MemoryLocalStore::new();
        let remote = MemoryRemoteStore::new();
        let mut sync = anonymous(&local, &remote).await;

        sync.add_to_cart(product("1", 1_000)).wait().await.unwrap();
        sync.add_to_cart(product("1", 1_000)).wait().await.unwrap();
        sync.add_to_wishlist(product("2", 500)).wait().await.unwrap();

        let reopened = anonymous(&local, &remote).await;
        assert_eq!(reopened.cart().get(&id("1")).unwrap().quantity.get(), 2);
        assert!(reopened.is_in_wishlist(&id("2")));
        assert_eq!(reopened.cart().total_price().to_fixed(), "20.00");
    }

    #[tokio::test]
    async fn test_unchanged_mutation_issues_no_write() {
        let local = MemoryLocalStore::new();
        let mut sync = anonymous(&local, &MemoryRemoteStore::new()).await;

        assert!(sync.add_to_wishlist(product("2", 500)).is_write());
        let again = sync.add_to_wishlist(product("2", 500));
        assert!(!again.is_write());
        assert_eq!(again.kind(), CollectionKind::Wishlist);
        again.wait().await.unwrap();

        assert!(!sync.remove_from_cart(&id("404")).is_write());
        assert!(!sync.set_cart_quantity(&id("404"), 2).is_write());
    }

    #[tokio::test]
    async fn test_sign_in_merges_local_into_remote() {
        let local = MemoryLocalStore::new();
        let remote = MemoryRemoteStore::new();
        let owner = UserId::new(Uuid::new_v4());
        let mut sync = anonymous(&local, &remote).await;
        sync.add_to_cart(product("A", 100)).wait().await.unwrap();
        sync.add_to_cart(product("B", 200)).wait().await.unwrap();

        let reports = sync.handle_identity(Some(owner)).await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].kind, CollectionKind::Cart);
        assert_eq!(reports[0].migrated, 2);
        assert!(!reports[1].had_local);
        assert_eq!(sync.phase(), SessionPhase::Authenticated { owner });
        assert_eq!(cart_ids(&sync), vec!["A", "B"]);
        assert_eq!(remote.rows(CollectionKind::Cart, owner).len(), 2);
        assert!(!local.contains_key("jewelry-cart"));
        assert_eq!(
            sync.take_notices(),
            vec![Notice::transferred(CollectionKind::Cart)]
        );
    }

    #[tokio::test]
    async fn test_repeated_identity_is_ignored() {
        let owner = UserId::new(Uuid::new_v4());
        let mut sync = anonymous(&MemoryLocalStore::new(), &MemoryRemoteStore::new()).await;

        assert!(sync.handle_identity(None).await.is_empty());
        assert_eq!(sync.handle_identity(Some(owner)).await.len(), 2);
        assert!(sync.handle_identity(Some(owner)).await.is_empty());
    }

    #[tokio::test]
    async fn test_authenticated_mutations_write_remote_only() {
        let local = MemoryLocalStore::new();
        let remote = MemoryRemoteStore::new();
        let owner = UserId::new(Uuid::new_v4());
        let mut sync = CollectionSync::start(local.clone(), remote.clone(), Owner::User(owner)).await;

        sync.add_to_cart(product("1", 100)).wait().await.unwrap();
        sync.set_cart_quantity(&id("1"), 3).wait().await.unwrap();

        let rows = remote.rows(CollectionKind::Cart, owner);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, Some(3));
        assert!(!local.contains_key("jewelry-cart"));

        sync.set_cart_quantity(&id("1"), 0).wait().await.unwrap();
        assert!(remote.rows(CollectionKind::Cart, owner).is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_keeps_optimistic_state() {
        let remote = MemoryRemoteStore::new();
        let owner = UserId::new(Uuid::new_v4());
        let mut sync =
            CollectionSync::start(MemoryLocalStore::new(), remote.clone(), Owner::User(owner)).await;
        remote.fail_writes(true);

        let result = sync.add_to_wishlist(product("5", 700)).wait().await;

        assert!(matches!(result, Err(SyncError::Remote(_))));
        assert!(sync.is_in_wishlist(&id("5")));
        assert_eq!(
            sync.take_notices(),
            vec![Notice::save_failed(CollectionKind::Wishlist)]
        );
    }

    #[tokio::test]
    async fn test_detached_failure_still_notifies() {
        let remote = MemoryRemoteStore::new();
        let owner = UserId::new(Uuid::new_v4());
        let mut sync =
            CollectionSync::start(MemoryLocalStore::new(), remote.clone(), Owner::User(owner)).await;
        remote.fail_writes(true);

        sync.add_to_cart(product("5", 700)).detach();
        for _ in 0..100 {
            if !sync.notices().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(sync.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_reloads_local_and_keeps_remote() {
        let local = MemoryLocalStore::new();
        let remote = MemoryRemoteStore::new();
        let owner = UserId::new(Uuid::new_v4());
        let mut sync = anonymous(&local, &remote).await;
        sync.handle_identity(Some(owner)).await;
        sync.add_to_wishlist(product("7", 100)).wait().await.unwrap();

        sync.handle_identity(None).await;

        assert_eq!(sync.phase(), SessionPhase::Anonymous);
        assert!(sync.wishlist().is_empty());
        assert_eq!(remote.rows(CollectionKind::Wishlist, owner).len(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_sign_in_round_trip_is_stable() {
        let remote = MemoryRemoteStore::new();
        let owner = UserId::new(Uuid::new_v4());
        let mut sync =
            CollectionSync::start(MemoryLocalStore::new(), remote.clone(), Owner::User(owner)).await;
        sync.add_to_cart(product("1", 100)).wait().await.unwrap();
        sync.add_to_cart(product("2", 200)).wait().await.unwrap();
        sync.add_to_cart(product("2", 200)).wait().await.unwrap();
        // Compare against what the account actually stores: the remote
        // projection drops category and color.
        sync.reload().await;
        let before = sync.cart().snapshot();
        let rows_before = remote.rows(CollectionKind::Cart, owner);

        sync.handle_identity(None).await;
        sync.handle_identity(Some(owner)).await;

        assert_eq!(sync.cart().snapshot(), before);
        assert_eq!(remote.rows(CollectionKind::Cart, owner), rows_before);
        assert!(sync.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_switch_user_detaches_previous_account() {
        let remote = MemoryRemoteStore::new();
        let alice = UserId::new(Uuid::new_v4());
        let bob = UserId::new(Uuid::new_v4());
        let mut sync =
            CollectionSync::start(MemoryLocalStore::new(), remote.clone(), Owner::User(alice)).await;
        sync.add_to_wishlist(product("1", 100)).wait().await.unwrap();

        sync.handle_identity(Some(bob)).await;

        assert_eq!(sync.owner(), Owner::User(bob));
        assert!(sync.wishlist().is_empty());
        assert_eq!(remote.rows(CollectionKind::Wishlist, alice).len(), 1);
    }

    #[tokio::test]
    async fn test_open_signs_out_without_touching_remote() {
        let local = MemoryLocalStore::new();
        let remote = MemoryRemoteStore::new();
        remote.fail_loads(true);
        let owner = UserId::new(Uuid::new_v4());
        let mut anon = anonymous(&local, &remote).await;
        anon.add_to_wishlist(product("3", 300)).wait().await.unwrap();

        let (sync, reports) =
            CollectionSync::open(local.clone(), remote.clone(), Owner::User(owner), None).await;

        assert!(reports.is_empty());
        assert_eq!(sync.phase(), SessionPhase::Anonymous);
        assert!(sync.is_in_wishlist(&id("3")));
        assert!(sync.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_open_without_edge_loads_observed_owner() {
        let remote = MemoryRemoteStore::new();
        let owner = UserId::new(Uuid::new_v4());
        let mut first =
            CollectionSync::start(MemoryLocalStore::new(), remote.clone(), Owner::User(owner)).await;
        first.add_to_cart(product("1", 100)).wait().await.unwrap();

        let (sync, reports) = CollectionSync::open(
            MemoryLocalStore::new(),
            remote,
            Owner::User(owner),
            Some(owner),
        )
        .await;

        assert!(reports.is_empty());
        assert_eq!(cart_ids(&sync), vec!["1"]);
    }

    #[tokio::test]
    async fn test_start_with_failing_remote_is_empty_with_notice() {
        let remote = MemoryRemoteStore::new();
        remote.fail_loads(true);
        let owner = UserId::new(Uuid::new_v4());

        let sync = CollectionSync::start(MemoryLocalStore::new(), remote, Owner::User(owner)).await;

        assert!(sync.cart().is_empty());
        assert_eq!(sync.take_notices().len(), 2);
    }
}
