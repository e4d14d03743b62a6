//! Synchronizer behaviour through the public service API.
//!
//! Uses the in-memory stores, so no external services are needed.

use gemcase_core::{CollectionKind, Owner, Price, Product, ProductId, UserId};
use gemcase_storefront::sync::{CollectionSync, MemoryLocalStore, MemoryRemoteStore, SessionPhase};
use uuid::Uuid;

type TestSync = CollectionSync<MemoryLocalStore, MemoryRemoteStore>;

fn id(raw: &str) -> ProductId {
    ProductId::parse(raw).expect("valid product id")
}

fn product(raw: &str, cents: i64) -> Product {
    Product {
        id: id(raw),
        name: format!("Piece {raw}"),
        price: Price::from_cents(cents),
        image: format!("https://images.example.com/{raw}.jpg"),
        description: String::new(),
        category: String::new(),
        material: String::new(),
        color: String::new(),
    }
}

fn ids<T>(items: &[T], key: impl Fn(&T) -> &ProductId) -> Vec<String> {
    let mut ids: Vec<String> = items.iter().map(|item| key(item).to_string()).collect();
    ids.sort();
    ids
}

async fn anonymous(local: &MemoryLocalStore, remote: &MemoryRemoteStore) -> TestSync {
    CollectionSync::start(local.clone(), remote.clone(), Owner::Anonymous).await
}

#[tokio::test]
async fn cart_total_tracks_surviving_lines() {
    let local = MemoryLocalStore::new();
    let remote = MemoryRemoteStore::new();
    let mut sync = anonymous(&local, &remote).await;

    let ring = product("1", 250_000);
    let hoops = product("3", 35_099);
    let chain = product("6", 12_001);

    sync.add_to_cart(ring.clone()).wait().await.expect("saved");
    sync.add_to_cart(hoops.clone()).wait().await.expect("saved");
    sync.add_to_cart(hoops.clone()).wait().await.expect("saved");
    sync.add_to_cart(chain.clone()).wait().await.expect("saved");
    sync.set_cart_quantity(&chain.id, 5).wait().await.expect("saved");
    sync.remove_from_cart(&ring.id).wait().await.expect("saved");
    sync.set_cart_quantity(&hoops.id, 1).wait().await.expect("saved");

    // 350.99 + 5 x 120.01
    assert_eq!(sync.cart().total_price().to_fixed(), "951.04");
    assert_eq!(sync.cart().item_count(), 6);
}

#[tokio::test]
async fn adding_twice_merges_cart_and_is_idempotent_for_wishlist() {
    let local = MemoryLocalStore::new();
    let remote = MemoryRemoteStore::new();
    let mut sync = anonymous(&local, &remote).await;
    let pendant = product("2", 45_000);

    sync.add_to_cart(pendant.clone()).wait().await.expect("saved");
    sync.add_to_cart(pendant.clone()).wait().await.expect("saved");
    sync.add_to_wishlist(pendant.clone()).wait().await.expect("saved");
    let second = sync.add_to_wishlist(pendant.clone());
    assert!(!second.is_write());
    second.detach();

    assert_eq!(sync.cart().len(), 1);
    assert_eq!(
        sync.cart().get(&pendant.id).map(|item| item.quantity.get()),
        Some(2)
    );
    assert_eq!(sync.wishlist().len(), 1);
}

#[tokio::test]
async fn zero_quantity_removes_the_line() {
    let local = MemoryLocalStore::new();
    let remote = MemoryRemoteStore::new();
    let mut sync = anonymous(&local, &remote).await;
    let bracelet = product("4", 180_000);

    sync.add_to_cart(bracelet.clone()).wait().await.expect("saved");
    sync.set_cart_quantity(&bracelet.id, 0).wait().await.expect("saved");

    assert!(!sync.cart().contains(&bracelet.id));
}

#[tokio::test]
async fn sign_in_moves_local_items_into_an_empty_account() {
    let local = MemoryLocalStore::new();
    let remote = MemoryRemoteStore::new();
    let owner = UserId::new(Uuid::new_v4());
    let mut sync = anonymous(&local, &remote).await;

    sync.add_to_wishlist(product("A", 100)).wait().await.expect("saved");
    sync.add_to_wishlist(product("B", 200)).wait().await.expect("saved");

    let reports = sync.handle_identity(Some(owner)).await;

    assert!(reports.iter().all(|report| report.is_complete()));
    assert_eq!(
        ids(&remote.rows(CollectionKind::Wishlist, owner), |row| &row.product_id),
        vec!["A", "B"]
    );
    assert!(!local.contains_key(CollectionKind::Wishlist.local_key()));
    assert_eq!(sync.phase(), SessionPhase::Authenticated { owner });
}

#[tokio::test]
async fn sign_in_merge_is_local_wins_union() {
    let local = MemoryLocalStore::new();
    let remote = MemoryRemoteStore::new();
    let owner = UserId::new(Uuid::new_v4());

    let mut account = CollectionSync::start(
        MemoryLocalStore::new(),
        remote.clone(),
        Owner::User(owner),
    )
    .await;
    account.add_to_wishlist(product("A", 1_000)).wait().await.expect("saved");
    account.add_to_wishlist(product("D", 4_000)).wait().await.expect("saved");

    let mut sync = anonymous(&local, &remote).await;
    sync.add_to_wishlist(product("A", 1_500)).wait().await.expect("saved");
    sync.add_to_wishlist(product("C", 3_000)).wait().await.expect("saved");
    sync.handle_identity(Some(owner)).await;

    let rows = remote.rows(CollectionKind::Wishlist, owner);
    assert_eq!(ids(&rows, |row| &row.product_id), vec!["A", "C", "D"]);
    let a = rows
        .iter()
        .find(|row| row.product_id == id("A"))
        .expect("A migrated");
    assert_eq!(a.product_price, Price::from_cents(1_500).amount());
    assert!(!local.contains_key(CollectionKind::Wishlist.local_key()));

    assert_eq!(
        sync.wishlist().get(&id("A")).map(|p| p.price),
        Some(Price::from_cents(1_500))
    );
    assert_eq!(sync.wishlist().len(), 3);
}

#[tokio::test]
async fn sign_out_then_sign_in_keeps_the_account_unchanged() {
    let local = MemoryLocalStore::new();
    let remote = MemoryRemoteStore::new();
    let owner = UserId::new(Uuid::new_v4());
    let mut sync = anonymous(&local, &remote).await;

    sync.handle_identity(Some(owner)).await;
    sync.add_to_cart(product("5", 320_000)).wait().await.expect("saved");
    sync.add_to_wishlist(product("7", 85_000)).wait().await.expect("saved");
    let cart_before = remote.rows(CollectionKind::Cart, owner);
    let wishlist_before = remote.rows(CollectionKind::Wishlist, owner);

    sync.handle_identity(None).await;
    assert!(sync.cart().is_empty());
    sync.handle_identity(Some(owner)).await;

    assert_eq!(remote.rows(CollectionKind::Cart, owner), cart_before);
    assert_eq!(remote.rows(CollectionKind::Wishlist, owner), wishlist_before);
    assert_eq!(sync.cart().len(), 1);
    assert_eq!(sync.wishlist().len(), 1);
}
