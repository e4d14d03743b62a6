//! Cart and wishlist synchronization across the local and remote stores.
//!
//! Shoppers build a cart and a wishlist before signing in. Those live in the
//! device-scoped local store (the browser session). Once signed in, both
//! collections live in the remote store (`PostgreSQL`), keyed by owner and
//! product. When the identity changes, the reconciler migrates local items
//! into the remote store (local wins on conflict) or detaches the remote view
//! on sign-out.
//!
//! # Layers
//!
//! - [`state`] - in-memory collection state (`CollectionState<Cart>`, `CollectionState<Wishlist>`)
//! - [`local`] - local persistence adapter over a raw [`LocalStore`]
//! - [`remote`] - remote persistence adapter over a row-level [`RemoteStore`]
//! - [`reconciler`] - session phases, identity transitions and migration
//! - [`service`] - [`CollectionSync`], the service object tying it together
//! - [`memory`] - in-memory stores for tests and embedding
//!
//! # Consistency
//!
//! Mutations apply to memory first and persist in a spawned task. Remote saves
//! replace the owner's whole row set, so concurrent saves for one owner are
//! last-writer-wins. Failures never roll back memory; they surface as
//! [`Notice`]s.

pub mod error;
pub mod kind;
pub mod local;
pub mod memory;
pub mod notice;
pub mod reconciler;
pub mod remote;
pub mod service;
pub mod state;

pub use error::{LocalStoreError, SyncError};
pub use kind::{Cart, Kind, Wishlist};
pub use local::{LocalCollections, LocalStore, SessionLocalStore};
pub use memory::{MemoryLocalStore, MemoryRemoteStore};
pub use notice::{Notice, NoticeLevel, Notices};
pub use reconciler::{MigrationFailure, MigrationReport, SessionPhase, Transition};
pub use remote::{CollectionRow, RemoteCollections, RemoteStore};
pub use service::{CollectionSync, PendingWrite};
pub use state::CollectionState;
