//! # Arbor Store
//!
//! The store boundary of the Arbor content reconciliation engine.
//!
//! This crate provides:
//! - The `LiveStore` trait: the adapter contract for the live content store
//! - The `SerializedNode`/`SerializedStore` traits: the reader contract for
//!   serialized desired state
//! - Scoped suppression guards for change feedback and notifications
//! - A change feed for observing committed mutations
//! - In-memory reference implementations of both stores
//!
//! The reconciliation engine itself lives in `arbor_sync_engine`; this
//! crate only defines what it talks to.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_feed;
mod error;
mod guard;
mod live;
mod memory;
mod serialized;

pub use change_feed::{ChangeEvent, ChangeFeed, ChangeKind};
pub use error::{StoreError, StoreResult};
pub use guard::{FeedbackGuard, NotificationsGuard};
pub use live::LiveStore;
pub use memory::MemoryLiveStore;
pub use serialized::{MemorySerializedTree, SerializedNode, SerializedStore};
