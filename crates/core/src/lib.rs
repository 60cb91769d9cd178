//! DummyMart Core - cart state machine and shared types.
//!
//! This crate provides the pieces of DummyMart that have invariants worth
//! testing on their own:
//! - [`cart`] - the persisted cart store, its immutable snapshots and the
//!   derived selectors views read from
//! - [`storage`] - the durable key-value contract the cart persists through
//! - [`types`] - newtype IDs, prices and the catalog product record
//!
//! # Architecture
//!
//! The core crate performs no network I/O and no filesystem I/O. Durable
//! storage is reached through the [`storage::KeyValueStore`] trait; the
//! storefront binary supplies a file-backed implementation, tests use
//! [`storage::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod storage;
pub mod types;

pub use cart::{CartLineItem, CartState, CartStore};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use types::*;
