//! Shared cart state holder.
//!
//! [`CartStore`] is created once by the application's composition root and
//! handed to every consumer. It holds the current snapshot in a
//! [`tokio::sync::watch`] channel: readers take cheap `Arc` snapshots,
//! subscribers are woken on every change, and mutations are serialized by the
//! channel's write lock so no reader ever sees a half-applied operation.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::{CartState, persist};
use crate::storage::KeyValueStore;
use crate::types::{Product, ProductId};

/// Storage key the cart snapshot lives under.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Handle to the application's cart.
///
/// Cheap to clone; all clones share one cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    state: watch::Sender<Arc<CartState>>,
    storage: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.snapshot())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open the cart, restoring any snapshot found in `storage`.
    ///
    /// Missing, unreadable or malformed data yields an empty cart; the
    /// problem is logged and otherwise ignored.
    #[must_use]
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = restore(storage.as_ref());
        debug!(lines = state.len(), "Cart restored");

        let (sender, _) = watch::channel(Arc::new(state));
        Self {
            inner: Arc::new(CartStoreInner {
                state: sender,
                storage,
            }),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CartState> {
        Arc::clone(&self.inner.state.borrow())
    }

    /// Receive every snapshot published after this call.
    ///
    /// The receiver starts marked as seen; `changed().await` resolves on the
    /// next mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<CartState>> {
        self.inner.state.subscribe()
    }

    /// Add one unit of `product`, merging with an existing line.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_to_cart(&self, product: &Product) -> Arc<CartState> {
        self.apply(|state| state.with_added(product))
    }

    /// Remove the line for `id`. Unknown ids are ignored.
    #[instrument(skip(self))]
    pub fn remove_from_cart(&self, id: ProductId) -> Arc<CartState> {
        self.apply(|state| state.without(id))
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub fn clear_cart(&self) -> Arc<CartState> {
        self.apply(|_| CartState::default())
    }

    /// Add one unit to the line for `id`. Unknown ids are ignored.
    #[instrument(skip(self))]
    pub fn increase_quantity(&self, id: ProductId) -> Arc<CartState> {
        self.apply(|state| state.with_increased(id))
    }

    /// Remove one unit from the line for `id`, dropping it at zero.
    /// Unknown ids are ignored.
    #[instrument(skip(self))]
    pub fn decrease_quantity(&self, id: ProductId) -> Arc<CartState> {
        self.apply(|state| state.with_decreased(id))
    }

    /// Add one unit of `product` only when no line for it exists yet.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_if_absent(&self, product: &Product) -> Arc<CartState> {
        self.apply(|state| {
            if state.get(product.id).is_some() {
                state.clone()
            } else {
                state.with_added(product)
            }
        })
    }

    /// Empty the cart and hand back what it held.
    ///
    /// Reading and clearing happen under one write lock, so a mutation that
    /// lands afterwards stays in the cart instead of being discarded.
    #[instrument(skip(self))]
    pub fn take_cart(&self) -> Arc<CartState> {
        let mut taken = None;

        self.inner.state.send_if_modified(|current| {
            if current.is_empty() {
                return false;
            }

            let empty = CartState::default();
            self.persist(&empty);
            taken = Some(std::mem::replace(current, Arc::new(empty)));
            true
        });

        taken.unwrap_or_default()
    }

    /// Swap in `transform(current)` and return the resulting snapshot.
    ///
    /// An unchanged result is neither persisted nor published.
    fn apply(&self, transform: impl FnOnce(&CartState) -> CartState) -> Arc<CartState> {
        let mut published = None;

        self.inner.state.send_if_modified(|current| {
            let next = transform(current);
            if next == **current {
                return false;
            }

            let next = Arc::new(next);
            self.persist(&next);
            *current = Arc::clone(&next);
            published = Some(next);
            true
        });

        published.unwrap_or_else(|| self.snapshot())
    }

    fn persist(&self, state: &CartState) {
        let encoded = match persist::encode(state) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Failed to encode cart snapshot");
                return;
            }
        };

        if let Err(e) = self.inner.storage.set(CART_STORAGE_KEY, encoded) {
            warn!(error = %e, "Failed to persist cart snapshot");
        }
    }
}

fn restore(storage: &dyn KeyValueStore) -> CartState {
    match storage.get(CART_STORAGE_KEY) {
        Ok(Some(raw)) => persist::decode(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding stored cart");
            CartState::default()
        }),
        Ok(None) => CartState::default(),
        Err(e) => {
            warn!(error = %e, "Failed to read stored cart");
            CartState::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::selectors::{cart_count, order_total};
    use crate::storage::{MemoryStore, StorageError};

    fn product(id: i64, title: &str, price: i64) -> Product {
        Product::new(ProductId::new(id), title, Decimal::new(price, 0))
    }

    fn open_empty() -> (CartStore, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        (CartStore::open(storage.clone()), storage)
    }

    fn stored(storage: &MemoryStore) -> CartState {
        persist::decode(&storage.get(CART_STORAGE_KEY).unwrap().unwrap()).unwrap()
    }

    /// Storage that accepts nothing.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }
    }

    #[test]
    fn test_open_without_data_is_empty() {
        let (store, _) = open_empty();
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let (store, storage) = open_empty();
        store.add_to_cart(&product(1, "A", 1));
        store.add_to_cart(&product(2, "B", 1));
        store.increase_quantity(ProductId::new(2));
        assert_eq!(stored(&storage), *store.snapshot());

        store.remove_from_cart(ProductId::new(1));
        assert_eq!(stored(&storage), *store.snapshot());
    }

    #[test]
    fn test_reopen_restores_previous_session() {
        let storage = Arc::new(MemoryStore::new());
        {
            let store = CartStore::open(storage.clone());
            store.add_to_cart(&product(1, "A", 4));
            store.add_to_cart(&product(1, "A", 4));
            store.add_to_cart(&product(2, "B", 1));
        }

        let reopened = CartStore::open(storage);
        let state = reopened.snapshot();
        assert_eq!(cart_count(&state), 3);
        assert_eq!(order_total(state.items()), Decimal::new(9, 0));
    }

    #[test]
    fn test_malformed_storage_opens_empty() {
        let storage = Arc::new(MemoryStore::with_entry(CART_STORAGE_KEY, "{\"state\":"));
        let store = CartStore::open(storage);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_unreadable_storage_opens_empty_and_keeps_working() {
        let store = CartStore::open(Arc::new(BrokenStore));
        let state = store.add_to_cart(&product(1, "A", 1));
        assert_eq!(state.len(), 1);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_merge_on_readd() {
        let (store, _) = open_empty();
        let pen = product(5, "Pen", 2);
        store.add_to_cart(&pen);
        let state = store.add_to_cart(&pen);
        assert_eq!(state.len(), 1);
        assert_eq!(state.get(pen.id).map(|i| i.quantity), Some(2));
    }

    #[test]
    fn test_decrease_from_one_removes() {
        let (store, _) = open_empty();
        store.add_to_cart(&product(5, "Pen", 2));
        let state = store.decrease_quantity(ProductId::new(5));
        assert!(state.get(ProductId::new(5)).is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (store, storage) = open_empty();
        store.add_to_cart(&product(1, "A", 1));
        assert!(store.clear_cart().is_empty());
        assert!(store.clear_cart().is_empty());
        assert!(stored(&storage).is_empty());
    }

    #[test]
    fn test_mutations_on_unknown_ids_are_noops() {
        let (store, _) = open_empty();
        let before = store.add_to_cart(&product(1, "A", 1));
        let missing = ProductId::new(404);

        assert!(Arc::ptr_eq(&before, &store.remove_from_cart(missing)));
        assert!(Arc::ptr_eq(&before, &store.increase_quantity(missing)));
        assert!(Arc::ptr_eq(&before, &store.decrease_quantity(missing)));
    }

    #[test]
    fn test_snapshots_are_not_mutated_in_place() {
        let (store, _) = open_empty();
        let first = store.add_to_cart(&product(1, "A", 1));
        let second = store.increase_quantity(ProductId::new(1));
        assert_eq!(first.items()[0].quantity, 1);
        assert_eq!(second.items()[0].quantity, 2);
    }

    #[test]
    fn test_pen_scenario() {
        let (store, _) = open_empty();

        let state = store.add_to_cart(&product(5, "Pen", 2));
        assert_eq!(state.items()[0].quantity, 1);
        assert_eq!(order_total(state.items()), Decimal::new(2, 0));

        let state = store.increase_quantity(ProductId::new(5));
        assert_eq!(order_total(state.items()), Decimal::new(4, 0));

        let state = store.add_to_cart(&product(7, "Pencil", 3));
        assert_eq!(order_total(state.items()), Decimal::new(7, 0));

        let state = store.remove_from_cart(ProductId::new(5));
        assert_eq!(order_total(state.items()), Decimal::new(3, 0));
    }

    #[tokio::test]
    async fn test_subscribers_see_each_change() {
        let (store, _) = open_empty();
        let mut rx = store.subscribe();

        store.add_to_cart(&product(1, "A", 1));
        rx.changed().await.unwrap();
        assert_eq!(cart_count(&rx.borrow_and_update()), 1);

        store.add_to_cart(&product(1, "A", 1));
        rx.changed().await.unwrap();
        assert_eq!(cart_count(&rx.borrow_and_update()), 2);
    }

    #[tokio::test]
    async fn test_noop_does_not_notify() {
        let (store, _) = open_empty();
        let rx = store.subscribe();

        store.remove_from_cart(ProductId::new(1));
        store.clear_cart();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_take_cart_returns_contents_and_empties() {
        let (store, storage) = open_empty();
        store.add_to_cart(&product(1, "A", 2));
        store.add_to_cart(&product(1, "A", 2));

        let taken = store.take_cart();

        assert_eq!(cart_count(&taken), 2);
        assert!(store.snapshot().is_empty());
        assert!(stored(&storage).is_empty());
    }

    #[test]
    fn test_add_after_take_stays_in_cart() {
        let (store, _) = open_empty();
        store.add_to_cart(&product(1, "A", 1));

        let taken = store.take_cart();
        store.add_to_cart(&product(2, "B", 1));

        assert!(taken.get(ProductId::new(2)).is_none());
        assert!(store.snapshot().get(ProductId::new(2)).is_some());
    }

    #[test]
    fn test_take_empty_cart_does_not_notify() {
        let (store, _) = open_empty();
        let rx = store.subscribe();

        assert!(store.take_cart().is_empty());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_concurrent_adds_are_never_lost_by_take() {
        const THREADS: i64 = 4;
        const ADDS: u64 = 200;

        let (store, _) = open_empty();
        let mut taken_units = 0;

        std::thread::scope(|scope| {
            for id in 1..=THREADS {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..ADDS {
                        store.add_to_cart(&product(id, "A", 1));
                    }
                });
            }
            for _ in 0..50 {
                taken_units += cart_count(&store.take_cart());
                std::thread::yield_now();
            }
        });

        let remaining = cart_count(&store.snapshot());
        assert_eq!(taken_units + remaining, ADDS * THREADS.unsigned_abs());
    }

    #[test]
    fn test_add_if_absent_adds_once() {
        let (store, _) = open_empty();
        let pen = product(5, "Pen", 2);

        store.add_if_absent(&pen);
        let state = store.add_if_absent(&pen);

        assert_eq!(state.get(pen.id).map(|i| i.quantity), Some(1));
    }

    #[test]
    fn test_concurrent_add_if_absent_keeps_quantity_one() {
        let (store, _) = open_empty();
        let pen = product(5, "Pen", 2);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let store = store.clone();
                let pen = &pen;
                scope.spawn(move || store.add_if_absent(pen));
            }
        });

        assert_eq!(store.snapshot().get(pen.id).map(|i| i.quantity), Some(1));
    }

    #[test]
    fn test_add_if_absent_on_present_line_does_not_notify() {
        let (store, _) = open_empty();
        let pen = product(5, "Pen", 2);
        store.add_to_cart(&pen);
        let rx = store.subscribe();

        store.add_if_absent(&pen);

        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_clones_share_one_cart() {
        let (store, _) = open_empty();
        let other = store.clone();
        other.add_to_cart(&product(1, "A", 1));
        assert_eq!(store.snapshot().len(), 1);
    }
}
