//! In-memory item store.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use crate::auth::AuthError;
use crate::models::item::{Item, ItemInput};

#[derive(Debug, Default)]
struct Inner {
    items: BTreeMap<u64, Item>,
    last_id: u64,
}

/// Items keyed by a monotonically increasing id starting at 1. Ids are
/// never reused after deletion.
#[derive(Debug, Default)]
pub struct ItemStore {
    inner: RwLock<Inner>,
}

/// Validate `name` and `price` presence, returning them.
fn required(input: &ItemInput) -> Result<(String, f64), AuthError> {
    match (&input.name, input.price) {
        (Some(name), Some(price)) if !name.is_empty() => Ok((name.clone(), price)),
        (name, price) => {
            let mut missing = Vec::new();
            if name.as_deref().is_none_or(str::is_empty) {
                missing.push("name");
            }
            if price.is_none() {
                missing.push("price");
            }
            Err(AuthError::MissingFields(missing.join(", ")))
        }
    }
}

fn not_found(id: u64) -> AuthError {
    AuthError::NotFound(format!("item {id}"))
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items ordered by id.
    pub async fn list(&self) -> Vec<Item> {
        self.inner.read().await.items.values().cloned().collect()
    }

    pub async fn get(&self, id: u64) -> Result<Item, AuthError> {
        self.inner
            .read()
            .await
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, input: ItemInput) -> Result<Item, AuthError> {
        let (name, price) = required(&input)?;
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let item = Item {
            id: inner.last_id,
            name,
            description: input.description,
            price,
            tax: input.tax,
        };
        inner.items.insert(item.id, item.clone());
        Ok(item)
    }

    /// Replace an existing item wholesale.
    pub async fn replace(&self, id: u64, input: ItemInput) -> Result<Item, AuthError> {
        let mut inner = self.inner.write().await;
        let slot = inner.items.get_mut(&id).ok_or_else(|| not_found(id))?;
        let (name, price) = required(&input)?;
        *slot = Item {
            id,
            name,
            description: input.description,
            price,
            tax: input.tax,
        };
        Ok(slot.clone())
    }

    pub async fn delete(&self, id: u64) -> Result<(), AuthError> {
        self.inner
            .write()
            .await
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, price: f64) -> ItemInput {
        ItemInput {
            name: Some(name.into()),
            price: Some(price),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_and_not_reused() {
        let store = ItemStore::new();
        let a = store.create(input("a", 1.0)).await.unwrap();
        let b = store.create(input("b", 2.0)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        store.delete(b.id).await.unwrap();
        let c = store.create(input("c", 3.0)).await.unwrap();
        assert_eq!(c.id, 3);
        assert_eq!(store.list().await.len(), 2);
    }

    #[tokio::test]
    async fn missing_fields_are_named() {
        let store = ItemStore::new();
        match store.create(ItemInput::default()).await {
            Err(AuthError::MissingFields(f)) => assert_eq!(f, "name, price"),
            other => panic!("unexpected: {other:?}"),
        }
        let no_price = ItemInput {
            name: Some("x".into()),
            ..Default::default()
        };
        match store.create(no_price).await {
            Err(AuthError::MissingFields(f)) => assert_eq!(f, "price"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn replace_and_delete_unknown_are_not_found() {
        let store = ItemStore::new();
        assert!(matches!(
            store.replace(9, input("x", 1.0)).await,
            Err(AuthError::NotFound(_))
        ));
        assert!(matches!(store.delete(9).await, Err(AuthError::NotFound(_))));
        assert!(matches!(store.get(9).await, Err(AuthError::NotFound(_))));
    }

    #[tokio::test]
    async fn replace_overwrites_optional_fields() {
        let store = ItemStore::new();
        let mut first = input("a", 1.0);
        first.tax = Some(0.2);
        let item = store.create(first).await.unwrap();
        let replaced = store.replace(item.id, input("b", 5.0)).await.unwrap();
        assert_eq!(replaced.tax, None);
        assert_eq!(store.get(item.id).await.unwrap().name, "b");
    }
}
