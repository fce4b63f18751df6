//! In-process catalog storage.
//!
//! Each entity lives in a [`Table`] keyed by a sequential id starting at 1.
//! Ids are never reused after a delete. The whole catalog sits behind one
//! async `RwLock`; handlers hold the guard only while they read or mutate and
//! never across an `.await` on anything else.

mod seed;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::models::{AboutUs, Category, Faq, Product, Workshop};

/// Rows of one entity type ordered by id.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    /// Insert a row built from the id it is assigned.
    pub fn insert_with(&mut self, build: impl FnOnce(u64) -> T) -> &mut T {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.entry(id).or_insert(build(id))
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.rows.contains_key(&id)
    }

    /// Rows in id order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All catalog tables.
#[derive(Debug, Clone, Default)]
pub struct CatalogData {
    pub categories: Table<Category>,
    pub products: Table<Product>,
    pub workshops: Table<Workshop>,
    pub faqs: Table<Faq>,
    pub about_us: Table<AboutUs>,
}

impl CatalogData {
    /// Number of products (any status) filed under a category.
    pub fn products_count(&self, category_id: u64) -> usize {
        self.products
            .iter()
            .filter(|p| p.category_id == category_id)
            .count()
    }

    /// Whether another category already uses `name`.
    pub fn category_name_taken(&self, name: &str, except: Option<u64>) -> bool {
        self.categories
            .iter()
            .any(|c| c.name == name && Some(c.id) != except)
    }
}

/// Cloneable handle to the shared catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    inner: Arc<RwLock<CatalogData>>,
}

impl Catalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the demonstration data, with workshop dates relative
    /// to `today`.
    pub fn seeded(today: NaiveDate) -> Self {
        let mut data = CatalogData::default();
        seed::load(&mut data, today, Utc::now());

        info!(
            categories = data.categories.len(),
            products = data.products.len(),
            workshops = data.workshops.len(),
            faqs = data.faqs.len(),
            about_us = data.about_us.len(),
            "Catalog seeded"
        );

        Self {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, CatalogData> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, CatalogData> {
        self.inner.write().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_and_not_reused() {
        let mut table: Table<u64> = Table::default();
        assert_eq!(*table.insert_with(|id| id), 1);
        assert_eq!(*table.insert_with(|id| id), 2);

        assert_eq!(table.remove(2), Some(2));
        assert_eq!(*table.insert_with(|id| id), 3);
        assert_eq!(table.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_seeded_catalog_contents() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let catalog = Catalog::seeded(today);
        let data = catalog.read().await;

        assert_eq!(data.categories.len(), 4);
        assert_eq!(data.products.len(), 4);
        assert_eq!(data.workshops.len(), 2);
        assert_eq!(data.about_us.len(), 3);
        assert_eq!(data.faqs.len(), 4);

        let first = data.workshops.get(1).unwrap();
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 3, 16).unwrap());
        assert_eq!(data.products_count(1), 1);
    }

    #[tokio::test]
    async fn test_category_name_taken_ignores_self() {
        let catalog = Catalog::seeded(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        let data = catalog.read().await;

        assert!(data.category_name_taken("Accesorios", None));
        assert!(!data.category_name_taken("Accesorios", Some(3)));
        assert!(!data.category_name_taken("accesorios", None));
    }
}
