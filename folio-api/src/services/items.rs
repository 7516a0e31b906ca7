//! Generic collection orchestration: validate, load, patch, persist.

use crate::repositories::{Item, ItemRepository};
use folio_core::{FolioResult, ItemId, StorageError};
use std::sync::Arc;

pub struct ItemService<T: Item> {
    repo: Arc<dyn ItemRepository<T>>,
}

impl<T: Item> Clone for ItemService<T> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

fn not_found<T: Item>(id: ItemId) -> StorageError {
    StorageError::ItemNotFound {
        entity: T::ENTITY,
        id,
    }
}

impl<T: Item> ItemService<T> {
    pub fn new(repo: Arc<dyn ItemRepository<T>>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> FolioResult<Vec<T>> {
        Ok(self.repo.list().await?)
    }

    pub async fn create(&self, draft: T::Draft) -> FolioResult<T> {
        T::validate_draft(&draft)?;
        let item = self.repo.insert(draft).await?;
        tracing::info!(entity = T::ENTITY, id = item.id(), "Item created");
        Ok(item)
    }

    /// Apply a partial update. Absent fields keep their stored values.
    pub async fn update(&self, id: ItemId, patch: T::Patch) -> FolioResult<T> {
        T::validate_patch(&patch)?;
        let mut item = self.repo.get(id).await?.ok_or_else(|| not_found::<T>(id))?;
        item.apply_patch(patch);
        if !self.repo.replace(&item).await? {
            return Err(not_found::<T>(id).into());
        }
        tracing::info!(entity = T::ENTITY, id, "Item updated");
        Ok(item)
    }

    pub async fn delete(&self, id: ItemId) -> FolioResult<()> {
        if !self.repo.delete(id).await? {
            return Err(not_found::<T>(id).into());
        }
        tracing::info!(entity = T::ENTITY, id, "Item deleted");
        Ok(())
    }
}
