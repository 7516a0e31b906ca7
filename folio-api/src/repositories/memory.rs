//! In-memory repositories for tests and `FOLIO_STORE=memory` development.

use super::{Item, ItemRepository, PageRepository, StorageResult, TestimonyRepository};
use async_trait::async_trait;
use folio_core::{ItemId, Testimony};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

// ============================================================================
// PAGES
// ============================================================================

/// Holds one page section.
#[derive(Debug)]
pub struct InMemoryPageRepository<P> {
    page: RwLock<Option<P>>,
}

impl<P> InMemoryPageRepository<P> {
    pub fn new() -> Self {
        Self {
            page: RwLock::new(None),
        }
    }

    /// Start with an existing page.
    pub fn with_page(page: P) -> Self {
        Self {
            page: RwLock::new(Some(page)),
        }
    }
}

impl<P> Default for InMemoryPageRepository<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P> PageRepository<P> for InMemoryPageRepository<P>
where
    P: Clone + Send + Sync + 'static,
{
    async fn get(&self) -> StorageResult<Option<P>> {
        Ok(self.page.read().await.clone())
    }

    async fn upsert(&self, page: &P) -> StorageResult<()> {
        *self.page.write().await = Some(page.clone());
        Ok(())
    }
}

// ============================================================================
// ITEMS
// ============================================================================

/// Ordered item map with a monotonically increasing id sequence.
#[derive(Debug)]
pub struct InMemoryItemRepository<T> {
    items: RwLock<BTreeMap<ItemId, T>>,
    next_id: AtomicI64,
}

impl<T> InMemoryItemRepository<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl<T> Default for InMemoryItemRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Item> ItemRepository<T> for InMemoryItemRepository<T> {
    async fn list(&self) -> StorageResult<Vec<T>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn get(&self, id: ItemId) -> StorageResult<Option<T>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn insert(&self, draft: T::Draft) -> StorageResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let item = T::from_draft(draft, id);
        self.items.write().await.insert(id, item.clone());
        Ok(item)
    }

    async fn replace(&self, item: &T) -> StorageResult<bool> {
        let mut items = self.items.write().await;
        match items.get_mut(&item.id()) {
            Some(slot) => {
                *slot = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ItemId) -> StorageResult<bool> {
        Ok(self.items.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl TestimonyRepository for InMemoryItemRepository<Testimony> {
    async fn list_approved(&self) -> StorageResult<Vec<Testimony>> {
        Ok(self
            .items
            .read()
            .await
            .values()
            .filter(|t| t.approved)
            .cloned()
            .collect())
    }

    async fn set_approval(&self, id: ItemId, approved: bool) -> StorageResult<bool> {
        let mut items = self.items.write().await;
        match items.get_mut(&id) {
            Some(testimony) => {
                testimony.approved = approved;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::TestimonyDraft;
    use folio_core::{
        HeroPage, NewTechnicalSkill, NewTestimony, SkillCategory, SkillLevel, TechnicalSkill,
    };

    fn skill(name: &str) -> NewTechnicalSkill {
        NewTechnicalSkill {
            name: name.to_string(),
            description: String::new(),
            specialities: vec!["axum".to_string()],
            level: SkillLevel::Advanced,
            category: SkillCategory::Backend,
        }
    }

    #[tokio::test]
    async fn test_page_starts_empty_then_upserts() {
        let repo = InMemoryPageRepository::<HeroPage>::new();
        assert_eq!(repo.get().await.expect("get"), None);

        let page = HeroPage {
            name: "Ada".to_string(),
            ..HeroPage::default()
        };
        repo.upsert(&page).await.expect("upsert");
        assert_eq!(repo.get().await.expect("get"), Some(page));
    }

    #[tokio::test]
    async fn test_items_get_sequential_ids_in_order() {
        let repo = InMemoryItemRepository::<TechnicalSkill>::new();
        let first = repo.insert(skill("Rust")).await.expect("insert");
        let second = repo.insert(skill("Go")).await.expect("insert");
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let names: Vec<String> = repo
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Rust".to_string(), "Go".to_string()]);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let repo = InMemoryItemRepository::<TechnicalSkill>::new();
        let first = repo.insert(skill("Rust")).await.expect("insert");
        assert!(repo.delete(first.id).await.expect("delete"));
        assert!(!repo.delete(first.id).await.expect("delete"));

        let next = repo.insert(skill("Go")).await.expect("insert");
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_replace_unknown_id_reports_missing() {
        let repo = InMemoryItemRepository::<TechnicalSkill>::new();
        let ghost = skill("Ghost").with_id(99);
        assert!(!repo.replace(&ghost).await.expect("replace"));
        assert_eq!(repo.get(99).await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_approval_filters_listing() {
        let repo = InMemoryItemRepository::<Testimony>::new();
        for name in ["A", "B"] {
            repo.insert(TestimonyDraft {
                testimony: NewTestimony {
                    name: name.to_string(),
                    profile_url: String::new(),
                    affiliation: String::new(),
                    rating: 5,
                    description: "Great".to_string(),
                },
                ai_summary: String::new(),
            })
            .await
            .expect("insert");
        }
        assert!(repo.list_approved().await.expect("list").is_empty());

        assert!(repo.set_approval(2, true).await.expect("approve"));
        assert!(!repo.set_approval(7, true).await.expect("approve"));

        let approved = repo.list_approved().await.expect("list");
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].name, "B");
    }
}
