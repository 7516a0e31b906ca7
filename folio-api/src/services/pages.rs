//! Singleton page sections.

use crate::repositories::PageRepository;
use folio_core::{
    AboutPage, FolioResult, HeroPage, ProjectPage, StorageError, TestimonyPage,
};
use std::sync::Arc;

/// A page document stored as a single row.
pub trait PageSection: Clone + Send + Sync + 'static {
    /// Section name used in "<name> page not found".
    const NAME: &'static str;

    /// Drop fields the client may not set before a write.
    fn normalize_for_write(&mut self) {}
}

impl PageSection for HeroPage {
    const NAME: &'static str = "Hero";
}

impl PageSection for AboutPage {
    const NAME: &'static str = "About";

    /// Card ids are assigned by the store on every write.
    fn normalize_for_write(&mut self) {
        for card in &mut self.cards {
            card.id = None;
        }
    }
}

impl PageSection for TestimonyPage {
    const NAME: &'static str = "Testimony";
}

impl PageSection for ProjectPage {
    const NAME: &'static str = "Project";
}

/// Get and full-document update for one page section.
pub struct PageService<P: PageSection> {
    repo: Arc<dyn PageRepository<P>>,
}

impl<P: PageSection> Clone for PageService<P> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<P: PageSection> PageService<P> {
    pub fn new(repo: Arc<dyn PageRepository<P>>) -> Self {
        Self { repo }
    }

    pub async fn get(&self) -> FolioResult<P> {
        self.repo
            .get()
            .await?
            .ok_or(StorageError::PageNotFound { page: P::NAME }.into())
    }

    pub async fn update(&self, mut page: P) -> FolioResult<()> {
        page.normalize_for_write();
        self.repo.upsert(&page).await?;
        tracing::info!(page = P::NAME, "Page updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryPageRepository;
    use folio_core::{AboutCard, FolioError};

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let service = PageService::<HeroPage>::new(Arc::new(InMemoryPageRepository::new()));
        let err = service.get().await.expect_err("missing");
        assert_eq!(
            err,
            FolioError::Storage(StorageError::PageNotFound { page: "Hero" })
        );
        assert_eq!(err.to_string(), "Hero page not found");
    }

    #[tokio::test]
    async fn test_update_then_get() {
        let service =
            PageService::<ProjectPage>::new(Arc::new(InMemoryPageRepository::new()));
        let page = ProjectPage {
            title: "Work".to_string(),
            description: "Selected projects".to_string(),
        };
        service.update(page.clone()).await.expect("update");
        assert_eq!(service.get().await.expect("get"), page);
    }

    #[tokio::test]
    async fn test_about_card_ids_are_cleared_on_write() {
        let repo = Arc::new(InMemoryPageRepository::<AboutPage>::new());
        let service = PageService::new(repo.clone());
        let page = AboutPage {
            cards: vec![AboutCard {
                id: Some(9),
                title: "Card".to_string(),
                description: String::new(),
            }],
            ..AboutPage::default()
        };
        service.update(page).await.expect("update");

        let stored = repo.get().await.expect("get").expect("page");
        assert_eq!(stored.cards[0].id, None);
        assert_eq!(stored.cards[0].title, "Card");
    }
}
