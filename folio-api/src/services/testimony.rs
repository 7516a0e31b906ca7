//! Testimony orchestration: summarization on create, approval, listing.

use super::summarizer::TestimonySummarizer;
use crate::repositories::{Item, TestimonyDraft, TestimonyRepository};
use folio_core::{
    FolioResult, ItemId, NewTestimony, StorageError, Testimony, TestimonyPatch,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct TestimonyService {
    repo: Arc<dyn TestimonyRepository>,
    summarizer: Option<Arc<dyn TestimonySummarizer>>,
}

fn not_found(id: ItemId) -> StorageError {
    StorageError::ItemNotFound {
        entity: Testimony::ENTITY,
        id,
    }
}

impl TestimonyService {
    pub fn new(
        repo: Arc<dyn TestimonyRepository>,
        summarizer: Option<Arc<dyn TestimonySummarizer>>,
    ) -> Self {
        Self { repo, summarizer }
    }

    pub async fn list_all(&self) -> FolioResult<Vec<Testimony>> {
        Ok(self.repo.list().await?)
    }

    pub async fn list_approved(&self) -> FolioResult<Vec<Testimony>> {
        Ok(self.repo.list_approved().await?)
    }

    /// Validate, summarize and store a testimony. New testimonies start
    /// unapproved.
    ///
    /// Without a summarizer the summary is left empty. A configured
    /// summarizer that fails aborts the create.
    pub async fn create(&self, testimony: NewTestimony) -> FolioResult<Testimony> {
        testimony.validate()?;

        let ai_summary = match &self.summarizer {
            Some(summarizer) => {
                let summary = summarizer.summarize(&testimony.description).await?;
                tracing::debug!(provider = summarizer.provider_name(), "Testimony summarized");
                summary
            }
            None => {
                tracing::warn!("No summarizer configured, storing testimony without summary");
                String::new()
            }
        };

        let created = self
            .repo
            .insert(TestimonyDraft {
                testimony,
                ai_summary,
            })
            .await?;
        tracing::info!(id = created.id, "Testimony created");
        Ok(created)
    }

    pub async fn update(&self, id: ItemId, patch: TestimonyPatch) -> FolioResult<Testimony> {
        patch.validate()?;
        let mut testimony = self.repo.get(id).await?.ok_or_else(|| not_found(id))?;
        patch.apply_to(&mut testimony);
        if !self.repo.replace(&testimony).await? {
            return Err(not_found(id).into());
        }
        tracing::info!(id, "Testimony updated");
        Ok(testimony)
    }

    pub async fn set_approval(&self, id: ItemId, approved: bool) -> FolioResult<()> {
        if !self.repo.set_approval(id, approved).await? {
            return Err(not_found(id).into());
        }
        tracing::info!(id, approved, "Testimony approval updated");
        Ok(())
    }

    pub async fn delete(&self, id: ItemId) -> FolioResult<()> {
        if !self.repo.delete(id).await? {
            return Err(not_found(id).into());
        }
        tracing::info!(id, "Testimony deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryItemRepository;
    use async_trait::async_trait;
    use folio_core::{FolioError, SummarizerError, ValidationError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSummarizer {
        calls: AtomicUsize,
        result: Result<String, SummarizerError>,
    }

    #[async_trait]
    impl TestimonySummarizer for FixedSummarizer {
        async fn summarize(&self, _description: &str) -> Result<String, SummarizerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        fn provider_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn new_testimony(rating: i32) -> NewTestimony {
        NewTestimony {
            name: "Grace".to_string(),
            profile_url: "https://example.com/grace".to_string(),
            affiliation: "Navy".to_string(),
            rating,
            description: "Always shipped on time.".to_string(),
        }
    }

    fn service_with(
        result: Option<Result<String, SummarizerError>>,
    ) -> (TestimonyService, Option<Arc<FixedSummarizer>>) {
        let summarizer = result.map(|result| {
            Arc::new(FixedSummarizer {
                calls: AtomicUsize::new(0),
                result,
            })
        });
        let service = TestimonyService::new(
            Arc::new(InMemoryItemRepository::<Testimony>::new()),
            summarizer
                .clone()
                .map(|s| s as Arc<dyn TestimonySummarizer>),
        );
        (service, summarizer)
    }

    #[tokio::test]
    async fn test_create_stores_summary_unapproved() {
        let (service, _) = service_with(Some(Ok("A dependable engineer.".to_string())));
        let created = service.create(new_testimony(5)).await.expect("create");
        assert_eq!(created.ai_summary, "A dependable engineer.");
        assert!(!created.approved);
        assert!(service.list_approved().await.expect("list").is_empty());
        assert_eq!(service.list_all().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn test_rating_checked_before_summarizing() {
        let (service, summarizer) = service_with(Some(Ok("x".to_string())));
        for rating in [0, 6] {
            let err = service.create(new_testimony(rating)).await.expect_err("invalid");
            assert_eq!(
                err,
                FolioError::Validation(ValidationError::RatingOutOfRange { rating })
            );
        }
        let calls = summarizer.map(|s| s.calls.load(Ordering::SeqCst));
        assert_eq!(calls, Some(0));
    }

    #[tokio::test]
    async fn test_unconfigured_summarizer_stores_empty_summary() {
        let (service, _) = service_with(None);
        let created = service.create(new_testimony(4)).await.expect("create");
        assert_eq!(created.ai_summary, "");
    }

    #[tokio::test]
    async fn test_failing_summarizer_aborts_create() {
        let (service, _) = service_with(Some(Err(SummarizerError::RequestFailed {
            provider: "fixed",
            status: 502,
            message: "upstream".to_string(),
        })));
        let err = service.create(new_testimony(4)).await.expect_err("fails");
        assert!(matches!(err, FolioError::Summarizer(_)));
        assert!(service.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_approval_and_delete() {
        let (service, _) = service_with(None);
        let created = service.create(new_testimony(5)).await.expect("create");

        service.set_approval(created.id, true).await.expect("approve");
        assert_eq!(service.list_approved().await.expect("list").len(), 1);

        service.set_approval(created.id, false).await.expect("revoke");
        assert!(service.list_approved().await.expect("list").is_empty());

        assert!(service.set_approval(99, true).await.is_err());
        service.delete(created.id).await.expect("delete");
        assert!(service.delete(created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_update_is_partial_and_revalidates_rating() {
        let (service, _) = service_with(None);
        let created = service.create(new_testimony(5)).await.expect("create");

        let updated = service
            .update(
                created.id,
                TestimonyPatch {
                    affiliation: Some("Harvard".to_string()),
                    ..TestimonyPatch::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.affiliation, "Harvard");
        assert_eq!(updated.name, "Grace");
        assert_eq!(updated.rating, 5);

        let err = service
            .update(
                created.id,
                TestimonyPatch {
                    rating: Some(9),
                    ..TestimonyPatch::default()
                },
            )
            .await
            .expect_err("invalid");
        assert!(matches!(err, FolioError::Validation(_)));
    }
}
