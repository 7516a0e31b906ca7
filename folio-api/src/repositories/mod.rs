//! Persistence seams.
//!
//! Page sections share [`PageRepository`], item collections share
//! [`ItemRepository`]. Testimonies add approval queries on top through
//! [`TestimonyRepository`]. Each trait has a Postgres adapter and an
//! in-memory adapter.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use folio_core::{
    CareerJourney, CareerJourneyPatch, ItemId, NewCareerJourney, NewProject, NewTechnicalSkill,
    NewTestimony, Project, ProjectPatch, StorageError, TechnicalSkill, TechnicalSkillPatch,
    Testimony, TestimonyPatch, ValidationError,
};

pub use memory::{InMemoryItemRepository, InMemoryPageRepository};
pub use postgres::PgRepository;

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================================
// ITEM TRAIT
// ============================================================================

/// A stored collection item with a create shape and a partial update shape.
pub trait Item: Clone + Send + Sync + 'static {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    type Draft: Send + Sync + 'static;
    type Patch: Send + Sync + 'static;

    fn id(&self) -> ItemId;
    fn from_draft(draft: Self::Draft, id: ItemId) -> Self;
    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError>;
    fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError>;
    fn apply_patch(&mut self, patch: Self::Patch);
}

impl Item for TechnicalSkill {
    const ENTITY: &'static str = "Skill";
    type Draft = NewTechnicalSkill;
    type Patch = TechnicalSkillPatch;

    fn id(&self) -> ItemId {
        self.id
    }
    fn from_draft(draft: Self::Draft, id: ItemId) -> Self {
        draft.with_id(id)
    }
    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError> {
        draft.validate()
    }
    fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError> {
        patch.validate()
    }
    fn apply_patch(&mut self, patch: Self::Patch) {
        patch.apply_to(self)
    }
}

impl Item for CareerJourney {
    const ENTITY: &'static str = "Career";
    type Draft = NewCareerJourney;
    type Patch = CareerJourneyPatch;

    fn id(&self) -> ItemId {
        self.id
    }
    fn from_draft(draft: Self::Draft, id: ItemId) -> Self {
        draft.with_id(id)
    }
    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError> {
        draft.validate()
    }
    fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError> {
        patch.validate()
    }
    fn apply_patch(&mut self, patch: Self::Patch) {
        patch.apply_to(self)
    }
}

impl Item for Project {
    const ENTITY: &'static str = "Project";
    type Draft = NewProject;
    type Patch = ProjectPatch;

    fn id(&self) -> ItemId {
        self.id
    }
    fn from_draft(draft: Self::Draft, id: ItemId) -> Self {
        draft.with_id(id)
    }
    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError> {
        draft.validate()
    }
    fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError> {
        patch.validate()
    }
    fn apply_patch(&mut self, patch: Self::Patch) {
        patch.apply_to(self)
    }
}

/// A submitted testimony together with its generated summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestimonyDraft {
    pub testimony: NewTestimony,
    pub ai_summary: String,
}

impl Item for Testimony {
    const ENTITY: &'static str = "Testimony";
    type Draft = TestimonyDraft;
    type Patch = TestimonyPatch;

    fn id(&self) -> ItemId {
        self.id
    }
    fn from_draft(draft: Self::Draft, id: ItemId) -> Self {
        draft.testimony.into_testimony(id, draft.ai_summary)
    }
    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError> {
        draft.testimony.validate()
    }
    fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError> {
        patch.validate()
    }
    fn apply_patch(&mut self, patch: Self::Patch) {
        patch.apply_to(self)
    }
}

// ============================================================================
// REPOSITORY TRAITS
// ============================================================================

/// Singleton page section storage.
#[async_trait]
pub trait PageRepository<P>: Send + Sync
where
    P: Send + Sync + 'static,
{
    /// The stored page, or `None` if it was never written.
    async fn get(&self) -> StorageResult<Option<P>>;

    /// Insert or overwrite the whole page.
    async fn upsert(&self, page: &P) -> StorageResult<()>;
}

/// Collection storage with store-assigned ids, listed in id order.
#[async_trait]
pub trait ItemRepository<T: Item>: Send + Sync {
    async fn list(&self) -> StorageResult<Vec<T>>;

    async fn get(&self, id: ItemId) -> StorageResult<Option<T>>;

    /// Store a new item and return it with its assigned id.
    async fn insert(&self, draft: T::Draft) -> StorageResult<T>;

    /// Overwrite an existing item. Returns `false` if the id is unknown.
    async fn replace(&self, item: &T) -> StorageResult<bool>;

    /// Returns `false` if the id is unknown.
    async fn delete(&self, id: ItemId) -> StorageResult<bool>;
}

/// Testimony storage with approval queries.
#[async_trait]
pub trait TestimonyRepository: ItemRepository<Testimony> {
    async fn list_approved(&self) -> StorageResult<Vec<Testimony>>;

    /// Returns `false` if the id is unknown.
    async fn set_approval(&self, id: ItemId, approved: bool) -> StorageResult<bool>;
}
