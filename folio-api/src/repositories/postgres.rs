//! Postgres repositories over the shared connection pool.
//!
//! Enum columns are TEXT with CHECK constraints and go through
//! `as_db_str`/`from_db_str`. Rows that no longer parse surface as
//! `StorageError::Corrupt` instead of panicking.

use super::{ItemRepository, PageRepository, StorageResult, TestimonyDraft, TestimonyRepository};
use crate::db::DbClient;
use async_trait::async_trait;
use folio_core::{
    AboutCard, AboutPage, CareerJourney, CareerType, ContributionType, HeroPage, ItemId,
    NewCareerJourney, NewProject, NewTechnicalSkill, Project, ProjectPage, ProjectType,
    SkillCategory, SkillLevel, StorageError, TechnicalSkill, Testimony, TestimonyPage,
};
use tokio_postgres::Row;

/// Fixed primary key of every singleton page row.
const PAGE_ROW_ID: i16 = 1;

fn db_err(err: tokio_postgres::Error) -> StorageError {
    tracing::error!(error = ?err, "Database query failed");
    StorageError::backend(err)
}

fn corrupt(entity: &'static str) -> impl Fn(folio_core::EnumParseError) -> StorageError {
    move |err| StorageError::Corrupt {
        entity,
        reason: err.to_string(),
    }
}

/// Repository set backed by Postgres.
#[derive(Clone)]
pub struct PgRepository {
    db: DbClient,
}

impl PgRepository {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn hero_from_row(row: &Row) -> StorageResult<HeroPage> {
    Ok(HeroPage {
        name: row.try_get("name").map_err(db_err)?,
        rank: row.try_get("rank").map_err(db_err)?,
        title: row.try_get("title").map_err(db_err)?,
        subtitle: row.try_get("subtitle").map_err(db_err)?,
        resume_link: row.try_get("resume_link").map_err(db_err)?,
        contact_link: row.try_get("contact_link").map_err(db_err)?,
        image_urls: row.try_get("image_urls").map_err(db_err)?,
        hobbies: row.try_get("hobbies").map_err(db_err)?,
    })
}

fn skill_from_row(row: &Row) -> StorageResult<TechnicalSkill> {
    let level: String = row.try_get("level").map_err(db_err)?;
    let category: String = row.try_get("category").map_err(db_err)?;
    Ok(TechnicalSkill {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        specialities: row.try_get("specialities").map_err(db_err)?,
        level: SkillLevel::from_db_str(&level).map_err(corrupt("technical_skills"))?,
        category: SkillCategory::from_db_str(&category).map_err(corrupt("technical_skills"))?,
    })
}

fn career_from_row(row: &Row) -> StorageResult<CareerJourney> {
    let career_type: String = row.try_get("career_type").map_err(db_err)?;
    Ok(CareerJourney {
        id: row.try_get("id").map_err(db_err)?,
        started_at: row.try_get("started_at").map_err(db_err)?,
        ended_at: row.try_get("ended_at").map_err(db_err)?,
        title: row.try_get("title").map_err(db_err)?,
        affiliation: row.try_get("affiliation").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        location: row.try_get("location").map_err(db_err)?,
        career_type: CareerType::from_db_str(&career_type).map_err(corrupt("career_journeys"))?,
    })
}

fn testimony_from_row(row: &Row) -> StorageResult<Testimony> {
    Ok(Testimony {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        profile_url: row.try_get("profile_url").map_err(db_err)?,
        affiliation: row.try_get("affiliation").map_err(db_err)?,
        rating: row.try_get("rating").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        ai_summary: row.try_get("ai_summary").map_err(db_err)?,
        approved: row.try_get("approved").map_err(db_err)?,
    })
}

fn project_from_row(row: &Row) -> StorageResult<Project> {
    let project_type: String = row.try_get("project_type").map_err(db_err)?;
    let contribution: String = row.try_get("contribution").map_err(db_err)?;
    Ok(Project {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        image_urls: row.try_get("image_urls").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        tech_stack: row.try_get("tech_stack").map_err(db_err)?,
        github_link: row.try_get("github_link").map_err(db_err)?,
        project_type: ProjectType::from_db_str(&project_type).map_err(corrupt("projects"))?,
        contribution: ContributionType::from_db_str(&contribution)
            .map_err(corrupt("projects"))?,
        project_link: row.try_get("project_link").map_err(db_err)?,
    })
}

fn collect_rows<T>(rows: &[Row], map: fn(&Row) -> StorageResult<T>) -> StorageResult<Vec<T>> {
    rows.iter().map(map).collect()
}

// ============================================================================
// PAGES
// ============================================================================

#[async_trait]
impl PageRepository<HeroPage> for PgRepository {
    async fn get(&self) -> StorageResult<Option<HeroPage>> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT name, rank, title, subtitle, resume_link, contact_link, image_urls, hobbies \
                 FROM hero_pages WHERE id = $1",
                &[&PAGE_ROW_ID],
            )
            .await
            .map_err(db_err)?;
        row.as_ref().map(hero_from_row).transpose()
    }

    async fn upsert(&self, page: &HeroPage) -> StorageResult<()> {
        let conn = self.db.get_conn().await?;
        conn.execute(
            "INSERT INTO hero_pages \
                 (id, name, rank, title, subtitle, resume_link, contact_link, image_urls, hobbies) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET \
                 name = EXCLUDED.name, rank = EXCLUDED.rank, title = EXCLUDED.title, \
                 subtitle = EXCLUDED.subtitle, resume_link = EXCLUDED.resume_link, \
                 contact_link = EXCLUDED.contact_link, image_urls = EXCLUDED.image_urls, \
                 hobbies = EXCLUDED.hobbies, updated_at = now()",
            &[
                &PAGE_ROW_ID,
                &page.name,
                &page.rank,
                &page.title,
                &page.subtitle,
                &page.resume_link,
                &page.contact_link,
                &page.image_urls,
                &page.hobbies,
            ],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl PageRepository<AboutPage> for PgRepository {
    async fn get(&self) -> StorageResult<Option<AboutPage>> {
        let conn = self.db.get_conn().await?;
        let Some(row) = conn
            .query_opt(
                "SELECT description, github_link, linkedin_link, available \
                 FROM about_pages WHERE id = $1",
                &[&PAGE_ROW_ID],
            )
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let cards = conn
            .query(
                "SELECT id, title, description FROM about_cards \
                 WHERE about_page_id = $1 ORDER BY id",
                &[&PAGE_ROW_ID],
            )
            .await
            .map_err(db_err)?
            .iter()
            .map(|card| -> StorageResult<AboutCard> {
                Ok(AboutCard {
                    id: Some(card.try_get("id").map_err(db_err)?),
                    title: card.try_get("title").map_err(db_err)?,
                    description: card.try_get("description").map_err(db_err)?,
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(Some(AboutPage {
            description: row.try_get("description").map_err(db_err)?,
            cards,
            github_link: row.try_get("github_link").map_err(db_err)?,
            linkedin_link: row.try_get("linkedin_link").map_err(db_err)?,
            available: row.try_get("available").map_err(db_err)?,
        }))
    }

    /// Upserts the page and replaces its cards in one transaction.
    async fn upsert(&self, page: &AboutPage) -> StorageResult<()> {
        let mut conn = self.db.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;

        tx.execute(
            "INSERT INTO about_pages (id, description, github_link, linkedin_link, available) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET \
                 description = EXCLUDED.description, github_link = EXCLUDED.github_link, \
                 linkedin_link = EXCLUDED.linkedin_link, available = EXCLUDED.available, \
                 updated_at = now()",
            &[
                &PAGE_ROW_ID,
                &page.description,
                &page.github_link,
                &page.linkedin_link,
                &page.available,
            ],
        )
        .await
        .map_err(db_err)?;

        tx.execute(
            "DELETE FROM about_cards WHERE about_page_id = $1",
            &[&PAGE_ROW_ID],
        )
        .await
        .map_err(db_err)?;

        for card in &page.cards {
            tx.execute(
                "INSERT INTO about_cards (about_page_id, title, description) VALUES ($1, $2, $3)",
                &[&PAGE_ROW_ID, &card.title, &card.description],
            )
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)
    }
}

/// Title/description pages share one row shape.
async fn get_titled_page(
    db: &DbClient,
    table: &'static str,
) -> StorageResult<Option<(String, String)>> {
    let conn = db.get_conn().await?;
    let row = conn
        .query_opt(
            &format!("SELECT title, description FROM {} WHERE id = $1", table),
            &[&PAGE_ROW_ID],
        )
        .await
        .map_err(db_err)?;
    row.map(|row| -> StorageResult<(String, String)> {
        Ok((
            row.try_get("title").map_err(db_err)?,
            row.try_get("description").map_err(db_err)?,
        ))
    })
    .transpose()
}

async fn upsert_titled_page(
    db: &DbClient,
    table: &'static str,
    title: &str,
    description: &str,
) -> StorageResult<()> {
    let conn = db.get_conn().await?;
    conn.execute(
        &format!(
            "INSERT INTO {} (id, title, description) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET \
                 title = EXCLUDED.title, description = EXCLUDED.description, updated_at = now()",
            table
        ),
        &[&PAGE_ROW_ID, &title, &description],
    )
    .await
    .map_err(db_err)?;
    Ok(())
}

#[async_trait]
impl PageRepository<TestimonyPage> for PgRepository {
    async fn get(&self) -> StorageResult<Option<TestimonyPage>> {
        Ok(get_titled_page(&self.db, "testimony_pages")
            .await?
            .map(|(title, description)| TestimonyPage { title, description }))
    }

    async fn upsert(&self, page: &TestimonyPage) -> StorageResult<()> {
        upsert_titled_page(&self.db, "testimony_pages", &page.title, &page.description).await
    }
}

#[async_trait]
impl PageRepository<ProjectPage> for PgRepository {
    async fn get(&self) -> StorageResult<Option<ProjectPage>> {
        Ok(get_titled_page(&self.db, "project_pages")
            .await?
            .map(|(title, description)| ProjectPage { title, description }))
    }

    async fn upsert(&self, page: &ProjectPage) -> StorageResult<()> {
        upsert_titled_page(&self.db, "project_pages", &page.title, &page.description).await
    }
}

// ============================================================================
// TECHNICAL SKILLS
// ============================================================================

const SKILL_COLUMNS: &str = "id, name, description, specialities, level, category";

#[async_trait]
impl ItemRepository<TechnicalSkill> for PgRepository {
    async fn list(&self) -> StorageResult<Vec<TechnicalSkill>> {
        let conn = self.db.get_conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {} FROM technical_skills ORDER BY id", SKILL_COLUMNS),
                &[],
            )
            .await
            .map_err(db_err)?;
        collect_rows(&rows, skill_from_row)
    }

    async fn get(&self, id: ItemId) -> StorageResult<Option<TechnicalSkill>> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {} FROM technical_skills WHERE id = $1", SKILL_COLUMNS),
                &[&id],
            )
            .await
            .map_err(db_err)?;
        row.as_ref().map(skill_from_row).transpose()
    }

    async fn insert(&self, draft: NewTechnicalSkill) -> StorageResult<TechnicalSkill> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO technical_skills (name, description, specialities, level, category) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
                &[
                    &draft.name,
                    &draft.description,
                    &draft.specialities,
                    &draft.level.as_db_str(),
                    &draft.category.as_db_str(),
                ],
            )
            .await
            .map_err(db_err)?;
        let id: ItemId = row.try_get(0).map_err(db_err)?;
        Ok(draft.with_id(id))
    }

    async fn replace(&self, skill: &TechnicalSkill) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE technical_skills SET name = $2, description = $3, specialities = $4, \
                 level = $5, category = $6, updated_at = now() WHERE id = $1",
                &[
                    &skill.id,
                    &skill.name,
                    &skill.description,
                    &skill.specialities,
                    &skill.level.as_db_str(),
                    &skill.category.as_db_str(),
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: ItemId) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM technical_skills WHERE id = $1", &[&id])
            .await
            .map_err(db_err)?;
        Ok(deleted > 0)
    }
}

// ============================================================================
// CAREER JOURNEYS
// ============================================================================

const CAREER_COLUMNS: &str =
    "id, started_at, ended_at, title, affiliation, description, location, career_type";

#[async_trait]
impl ItemRepository<CareerJourney> for PgRepository {
    async fn list(&self) -> StorageResult<Vec<CareerJourney>> {
        let conn = self.db.get_conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {} FROM career_journeys ORDER BY id", CAREER_COLUMNS),
                &[],
            )
            .await
            .map_err(db_err)?;
        collect_rows(&rows, career_from_row)
    }

    async fn get(&self, id: ItemId) -> StorageResult<Option<CareerJourney>> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {} FROM career_journeys WHERE id = $1", CAREER_COLUMNS),
                &[&id],
            )
            .await
            .map_err(db_err)?;
        row.as_ref().map(career_from_row).transpose()
    }

    async fn insert(&self, draft: NewCareerJourney) -> StorageResult<CareerJourney> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO career_journeys \
                     (started_at, ended_at, title, affiliation, description, location, career_type) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
                &[
                    &draft.started_at,
                    &draft.ended_at,
                    &draft.title,
                    &draft.affiliation,
                    &draft.description,
                    &draft.location,
                    &draft.career_type.as_db_str(),
                ],
            )
            .await
            .map_err(db_err)?;
        let id: ItemId = row.try_get(0).map_err(db_err)?;
        Ok(draft.with_id(id))
    }

    async fn replace(&self, career: &CareerJourney) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE career_journeys SET started_at = $2, ended_at = $3, title = $4, \
                 affiliation = $5, description = $6, location = $7, career_type = $8, \
                 updated_at = now() WHERE id = $1",
                &[
                    &career.id,
                    &career.started_at,
                    &career.ended_at,
                    &career.title,
                    &career.affiliation,
                    &career.description,
                    &career.location,
                    &career.career_type.as_db_str(),
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: ItemId) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM career_journeys WHERE id = $1", &[&id])
            .await
            .map_err(db_err)?;
        Ok(deleted > 0)
    }
}

// ============================================================================
// TESTIMONIES
// ============================================================================

const TESTIMONY_COLUMNS: &str =
    "id, name, profile_url, affiliation, rating, description, ai_summary, approved";

#[async_trait]
impl ItemRepository<Testimony> for PgRepository {
    async fn list(&self) -> StorageResult<Vec<Testimony>> {
        let conn = self.db.get_conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {} FROM testimonies ORDER BY id", TESTIMONY_COLUMNS),
                &[],
            )
            .await
            .map_err(db_err)?;
        collect_rows(&rows, testimony_from_row)
    }

    async fn get(&self, id: ItemId) -> StorageResult<Option<Testimony>> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {} FROM testimonies WHERE id = $1", TESTIMONY_COLUMNS),
                &[&id],
            )
            .await
            .map_err(db_err)?;
        row.as_ref().map(testimony_from_row).transpose()
    }

    async fn insert(&self, draft: TestimonyDraft) -> StorageResult<Testimony> {
        let conn = self.db.get_conn().await?;
        let new = &draft.testimony;
        let row = conn
            .query_one(
                "INSERT INTO testimonies \
                     (name, profile_url, affiliation, rating, description, ai_summary, approved) \
                 VALUES ($1, $2, $3, $4, $5, $6, FALSE) RETURNING id",
                &[
                    &new.name,
                    &new.profile_url,
                    &new.affiliation,
                    &new.rating,
                    &new.description,
                    &draft.ai_summary,
                ],
            )
            .await
            .map_err(db_err)?;
        let id: ItemId = row.try_get(0).map_err(db_err)?;
        Ok(draft.testimony.into_testimony(id, draft.ai_summary))
    }

    async fn replace(&self, testimony: &Testimony) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE testimonies SET name = $2, profile_url = $3, affiliation = $4, \
                 rating = $5, description = $6, ai_summary = $7, approved = $8, \
                 updated_at = now() WHERE id = $1",
                &[
                    &testimony.id,
                    &testimony.name,
                    &testimony.profile_url,
                    &testimony.affiliation,
                    &testimony.rating,
                    &testimony.description,
                    &testimony.ai_summary,
                    &testimony.approved,
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: ItemId) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM testimonies WHERE id = $1", &[&id])
            .await
            .map_err(db_err)?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl TestimonyRepository for PgRepository {
    async fn list_approved(&self) -> StorageResult<Vec<Testimony>> {
        let conn = self.db.get_conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM testimonies WHERE approved ORDER BY id",
                    TESTIMONY_COLUMNS
                ),
                &[],
            )
            .await
            .map_err(db_err)?;
        collect_rows(&rows, testimony_from_row)
    }

    async fn set_approval(&self, id: ItemId, approved: bool) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE testimonies SET approved = $2, updated_at = now() WHERE id = $1",
                &[&id, &approved],
            )
            .await
            .map_err(db_err)?;
        Ok(updated > 0)
    }
}

// ============================================================================
// PROJECTS
// ============================================================================

const PROJECT_COLUMNS: &str = "id, name, image_urls, description, tech_stack, github_link, \
                               project_type, contribution, project_link";

#[async_trait]
impl ItemRepository<Project> for PgRepository {
    async fn list(&self) -> StorageResult<Vec<Project>> {
        let conn = self.db.get_conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {} FROM projects ORDER BY id", PROJECT_COLUMNS),
                &[],
            )
            .await
            .map_err(db_err)?;
        collect_rows(&rows, project_from_row)
    }

    async fn get(&self, id: ItemId) -> StorageResult<Option<Project>> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS),
                &[&id],
            )
            .await
            .map_err(db_err)?;
        row.as_ref().map(project_from_row).transpose()
    }

    async fn insert(&self, draft: NewProject) -> StorageResult<Project> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO projects (name, image_urls, description, tech_stack, github_link, \
                     project_type, contribution, project_link) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
                &[
                    &draft.name,
                    &draft.image_urls,
                    &draft.description,
                    &draft.tech_stack,
                    &draft.github_link,
                    &draft.project_type.as_db_str(),
                    &draft.contribution.as_db_str(),
                    &draft.project_link,
                ],
            )
            .await
            .map_err(db_err)?;
        let id: ItemId = row.try_get(0).map_err(db_err)?;
        Ok(draft.with_id(id))
    }

    async fn replace(&self, project: &Project) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE projects SET name = $2, image_urls = $3, description = $4, \
                 tech_stack = $5, github_link = $6, project_type = $7, contribution = $8, \
                 project_link = $9, updated_at = now() WHERE id = $1",
                &[
                    &project.id,
                    &project.name,
                    &project.image_urls,
                    &project.description,
                    &project.tech_stack,
                    &project.github_link,
                    &project.project_type.as_db_str(),
                    &project.contribution.as_db_str(),
                    &project.project_link,
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: ItemId) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM projects WHERE id = $1", &[&id])
            .await
            .map_err(db_err)?;
        Ok(deleted > 0)
    }
}

// ============================================================================
// DB-BACKED TESTS
// ============================================================================
