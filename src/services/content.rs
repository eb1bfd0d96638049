//! Content service
//!
//! `ContentService<E>` is the one place listings, lookups and admin edits go
//! through for every entity:
//! - paginated listing with filter validation
//! - public visibility rules for slug lookups
//! - slug derivation and uniqueness
//! - reference checks (category, program, campaign)
//! - per-status counts for the dashboard

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::error::{ServiceError, ServiceResult};
use super::slug::{generate_slug, slug_candidate};
use crate::db::repositories::EntityRepository;
use crate::models::{Entity, EntityInput, ListFilter, Page, PageRequest};

/// Upper bound on `-N` suffixes tried for a derived slug
const MAX_SLUG_ATTEMPTS: u32 = 1000;

/// Total and per-status record counts for one entity
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusCounts {
    pub total: i64,
    pub by_status: Vec<(String, i64)>,
}

pub struct ContentService<E: Entity> {
    repo: Arc<dyn EntityRepository<E>>,
}

impl<E: Entity> Clone for ContentService<E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<E: Entity> ContentService<E> {
    pub fn new(repo: Arc<dyn EntityRepository<E>>) -> Self {
        Self { repo }
    }

    /// Run the paginated listing query.
    ///
    /// A page past the last one yields an empty `records` list; it is not an
    /// error.
    pub async fn list(&self, filter: &ListFilter, request: PageRequest) -> ServiceResult<Page<E>> {
        filter.check_keys::<E>()?;

        let total = self.repo.count_matching(filter).await?;
        let records = if Page::<E>::is_past_end(total, request) {
            Vec::new()
        } else {
            self.repo.find_page(filter, request).await?
        };

        Ok(Page::new(records, total, request))
    }

    /// Listing restricted to publicly visible statuses
    pub async fn list_public(&self, filter: ListFilter, request: PageRequest) -> ServiceResult<Page<E>> {
        self.list(&filter.status_in(E::PUBLIC_STATUSES), request).await
    }

    /// The newest `count` records matching `filter`
    pub async fn latest(&self, filter: &ListFilter, count: u32) -> ServiceResult<Vec<E>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        Ok(self.list(filter, PageRequest::new(1, count)).await?.records)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<E> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("{} {}", E::LABEL, id)))
    }

    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<E> {
        if !E::HAS_SLUG {
            return Err(ServiceError::not_found(format!("{} '{}'", E::LABEL, slug)));
        }
        self.repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("{} '{}'", E::LABEL, slug)))
    }

    /// Slug lookup that hides records outside the public statuses
    pub async fn get_public(&self, slug: &str) -> ServiceResult<E> {
        let record = self.get_by_slug(slug).await?;
        if !record.is_public() {
            return Err(ServiceError::not_found(format!("{} '{}'", E::LABEL, slug)));
        }
        Ok(record)
    }

    pub async fn create(&self, mut input: E::Input) -> ServiceResult<E> {
        self.prepare_input(&mut input, None).await?;
        E::prepare(&mut input, None, Utc::now());

        let record = self.repo.insert(&input).await?;
        tracing::info!("Created {} {}", E::LABEL, record.id());
        Ok(record)
    }

    /// Full replacement of an existing record
    pub async fn update(&self, id: i64, mut input: E::Input) -> ServiceResult<E> {
        let existing = self.get(id).await?;

        self.prepare_input(&mut input, Some(id)).await?;
        E::prepare(&mut input, Some(&existing), Utc::now());

        let record = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("{} {}", E::LABEL, id)))?;
        tracing::info!("Updated {} {}", E::LABEL, id);
        Ok(record)
    }

    /// Delete a record, returning what was removed
    pub async fn delete(&self, id: i64) -> ServiceResult<E> {
        let existing = self.get(id).await?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found(format!("{} {}", E::LABEL, id)));
        }
        tracing::info!("Deleted {} {}", E::LABEL, id);
        Ok(existing)
    }

    /// Total and per-status counts, computed with the listing count query
    pub async fn count_by_status(&self) -> ServiceResult<StatusCounts> {
        let total = self.repo.count_matching(&ListFilter::new()).await?;
        let mut by_status = Vec::with_capacity(E::STATUSES.len());
        for status in E::STATUSES {
            let count = self
                .repo
                .count_matching(&ListFilter::new().status(*status))
                .await?;
            by_status.push((status.to_string(), count));
        }
        Ok(StatusCounts { total, by_status })
    }

    /// Validate, check references and settle the slug
    async fn prepare_input(&self, input: &mut E::Input, exclude_id: Option<i64>) -> ServiceResult<()> {
        input.validate()?;

        for reference in input.references() {
            if !self.repo.reference_exists(&reference).await? {
                return Err(ServiceError::validation(format!(
                    "{} {} does not exist",
                    reference.label, reference.id
                )));
            }
        }

        if E::HAS_SLUG {
            let slug = self.resolve_slug(input, exclude_id).await?;
            input.set_slug(slug);
        }
        Ok(())
    }

    async fn resolve_slug(&self, input: &E::Input, exclude_id: Option<i64>) -> ServiceResult<String> {
        if let Some(slug) = input.slug().filter(|s| !s.is_empty()) {
            if self.repo.slug_exists(slug, exclude_id).await? {
                return Err(ServiceError::validation(format!(
                    "{} slug '{}' is already in use",
                    E::LABEL,
                    slug
                )));
            }
            return Ok(slug.to_string());
        }

        let mut base = generate_slug(input.title());
        if base.is_empty() {
            base = E::LABEL.to_lowercase();
        }

        for attempt in 0..MAX_SLUG_ATTEMPTS {
            let candidate = slug_candidate(&base, attempt);
            if !self.repo.slug_exists(&candidate, exclude_id).await? {
                return Ok(candidate);
            }
        }

        Err(ServiceError::validation(format!(
            "Could not derive a unique slug from '{}'",
            input.title()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{
        Category, CategoryInput, DateRange, Event, EventInput, Post, PostInput, PostStatus,
        Program, ProgramInput, Project, ProjectInput,
    };
    use chrono::NaiveDate;

    async fn setup_test_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    fn service<E: Entity>(pool: &DynDatabasePool) -> ContentService<E> {
        ContentService::new(SqlxRepository::<E>::boxed(pool.clone()))
    }

    fn post_input(title: &str, status: PostStatus) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: "Some **markdown**".to_string(),
            status,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_twenty_three_records() {
        let pool = setup_test_pool().await;
        let posts = service::<Post>(&pool);
        for n in 1..=23 {
            posts
                .create(post_input(&format!("Post {}", n), PostStatus::Published))
                .await
                .unwrap();
        }

        let page = posts.list(&ListFilter::new(), PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(page.records.len(), 10);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.total_count, 23);

        let page = posts.list(&ListFilter::new(), PageRequest::new(3, 10)).await.unwrap();
        assert_eq!(page.records.len(), 3);

        let page = posts.list(&ListFilter::new(), PageRequest::new(4, 10)).await.unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.current_page, 4);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.total_count, 23);
    }

    #[tokio::test]
    async fn test_list_empty_table() {
        let pool = setup_test_pool().await;
        let page = service::<Post>(&pool)
            .list(&ListFilter::new(), PageRequest::new(1, 10))
            .await
            .unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.last_page, 1);
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_filter() {
        let pool = setup_test_pool().await;
        let result = service::<Post>(&pool)
            .list(&ListFilter::new().eq("author_name", "x"), PageRequest::new(1, 10))
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_derives_unique_slugs() {
        let pool = setup_test_pool().await;
        let posts = service::<Post>(&pool);

        let first = posts.create(post_input("Annual Report", PostStatus::Draft)).await.unwrap();
        let second = posts.create(post_input("Annual Report", PostStatus::Draft)).await.unwrap();
        let third = posts.create(post_input("Annual  report!", PostStatus::Draft)).await.unwrap();

        assert_eq!(first.slug, "annual-report");
        assert_eq!(second.slug, "annual-report-2");
        assert_eq!(third.slug, "annual-report-3");
    }

    #[tokio::test]
    async fn test_untitled_slug_falls_back_to_label() {
        let pool = setup_test_pool().await;
        let post = service::<Post>(&pool)
            .create(post_input("???", PostStatus::Draft))
            .await
            .unwrap();
        assert_eq!(post.slug, "post");
    }

    #[tokio::test]
    async fn test_explicit_duplicate_slug_rejected() {
        let pool = setup_test_pool().await;
        let posts = service::<Post>(&pool);
        posts.create(post_input("Gala", PostStatus::Draft)).await.unwrap();

        let mut input = post_input("Another", PostStatus::Draft);
        input.slug = Some("gala".to_string());
        let result = posts.create(input).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_own_slug() {
        let pool = setup_test_pool().await;
        let posts = service::<Post>(&pool);
        let created = posts.create(post_input("Gala", PostStatus::Draft)).await.unwrap();

        let mut input = post_input("Gala night", PostStatus::Published);
        input.slug = Some("gala".to_string());
        let updated = posts.update(created.id, input).await.unwrap();
        assert_eq!(updated.slug, "gala");
        assert_eq!(updated.title, "Gala night");
        assert!(updated.published_at.is_some());
        assert!(updated.content_html.contains("<strong>markdown</strong>"));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let pool = setup_test_pool().await;
        let result = service::<Post>(&pool)
            .update(42, post_input("Ghost", PostStatus::Draft))
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_category_rejected() {
        let pool = setup_test_pool().await;
        let mut input = post_input("Orphan", PostStatus::Draft);
        input.category_id = Some(99);
        let result = service::<Post>(&pool).create(input).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_project_requires_existing_program() {
        let pool = setup_test_pool().await;
        let projects = service::<Project>(&pool);
        let input: ProjectInput =
            serde_json::from_value(serde_json::json!({"title": "Borehole", "program_id": 5})).unwrap();
        assert!(matches!(
            projects.create(input.clone()).await,
            Err(ServiceError::Validation(_))
        ));

        let program_input: ProgramInput =
            serde_json::from_value(serde_json::json!({"title": "Water"})).unwrap();
        let program = service::<Program>(&pool).create(program_input).await.unwrap();

        let mut input = input;
        input.program_id = Some(program.id);
        let project = projects.create(input).await.unwrap();
        assert_eq!(project.program_id, Some(program.id));
    }

    #[tokio::test]
    async fn test_public_lookup_hides_drafts() {
        let pool = setup_test_pool().await;
        let posts = service::<Post>(&pool);
        posts.create(post_input("Draft", PostStatus::Draft)).await.unwrap();
        posts.create(post_input("Live", PostStatus::Published)).await.unwrap();

        assert!(matches!(posts.get_public("draft").await, Err(ServiceError::NotFound(_))));
        assert_eq!(posts.get_public("live").await.unwrap().title, "Live");
        assert_eq!(posts.get_by_slug("draft").await.unwrap().title, "Draft");

        let page = posts
            .list_public(ListFilter::new(), PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);

        // Asking for drafts on the public listing finds nothing
        let page = posts
            .list_public(ListFilter::new().status("draft"), PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = setup_test_pool().await;
        let posts = service::<Post>(&pool);
        let created = posts.create(post_input("Gone", PostStatus::Draft)).await.unwrap();

        let deleted = posts.delete(created.id).await.unwrap();
        assert_eq!(deleted.id, created.id);
        assert!(matches!(posts.get(created.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(posts.delete(created.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let pool = setup_test_pool().await;
        let categories = service::<Category>(&pool);
        for (name, status) in [("A", "active"), ("B", "active"), ("C", "inactive")] {
            let input: CategoryInput =
                serde_json::from_value(serde_json::json!({"name": name, "status": status})).unwrap();
            categories.create(input).await.unwrap();
        }

        let counts = categories.count_by_status().await.unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(
            counts.by_status,
            vec![("active".to_string(), 2), ("inactive".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_latest_upcoming_events() {
        let pool = setup_test_pool().await;
        let events = service::<Event>(&pool);
        for (slug, start, end) in [
            ("past", "2020-01-01", Some("2020-01-02")),
            ("ongoing", "2020-01-01", Some("2999-01-01")),
            ("future", "2999-06-01", None),
        ] {
            let input: EventInput = serde_json::from_value(serde_json::json!({
                "title": slug,
                "start_date": start,
                "end_date": end,
                "status": "published",
            }))
            .unwrap();
            events.create(input).await.unwrap();
        }

        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let filter = ListFilter::new()
            .status("published")
            .between(DateRange::from(today));
        let upcoming = events.latest(&filter, 3).await.unwrap();
        let mut slugs: Vec<_> = upcoming.into_iter().map(|e| e.slug).collect();
        slugs.sort();
        assert_eq!(slugs, vec!["future", "ongoing"]);

        assert!(events.latest(&filter, 0).await.unwrap().is_empty());
    }
}
