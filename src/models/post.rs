//! Blog post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_text, require_valid_slug};
use super::{Entity, EntityInput, RowAccess, SqlValue, ValidationError};
use crate::services::markdown::render_markdown;

status_enum!(
    /// Post publication status
    PostStatus {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
);

/// Blog post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    /// Markdown source
    pub content: String,
    pub content_html: String,
    pub featured_image: Option<String>,
    pub author_name: Option<String>,
    pub category_id: Option<i64>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a post
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(skip)]
    pub content_html: String,
    #[serde(skip)]
    pub published_at: Option<DateTime<Utc>>,
}

impl EntityInput for PostInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("Post title", &self.title)?;
        require_valid_slug(self.slug.as_deref())
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn set_slug(&mut self, slug: String) {
        self.slug = Some(slug);
    }

    fn category_id(&self) -> Option<i64> {
        self.category_id
    }
}

impl Entity for Post {
    type Input = PostInput;

    const TABLE: &'static str = "posts";
    const LABEL: &'static str = "Post";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "slug",
        "excerpt",
        "content",
        "content_html",
        "featured_image",
        "author_name",
        "category_id",
        "status",
        "published_at",
        "created_at",
        "updated_at",
    ];
    const WRITE_COLUMNS: &'static [&'static str] = &[
        "title",
        "slug",
        "excerpt",
        "content",
        "content_html",
        "featured_image",
        "author_name",
        "category_id",
        "status",
        "published_at",
    ];
    const DATE_SPAN: super::DateSpan = super::DateSpan::Single("published_at");
    const STATUSES: &'static [&'static str] = PostStatus::NAMES;
    const PUBLIC_STATUSES: &'static [&'static str] = &["published"];

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.int("id")?,
            title: row.text("title")?,
            slug: row.text("slug")?,
            excerpt: row.opt_text("excerpt")?,
            content: row.text("content")?,
            content_html: row.text("content_html")?,
            featured_image: row.opt_text("featured_image")?,
            author_name: row.opt_text("author_name")?,
            category_id: row.opt_int("category_id")?,
            status: row.text("status")?.parse()?,
            published_at: row.opt_timestamp("published_at")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }

    fn write_values(input: &PostInput) -> Vec<SqlValue> {
        vec![
            input.title.trim().into(),
            input.slug.clone().into(),
            input.excerpt.clone().into(),
            input.content.clone().into(),
            input.content_html.clone().into(),
            input.featured_image.clone().into(),
            input.author_name.clone().into(),
            input.category_id.into(),
            input.status.as_str().into(),
            input.published_at.into(),
        ]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn status_str(&self) -> &'static str {
        self.status.as_str()
    }

    /// Render the Markdown body and keep `published_at` in step with the
    /// status: stamped on first publication, cleared when unpublished.
    fn prepare(input: &mut PostInput, existing: Option<&Self>, now: DateTime<Utc>) {
        input.content_html = render_markdown(&input.content);
        input.published_at = match (input.status, existing) {
            (PostStatus::Published, Some(post)) if post.status == PostStatus::Published => {
                post.published_at.or(Some(now))
            }
            (PostStatus::Published, _) => Some(now),
            _ => None,
        };
    }
}
