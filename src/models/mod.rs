//! Data models
//!
//! Typed entities for every kind of site content, their status enums and
//! inputs, and the listing types shared by all of them.

#[macro_use]
mod status;

mod campaign;
mod category;
mod donation;
mod entity;
mod event;
mod grant;
mod listing;
mod media;
mod post;
mod program;
mod project;
mod resource;

pub use campaign::{progress_percent, Campaign, CampaignInput, CampaignStatus};
pub use category::{Category, CategoryInput, CategoryStatus};
pub use donation::{Donation, DonationInput, DonationStatus, PaymentMethod};
pub use entity::{
    filter_column, is_valid_slug, DateSpan, Entity, EntityInput, Reference, RowAccess, SqlValue,
    ValidationError, MAX_SLUG_CHARS,
};
pub use event::{Event, EventInput, EventStatus};
pub use grant::{Grant, GrantInput, GrantStatus};
pub use listing::{last_page, DateRange, FilterValue, ListFilter, Page, PageRequest};
pub use media::{Media, MediaInput, MediaMetadata, MediaStatus};
pub use post::{Post, PostInput, PostStatus};
pub use program::{Program, ProgramInput, ProgramStatus};
pub use project::{Project, ProjectInput, ProjectStatus};
pub use resource::{Resource, ResourceInput, ResourceStatus};
