//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They are
//! responsible for:
//! - Validating inputs and references
//! - Deriving slugs and rendered fields
//! - Running listings and aggregate statistics
//! - Storing uploaded files

pub mod content;
pub mod donation;
pub mod error;
pub mod markdown;
pub mod slug;
pub mod statistics;
pub mod upload;

pub use content::{ContentService, StatusCounts};
pub use donation::{DonationService, DonationStatistics};
pub use error::{ServiceError, ServiceResult};
pub use markdown::render_markdown;
pub use slug::generate_slug;
pub use statistics::{EntityCounts, StatisticsService, StatusCounter};
pub use upload::{StoredFile, UploadError, UploadStore};
