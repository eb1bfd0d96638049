//! Charitas - content and donation backend for nonprofit websites
//!
//! Every content type (posts, events, programs, projects, campaigns,
//! grants, resources, media, categories and donations) is served through
//! one paginated listing query and one generic admin workflow.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
