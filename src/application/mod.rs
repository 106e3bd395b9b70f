//! Application layer services implementing business logic.
//!
//! Services coordinate the link store, the cache tiers, and the metrics
//! recorder. HTTP handlers call into them and never touch infrastructure
//! directly.
//!
//! # Available Services
//!
//! - [`services::redirect_service::RedirectService`] - hot-path short code resolution
//! - [`services::link_service::LinkService`] - link creation, update, and deletion

pub mod services;
