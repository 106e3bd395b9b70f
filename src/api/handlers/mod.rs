//! HTTP request handlers.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod links;
pub mod metrics;
pub mod redirect;
pub mod shorten;

pub use health::health_handler;
pub use links::{delete_link_handler, update_link_handler};
pub use metrics::{metrics_handler, metrics_summary_handler};
pub use redirect::redirect_handler;
pub use shorten::shorten_handler;
