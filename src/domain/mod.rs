//! Domain layer: entities, repository contracts, and click tracking.
//!
//! - [`entities`] - core data structures
//! - [`repositories`] - persistence trait definitions
//! - [`click_event`] - click captured on the redirect path
//! - [`click_worker`] - asynchronous click persistence
//!
//! # Click Processing Flow
//!
//! 1. The redirect service resolves a code to a URL
//! 2. A [`click_event::ClickEvent`] is offered to a bounded channel (non-blocking)
//! 3. [`click_worker::run_click_worker`] persists it with retry
//! 4. Clicks are dropped when the queue is full or retries are exhausted

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
