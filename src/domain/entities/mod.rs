//! Core domain entities.
//!
//! - [`Link`] - a persisted short link
//! - [`LinkTarget`] - the redirect projection of a link
//! - [`NewClick`] - a click waiting to be persisted
//!
//! Creation and update inputs use separate structs (`NewLink`, `LinkPatch`).

pub mod click;
pub mod link;

pub use click::NewClick;
pub use link::{Link, LinkPatch, LinkTarget, NewLink};
