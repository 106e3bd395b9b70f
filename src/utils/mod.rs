//! Short code policy and URL helpers.
//!
//! - [`blocklist`] - reserved, brand, and profane tokens
//! - [`code_generator`] - random codes, Base62, and collision-checked generation
//! - [`alias_validator`] - custom alias and short code validation
//! - [`url_normalizer`] - destination URL normalization

pub mod alias_validator;
pub mod blocklist;
pub mod code_generator;
pub mod url_normalizer;
