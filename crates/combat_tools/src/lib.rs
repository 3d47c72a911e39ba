//! # Zone Combat Development Tools
//!
//! Command-line tools for development:
//! - Scenario validators
//! - Terrain lock status packet decoder

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod packet;
pub mod validate;
