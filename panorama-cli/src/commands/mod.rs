//! CLI command implementations.

pub mod delete;
pub mod list;
pub mod upload;
pub mod url;
