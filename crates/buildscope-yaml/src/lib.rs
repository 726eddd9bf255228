//! YAML table manifests for buildscope.
//!
//! A manifest declares one table: its row schema, columns in display order,
//! default sort and empty-state message.

mod error;
mod manifest;

pub use error::ParseError;
pub use manifest::{ColumnConfig, DefaultSort, RoleName, TableManifest};
