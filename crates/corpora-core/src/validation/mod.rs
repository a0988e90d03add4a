//! Validation modules

pub mod files;

pub use files::{validate_files, AllowList, Validated};
