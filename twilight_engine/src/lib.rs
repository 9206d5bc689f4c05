#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! Runtime side of the Twilight Marches content pack system.
//!
//! [`ContentRegistry`] loads compiled packs, merges them with later-pack-wins semantics,
//! validates the merged graph and serves queries to the gameplay layer.

pub const TWILIGHT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod data_paths;
pub mod error;
pub mod merge;
pub mod provider;
pub mod registry;
pub mod shared;

pub use config::EngineConfig;
pub use error::ContentAccessError;
pub use merge::{MergedContent, OverrideRecord, merge_content};
pub use provider::{ContentProvider, InMemoryContentProvider};
pub use registry::ContentRegistry;
pub use shared::SharedContentRegistry;
