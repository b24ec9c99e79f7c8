//! ImbLab Core: dataset sources, normalization, undersampling, persistence.
//!
//! This crate contains the dataset collection pipeline:
//! - Remote sources (plain text, zip entries, spreadsheets, SQLite files)
//! - Normalization into canonical frames (`"0".."n-1"` features, `target` last)
//! - Ratio-based undersampling of the minority class
//! - Synthetic cluster-based classification problems
//! - The named catalogues and the collection orchestrator
//! - SQLite persistence, one table per dataset

pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod imbalance;
pub mod pipeline;
pub mod rng;
pub mod store;
pub mod synthetic;

pub use config::PipelineConfig;
pub use error::DatasetError;
pub use frame::{ClassCounts, NamedFrame, TARGET};
pub use pipeline::{CollectionKind, DatasetCollection};
