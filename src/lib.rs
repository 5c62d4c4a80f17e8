//! sorthat - sort a cluttered folder by file extension
//!
//! This library classifies files by extension into movies, photos, audio,
//! documents and applications, moves them into per-category folders under a
//! destination root, optionally sweeps the leftovers into `misc`, and removes
//! any category folder that ends up empty.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod output;
pub mod sorter;

pub use config::{CompiledConfig, CompiledFilters, ConfigError, SorterConfig};
pub use file_category::{Category, ClassificationTable, TableError};
pub use sorter::{SortError, SortReport, Sorter};

pub use cli::{Args, MiscChoice, RunOptions, run_cli, run_cli_with_config};
