pub mod cli;
pub mod color;
pub mod deps;
pub mod error;
pub mod file_tree;
pub mod generator;
pub mod library_layout;
pub mod makefile;
pub mod src_mk;
pub mod targets_builder;
pub mod targets_cfg;

pub use error::{BuckifyError, Result};
pub use generator::{GenerationSummary, TargetsGenerator};
