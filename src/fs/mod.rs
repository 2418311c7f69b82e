//! Filesystem module.
//!
//! Provides:
//! - Output directory management
//! - Output file name generation

pub mod naming;
pub mod paths;

pub use naming::{ensure_extension, resolve_filename, sanitize_component, strip_episode_markers};
pub use paths::{ensure_dir, enter_output_directory, get_output_path};
