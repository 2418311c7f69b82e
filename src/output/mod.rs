//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress spinners
//! - Statistics reporting

pub mod console;
pub mod progress;
pub mod stats;

pub use self::console::{
    print_banner, print_error, print_info, print_run_summary, print_success, print_warning,
};
pub use progress::create_spinner;
pub use stats::{print_batch_stats, print_episode_result};
