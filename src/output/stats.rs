//! Statistics reporting.

use console::style;

use crate::download::{BatchStats, EpisodeOutcome};

/// Print the result of one episode.
pub fn print_episode_result(outcome: &EpisodeOutcome) {
    if outcome.is_success() {
        println!(
            "{} Episode {}: {}",
            style("OK").green().bold(),
            outcome.episode_number,
            outcome.filename.as_deref().unwrap_or("")
        );
    } else {
        println!(
            "{} Episode {}: {}",
            style("FAIL").red().bold(),
            outcome.episode_number,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}

/// Print statistics for a finished batch.
pub fn print_batch_stats(stats: &BatchStats) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Batch Statistics:").bold());
    println!("  Attempted: {}", stats.attempted);
    println!("  Succeeded: {}", style(stats.succeeded).green());
    if stats.failed > 0 {
        let episodes: Vec<String> = stats.failed_episodes.iter().map(u32::to_string).collect();
        println!(
            "  Failed:    {} (episodes {})",
            style(stats.failed).red(),
            episodes.join(", ")
        );
    }
    if stats.interrupted {
        println!("  {}", style("Stopped early on user request").yellow());
    }
    for path in &stats.downloaded {
        println!("  Saved: {}", path.display());
    }
    println!("{}", style("═".repeat(50)).dim());
}
