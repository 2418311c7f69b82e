//! Console output utilities.

use console::style;

use crate::download::BatchPlan;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Episode Grabber                                   ║
║     Headless capture of streamed series episodes      ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print the batch about to run.
pub fn print_run_summary(plan: &BatchPlan, output_dir: &str) {
    println!();
    println!("{}", style("Batch:").bold());
    println!("  URL:       {}", plan.template_url);
    if let Some(name) = &plan.custom_name {
        println!("  Name:      {}", name);
    }
    println!("  Episodes:  {} ({} to {})", plan.count, plan.start, plan.end());
    println!("  Directory: {}", output_dir);
    println!();
}
