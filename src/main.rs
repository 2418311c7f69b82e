//! Episode Grabber - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use episode_grabber::{
    browser::{BrowserSession, ChromeSession, ManifestObserver},
    cli::Args,
    config::{validate_config, Config},
    download::{interrupt_on, BatchRunner, EpisodeProcessor, FfmpegMuxer, Muxer, ProcessorSettings},
    error::{exit_codes, Error, Result},
    fs::enter_output_directory,
    output::{
        print_banner, print_batch_stats, print_episode_result, print_error, print_info,
        print_run_summary, print_success, print_warning,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::TomlParse(_)
                | Error::UrlParse(_) => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::FFmpegNotFound(_) => ExitCode::from(exit_codes::DEPENDENCY_ERROR as u8),
                Error::Browser(_) | Error::Navigation(_) => {
                    ExitCode::from(exit_codes::BROWSER_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration, then let the command line override it
    let config_path = args.config.clone();
    let mut config = Config::discover(config_path.as_deref())?;
    args.merge_into_config(&mut config);

    if config.target.start.is_none() {
        match episode_grabber::detect_episode(&config.target.url) {
            Some(n) => print_info(&format!("Detected start episode {} from URL", n)),
            None => tracing::debug!("No episode number in URL; starting at 1"),
        }
    }

    validate_config(&config)?;

    // Relative output paths resolve against the chosen directory from here on
    let output_dir = match &config.download.output_directory {
        Some(dir) => enter_output_directory(dir)?,
        None => config.output_directory(),
    };

    let muxer = FfmpegMuxer::new(&config.download);
    muxer.probe().await?;

    let plan = config.batch_plan();
    print_run_summary(&plan, &output_dir.display().to_string());

    print_info("Starting browser...");
    let observer = ManifestObserver::new(
        &config.capture.manifest_marker,
        config.capture.poll_interval(),
    );
    let mut session = ChromeSession::launch(&config.browser, observer).await?;

    let stats = {
        let settings = ProcessorSettings::from_config(&config, output_dir);
        let runner = BatchRunner::new(
            EpisodeProcessor::new(&session, &muxer, settings),
            config.batch.pacing_delay(),
        )
        .with_reporter(print_episode_result);

        runner
            .run(&plan, interrupt_on(tokio::signal::ctrl_c()))
            .await
    };

    if let Err(e) = session.close().await {
        print_warning(&format!("Failed to close browser: {}", e));
    }

    print_batch_stats(&stats);

    if stats.interrupted {
        print_warning("Interrupted by user");
    } else if stats.failed == 0 {
        print_success("All episodes downloaded");
    }

    Ok(())
}
