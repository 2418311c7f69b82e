//! Stream saving through an external muxer.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::output::create_spinner;

/// Number of trailing stderr lines kept in failure messages.
const STDERR_TAIL_LINES: usize = 5;

/// Why a muxer run did not produce a file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MuxError {
    #[error("failed to prepare output directory: {0}")]
    Prepare(String),

    #[error("failed to run muxer: {0}")]
    Launch(String),

    #[error("muxer timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("muxer exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
}

/// Result of one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub success: bool,
    pub output_path: PathBuf,
    pub error: Option<MuxError>,
}

impl DownloadOutcome {
    pub fn succeeded(output_path: &Path) -> Self {
        Self {
            success: true,
            output_path: output_path.to_path_buf(),
            error: None,
        }
    }

    pub fn failed(output_path: &Path, error: MuxError) -> Self {
        Self {
            success: false,
            output_path: output_path.to_path_buf(),
            error: Some(error),
        }
    }
}

/// Saves the stream behind a manifest URL to a file.
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Check that the muxer can be invoked at all.
    async fn probe(&self) -> Result<()>;

    /// Save `manifest_url` to `output_path`. Never errors; failures are
    /// reported through the outcome.
    async fn download(&self, manifest_url: &str, output_path: &Path) -> DownloadOutcome;
}

/// ffmpeg in stream-copy mode.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    binary: PathBuf,
    timeout: Duration,
    show_progress: bool,
}

impl FfmpegMuxer {
    pub fn new(config: &DownloadConfig) -> Self {
        Self {
            binary: locate_binary(&config.ffmpeg_binary),
            timeout: config.download_timeout(),
            show_progress: config.show_progress,
        }
    }
}

/// Resolve a bare binary name through `PATH`. Paths are used as given.
pub fn locate_binary(name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.components().count() > 1 {
        return path.to_path_buf();
    }
    which::which(name).unwrap_or_else(|_| path.to_path_buf())
}

/// Muxer arguments: copy streams untouched, fix ADTS AAC for MP4, overwrite.
pub fn build_args(manifest_url: &str, output_path: &Path) -> Vec<OsString> {
    vec![
        "-i".into(),
        manifest_url.into(),
        "-c".into(),
        "copy".into(),
        "-bsf:a".into(),
        "aac_adtstoasc".into(),
        "-y".into(),
        output_path.as_os_str().to_os_string(),
    ]
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn probe(&self) -> Result<()> {
        let status = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| Error::FFmpegNotFound(format!("{}: {}", self.binary.display(), e)))?;

        if !status.success() {
            return Err(Error::FFmpegNotFound(format!(
                "{} -version exited with {}",
                self.binary.display(),
                status
            )));
        }

        tracing::debug!("Using muxer at {}", self.binary.display());
        Ok(())
    }

    async fn download(&self, manifest_url: &str, output_path: &Path) -> DownloadOutcome {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return DownloadOutcome::failed(output_path, MuxError::Prepare(e.to_string()));
            }
        }

        tracing::info!("Downloading: {}", output_path.display());

        let child = Command::new(&self.binary)
            .args(build_args(manifest_url, output_path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => return DownloadOutcome::failed(output_path, MuxError::Launch(e.to_string())),
        };

        let spinner = self.show_progress.then(|| {
            let name = output_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            create_spinner(&format!("Downloading {}", name))
        });

        // Dropping the wait future on timeout kills the child.
        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        match result {
            Err(_) => {
                tracing::error!("Download timed out: {}", output_path.display());
                DownloadOutcome::failed(output_path, MuxError::TimedOut(self.timeout))
            }
            Ok(Err(e)) => DownloadOutcome::failed(output_path, MuxError::Launch(e.to_string())),
            Ok(Ok(output)) if output.status.success() => {
                match tokio::fs::metadata(output_path).await {
                    Ok(meta) => tracing::info!(
                        "Download complete: {} ({:.2} MB)",
                        output_path.display(),
                        meta.len() as f64 / (1024.0 * 1024.0)
                    ),
                    Err(_) => tracing::info!("Download complete: {}", output_path.display()),
                }
                DownloadOutcome::succeeded(output_path)
            }
            Ok(Ok(output)) => {
                let error = MuxError::Exit {
                    status: output.status.to_string(),
                    stderr: stderr_tail(&output.stderr),
                };
                tracing::error!("{}", error);
                DownloadOutcome::failed(output_path, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn muxer(binary: &str, timeout: Duration) -> FfmpegMuxer {
        FfmpegMuxer {
            binary: locate_binary(binary),
            timeout,
            show_progress: false,
        }
    }

    #[test]
    fn test_build_args() {
        let args = build_args("https://cdn.example.com/a.m3u8", Path::new("out/Show_Episode1.mp4"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-i",
                "https://cdn.example.com/a.m3u8",
                "-c",
                "copy",
                "-bsf:a",
                "aac_adtstoasc",
                "-y",
                "out/Show_Episode1.mp4",
            ]
        );
    }

    #[test]
    fn test_stderr_tail() {
        let stderr = b"line1\nline2\n\nline3\nline4\nline5\nline6\n";
        assert_eq!(stderr_tail(stderr), "line2 | line3 | line4 | line5 | line6");
        assert_eq!(stderr_tail(b""), "");
    }

    #[test]
    fn test_locate_binary_keeps_paths() {
        assert_eq!(
            locate_binary("/opt/ffmpeg/bin/ffmpeg"),
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(
            locate_binary("no-such-binary-here"),
            PathBuf::from("no-such-binary-here")
        );
    }

    #[test]
    fn test_timeout_message() {
        let error = MuxError::TimedOut(Duration::from_secs(3600));
        assert_eq!(error.to_string(), "muxer timed out after 3600s");
    }

    #[tokio::test]
    async fn test_probe_missing_binary() {
        let muxer = muxer("no-such-ffmpeg-binary", Duration::from_secs(5));
        let err = muxer.probe().await.unwrap_err();
        assert!(matches!(err, Error::FFmpegNotFound(_)));
    }

    #[tokio::test]
    async fn test_download_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("a.mp4");
        let muxer = muxer("no-such-ffmpeg-binary", Duration::from_secs(5));

        let outcome = muxer.download("https://cdn.example.com/a.m3u8", &output).await;
        assert!(!outcome.success);
        assert!(matches!(outcome.error, Some(MuxError::Launch(_))));
        // The destination directory is prepared before launching.
        assert!(dir.path().join("nested").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_defines_success() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("a.mp4");

        // `true` and `false` ignore their arguments.
        let ok = muxer("true", Duration::from_secs(5))
            .download("https://cdn.example.com/a.m3u8", &output)
            .await;
        assert!(ok.success);
        assert_eq!(ok.error, None);
        assert_eq!(ok.output_path, output);

        let failed = muxer("false", Duration::from_secs(5))
            .download("https://cdn.example.com/a.m3u8", &output)
            .await;
        assert!(!failed.success);
        assert!(matches!(failed.error, Some(MuxError::Exit { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_success() {
        tokio_test::assert_ok!(muxer("true", Duration::from_secs(5)).probe().await);
    }
}
