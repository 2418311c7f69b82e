//! Per-episode URL derivation.
//!
//! Player pages usually carry the episode number in their last path segment,
//! most often as `<id>-<season>-<episode>.html`. Derivation rewrites that
//! number and falls back to progressively weaker conventions. It never fails:
//! when nothing can be rewritten the template is returned unchanged.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Prefix of the human-readable episode label.
pub const EPISODE_LABEL_PREFIX: &str = "Episode";

/// A concrete per-episode URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedUrl {
    pub url: String,
    pub episode_label: String,
}

/// Trailing-number conventions tried on the last path segment, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Convention {
    Bare,
    Dash,
    Underscore,
    Dot,
}

impl Convention {
    const ALL: [Convention; 4] = [
        Convention::Bare,
        Convention::Dash,
        Convention::Underscore,
        Convention::Dot,
    ];

    fn pattern(self) -> &'static Regex {
        static BARE: OnceLock<Regex> = OnceLock::new();
        static DASH: OnceLock<Regex> = OnceLock::new();
        static UNDERSCORE: OnceLock<Regex> = OnceLock::new();
        static DOT: OnceLock<Regex> = OnceLock::new();

        match self {
            Convention::Bare => {
                BARE.get_or_init(|| Regex::new(r"(?:^|[^-_.\d])(\d+)$").expect("valid regex"))
            }
            Convention::Dash => DASH.get_or_init(|| Regex::new(r"-(\d+)$").expect("valid regex")),
            Convention::Underscore => {
                UNDERSCORE.get_or_init(|| Regex::new(r"_(\d+)$").expect("valid regex"))
            }
            Convention::Dot => DOT.get_or_init(|| Regex::new(r"\.(\d+)$").expect("valid regex")),
        }
    }
}

fn triple_pattern() -> &'static Regex {
    static TRIPLE: OnceLock<Regex> = OnceLock::new();
    TRIPLE.get_or_init(|| Regex::new(r"(\d+)-(\d+)-(\d+)(\.html)").expect("valid regex"))
}

/// Build the label shown in logs and used in file names.
pub fn episode_label(episode: u32) -> String {
    format!("{}{}", EPISODE_LABEL_PREFIX, episode)
}

/// Derive the URL of `episode` from a template URL.
pub fn derive(template_url: &str, episode: u32) -> DerivedUrl {
    let episode_label = episode_label(episode);

    let url = match derive_from_triple(template_url, episode) {
        Some(url) => url,
        None => derive_fallback(template_url, episode),
    };

    DerivedUrl { url, episode_label }
}

/// Episode number embedded in a `<id>-<season>-<episode>.html` URL.
pub fn detect_episode(url: &str) -> Option<u32> {
    let captures = triple_pattern().captures(url)?;
    captures.get(3)?.as_str().parse().ok()
}

fn derive_from_triple(template_url: &str, episode: u32) -> Option<String> {
    let captures = triple_pattern().captures(template_url)?;
    let group = captures.get(3)?;

    tracing::debug!(
        "Episode group {} -> {} in {}",
        group.as_str(),
        episode,
        template_url
    );

    Some(splice(template_url, group.start(), group.end(), episode))
}

fn derive_fallback(template_url: &str, episode: u32) -> String {
    let mut parsed = match Url::parse(template_url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Cannot derive episode URL from {}: {}", template_url, e);
            return template_url.to_string();
        }
    };

    let path = parsed.path().to_string();
    let (dir, segment) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
    let (stem, extension) = split_extension(segment);

    let new_stem = Convention::ALL
        .iter()
        .find_map(|convention| {
            let captures = convention.pattern().captures(stem)?;
            let digits = captures.get(1)?;
            tracing::debug!("Using {:?} numbering in '{}'", convention, segment);
            Some(splice(stem, digits.start(), digits.end(), episode))
        })
        .unwrap_or_else(|| {
            tracing::debug!("No episode number in '{}', appending one", segment);
            format!("{}_{}", stem, episode)
        });

    parsed.set_path(&format!("{}/{}{}", dir, new_stem, extension));
    parsed.to_string()
}

/// Split `name.ext` into `("name", ".ext")`. Numeric suffixes are not
/// extensions, so `part.3` stays whole.
fn split_extension(segment: &str) -> (&str, &str) {
    match segment.rfind('.') {
        Some(pos) if pos > 0 => {
            let ext = &segment[pos + 1..];
            let is_extension = !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && !ext.chars().all(|c| c.is_ascii_digit());
            if is_extension {
                (&segment[..pos], &segment[pos..])
            } else {
                (segment, "")
            }
        }
        _ => (segment, ""),
    }
}

fn splice(text: &str, start: usize, end: usize, episode: u32) -> String {
    format!("{}{}{}", &text[..start], episode, &text[end..])
}
