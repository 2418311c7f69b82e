//! Output file name generation.

use std::sync::OnceLock;

use regex::Regex;

/// Stem used when neither a custom name nor a usable page title exists.
pub const FALLBACK_STEM: &str = "video";

/// Episode markers already present in page titles, e.g. `第3集`, `Episode 3`, `EP03`.
fn episode_marker_pattern() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?i)第\s*\d+\s*[集话話]?|集\d+|\bepisode\s*\d+|\bep\.?\s*\d+")
            .expect("valid regex")
    })
}

/// Replace characters that are illegal in file names with underscores.
///
/// Covers `< > : " / \ | ? *` and control characters. Never fails; the
/// result may be empty when the input is.
pub fn sanitize_component(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Remove episode markers from a page title so the number is not repeated.
pub fn strip_episode_markers(title: &str) -> String {
    let stripped = episode_marker_pattern().replace_all(title, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c == '_' || c == '-' || c == '|' || c.is_whitespace())
        .to_string()
}

/// Append `.extension` unless the name already ends with it.
pub fn ensure_extension(name: &str, extension: &str) -> String {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    if name.to_lowercase().ends_with(&suffix.to_lowercase()) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

/// Build the output file name for an episode.
///
/// A custom series name wins over the page title. Titles have their own
/// episode markers removed before the label is appended.
pub fn resolve_filename(
    custom_name: Option<&str>,
    episode_label: &str,
    page_title: &str,
    extension: &str,
) -> String {
    let custom = custom_name
        .map(sanitize_component)
        .filter(|name| !name.is_empty());

    let stem = match custom {
        Some(name) => name,
        None => {
            let title = strip_episode_markers(&sanitize_component(page_title));
            if title.is_empty() {
                FALLBACK_STEM.to_string()
            } else {
                title
            }
        }
    };

    ensure_extension(&format!("{}_{}", stem, sanitize_component(episode_label)), extension)
}
