//! Episode addressing.
//!
//! Provides:
//! - Per-episode requests built by the batch runner
//! - Episode URL derivation and start-episode detection

pub mod request;
pub mod url;

pub use request::EpisodeRequest;
pub use self::url::{derive, detect_episode, episode_label, DerivedUrl};
