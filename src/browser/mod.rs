//! Browser module.
//!
//! This module provides:
//! - The browsing session capability used by the episode processor
//! - Manifest capture from intercepted network requests
//! - A headless Chrome implementation over the DevTools protocol

pub mod chrome;
pub mod observer;
pub mod session;

pub use chrome::ChromeSession;
pub use observer::ManifestObserver;
pub use session::BrowserSession;
