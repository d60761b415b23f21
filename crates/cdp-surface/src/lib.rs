//! Browser Surface (§4.1): a thin, stateless wrapper over a headful
//! Chromium tab. Everything above this crate talks to a browser only
//! through the `BrowserSurface` trait.

mod config;
mod element;
mod error;
mod surface;

pub use config::{SurfaceConfig, DEFAULT_USER_AGENT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
pub use error::{SurfaceError, SurfaceErrorKind};
pub use surface::{BrowserSurface, ChromiumSurface, ElementHandle, PageHandle};
