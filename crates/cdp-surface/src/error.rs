use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// High-level error categories surfaced by the browser surface.
#[derive(Clone, Debug, Error, Serialize, Deserialize)]
pub enum SurfaceErrorKind {
    #[error("navigation timed out")]
    NavTimeout,
    #[error("element not found within retries")]
    ElementNotFound,
    #[error("element found but not interactable")]
    ElementNotReady,
    #[error("script evaluation failed")]
    EvalFailed,
    #[error("browser launch failed")]
    LaunchFailed,
    #[error("tab lifecycle error")]
    TabError,
    #[error("cdp i/o failure")]
    CdpIo,
}

/// Enriched error returned by every `BrowserSurface` primitive. Primitives
/// never panic; callers translate this into a failing `TaskResult`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceError {
    pub kind: SurfaceErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for SurfaceError {}

impl SurfaceError {
    pub fn new(kind: SurfaceErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            retriable: false,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }
}

impl From<chromiumoxide::error::CdpError> for SurfaceError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SurfaceError::new(SurfaceErrorKind::CdpIo).with_hint(err.to_string())
    }
}
