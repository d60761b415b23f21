use chromiumoxide::element::Element;

use crate::error::{SurfaceError, SurfaceErrorKind};

/// Checks attached + visible + enabled in one round trip, matching the
/// gate `find()` retries against (§4.1). A disconnected node (detached by
/// a re-render between the query and the check) reads as not-ready rather
/// than erroring, so the retry loop simply tries again.
pub(crate) async fn is_ready(element: &Element) -> Result<bool, SurfaceError> {
    let ready = element
        .call_js_fn(
            "function() {\
                if (!this.isConnected) return false;\
                const style = window.getComputedStyle(this);\
                if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') return false;\
                const rect = this.getBoundingClientRect();\
                if (rect.width <= 0 || rect.height <= 0) return false;\
                if (this.disabled) return false;\
                return true;\
            }",
            false,
        )
        .await
        .map_err(|e| SurfaceError::new(SurfaceErrorKind::EvalFailed).with_hint(e.to_string()))?
        .result
        .value
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    Ok(ready)
}

pub(crate) async fn clear_value(element: &Element) -> Result<(), SurfaceError> {
    element
        .call_js_fn(
            "function() {\
                if ('value' in this) { this.value = ''; }\
                else if (this.isContentEditable) { this.textContent = ''; }\
                this.dispatchEvent(new Event('input', { bubbles: true }));\
            }",
            false,
        )
        .await
        .map_err(|e| SurfaceError::new(SurfaceErrorKind::EvalFailed).with_hint(e.to_string()))?;
    Ok(())
}
