/// Desktop viewport: wide enough that responsive sites render their
/// desktop layout rather than a mobile nav.
pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36";

/// Launch parameters for the Chromium surface. Headless is intentionally
/// not exposed as a knob here: a human needs to see the window to complete
/// a CAPTCHA, so `SurfaceConfig::default()` is the only constructor
/// production code should use. Tests may still flip it.
#[derive(Clone, Debug)]
pub struct SurfaceConfig {
    pub headless: bool,
    pub viewport: (u32, u32),
    pub user_agent: String,
    pub executable_path: Option<String>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport: (VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            executable_path: std::env::var("TASKBROWSER_CHROME_PATH").ok(),
        }
    }
}
