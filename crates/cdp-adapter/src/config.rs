use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;
use which::which;

pub const ENV_CHROME: &str = "A11Y_PROBE_CHROME";
pub const ENV_HEADLESS: &str = "A11Y_PROBE_HEADLESS";
pub const ENV_PROFILE: &str = "A11Y_PROBE_PROFILE";
const ENV_NO_SANDBOX: &str = "A11Y_PROBE_DISABLE_SANDBOX";
const ENV_SKIP_WELL_KNOWN: &str = "A11Y_PROBE_SKIP_OS_PATHS";

/// How to start (or reach) the browser. Defaults come from the environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    /// Empty means "let chromiumoxide find one".
    pub executable: PathBuf,
    pub user_data_dir: Option<PathBuf>,
    pub headless: bool,
    pub no_sandbox: bool,
    pub request_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    pub window_width: u32,
    pub window_height: u32,
    /// Attach here instead of launching.
    pub websocket_url: Option<String>,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: discover_chrome().unwrap_or_default(),
            user_data_dir: env::var_os(ENV_PROFILE).map(PathBuf::from),
            headless: env_bool(ENV_HEADLESS).unwrap_or(true),
            no_sandbox: env_bool(ENV_NO_SANDBOX).unwrap_or(false),
            request_timeout_ms: 30_000,
            navigation_timeout_ms: 30_000,
            window_width: 1280,
            window_height: 800,
            websocket_url: None,
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(target_os = "windows")]
const BINARY_NAMES: &[&str] = &["chrome.exe", "chromium.exe", "msedge.exe"];
#[cfg(not(target_os = "windows"))]
const BINARY_NAMES: &[&str] = &[
    "google-chrome-stable",
    "google-chrome",
    "chromium",
    "chromium-browser",
];

#[cfg(target_os = "macos")]
const WELL_KNOWN_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];
#[cfg(any(target_os = "linux", target_os = "freebsd"))]
const WELL_KNOWN_PATHS: &[&str] = &[
    "/usr/bin/google-chrome-stable",
    "/usr/bin/google-chrome",
    "/usr/bin/chromium-browser",
    "/usr/bin/chromium",
];
#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "freebsd")))]
const WELL_KNOWN_PATHS: &[&str] = &[];

/// First existing browser binary: `A11Y_PROBE_CHROME`, then `PATH`, then
/// the platform's usual install locations.
pub fn discover_chrome() -> Option<PathBuf> {
    let from_env = env::var(ENV_CHROME)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from);

    let skip_well_known = env::var(ENV_SKIP_WELL_KNOWN)
        .map(|raw| !raw.trim().is_empty())
        .unwrap_or(false);

    let found = from_env
        .into_iter()
        .chain(BINARY_NAMES.iter().filter_map(|name| which(name).ok()))
        .chain(
            WELL_KNOWN_PATHS
                .iter()
                .filter(move |_| !skip_well_known)
                .map(PathBuf::from),
        )
        .find(|candidate| candidate.exists());
    debug!(executable = ?found, "chrome discovery");
    found
}
