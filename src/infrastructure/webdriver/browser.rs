//! Browser specifics: executable discovery, session capabilities and driver
//! command lines for Firefox (geckodriver) and Chrome (chromedriver).

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::info;

use crate::domain::errors::{RunError, RunResult};
use crate::domain::models::{BrowserConfig, BrowserKind};

/// Standard install locations for the current OS, most common first.
pub fn candidate_paths(kind: BrowserKind) -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut paths: Vec<PathBuf> = Vec::new();

    if cfg!(windows) {
        let (vendor, exe) = match kind {
            BrowserKind::Firefox => (r"Mozilla Firefox", "firefox.exe"),
            BrowserKind::Chrome => (r"Google\Chrome\Application", "chrome.exe"),
        };
        for root in [r"C:\Program Files", r"C:\Program Files (x86)"] {
            paths.push(Path::new(root).join(vendor).join(exe));
        }
    } else if cfg!(target_os = "macos") {
        let bundle = match kind {
            BrowserKind::Firefox => "Firefox.app/Contents/MacOS/firefox",
            BrowserKind::Chrome => "Google Chrome.app/Contents/MacOS/Google Chrome",
        };
        paths.push(Path::new("/Applications").join(bundle));
        if let Some(home) = &home {
            paths.push(home.join("Applications").join(bundle));
        }
    } else {
        let names: &[&str] = match kind {
            BrowserKind::Firefox => &["firefox"],
            BrowserKind::Chrome => &["google-chrome", "google-chrome-stable", "chromium"],
        };
        for name in names {
            for dir in ["/usr/bin", "/usr/local/bin"] {
                paths.push(Path::new(dir).join(name));
            }
        }
    }

    paths
}

/// The configured browser executable, or the first standard location that exists.
pub fn resolve_binary(config: &BrowserConfig) -> RunResult<PathBuf> {
    if let Some(path) = config.binary_path.as_ref().filter(|p| p.is_file()) {
        return Ok(path.clone());
    }

    let found = candidate_paths(config.kind)
        .into_iter()
        .find(|candidate| candidate.is_file());

    match found {
        Some(path) => {
            info!(browser = config.kind.as_str(), path = %path.display(), "browser executable detected");
            Ok(path)
        }
        None => Err(RunError::MissingBinary {
            what: config.kind.as_str().to_string(),
            path: config.binary_path.clone(),
        }),
    }
}

/// `alwaysMatch` capabilities for a new session.
pub fn capabilities(config: &BrowserConfig, binary: &Path) -> Value {
    let binary = binary.display().to_string();
    match config.kind {
        BrowserKind::Firefox => {
            let mut args: Vec<String> = Vec::new();
            if let Some(profile) = config.profile_path.as_ref().filter(|p| p.is_dir()) {
                args.push("-profile".to_string());
                args.push(profile.display().to_string());
            }
            if config.headless {
                args.push("-headless".to_string());
            }
            json!({
                "browserName": "firefox",
                "moz:firefoxOptions": { "binary": binary, "args": args }
            })
        }
        BrowserKind::Chrome => {
            let mut args: Vec<String> = Vec::new();
            if let Some(profile) = config.profile_path.as_ref().filter(|p| p.is_dir()) {
                args.push(format!("user-data-dir={}", profile.display()));
            }
            if let Some(directory) = &config.profile_directory {
                args.push(format!("profile-directory={directory}"));
            }
            if config.headless {
                args.push("--headless=new".to_string());
            }
            json!({
                "browserName": "chrome",
                "goog:chromeOptions": { "binary": binary, "args": args }
            })
        }
    }
}

/// Command-line arguments for the driver server.
pub fn driver_args(kind: BrowserKind, port: u16) -> Vec<String> {
    match kind {
        BrowserKind::Firefox => vec!["--port".to_string(), port.to_string()],
        BrowserKind::Chrome => vec![format!("--port={port}")],
    }
}
