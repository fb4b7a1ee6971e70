//! Browser detection and install guidance.

use std::path::PathBuf;

/// Chromium-based executable names to search for on `PATH`. All of these
/// speak CDP.
const CHROMIUM_EXECUTABLES: &[&str] = &[
    "chrome",
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "msedge",
    "microsoft-edge-stable",
    "brave-browser",
];

/// macOS app bundle paths, checked before `PATH` (which can contain broken
/// wrapper scripts).
#[cfg(target_os = "macos")]
const MACOS_APP_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

#[cfg(target_os = "windows")]
const WINDOWS_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

/// Result of browser detection.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Path to the browser executable, if one was found.
    pub path: Option<PathBuf>,
    /// Platform-specific install instructions, populated when nothing was
    /// found.
    pub install_hint: String,
}

/// Detect a Chromium-based browser.
///
/// Checks, in order: the configured path, the `CHROME` environment variable,
/// platform install locations, and finally known executable names on `PATH`.
pub fn detect_browser(custom_path: Option<&str>) -> DetectionResult {
    if let Some(path) = custom_path {
        let p = PathBuf::from(path);
        if p.exists() {
            return found(p);
        }
    }

    if let Ok(path) = std::env::var("CHROME") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return found(p);
        }
    }

    #[cfg(target_os = "macos")]
    for path in MACOS_APP_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return found(p);
        }
    }

    #[cfg(target_os = "windows")]
    for path in WINDOWS_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return found(p);
        }
    }

    for name in CHROMIUM_EXECUTABLES {
        if let Ok(path) = which::which(name) {
            return found(path);
        }
    }

    DetectionResult {
        path: None,
        install_hint: install_instructions(),
    }
}

fn found(path: PathBuf) -> DetectionResult {
    DetectionResult {
        path: Some(path),
        install_hint: String::new(),
    }
}

/// Platform-specific install instructions, embedded in the fatal bootstrap
/// error when no browser is found.
pub fn install_instructions() -> String {
    let instructions = if cfg!(target_os = "macos") {
        "  brew install --cask google-chrome"
    } else if cfg!(target_os = "linux") {
        "  Debian/Ubuntu: sudo apt install chromium-browser\n  \
         Fedora:         sudo dnf install chromium\n  \
         Arch:           sudo pacman -S chromium"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome"
    } else {
        "  Download from https://www.google.com/chrome/"
    };

    format!(
        "no Chromium-based browser found. Install one:\n\n\
         {instructions}\n\n\
         Any Chromium-based browser works (Chrome, Chromium, Edge, Brave).\n\
         Or point at one explicitly:\n  \
         [browser]\n  \
         chrome_path = \"/path/to/browser\"\n\n\
         Or set the CHROME environment variable."
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn custom_path_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake-chrome");
        std::fs::write(&fake, "").unwrap();

        let result = detect_browser(fake.to_str());
        assert_eq!(result.path.as_deref(), Some(fake.as_path()));
        assert!(result.install_hint.is_empty());
    }

    #[test]
    fn invalid_custom_path_falls_through() {
        // Whether anything is found depends on the host; either way the
        // bogus path itself must not be returned.
        let result = detect_browser(Some("/nonexistent/path/to/chrome"));
        assert_ne!(
            result.path.as_deref(),
            Some(std::path::Path::new("/nonexistent/path/to/chrome"))
        );
    }

    #[test]
    fn install_hint_names_a_package_manager() {
        let hint = install_instructions();
        assert!(!hint.is_empty());

        #[cfg(target_os = "linux")]
        assert!(hint.contains("apt") || hint.contains("dnf") || hint.contains("pacman"));

        #[cfg(target_os = "macos")]
        assert!(hint.contains("brew"));
    }
}
