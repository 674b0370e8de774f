use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Path constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "growthlog.yaml";
pub const DEFAULT_CREDENTIALS_FILE: &str = "secrets/gsheet_service_account.json";
pub const DEFAULT_METRICS_CSV: &str = "data/metrics/daily_metrics.csv";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path against the project root. Absolute paths pass
/// through untouched.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet key validation
// ---------------------------------------------------------------------------

static SHEET_ID_RE: OnceLock<Regex> = OnceLock::new();

fn sheet_id_re() -> &'static Regex {
    SHEET_ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap())
}

/// Google spreadsheet keys are URL-safe base64-ish strings.
pub fn is_valid_spreadsheet_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 128 && sheet_id_re().is_match(id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_spreadsheet_ids() {
        for id in ["1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms", "abc", "a_b-c"] {
            assert!(is_valid_spreadsheet_id(id), "expected valid: {id}");
        }
    }

    #[test]
    fn invalid_spreadsheet_ids() {
        for id in ["", "has spaces", "slash/inside", "https://docs.google.com/x"] {
            assert!(!is_valid_spreadsheet_id(id), "expected invalid: {id}");
        }
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            resolve(root, Path::new(DEFAULT_METRICS_CSV)),
            PathBuf::from("/tmp/proj/data/metrics/daily_metrics.csv")
        );
        assert_eq!(
            resolve(root, Path::new("/etc/key.json")),
            PathBuf::from("/etc/key.json")
        );
        assert_eq!(config_path(root), PathBuf::from("/tmp/proj/growthlog.yaml"));
    }
}
