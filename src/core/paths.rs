use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "BIOREMPP_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "results_table";

/// Get the reference data directory
/// Uses the configured directory, then BIOREMPP_DATA_DIR, then ./data
pub fn data_dir(configured: Option<&Path>) -> PathBuf {
    resolve_data_dir(configured, std::env::var(DATA_DIR_ENV).ok())
}

fn resolve_data_dir(configured: Option<&Path>, from_env: Option<String>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }
    match from_env {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_DATA_DIR),
    }
}

/// Check if the data directory comes from the environment
pub fn is_custom_data_dir() -> bool {
    std::env::var(DATA_DIR_ENV).is_ok()
}

/// Get a human-readable description of the current path configuration
pub fn describe_paths(configured: Option<&Path>) -> String {
    format!(
        "BioRemPP Paths:\n  \
        Data: {}\n  \
        Custom: {}",
        data_dir(configured).display(),
        if configured.is_some() || is_custom_data_dir() {
            "Yes"
        } else {
            "No (using defaults)"
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_dir_wins() {
        let dir = resolve_data_dir(Some(Path::new("/refs")), Some("/env".to_string()));
        assert_eq!(dir, PathBuf::from("/refs"));
    }

    #[test]
    fn test_env_then_default() {
        assert_eq!(
            resolve_data_dir(None, Some("/env".to_string())),
            PathBuf::from("/env")
        );
        assert_eq!(resolve_data_dir(None, None), PathBuf::from("data"));
        assert_eq!(
            resolve_data_dir(None, Some("  ".to_string())),
            PathBuf::from("data")
        );
    }
}
