//! File system utilities.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{AppError, Result};

/// Read a required input file, reporting absence as `InputMissing`.
pub fn read_required(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::input_missing(path)),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Load TOML data from a file
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_required(path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_required_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_required(&dir.path().join("export.csv")).unwrap_err();
        assert!(matches!(err, AppError::InputMissing { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_toml_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[resolver]\nmax_hops = 3\n").unwrap();
        let config: crate::models::Config = load_toml(&path).unwrap();
        assert_eq!(config.resolver.max_hops, 3);
    }
}
