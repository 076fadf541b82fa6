use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BidError;
use crate::filter::Selection;
use crate::load::file_label;
use crate::matcher::MatchOptions;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A saved comparison session (`*.bids.toml`).
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub options: MatchOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    pub path: String,
    /// Catalog label; derived from the file name when omitted.
    #[serde(default)]
    pub label: Option<String>,
}

impl FileEntry {
    pub fn label(&self) -> String {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label.trim().to_string(),
            _ => file_label(Path::new(&self.path)),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl SessionConfig {
    pub fn from_toml(input: &str) -> Result<Self, BidError> {
        let config: SessionConfig =
            toml::from_str(input).map_err(|e| BidError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, BidError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| BidError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), BidError> {
        if self.files.is_empty() {
            return Err(BidError::ConfigValidation("at least one file is required".into()));
        }

        for (i, file) in self.files.iter().enumerate() {
            if file.path.trim().is_empty() {
                return Err(BidError::ConfigValidation(format!("files[{i}]: path is empty")));
            }
        }

        let mut seen: Vec<String> = Vec::new();
        for file in &self.files {
            let label = file.label();
            if seen.contains(&label) {
                return Err(BidError::ConfigValidation(format!(
                    "duplicate label '{label}' (file '{}')",
                    file.path
                )));
            }
            seen.push(label);
        }

        Ok(())
    }

    /// File paths resolved against the directory holding the config file.
    pub fn resolve_paths(&self, config_path: &Path) -> Vec<(PathBuf, String)> {
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        self.files
            .iter()
            .map(|f| {
                let path = Path::new(&f.path);
                let resolved = if path.is_absolute() { path.to_path_buf() } else { base.join(path) };
                (resolved, f.label())
            })
            .collect()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("bid comparison")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
