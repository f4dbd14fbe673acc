//! Boss catalog: respawn windows and display metadata, keyed by boss name.
//!
//! Loaded once at startup and shared read-only through [`crate::state::AppState`].
//! The catalog compiled into the binary is used unless `BOSS_TIMER_CATALOG`
//! points at another TOML file with the same layout:
//!
//! ```toml
//! [bosses."Ember Drake"]
//! min_mins = 60
//! max_mins = 90
//! img = "images/bosses/ember_drake.png"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const EMBEDDED_CATALOG: &str = include_str!("../catalog.toml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("catalog defines no bosses")]
    Empty,

    #[error("catalog contains a boss with an empty name")]
    EmptyName,

    #[error("boss '{name}' has min_mins {min_mins} greater than max_mins {max_mins}")]
    InvalidWindow {
        name: String,
        min_mins: u32,
        max_mins: u32,
    },
}

/// Respawn window of a single boss.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BossEntry {
    /// Earliest possible respawn, in minutes after the kill.
    pub min_mins: u32,
    /// Respawn is guaranteed by this many minutes after the kill.
    pub max_mins: u32,
    /// Display asset reference.
    pub img: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    bosses: BTreeMap<String, BossEntry>,
}

/// Immutable boss name → [`BossEntry`] mapping.
#[derive(Debug, Clone)]
pub struct BossCatalog {
    bosses: BTreeMap<String, BossEntry>,
}

impl BossCatalog {
    /// Read the catalog at `path`, or the embedded catalog when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)
            }
            None => Self::embedded(),
        }
    }

    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_toml_str(EMBEDDED_CATALOG)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(raw)?;
        Self::from_entries(file.bosses)
    }

    pub fn from_entries(
        bosses: impl IntoIterator<Item = (String, BossEntry)>,
    ) -> Result<Self, CatalogError> {
        let bosses: BTreeMap<String, BossEntry> = bosses.into_iter().collect();
        if bosses.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (name, entry) in &bosses {
            if name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if entry.min_mins > entry.max_mins {
                return Err(CatalogError::InvalidWindow {
                    name: name.clone(),
                    min_mins: entry.min_mins,
                    max_mins: entry.max_mins,
                });
            }
        }
        Ok(Self { bosses })
    }

    pub fn get(&self, name: &str) -> Option<&BossEntry> {
        self.bosses.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bosses.contains_key(name)
    }

    /// Boss names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bosses.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BossEntry)> {
        self.bosses.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bosses.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn embedded_catalog_is_valid() {
        let catalog = BossCatalog::embedded().unwrap();
        assert_ne!(catalog.len(), 0);
        for (_, entry) in catalog.iter() {
            assert!(entry.min_mins <= entry.max_mins);
            assert!(!entry.img.is_empty());
        }
    }

    #[test]
    fn parses_quoted_names() {
        let catalog = BossCatalog::from_toml_str(
            r#"
            [bosses."Boss A"]
            min_mins = 60
            max_mins = 90
            img = "a.png"

            [bosses.Zed]
            min_mins = 5
            max_mins = 5
            img = "z.png"
            "#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get("Boss A"),
            Some(&BossEntry { min_mins: 60, max_mins: 90, img: "a.png".into() })
        );
        assert!(catalog.contains("Zed"));
        assert!(!catalog.contains("boss a"));
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["Boss A", "Zed"]);
    }

    #[test]
    fn rejects_inverted_window() {
        let err = BossCatalog::from_toml_str(
            r#"
            [bosses.Backwards]
            min_mins = 90
            max_mins = 60
            img = "b.png"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidWindow { ref name, .. } if name == "Backwards"));
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = BossCatalog::from_toml_str("[bosses]\n").unwrap_err();
        assert!(matches!(err, CatalogError::Empty));
    }

    #[test]
    fn rejects_blank_name() {
        let err = BossCatalog::from_entries([(
            "  ".to_owned(),
            BossEntry { min_mins: 1, max_mins: 2, img: "x.png".into() },
        )])
        .unwrap_err();
        assert!(matches!(err, CatalogError::EmptyName));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BossCatalog::load(Some(Path::new("/nonexistent/catalog.toml"))).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
