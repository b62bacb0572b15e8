use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use changes_register::DEFAULT_AUTHOR;
use changes_sync::parse_sources;

/// Contents of `changes.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub changeset: ChangesetConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangesetConfig {
    /// Comma-separated default pull sources.
    pub sources: String,
    pub author: String,
    pub branch: Option<String>,
    pub state: PathBuf,
}

impl Default for ChangesetConfig {
    fn default() -> Self {
        Self {
            sources: String::new(),
            author: DEFAULT_AUTHOR.to_string(),
            branch: None,
            state: PathBuf::from(".changes/state.json"),
        }
    }
}

impl Config {
    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn sources(&self) -> Vec<String> {
        parse_sources(&self.changeset.sources)
    }
}
