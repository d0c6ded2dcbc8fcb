//! Dataset backing variable directives.
//!
//! The dataset is a JSON document with two top-level namespaces, `emoji` and
//! `data`. It is loaded once at startup and shared behind an `Arc`; there is
//! no reload path short of restarting the process.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::ContentConfig;

/// Error type for dataset loading.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Reading the dataset file failed
    #[error("Failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),

    /// The dataset file is not valid JSON
    #[error("Failed to parse dataset file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Namespace addressed by a variable directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// The `{emoji:...}` namespace
    Emoji,
    /// The `{data:...}` namespace
    Data,
}

/// Loaded key/value document resolved by variable directives.
///
/// Construct one explicitly at startup and inject it into the
/// [`TemplateEngine`](super::TemplateEngine); tests supply fixtures via
/// [`Dataset::from_value`] without touching the filesystem.
#[derive(Debug, Clone)]
pub struct Dataset {
    emoji: Value,
    data: Value,
}

impl Dataset {
    /// Build a dataset from an already-parsed JSON document.
    ///
    /// Missing namespaces default to empty objects.
    pub fn from_value(root: Value) -> Self {
        let mut root = root;
        let emoji = root
            .get_mut("emoji")
            .map(Value::take)
            .unwrap_or_else(|| Value::Object(Default::default()));
        let data = root
            .get_mut("data")
            .map(Value::take)
            .unwrap_or_else(|| Value::Object(Default::default()));
        Self { emoji, data }
    }

    /// Dataset with empty namespaces; every variable directive stays verbatim.
    pub fn empty() -> Self {
        Self::from_value(Value::Object(Default::default()))
    }

    /// Load a dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let raw = fs::read_to_string(path)?;
        let root: Value = serde_json::from_str(&raw)?;
        Ok(Self::from_value(root))
    }

    /// Locate and load the dataset for the configured content root.
    ///
    /// Prefers `{root}/{dataset_file}` (the pre-rendered copy), then
    /// `{dataset_file}` in the working directory. A missing file yields an
    /// empty dataset; a present but malformed file is a startup error.
    pub fn discover(content: &ContentConfig) -> Result<Self, DatasetError> {
        let rendered = Path::new(&content.root).join(&content.dataset_file);
        let local = PathBuf::from(&content.dataset_file);

        let path = if rendered.is_file() {
            rendered
        } else if local.is_file() {
            local
        } else {
            tracing::warn!(
                file = %content.dataset_file,
                "No dataset file found, variable directives will not resolve"
            );
            return Ok(Self::empty());
        };

        let dataset = Self::load(&path)?;
        tracing::info!(
            path = %path.display(),
            emoji_entries = dataset.namespace_len(Namespace::Emoji),
            data_entries = dataset.namespace_len(Namespace::Data),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Resolve a dotted path in the given namespace to its string form.
    ///
    /// Returns `None` when any segment is missing, an intermediate value is
    /// not an object, or the leaf is JSON `null`. String leaves render
    /// without quotes; other values use their JSON form.
    pub fn resolve(&self, namespace: Namespace, path: &str) -> Option<String> {
        let mut current = match namespace {
            Namespace::Emoji => &self.emoji,
            Namespace::Data => &self.data,
        };

        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }

        match current {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Number of top-level entries in a namespace (for stats reporting).
    pub fn namespace_len(&self, namespace: Namespace) -> usize {
        let value = match namespace {
            Namespace::Emoji => &self.emoji,
            Namespace::Data => &self.data,
        };
        value.as_object().map_or(0, |o| o.len())
    }
}
