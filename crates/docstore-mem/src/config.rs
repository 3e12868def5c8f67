//! Repository configuration.
//!
//! ```toml
//! name = "test"
//! id_type = "sequenceHexRandomized"
//! debug_ids = false
//! strict_list_diff = true
//! create_root = true
//! ```

use docstore_state::ApplyOptions;
use serde::Deserialize;

use crate::error::{RepositoryError, Result};

/// How new document ids are generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdType {
    /// Random UUID v4.
    #[default]
    Varchar,
    /// Decimal counter starting at 1.
    Sequence,
    /// 16 hex digits from a xorshift sequence with a random seed.
    SequenceHexRandomized,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub name: String,
    pub id_type: IdType,
    /// Ids become `UUID_1`, `UUID_2`, ... whatever the id type.
    pub debug_ids: bool,
    /// Reject ListDiffs longer than their target list.
    pub strict_list_diff: bool,
    /// Create the root document when the repository is opened.
    pub create_root: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            id_type: IdType::default(),
            debug_ids: false,
            strict_list_diff: false,
            create_root: false,
        }
    }
}

impl RepositoryConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| RepositoryError::Config(format!("failed to parse repository config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(RepositoryError::Config("repository name must not be empty".into()));
        }
        Ok(())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    pub fn with_debug_ids(mut self, debug_ids: bool) -> Self {
        self.debug_ids = debug_ids;
        self
    }

    pub fn with_strict_list_diff(mut self, strict: bool) -> Self {
        self.strict_list_diff = strict;
        self
    }

    pub fn with_create_root(mut self, create_root: bool) -> Self {
        self.create_root = create_root;
        self
    }

    pub fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            strict_list_diff: self.strict_list_diff,
        }
    }
}
