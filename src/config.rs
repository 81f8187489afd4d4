//! Conversion options

use crate::ast::Language;
use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Knobs for one conversion run. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Replaces the source language's always-imported namespaces
    pub implicit_imports: Option<Vec<String>>,
    /// VB → C#: write VB's implicit imports out as `using` directives
    pub emit_implicit_imports: bool,
    /// VB → C#: give uninitialized locals VB's default value
    pub initialize_locals: bool,
    /// Upper bound on forward-reference resolution passes
    pub max_resolve_passes: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            implicit_imports: None,
            emit_implicit_imports: true,
            initialize_locals: true,
            max_resolve_passes: 8,
        }
    }
}

impl ConversionOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        let options: ConversionOptions = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_resolve_passes == 0 {
            return Err(ConvertError::Config(
                "max_resolve_passes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Namespaces implicitly imported into a unit of `language`
    pub fn implicit_imports_for(&self, language: Language) -> Vec<String> {
        match &self.implicit_imports {
            Some(list) => list.clone(),
            None => language
                .implicit_imports()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
