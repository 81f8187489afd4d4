//! Conversion driver
//!
//! 一つの単位の変換を状態機械として進める。
//! Parsed → Resolving → Converting → Done
//!
//! 構文エラーのある入力は規則を一つも走らせずに拒否し、
//! 致命的な診断を一つだけ返す。それ以外の問題は診断として結果に残る。

use crate::ast::{realign_trivia, AnchoredTrivia, CompilationUnit, Language, NodeMap, TriviaStream};
use crate::config::ConversionOptions;
use crate::convert;
use crate::diagnostics::{from_error, Diagnostics};
use crate::error::{ConvertError, Result};
use crate::symbols::{LibraryCatalog, SymbolModelBuilder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Where a driver is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Input AST and trivia available
    Parsed,
    /// Symbol model under construction
    Resolving,
    /// Rule engine walk active
    Converting,
    /// Target AST complete, diagnostics final
    Done,
}

/// Parse error reported by the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    #[serde(default)]
    pub column: usize,
}

/// What the front end hands over for one compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedUnit {
    pub language: Language,
    #[serde(default)]
    pub file: Option<String>,
    pub unit: CompilationUnit,
    #[serde(default)]
    pub trivia: TriviaStream,
    #[serde(default)]
    pub parse_errors: Vec<ParseError>,
}

impl ParsedUnit {
    pub fn new(language: Language, unit: CompilationUnit) -> Self {
        Self {
            language,
            file: None,
            unit,
            trivia: TriviaStream::default(),
            parse_errors: Vec::new(),
        }
    }

    pub fn with_file(mut self, file: &str) -> Self {
        self.file = Some(file.to_string());
        self
    }

    pub fn with_trivia(mut self, trivia: TriviaStream) -> Self {
        self.trivia = trivia;
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a unit from a JSON file; the file name is used when the JSON has none
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut parsed = Self::from_json(&text)?;
        if parsed.file.is_none() {
            parsed.file = Some(path.display().to_string());
        }
        Ok(parsed)
    }

    fn malformed(&self) -> Option<ConvertError> {
        let first = self.parse_errors.first()?;
        Some(ConvertError::MalformedInput {
            count: self.parse_errors.len(),
            line: first.line,
            message: first.message.clone(),
        })
    }
}

/// What the printer receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub target_language: Language,
    pub unit: CompilationUnit,
    pub trivia: Vec<AnchoredTrivia>,
    pub node_map: NodeMap,
    pub diagnostics: Diagnostics,
}

impl ConversionOutput {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs one conversion at a time against a shared library catalog
pub struct ConversionDriver {
    library: Arc<LibraryCatalog>,
    options: ConversionOptions,
    state: DriverState,
}

impl ConversionDriver {
    pub fn new(library: Arc<LibraryCatalog>, options: ConversionOptions) -> Self {
        Self {
            library,
            options,
            state: DriverState::Parsed,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    fn enter(&mut self, next: DriverState) {
        debug!(from = ?self.state, to = ?next, "driver state");
        self.state = next;
    }

    /// Convert `input` into `target`.
    ///
    /// `Err` carries the single fatal diagnostic of a run that never reached
    /// the rule engine. A finished run keeps every warning and error it produced.
    pub fn run(
        &mut self,
        input: &ParsedUnit,
        target: Language,
    ) -> std::result::Result<ConversionOutput, Diagnostics> {
        self.state = DriverState::Parsed;
        let file = input.file.as_deref();
        let fatal = |err: ConvertError| from_error(&err, file);

        if let Some(err) = input.malformed() {
            return Err(fatal(err));
        }
        if input.language == target {
            return Err(fatal(ConvertError::InvalidLanguagePair {
                source_language: input.language,
                target,
            }));
        }

        self.enter(DriverState::Resolving);
        let (model, mut diagnostics) = SymbolModelBuilder::new(Arc::clone(&self.library), input.language)
            .with_options(self.options.clone())
            .with_file(input.file.clone())
            .build(&input.unit);
        let pending = model.pending_forward_refs();
        if pending > 0 {
            return Err(fatal(ConvertError::PendingForwardRefs(pending)));
        }

        self.enter(DriverState::Converting);
        let converted = convert::convert_unit(&input.unit, &model, target, &self.options, file).map_err(fatal)?;
        let trivia = realign_trivia(&input.trivia, &input.unit, &converted.node_map);
        diagnostics.extend(converted.diagnostics);

        self.enter(DriverState::Done);
        info!(
            file = file.unwrap_or("<input>"),
            errors = diagnostics.errors().count(),
            warnings = diagnostics.warnings().count(),
            "conversion finished"
        );
        Ok(ConversionOutput {
            target_language: target,
            unit: converted.unit,
            trivia,
            node_map: converted.node_map,
            diagnostics,
        })
    }
}

/// Convert independent units in parallel. Results keep the input order.
pub fn convert_batch(
    inputs: &[ParsedUnit],
    target: Language,
    library: Arc<LibraryCatalog>,
    options: &ConversionOptions,
) -> Vec<std::result::Result<ConversionOutput, Diagnostics>> {
    debug!(units = inputs.len(), "batch conversion");
    inputs
        .par_iter()
        .map(|input| ConversionDriver::new(Arc::clone(&library), options.clone()).run(input, target))
        .collect()
}
