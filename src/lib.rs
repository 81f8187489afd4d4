//! clrconv - C# ⇄ VB.NET converter
//!
//! # Overview
//! Type-directed conversion between parsed C# and VB.NET syntax trees.
//! A front end hands over a [`driver::ParsedUnit`]; the converter resolves
//! every identifier against the unit's own declarations and a library
//! catalog, then rewrites the tree through a table of per-node rules.
//! Constructs with no counterpart become placeholders with an error
//! diagnostic instead of aborting the run.

pub mod ast;
pub mod casing;
pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod semantic;
pub mod symbols;

use std::path::Path;
use std::sync::Arc;

pub use ast::Language;
pub use config::ConversionOptions;
pub use diagnostics::Diagnostics;
pub use driver::{convert_batch, ConversionDriver, ConversionOutput, ParsedUnit};
pub use error::{ConvertError, Result};
pub use symbols::LibraryCatalog;

/// Convert one unit against the built-in core library with default options
pub fn convert_parsed(
    input: &ParsedUnit,
    target: Language,
) -> std::result::Result<ConversionOutput, Diagnostics> {
    let library = LibraryCatalog::core()
        .map_err(|err| diagnostics::from_error(&err, input.file.as_deref()))?;
    ConversionDriver::new(Arc::new(library), ConversionOptions::default()).run(input, target)
}

/// Convert a `ParsedUnit` JSON file and write the `ConversionOutput` JSON
pub fn convert_file(input: &Path, output: &Path, target: Language) -> anyhow::Result<()> {
    let parsed = ParsedUnit::load(input)?;
    let converted = convert_parsed(&parsed, target)
        .map_err(|diags| anyhow::anyhow!("{}", diags.to_text()))?;
    std::fs::write(output, converted.to_json()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstBuilder, DeclKind, TypeDeclKind};

    #[test]
    fn test_convert_parsed_module_to_static_class() {
        let b = AstBuilder::new(Language::VBNet);
        let module = b.type_decl(
            TypeDeclKind::Module,
            "Helpers",
            Default::default(),
            vec![],
            vec![b.method("Run", vec![])],
        );
        let input = ParsedUnit::new(Language::VBNet, b.unit(vec![], vec![module]));
        let out = convert_parsed(&input, Language::CSharp).unwrap();
        let DeclKind::Type {
            kind, modifiers, ..
        } = &out.unit.members[0].kind
        else {
            panic!("expected a type");
        };
        assert_eq!(*kind, TypeDeclKind::Class);
        assert!(modifiers.is_static);
    }

    #[test]
    fn test_convert_file_writes_json() {
        let b = AstBuilder::new(Language::CSharp);
        let input = ParsedUnit::new(
            Language::CSharp,
            b.unit(vec![], vec![b.class("Widget", vec![])]),
        );
        let dir = std::env::temp_dir().join(format!("clrconv-lib-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let in_path = dir.join("widget.json");
        let out_path = dir.join("widget.out.json");
        std::fs::write(&in_path, serde_json::to_string(&input).unwrap()).unwrap();

        convert_file(&in_path, &out_path, Language::VBNet).unwrap();
        let written = std::fs::read_to_string(&out_path).unwrap();
        let output: ConversionOutput = serde_json::from_str(&written).unwrap();
        assert_eq!(output.target_language, Language::VBNet);
        std::fs::remove_dir_all(&dir).ok();
    }
}
