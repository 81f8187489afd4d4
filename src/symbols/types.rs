//! Resolved type definitions

use super::table::SymbolId;
use crate::ast::Language;
use serde::{Deserialize, Serialize};

/// Well-known types with keyword spellings in both languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinType {
    Bool,
    Byte,
    Char,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    DateTime,
    String,
    Object,
    Void,
}

const ALL_BUILTINS: [BuiltinType; 13] = [
    BuiltinType::Bool,
    BuiltinType::Byte,
    BuiltinType::Char,
    BuiltinType::Int16,
    BuiltinType::Int32,
    BuiltinType::Int64,
    BuiltinType::Single,
    BuiltinType::Double,
    BuiltinType::Decimal,
    BuiltinType::DateTime,
    BuiltinType::String,
    BuiltinType::Object,
    BuiltinType::Void,
];

impl BuiltinType {
    /// Fully qualified runtime name
    pub fn clr_name(&self) -> &'static str {
        match self {
            BuiltinType::Bool => "System.Boolean",
            BuiltinType::Byte => "System.Byte",
            BuiltinType::Char => "System.Char",
            BuiltinType::Int16 => "System.Int16",
            BuiltinType::Int32 => "System.Int32",
            BuiltinType::Int64 => "System.Int64",
            BuiltinType::Single => "System.Single",
            BuiltinType::Double => "System.Double",
            BuiltinType::Decimal => "System.Decimal",
            BuiltinType::DateTime => "System.DateTime",
            BuiltinType::String => "System.String",
            BuiltinType::Object => "System.Object",
            BuiltinType::Void => "System.Void",
        }
    }

    /// Keyword spelling in `language`, if the language has one
    pub fn keyword(&self, language: Language) -> Option<&'static str> {
        let kw = match (language, self) {
            (Language::CSharp, BuiltinType::Bool) => "bool",
            (Language::CSharp, BuiltinType::Byte) => "byte",
            (Language::CSharp, BuiltinType::Char) => "char",
            (Language::CSharp, BuiltinType::Int16) => "short",
            (Language::CSharp, BuiltinType::Int32) => "int",
            (Language::CSharp, BuiltinType::Int64) => "long",
            (Language::CSharp, BuiltinType::Single) => "float",
            (Language::CSharp, BuiltinType::Double) => "double",
            (Language::CSharp, BuiltinType::Decimal) => "decimal",
            (Language::CSharp, BuiltinType::String) => "string",
            (Language::CSharp, BuiltinType::Object) => "object",
            (Language::CSharp, BuiltinType::Void) => "void",
            (Language::CSharp, BuiltinType::DateTime) => return None,
            (Language::VBNet, BuiltinType::Bool) => "Boolean",
            (Language::VBNet, BuiltinType::Byte) => "Byte",
            (Language::VBNet, BuiltinType::Char) => "Char",
            (Language::VBNet, BuiltinType::Int16) => "Short",
            (Language::VBNet, BuiltinType::Int32) => "Integer",
            (Language::VBNet, BuiltinType::Int64) => "Long",
            (Language::VBNet, BuiltinType::Single) => "Single",
            (Language::VBNet, BuiltinType::Double) => "Double",
            (Language::VBNet, BuiltinType::Decimal) => "Decimal",
            (Language::VBNet, BuiltinType::DateTime) => "Date",
            (Language::VBNet, BuiltinType::String) => "String",
            (Language::VBNet, BuiltinType::Object) => "Object",
            (Language::VBNet, BuiltinType::Void) => return None,
        };
        Some(kw)
    }

    /// Keyword lookup under the language's case rules
    pub fn from_keyword(language: Language, word: &str) -> Option<BuiltinType> {
        ALL_BUILTINS.iter().copied().find(|b| {
            b.keyword(language)
                .is_some_and(|kw| language.names_match(kw, word))
        })
    }

    pub fn from_clr_name(name: &str) -> Option<BuiltinType> {
        ALL_BUILTINS.iter().copied().find(|b| b.clr_name() == name)
    }

    pub fn is_value_type(&self) -> bool {
        !matches!(
            self,
            BuiltinType::String | BuiltinType::Object | BuiltinType::Void
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            BuiltinType::Byte | BuiltinType::Int16 | BuiltinType::Int32 | BuiltinType::Int64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral()
            || matches!(
                self,
                BuiltinType::Single | BuiltinType::Double | BuiltinType::Decimal
            )
    }

    /// Rank used for binary numeric promotion
    fn numeric_rank(&self) -> u8 {
        match self {
            BuiltinType::Byte => 1,
            BuiltinType::Int16 => 2,
            BuiltinType::Int32 => 3,
            BuiltinType::Int64 => 4,
            BuiltinType::Decimal => 5,
            BuiltinType::Single => 6,
            BuiltinType::Double => 7,
            _ => 0,
        }
    }

    /// Result type of an arithmetic operation on two numeric operands
    pub fn promote(a: BuiltinType, b: BuiltinType) -> BuiltinType {
        let widest = if a.numeric_rank() >= b.numeric_rank() { a } else { b };
        if widest.numeric_rank() < BuiltinType::Int32.numeric_rank() {
            BuiltinType::Int32
        } else {
            widest
        }
    }
}

/// Parameter and return types of a method or delegate shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<ResolvedType>,
    pub ret: ResolvedType,
}

/// Statically determined type of an expression or declaration.
///
/// Two values are interchangeable iff they are equal: `Named` compares the
/// declaring symbol, everything else compares shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolvedType {
    Builtin(BuiltinType),
    Named(SymbolId),
    Array {
        element: Box<ResolvedType>,
        rank: usize,
    },
    /// Delegate given by signature only (VB events declared with a parameter list)
    Delegate(Box<Signature>),
    /// Type of the `null` / `Nothing` literal
    Null,
    Unknown,
}

impl ResolvedType {
    pub fn is_unknown(&self) -> bool {
        matches!(self, ResolvedType::Unknown)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ResolvedType::Builtin(BuiltinType::String))
    }

    pub fn as_builtin(&self) -> Option<BuiltinType> {
        match self {
            ResolvedType::Builtin(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_integral(&self) -> bool {
        self.as_builtin().is_some_and(|b| b.is_integral())
    }

    pub fn array_of(element: ResolvedType, rank: usize) -> ResolvedType {
        ResolvedType::Array {
            element: Box::new(element),
            rank,
        }
    }

    /// Element type and rank when this is an array
    pub fn as_array(&self) -> Option<(&ResolvedType, usize)> {
        match self {
            ResolvedType::Array { element, rank } => Some((element, *rank)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_round_trip_per_language() {
        assert_eq!(
            BuiltinType::from_keyword(Language::CSharp, "int"),
            Some(BuiltinType::Int32)
        );
        assert_eq!(
            BuiltinType::from_keyword(Language::VBNet, "integer"),
            Some(BuiltinType::Int32)
        );
        assert_eq!(BuiltinType::from_keyword(Language::CSharp, "Int"), None);
        assert_eq!(BuiltinType::Int32.keyword(Language::VBNet), Some("Integer"));
        assert_eq!(BuiltinType::DateTime.keyword(Language::CSharp), None);
    }

    #[test]
    fn test_clr_name_lookup() {
        assert_eq!(
            BuiltinType::from_clr_name("System.String"),
            Some(BuiltinType::String)
        );
        assert_eq!(BuiltinType::from_clr_name("System.AppDomain"), None);
    }

    #[test]
    fn test_value_type_classification() {
        assert!(BuiltinType::Int32.is_value_type());
        assert!(BuiltinType::DateTime.is_value_type());
        assert!(!BuiltinType::String.is_value_type());
        assert!(!BuiltinType::Object.is_value_type());
    }

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(
            BuiltinType::promote(BuiltinType::Int16, BuiltinType::Byte),
            BuiltinType::Int32
        );
        assert_eq!(
            BuiltinType::promote(BuiltinType::Int32, BuiltinType::Double),
            BuiltinType::Double
        );
    }

    #[test]
    fn test_array_shape_equality() {
        let a = ResolvedType::array_of(ResolvedType::Builtin(BuiltinType::Int32), 2);
        let b = ResolvedType::array_of(ResolvedType::Builtin(BuiltinType::Int32), 2);
        let c = ResolvedType::array_of(ResolvedType::Builtin(BuiltinType::Int32), 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
