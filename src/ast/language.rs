//! Source / target language identifiers

use serde::{Deserialize, Serialize};

/// One of the two surface syntaxes over the shared object model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(alias = "cs", alias = "c#")]
    CSharp,
    #[serde(alias = "vb", alias = "vb.net")]
    VBNet,
}

impl Language {
    /// Identifiers of VB are looked up without regard to case
    pub fn is_case_insensitive(&self) -> bool {
        matches!(self, Language::VBNet)
    }

    /// The other language of the pair
    pub fn counterpart(&self) -> Language {
        match self {
            Language::CSharp => Language::VBNet,
            Language::VBNet => Language::CSharp,
        }
    }

    /// Namespaces imported into every unit without an explicit directive
    pub fn implicit_imports(&self) -> &'static [&'static str] {
        match self {
            Language::CSharp => &[],
            Language::VBNet => &["System", "Microsoft.VisualBasic"],
        }
    }

    /// Compare two identifiers under this language's lookup rules
    pub fn names_match(&self, a: &str, b: &str) -> bool {
        if self.is_case_insensitive() {
            a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
        } else {
            a == b
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Language::CSharp => "cs",
            Language::VBNet => "vb",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::CSharp => write!(f, "C#"),
            Language::VBNet => write!(f, "VB.NET"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cs" | "c#" | "csharp" => Ok(Language::CSharp),
            "vb" | "vb.net" | "vbnet" => Ok(Language::VBNet),
            other => Err(format!("unknown language '{other}' (expected cs or vb)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_follows_language() {
        assert!(Language::VBNet.names_match("AppDomain", "appdomain"));
        assert!(!Language::CSharp.names_match("AppDomain", "appdomain"));
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("vb".parse::<Language>().unwrap(), Language::VBNet);
        assert_eq!("C#".parse::<Language>().unwrap(), Language::CSharp);
        assert!("java".parse::<Language>().is_err());
    }

    #[test]
    fn test_implicit_imports() {
        assert!(Language::CSharp.implicit_imports().is_empty());
        assert_eq!(
            Language::VBNet.implicit_imports(),
            &["System", "Microsoft.VisualBasic"]
        );
    }
}
