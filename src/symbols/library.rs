//! Referenced-library catalog
//!
//! 参照ライブラリの型とメンバーを JSON 記述から読み込み、読み取り専用の
//! 表にする。カタログは `Arc` で共有され、同時に走る変換の間でロックなしに
//! 参照される。

use super::table::{ScopeId, ScopeKind, SymbolId, SymbolKind, SymbolTable, Tier, TypeKind};
use super::types::{BuiltinType, ResolvedType, Signature};
use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

const CORE_LIBRARY: &str = include_str!("core_library.json");

/// Serialized form of a referenced library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryDescription {
    pub namespaces: Vec<NamespaceDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDescription {
    /// Dotted namespace name
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescription {
    pub name: String,
    pub kind: TypeKind,
    /// Qualified names of base types and interfaces
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberDescription>,
    /// Delegate parameter types
    #[serde(default)]
    pub params: Vec<String>,
    /// Delegate return type
    #[serde(default)]
    pub returns: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Field,
    Method,
    Property,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDescription {
    pub name: String,
    pub kind: MemberKind,
    /// Field/property type, method return type or event delegate type
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(rename = "default", default)]
    pub is_default: bool,
}

impl LibraryDescription {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ConvertError::Catalog(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Description of the built-in core catalog
    pub fn core() -> Result<Self> {
        Self::from_json(CORE_LIBRARY)
    }
}

/// Immutable catalog of every library type and member visible to a unit
#[derive(Debug, Clone)]
pub struct LibraryCatalog {
    table: SymbolTable,
    /// Exact qualified name → type or namespace
    qualified: HashMap<String, SymbolId>,
}

impl LibraryCatalog {
    /// Core catalog (System, System.Reflection, System.Collections, VB runtime)
    pub fn core() -> Result<Self> {
        Self::from_descriptions(&[LibraryDescription::core()?])
    }

    /// Core catalog extended with `extra`
    pub fn core_with(extra: LibraryDescription) -> Result<Self> {
        Self::from_descriptions(&[LibraryDescription::core()?, extra])
    }

    /// Build a catalog from several descriptions.
    ///
    /// Namespaces and types of every description are declared before any
    /// member, so member types may refer across descriptions.
    pub fn from_descriptions(descriptions: &[LibraryDescription]) -> Result<Self> {
        let mut catalog = Self {
            table: SymbolTable::new(Tier::Library),
            qualified: HashMap::new(),
        };

        let mut declared = Vec::new();
        for desc in descriptions {
            for ns in &desc.namespaces {
                if ns.name.trim().is_empty() {
                    return Err(ConvertError::Catalog("namespace with empty name".to_string()));
                }
                let ns_scope = catalog.ensure_namespace(&ns.name);
                for ty in &ns.types {
                    let qualified = format!("{}.{}", ns.name, ty.name);
                    if catalog.qualified.contains_key(&qualified) {
                        warn!(ty = %qualified, "duplicate library type ignored");
                        continue;
                    }
                    let id = catalog.table.declare(
                        ns_scope,
                        &ty.name,
                        SymbolKind::Type(ty.kind),
                        ResolvedType::Unknown,
                    );
                    let members = catalog.table.add_scope(ScopeKind::Type, ns_scope, Some(id));
                    if let Some(sym) = catalog.table.symbol_mut(id) {
                        sym.ty = ResolvedType::Named(id);
                        sym.members = Some(members);
                        sym.is_static = ty.kind == TypeKind::Module;
                    }
                    catalog.qualified.insert(qualified, id);
                    declared.push((id, members, ty));
                }
            }
        }

        for (id, members, ty) in declared {
            let bases: Vec<ResolvedType> = ty.bases.iter().map(|b| catalog.parse_type(b)).collect();
            let signature = (ty.kind == TypeKind::Delegate).then(|| Signature {
                params: ty.params.iter().map(|p| catalog.parse_type(p)).collect(),
                ret: ty
                    .returns
                    .as_deref()
                    .map(|r| catalog.parse_type(r))
                    .unwrap_or(ResolvedType::Builtin(BuiltinType::Void)),
            });
            if let Some(sym) = catalog.table.symbol_mut(id) {
                sym.bases = bases;
                sym.signature = signature;
            }
            for member in &ty.members {
                catalog.declare_member(members, member, ty.kind == TypeKind::Module);
            }
        }

        Ok(catalog)
    }

    fn ensure_namespace(&mut self, dotted: &str) -> ScopeId {
        let mut scope = self.table.global();
        let mut path = String::new();
        for segment in dotted.split('.') {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(segment);
            if let Some(existing) = self.qualified.get(&path).copied() {
                if let Some(members) = self.table.symbol(existing).and_then(|s| s.members) {
                    scope = members;
                    continue;
                }
            }
            let id = self
                .table
                .declare(scope, segment, SymbolKind::Namespace, ResolvedType::Unknown);
            let members = self.table.add_scope(ScopeKind::Namespace, scope, Some(id));
            if let Some(sym) = self.table.symbol_mut(id) {
                sym.members = Some(members);
            }
            self.qualified.insert(path.clone(), id);
            scope = members;
        }
        scope
    }

    fn declare_member(&mut self, scope: ScopeId, member: &MemberDescription, in_module: bool) {
        let ty = member
            .ty
            .as_deref()
            .map(|t| self.parse_type(t))
            .unwrap_or(ResolvedType::Builtin(BuiltinType::Void));
        let kind = match member.kind {
            MemberKind::Field => SymbolKind::Field,
            MemberKind::Method => SymbolKind::Method,
            MemberKind::Property => SymbolKind::Property,
            MemberKind::Event => SymbolKind::Event,
        };
        let signature = match member.kind {
            MemberKind::Method => Some(Signature {
                params: member.params.iter().map(|p| self.parse_type(p)).collect(),
                ret: ty.clone(),
            }),
            MemberKind::Property if !member.params.is_empty() => Some(Signature {
                params: member.params.iter().map(|p| self.parse_type(p)).collect(),
                ret: ty.clone(),
            }),
            _ => None,
        };
        let id = self.table.declare(scope, &member.name, kind, ty);
        if let Some(sym) = self.table.symbol_mut(id) {
            sym.is_static = member.is_static || in_module;
            sym.is_default = member.is_default;
            sym.signature = signature;
        }
    }

    /// Parse a catalog type string (`System.Int32`, `System.Reflection.Assembly[]`, `System.Int32[,]`)
    fn parse_type(&self, text: &str) -> ResolvedType {
        let mut base = text.trim();
        let mut ranks = Vec::new();
        while let Some(stripped) = base.strip_suffix(']') {
            let Some(open) = stripped.rfind('[') else {
                break;
            };
            ranks.push(stripped[open + 1..].matches(',').count() + 1);
            base = &stripped[..open];
        }
        let mut ty = if let Some(builtin) = BuiltinType::from_clr_name(base) {
            ResolvedType::Builtin(builtin)
        } else if let Some(id) = self.qualified.get(base) {
            ResolvedType::Named(*id)
        } else {
            warn!(ty = %text, "library type reference could not be resolved");
            ResolvedType::Unknown
        };
        // 末尾から剥がしたので、内側の次元から順に包む
        for rank in ranks {
            ty = ResolvedType::array_of(ty, rank);
        }
        ty
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn global(&self) -> ScopeId {
        self.table.global()
    }

    /// Namespace or type by exact qualified name
    pub fn by_qualified_name(&self, name: &str) -> Option<SymbolId> {
        self.qualified.get(name).copied()
    }

    /// Namespace or type by qualified name, ignoring case
    pub fn by_qualified_name_folded(&self, name: &str) -> Option<SymbolId> {
        self.by_qualified_name(name).or_else(|| {
            self.qualified
                .iter()
                .find(|(q, _)| q.eq_ignore_ascii_case(name))
                .map(|(_, id)| *id)
        })
    }

    /// Library type symbol backing a built-in
    pub fn builtin_symbol(&self, builtin: BuiltinType) -> Option<SymbolId> {
        self.by_qualified_name(builtin.clr_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> LibraryCatalog {
        LibraryCatalog::core().unwrap()
    }

    #[test]
    fn test_core_catalog_has_expected_types() {
        let catalog = core();
        for name in [
            "System.Object",
            "System.AppDomain",
            "System.IDisposable",
            "System.EventHandler",
            "System.Reflection.Assembly",
            "Microsoft.VisualBasic.Strings",
            "Microsoft.VisualBasic.CompilerServices.Utils",
        ] {
            assert!(catalog.by_qualified_name(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn test_member_types_are_parsed() {
        let catalog = core();
        let app_domain = catalog.by_qualified_name("System.AppDomain").unwrap();
        let members = catalog.table().symbol(app_domain).unwrap().members.unwrap();
        let scope = catalog.table().scope(members).unwrap();
        let get_assemblies = scope.get("GetAssemblies", false)[0];
        let assembly = catalog.by_qualified_name("System.Reflection.Assembly").unwrap();
        assert_eq!(
            catalog.table().symbol(get_assemblies).unwrap().ty,
            ResolvedType::array_of(ResolvedType::Named(assembly), 1)
        );
        let thread_id = scope.get("getcurrentthreadid", true)[0];
        let sym = catalog.table().symbol(thread_id).unwrap();
        assert!(sym.is_static);
        assert_eq!(sym.ty, ResolvedType::Builtin(BuiltinType::Int32));
    }

    #[test]
    fn test_delegate_signature() {
        let catalog = core();
        let handler = catalog.by_qualified_name("System.EventHandler").unwrap();
        let sym = catalog.table().symbol(handler).unwrap();
        assert_eq!(sym.type_kind(), Some(TypeKind::Delegate));
        assert_eq!(sym.param_count(), Some(2));
    }

    #[test]
    fn test_module_members_are_static() {
        let catalog = core();
        let strings = catalog.by_qualified_name("Microsoft.VisualBasic.Strings").unwrap();
        let members = catalog.table().symbol(strings).unwrap().members.unwrap();
        let len = catalog.table().scope(members).unwrap().get("Len", false)[0];
        assert!(catalog.table().symbol(len).unwrap().is_static);
    }

    #[test]
    fn test_extra_description_extends_core() {
        let extra = LibraryDescription::from_json(
            r#"{"namespaces": [{"name": "Acme.Widgets", "types": [
                {"name": "Widget", "kind": "class", "bases": ["System.Object"],
                 "members": [{"name": "Owner", "kind": "property", "type": "System.AppDomain"}]}
            ]}]}"#,
        )
        .unwrap();
        let catalog = LibraryCatalog::core_with(extra).unwrap();
        let widget = catalog.by_qualified_name("Acme.Widgets.Widget").unwrap();
        let object = catalog.by_qualified_name("System.Object").unwrap();
        assert_eq!(
            catalog.table().symbol(widget).unwrap().bases,
            vec![ResolvedType::Named(object)]
        );
        assert!(catalog.by_qualified_name("Acme").is_some());
    }

    #[test]
    fn test_bad_json_is_catalog_error() {
        let err = LibraryDescription::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConvertError::Catalog(_)));
    }

    #[test]
    fn test_qualified_lookup_folded() {
        let catalog = core();
        assert_eq!(
            catalog.by_qualified_name_folded("system.appdomain"),
            catalog.by_qualified_name("System.AppDomain")
        );
    }
}
