//! Symbol and scope arenas
//!
//! シンボルとスコープは表 (arena) に格納し、ID で参照する。スコープは親への
//! ID を持つだけで所有はしない。名前の索引は宣言どおりの綴りと小文字化した
//! 綴りの二つを持ち、後者は大文字小文字を区別しない言語の解決でだけ使う。

use super::types::{ResolvedType, Signature};
use crate::ast::{NodeId, TypeDeclKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which arena a symbol or scope lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Shared, read-only referenced-library catalog
    Library,
    /// Declarations of the unit being converted
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId {
    pub tier: Tier,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId {
    pub tier: Tier,
    pub index: u32,
}

/// Kind of a type symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Module,
    Delegate,
}

impl TypeKind {
    pub fn is_value_type(&self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::Enum)
    }
}

impl From<TypeDeclKind> for TypeKind {
    fn from(kind: TypeDeclKind) -> Self {
        match kind {
            TypeDeclKind::Class => TypeKind::Class,
            TypeDeclKind::Struct => TypeKind::Struct,
            TypeDeclKind::Interface => TypeKind::Interface,
            TypeDeclKind::Enum => TypeKind::Enum,
            TypeDeclKind::Module => TypeKind::Module,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Namespace,
    Type(TypeKind),
    Field,
    Method,
    Property,
    Event,
    Local,
    Parameter,
}

impl SymbolKind {
    pub fn is_type(&self) -> bool {
        matches!(self, SymbolKind::Type(_))
    }

    /// Namespaces and types can qualify a name
    pub fn is_container(&self) -> bool {
        matches!(self, SymbolKind::Namespace | SymbolKind::Type(_))
    }

    /// Members and variables that denote a value
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            SymbolKind::Field
                | SymbolKind::Property
                | SymbolKind::Event
                | SymbolKind::Local
                | SymbolKind::Parameter
        )
    }
}

/// A declared entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    /// Declared casing; the only casing ever emitted for this symbol
    pub name: String,
    pub kind: SymbolKind,
    /// Declared static type. Types carry `Named(self)`, methods their return type
    pub ty: ResolvedType,
    /// Scope that owns the declaration
    pub scope: ScopeId,
    pub is_static: bool,
    /// Scope holding the members of a namespace or type, or the parameters of a method
    pub members: Option<ScopeId>,
    /// Methods, delegate types and events declared with a parameter list
    pub signature: Option<Signature>,
    /// Base types and implemented interfaces
    pub bases: Vec<ResolvedType>,
    /// Default (parameterized) property such as `ArrayList.Item`
    pub is_default: bool,
    /// Declaring node in the unit, if any
    pub declaration: Option<NodeId>,
}

impl Symbol {
    pub fn type_kind(&self) -> Option<TypeKind> {
        match self.kind {
            SymbolKind::Type(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn param_count(&self) -> Option<usize> {
        self.signature.as_ref().map(|s| s.params.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    Global,
    Namespace,
    Type,
    Member,
    Block,
}

/// A lexical scope: namespace → type → member → block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Namespace, type or method that opened the scope
    pub owner: Option<SymbolId>,
    pub symbols: Vec<SymbolId>,
    by_name: HashMap<String, Vec<SymbolId>>,
    by_folded: HashMap<String, Vec<SymbolId>>,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>, owner: Option<SymbolId>) -> Self {
        Self {
            id,
            kind,
            parent,
            owner,
            symbols: Vec::new(),
            by_name: HashMap::new(),
            by_folded: HashMap::new(),
        }
    }

    fn insert(&mut self, name: &str, id: SymbolId) {
        self.symbols.push(id);
        self.by_name.entry(name.to_string()).or_default().push(id);
        self.by_folded.entry(fold(name)).or_default().push(id);
    }

    /// Symbols declared directly in this scope under `name`
    pub fn get(&self, name: &str, case_insensitive: bool) -> &[SymbolId] {
        let hits = if case_insensitive {
            self.by_folded.get(&fold(name))
        } else {
            self.by_name.get(name)
        };
        hits.map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups of distinct spellings that collide when case is ignored
    pub fn case_collisions(&self) -> impl Iterator<Item = &[SymbolId]> {
        self.by_folded
            .iter()
            .filter(|(folded, ids)| {
                ids.len() > 1
                    && self
                        .by_name
                        .keys()
                        .filter(|name| fold(name) == **folded)
                        .count()
                        > 1
            })
            .map(|(_, ids)| ids.as_slice())
    }
}

/// Key of the case-insensitive index
pub fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Arena of symbols and scopes for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    tier: Tier,
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Empty table with its global scope
    pub fn new(tier: Tier) -> Self {
        let global = ScopeId { tier, index: 0 };
        Self {
            tier,
            symbols: Vec::new(),
            scopes: vec![Scope::new(global, ScopeKind::Global, None, None)],
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn global(&self) -> ScopeId {
        ScopeId {
            tier: self.tier,
            index: 0,
        }
    }

    pub fn add_scope(&mut self, kind: ScopeKind, parent: ScopeId, owner: Option<SymbolId>) -> ScopeId {
        let id = ScopeId {
            tier: self.tier,
            index: self.scopes.len() as u32,
        };
        self.scopes.push(Scope::new(id, kind, Some(parent), owner));
        id
    }

    /// Declare a symbol in `scope`; the returned id is filled into the symbol
    pub fn declare(&mut self, scope: ScopeId, name: &str, kind: SymbolKind, ty: ResolvedType) -> SymbolId {
        let id = SymbolId {
            tier: self.tier,
            index: self.symbols.len() as u32,
        };
        self.symbols.push(Symbol {
            id,
            name: name.to_string(),
            kind,
            ty,
            scope,
            is_static: false,
            members: None,
            signature: None,
            bases: Vec::new(),
            is_default: false,
            declaration: None,
        });
        if let Some(s) = self.scopes.get_mut(scope.index as usize) {
            s.insert(name, id);
        }
        id
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        if id.tier != self.tier {
            return None;
        }
        self.symbols.get(id.index as usize)
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        if id.tier != self.tier {
            return None;
        }
        self.symbols.get_mut(id.index as usize)
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        if id.tier != self.tier {
            return None;
        }
        self.scopes.get(id.index as usize)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
