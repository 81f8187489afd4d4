//! Symbol model of one compilation unit
//!
//! 単位内の宣言 (Unit 層) と共有ライブラリ (Library 層) をまとめ、
//! 元言語の規則で名前を引く。構築後は読み取り専用。

use super::library::LibraryCatalog;
use super::table::{Scope, ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind, SymbolTable, Tier, TypeKind};
use super::types::{BuiltinType, ResolvedType};
use crate::ast::{Language, NodeId, TypeRef};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SymbolModel {
    library: Arc<LibraryCatalog>,
    unit: SymbolTable,
    language: Language,
    imports: Vec<String>,
    aliases: HashMap<String, String>,
    node_scopes: HashMap<NodeId, ScopeId>,
    node_symbols: HashMap<NodeId, SymbolId>,
    pending: usize,
    case_conflicts: Vec<Vec<SymbolId>>,
}

impl SymbolModel {
    /// Empty unit model over `library`
    pub fn new(library: Arc<LibraryCatalog>, language: Language) -> Self {
        Self {
            library,
            unit: SymbolTable::new(Tier::Unit),
            language,
            imports: Vec::new(),
            aliases: HashMap::new(),
            node_scopes: HashMap::new(),
            node_symbols: HashMap::new(),
            pending: 0,
            case_conflicts: Vec::new(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn library(&self) -> &Arc<LibraryCatalog> {
        &self.library
    }

    pub fn unit_table(&self) -> &SymbolTable {
        &self.unit
    }

    pub(crate) fn unit_table_mut(&mut self) -> &mut SymbolTable {
        &mut self.unit
    }

    /// Global scope of the unit
    pub fn global(&self) -> ScopeId {
        self.unit.global()
    }

    fn case_insensitive(&self) -> bool {
        self.language.is_case_insensitive()
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        match id.tier {
            Tier::Library => self.library.table().symbol(id),
            Tier::Unit => self.unit.symbol(id),
        }
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        match id.tier {
            Tier::Library => self.library.table().scope(id),
            Tier::Unit => self.unit.scope(id),
        }
    }

    /// Declared name of `id`, or the empty string
    pub fn name_of(&self, id: SymbolId) -> &str {
        self.symbol(id).map(|s| s.name.as_str()).unwrap_or("")
    }

    // --- 構築中に使う設定 ---

    pub(crate) fn add_import(&mut self, namespace: &str) {
        let lang = self.language;
        if !self.imports.iter().any(|i| lang.names_match(i, namespace)) {
            self.imports.push(namespace.to_string());
        }
    }

    pub(crate) fn add_alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(alias.to_string(), target.to_string());
    }

    pub(crate) fn bind_scope(&mut self, node: NodeId, scope: ScopeId) {
        self.node_scopes.insert(node, scope);
    }

    pub(crate) fn bind_symbol(&mut self, node: NodeId, symbol: SymbolId) {
        self.node_symbols.insert(node, symbol);
    }

    pub(crate) fn set_pending(&mut self, count: usize) {
        self.pending = count;
    }

    pub(crate) fn set_case_conflicts(&mut self, conflicts: Vec<Vec<SymbolId>>) {
        self.case_conflicts = conflicts;
    }

    /// Imported namespaces, explicit and implicit
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Scope opened by a declaration, block or scoped statement
    pub fn scope_of_node(&self, node: NodeId) -> Option<ScopeId> {
        self.node_scopes.get(&node).copied()
    }

    /// Symbol declared by a declaration, declarator or parameter
    pub fn symbol_of_node(&self, node: NodeId) -> Option<SymbolId> {
        self.node_symbols.get(&node).copied()
    }

    /// Forward references still waiting for a resolution pass
    pub fn pending_forward_refs(&self) -> usize {
        self.pending
    }

    /// Groups of sibling symbols whose names differ only by case
    pub fn case_conflicts(&self) -> &[Vec<SymbolId>] {
        &self.case_conflicts
    }

    /// Fully qualified name following owner scopes (`System.AppDomain`)
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(sid) = current {
            let Some(sym) = self.symbol(sid) else {
                break;
            };
            parts.push(sym.name.as_str());
            current = self.scope(sym.scope).and_then(|s| s.owner);
        }
        parts.reverse();
        parts.join(".")
    }

    /// Innermost type enclosing `scope`
    pub fn enclosing_type(&self, scope: ScopeId) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(sid) = current {
            let s = self.scope(sid)?;
            if s.kind == ScopeKind::Type {
                return s.owner;
            }
            current = s.parent;
        }
        None
    }

    /// Innermost method or property enclosing `scope`
    pub fn enclosing_member(&self, scope: ScopeId) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(sid) = current {
            let s = self.scope(sid)?;
            match s.kind {
                ScopeKind::Member => return s.owner,
                ScopeKind::Type | ScopeKind::Namespace | ScopeKind::Global => return None,
                ScopeKind::Block => current = s.parent,
            }
        }
        None
    }

    // --- 名前解決 ---

    /// Resolve a simple name from `scope`: lexical scope chain (with
    /// inherited members at type scopes and VB module members at namespace
    /// scopes), then imports, then root namespaces of both tiers.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Vec<SymbolId> {
        let ci = self.case_insensitive();
        let mut current = Some(scope);
        while let Some(sid) = current {
            let Some(s) = self.scope(sid) else {
                break;
            };
            let direct = s.get(name, ci);
            if !direct.is_empty() {
                return direct.to_vec();
            }
            match s.kind {
                ScopeKind::Type => {
                    if let Some(owner) = s.owner {
                        let inherited = self.base_members(owner, name, &mut Vec::new());
                        if !inherited.is_empty() {
                            return inherited;
                        }
                    }
                }
                ScopeKind::Namespace | ScopeKind::Global if self.language == Language::VBNet => {
                    let hits = self.module_members(s, name);
                    if !hits.is_empty() {
                        return hits;
                    }
                }
                _ => {}
            }
            current = s.parent;
        }

        let mut hits = Vec::new();
        for (alias, target) in &self.aliases {
            if self.language.names_match(alias, name) {
                hits.extend(self.resolve_import(target));
            }
        }
        if !hits.is_empty() {
            return hits;
        }
        for import in &self.imports {
            for container in self.resolve_import(import) {
                for hit in self.members_of(container, name) {
                    if !hits.contains(&hit) {
                        hits.push(hit);
                    }
                }
                if self.language == Language::VBNet {
                    if let Some(members) = self.symbol(container).and_then(|c| c.members) {
                        if let Some(ns_scope) = self.scope(members) {
                            for hit in self.module_members(ns_scope, name) {
                                if !hits.contains(&hit) {
                                    hits.push(hit);
                                }
                            }
                        }
                    }
                }
            }
        }
        if !hits.is_empty() {
            return hits;
        }

        self.library
            .table()
            .scope(self.library.global())
            .map(|s| s.get(name, ci).to_vec())
            .unwrap_or_default()
    }

    /// Members of every VB module declared directly in `scope`
    fn module_members(&self, scope: &Scope, name: &str) -> Vec<SymbolId> {
        let ci = self.case_insensitive();
        let mut hits = Vec::new();
        for id in &scope.symbols {
            let Some(sym) = self.symbol(*id) else {
                continue;
            };
            if sym.type_kind() != Some(TypeKind::Module) {
                continue;
            }
            if let Some(members) = sym.members.and_then(|m| self.scope(m)) {
                hits.extend_from_slice(members.get(name, ci));
            }
        }
        hits
    }

    /// Namespaces or types named by an import directive, from both tiers
    pub fn resolve_import(&self, dotted: &str) -> Vec<SymbolId> {
        let mut hits = Vec::new();
        let library_hit = if self.case_insensitive() {
            self.library.by_qualified_name_folded(dotted)
        } else {
            self.library.by_qualified_name(dotted)
        };
        hits.extend(library_hit);
        hits.extend(self.find_in_unit(dotted));
        hits
    }

    fn find_in_unit(&self, dotted: &str) -> Option<SymbolId> {
        let ci = self.case_insensitive();
        let mut scope = self.unit.global();
        let mut found = None;
        for segment in dotted.split('.') {
            let s = self.unit.scope(scope)?;
            let id = s
                .get(segment, ci)
                .iter()
                .copied()
                .find(|id| self.symbol(*id).is_some_and(|sym| sym.kind.is_container()))?;
            found = Some(id);
            scope = self.symbol(id)?.members?;
        }
        found
    }

    /// Members named `name` of a namespace or type, searching base types
    pub fn members_of(&self, container: SymbolId, name: &str) -> Vec<SymbolId> {
        let mut visited = Vec::new();
        self.members_inner(container, name, &mut visited)
    }

    fn members_inner(&self, container: SymbolId, name: &str, visited: &mut Vec<SymbolId>) -> Vec<SymbolId> {
        if visited.contains(&container) {
            return Vec::new();
        }
        visited.push(container);
        let Some(sym) = self.symbol(container) else {
            return Vec::new();
        };
        if let Some(members) = sym.members.and_then(|m| self.scope(m)) {
            let direct = members.get(name, self.case_insensitive());
            if !direct.is_empty() {
                return direct.to_vec();
            }
        }
        if sym.kind.is_type() {
            return self.base_members(container, name, visited);
        }
        Vec::new()
    }

    fn base_members(&self, ty: SymbolId, name: &str, visited: &mut Vec<SymbolId>) -> Vec<SymbolId> {
        if !visited.contains(&ty) {
            visited.push(ty);
        }
        let Some(sym) = self.symbol(ty) else {
            return Vec::new();
        };
        for base in &sym.bases {
            if let Some(base_sym) = self.type_symbol(base) {
                let hits = self.members_inner(base_sym, name, visited);
                if !hits.is_empty() {
                    return hits;
                }
            }
        }
        // すべての型は暗黙に Object を継承する
        if sym.type_kind() != Some(TypeKind::Module) {
            if let Some(object) = self.library.builtin_symbol(BuiltinType::Object) {
                return self.members_inner(object, name, visited);
            }
        }
        Vec::new()
    }

    /// Members named `name` on a value of type `ty`
    pub fn members_of_type(&self, ty: &ResolvedType, name: &str) -> Vec<SymbolId> {
        self.type_symbol(ty)
            .map(|id| self.members_of(id, name))
            .unwrap_or_default()
    }

    /// Default property of a type, searching base types
    pub fn default_member(&self, ty: &ResolvedType) -> Option<SymbolId> {
        let mut current = self.type_symbol(ty);
        let mut guard = 0;
        while let Some(id) = current {
            let sym = self.symbol(id)?;
            if let Some(members) = sym.members.and_then(|m| self.scope(m)) {
                let found = members
                    .symbols
                    .iter()
                    .copied()
                    .find(|m| self.symbol(*m).is_some_and(|s| s.is_default));
                if found.is_some() {
                    return found;
                }
            }
            guard += 1;
            if guard > 32 {
                return None;
            }
            current = sym.bases.first().and_then(|b| self.type_symbol(b));
        }
        None
    }

    /// Type symbol describing the members of `ty`
    pub fn type_symbol(&self, ty: &ResolvedType) -> Option<SymbolId> {
        match ty {
            ResolvedType::Named(id) => Some(*id),
            ResolvedType::Builtin(b) => self.library.builtin_symbol(*b),
            ResolvedType::Array { .. } => self.library.by_qualified_name("System.Array"),
            ResolvedType::Delegate(_) | ResolvedType::Null | ResolvedType::Unknown => None,
        }
    }

    // --- 型 ---

    /// Resolve a written type reference from `scope`
    pub fn resolve_type_ref(&self, tref: &TypeRef, scope: ScopeId) -> ResolvedType {
        let mut ty = self.resolve_type_name(&tref.name, scope);
        for rank in tref.array_ranks.iter().rev() {
            ty = ResolvedType::array_of(ty, *rank);
        }
        ty
    }

    /// Resolve a (possibly qualified) type name; keywords of the unit's language first
    pub fn resolve_type_name(&self, name: &str, scope: ScopeId) -> ResolvedType {
        if let Some(builtin) = BuiltinType::from_keyword(self.language, name) {
            return ResolvedType::Builtin(builtin);
        }
        self.resolve_qualified(name, scope)
            .into_iter()
            .find(|id| self.symbol(*id).is_some_and(|s| s.kind.is_type()))
            .map(|id| self.named_type(id))
            .unwrap_or(ResolvedType::Unknown)
    }

    /// Namespaces and types reached by a dotted name
    pub fn resolve_qualified(&self, dotted: &str, scope: ScopeId) -> Vec<SymbolId> {
        let mut segments = dotted.split('.');
        let Some(first) = segments.next() else {
            return Vec::new();
        };
        let mut hits: Vec<SymbolId> = self
            .lookup(scope, first)
            .into_iter()
            .filter(|id| self.symbol(*id).is_some_and(|s| s.kind.is_container()))
            .collect();
        for segment in segments {
            hits = hits
                .iter()
                .flat_map(|h| self.members_of(*h, segment))
                .filter(|id| self.symbol(*id).is_some_and(|s| s.kind.is_container()))
                .collect();
            if hits.is_empty() {
                break;
            }
        }
        hits
    }

    /// `Named(id)`, or the built-in when `id` is the library type behind one
    pub fn named_type(&self, id: SymbolId) -> ResolvedType {
        if id.tier == Tier::Library {
            if let Some(builtin) = BuiltinType::from_clr_name(&self.qualified_name(id)) {
                return ResolvedType::Builtin(builtin);
            }
        }
        ResolvedType::Named(id)
    }

    /// Value type (`Some(true)`), reference type (`Some(false)`) or unknown
    pub fn is_value_type(&self, ty: &ResolvedType) -> Option<bool> {
        match ty {
            ResolvedType::Builtin(b) => Some(b.is_value_type()),
            ResolvedType::Named(id) => self
                .symbol(*id)
                .and_then(|s| s.type_kind())
                .map(|k| k.is_value_type()),
            ResolvedType::Array { .. } | ResolvedType::Delegate(_) | ResolvedType::Null => Some(false),
            ResolvedType::Unknown => None,
        }
    }

    /// Type kind of a named type
    pub fn type_kind(&self, ty: &ResolvedType) -> Option<TypeKind> {
        match ty {
            ResolvedType::Named(id) => self.symbol(*id).and_then(|s| s.type_kind()),
            ResolvedType::Delegate(_) => Some(TypeKind::Delegate),
            _ => None,
        }
    }

    /// Element type produced by indexing or enumerating `ty`
    pub fn element_type(&self, ty: &ResolvedType) -> ResolvedType {
        match ty {
            ResolvedType::Array { element, .. } => (**element).clone(),
            ResolvedType::Builtin(BuiltinType::String) => ResolvedType::Builtin(BuiltinType::Char),
            ResolvedType::Unknown => ResolvedType::Unknown,
            other => self
                .default_member(other)
                .and_then(|m| self.symbol(m))
                .map(|s| s.ty.clone())
                .unwrap_or(ResolvedType::Unknown),
        }
    }

    /// Writable access to a unit symbol during model construction
    pub(crate) fn unit_symbol_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.unit.symbol_mut(id)
    }

    /// Every unit symbol of `kind`
    pub fn unit_symbols_of_kind(&self, kind: SymbolKind) -> impl Iterator<Item = &Symbol> {
        self.unit.symbols().filter(move |s| s.kind == kind)
    }
}
