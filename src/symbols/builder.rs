//! Symbol model construction
//!
//! 1. 宣言パス: 単位を走査してシンボルとスコープを登録する
//! 2. 解決パス: 型参照・初期化子からの推論・基底型・シグネチャを解決する。
//!    前方参照は進展がある限りパスを繰り返し、残ったものは Unknown にして
//!    警告を出す。

use super::library::LibraryCatalog;
use super::model::SymbolModel;
use super::table::{ScopeId, ScopeKind, SymbolId, SymbolKind, TypeKind};
use super::types::{BuiltinType, ResolvedType, Signature};
use crate::ast::{
    Block, CompilationUnit, Decl, DeclKind, Expr, Language, NodeId, Param, SourceRange, Stmt,
    StmtKind, TypeRef, VariableDeclarator,
};
use crate::config::ConversionOptions;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSpan, Diagnostics};
use crate::semantic::Resolver;
use std::sync::Arc;
use tracing::debug;

/// What is still missing for a symbol
#[derive(Debug, Clone)]
enum PendingKind {
    /// Written type, optionally wrapped in an array of the given rank
    Declared { ty: TypeRef, array_rank: Option<usize> },
    /// `Dim x = e` / `var x = e`
    Inferred(Expr),
    /// `For Each x In e` without a written type
    Element(Expr),
    /// Parameters and return type of a method or delegate
    Signature {
        params: Vec<TypeRef>,
        ret: Option<TypeRef>,
    },
    /// Event declared with a parameter list
    EventSignature(Vec<TypeRef>),
    Bases(Vec<TypeRef>),
}

#[derive(Debug, Clone)]
struct Pending {
    symbol: SymbolId,
    scope: ScopeId,
    range: SourceRange,
    kind: PendingKind,
}

enum Update {
    Type(ResolvedType),
    Signature(Signature),
    EventSignature(Signature),
    Bases(Vec<ResolvedType>),
}

/// Builds a `SymbolModel` for one compilation unit
pub struct SymbolModelBuilder {
    library: Arc<LibraryCatalog>,
    language: Language,
    options: ConversionOptions,
    file: Option<String>,
}

impl SymbolModelBuilder {
    pub fn new(library: Arc<LibraryCatalog>, language: Language) -> Self {
        Self {
            library,
            language,
            options: ConversionOptions::default(),
            file: None,
        }
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    /// Declare everything in `unit`, then resolve forward references
    pub fn build(&self, unit: &CompilationUnit) -> (SymbolModel, Diagnostics) {
        let mut model = SymbolModel::new(Arc::clone(&self.library), self.language);
        for import in &unit.imports {
            match &import.alias {
                Some(alias) => model.add_alias(alias, &import.namespace),
                None => model.add_import(&import.namespace),
            }
        }
        for ns in self.options.implicit_imports_for(self.language) {
            model.add_import(&ns);
        }

        let global = model.global();
        model.bind_scope(unit.id, global);
        let mut declarer = Declarer {
            model: &mut model,
            pending: Vec::new(),
        };
        for member in &unit.members {
            declarer.declare_decl(member, global, false);
        }
        let pending = declarer.pending;

        let mut diagnostics = Diagnostics::new();
        let remaining = self.resolve_passes(&mut model, pending);
        for p in &remaining {
            let name = model.name_of(p.symbol).to_string();
            let message = match &p.kind {
                PendingKind::Declared { ty, .. } => {
                    format!("type '{}' of '{}' could not be resolved", ty.name, name)
                }
                PendingKind::Inferred(_) | PendingKind::Element(_) => {
                    format!("type of '{name}' could not be inferred")
                }
                PendingKind::Signature { .. } | PendingKind::EventSignature(_) => {
                    format!("signature of '{name}' refers to an unresolved type")
                }
                PendingKind::Bases(_) => format!("base type of '{name}' could not be resolved"),
            };
            diagnostics.add(Diagnostic::new(
                DiagnosticKind::UnresolvedSymbol,
                message,
                DiagnosticSpan::from_range(self.file.as_deref(), p.range),
                "resolve",
            ));
        }
        // 解決できなかった参照は Unknown のまま確定させる
        model.set_pending(0);

        if self.language == Language::CSharp {
            let conflicts: Vec<Vec<SymbolId>> = model
                .unit_table()
                .scopes()
                .flat_map(|s| s.case_collisions().map(<[SymbolId]>::to_vec).collect::<Vec<_>>())
                .collect();
            model.set_case_conflicts(conflicts);
        }

        debug!(
            symbols = model.unit_table().len(),
            unresolved = remaining.len(),
            "symbol model built"
        );
        (model, diagnostics)
    }

    /// Run resolution passes until nothing is pending, no pass makes
    /// progress, or the pass limit is reached. Returns what is left.
    fn resolve_passes(&self, model: &mut SymbolModel, mut pending: Vec<Pending>) -> Vec<Pending> {
        let max_passes = self.options.max_resolve_passes.max(1);
        let mut pass = 0;
        model.set_pending(pending.len());
        while !pending.is_empty() && pass < max_passes {
            pass += 1;
            let before = pending.len();
            let results: Vec<(Pending, Update, bool)> = {
                let resolver = Resolver::new(model);
                pending
                    .into_iter()
                    .map(|p| {
                        let (update, done) = resolve_one(model, &resolver, &p);
                        (p, update, done)
                    })
                    .collect()
            };
            pending = Vec::new();
            for (p, update, done) in results {
                apply(model, p.symbol, update);
                if !done {
                    pending.push(p);
                }
            }
            model.set_pending(pending.len());
            debug!(pass, resolved = before - pending.len(), left = pending.len(), "resolve pass");
            if pending.len() == before {
                break;
            }
        }
        pending
    }
}

fn resolve_one(model: &SymbolModel, resolver: &Resolver<'_>, p: &Pending) -> (Update, bool) {
    match &p.kind {
        PendingKind::Declared { ty, array_rank } => {
            let mut resolved = model.resolve_type_ref(ty, p.scope);
            let done = !resolved.is_unknown();
            if let Some(rank) = array_rank {
                resolved = ResolvedType::array_of(resolved, *rank);
            }
            (Update::Type(resolved), done)
        }
        PendingKind::Inferred(expr) => {
            let ty = resolver.type_of(expr, p.scope);
            let done = !ty.is_unknown();
            // `var x = null` は Object として扱う
            let ty = if ty == ResolvedType::Null {
                ResolvedType::Builtin(BuiltinType::Object)
            } else {
                ty
            };
            (Update::Type(ty), done)
        }
        PendingKind::Element(expr) => {
            let collection = resolver.type_of(expr, p.scope);
            let ty = model.element_type(&collection);
            let done = !ty.is_unknown();
            (Update::Type(ty), done)
        }
        PendingKind::Signature { params, ret } => {
            let params: Vec<ResolvedType> = params
                .iter()
                .map(|t| model.resolve_type_ref(t, p.scope))
                .collect();
            let ret = ret
                .as_ref()
                .map(|t| model.resolve_type_ref(t, p.scope))
                .unwrap_or(ResolvedType::Builtin(BuiltinType::Void));
            let done = !ret.is_unknown() && params.iter().all(|t| !t.is_unknown());
            (Update::Signature(Signature { params, ret }), done)
        }
        PendingKind::EventSignature(params) => {
            let params: Vec<ResolvedType> = params
                .iter()
                .map(|t| model.resolve_type_ref(t, p.scope))
                .collect();
            let done = params.iter().all(|t| !t.is_unknown());
            let sig = Signature {
                params,
                ret: ResolvedType::Builtin(BuiltinType::Void),
            };
            (Update::EventSignature(sig), done)
        }
        PendingKind::Bases(bases) => {
            let bases: Vec<ResolvedType> = bases
                .iter()
                .map(|t| model.resolve_type_ref(t, p.scope))
                .collect();
            let done = bases.iter().all(|t| !t.is_unknown());
            (Update::Bases(bases), done)
        }
    }
}

fn apply(model: &mut SymbolModel, id: SymbolId, update: Update) {
    let Some(sym) = model.unit_symbol_mut(id) else {
        return;
    };
    match update {
        Update::Type(ty) => sym.ty = ty,
        Update::Signature(sig) => {
            match sym.kind {
                SymbolKind::Method => sym.ty = sig.ret.clone(),
                SymbolKind::Type(TypeKind::Delegate) => {}
                _ => sym.ty = ResolvedType::Delegate(Box::new(sig.clone())),
            }
            sym.signature = Some(sig);
        }
        Update::EventSignature(sig) => {
            sym.ty = ResolvedType::Delegate(Box::new(sig.clone()));
            sym.signature = Some(sig);
        }
        Update::Bases(bases) => sym.bases = bases,
    }
}

/// Pass 1 walker
struct Declarer<'m> {
    model: &'m mut SymbolModel,
    pending: Vec<Pending>,
}

impl Declarer<'_> {
    fn declare(&mut self, scope: ScopeId, name: &str, kind: SymbolKind, node: Option<NodeId>) -> SymbolId {
        let table = self.model.unit_table_mut();
        let id = table.declare(scope, name, kind, ResolvedType::Unknown);
        if let Some(node) = node {
            if let Some(sym) = table.symbol_mut(id) {
                sym.declaration = Some(node);
            }
            self.model.bind_symbol(node, id);
        }
        id
    }

    fn defer(&mut self, symbol: SymbolId, scope: ScopeId, range: SourceRange, kind: PendingKind) {
        self.pending.push(Pending {
            symbol,
            scope,
            range,
            kind,
        });
    }

    fn set_type(&mut self, id: SymbolId, ty: ResolvedType) {
        if let Some(sym) = self.model.unit_symbol_mut(id) {
            sym.ty = ty;
        }
    }

    fn set_static(&mut self, id: SymbolId, is_static: bool) {
        if let Some(sym) = self.model.unit_symbol_mut(id) {
            sym.is_static = is_static;
        }
    }

    fn open_scope(&mut self, kind: ScopeKind, parent: ScopeId, owner: Option<SymbolId>) -> ScopeId {
        self.model.unit_table_mut().add_scope(kind, parent, owner)
    }

    /// Reuse a namespace declared earlier in the same scope (partial namespaces)
    fn namespace_scope(&mut self, parent: ScopeId, name: &str, node: NodeId) -> ScopeId {
        let mut scope = parent;
        for segment in name.split('.') {
            let existing = self
                .model
                .unit_table()
                .scope(scope)
                .map(|s| s.get(segment, self.model.language().is_case_insensitive()).to_vec())
                .unwrap_or_default()
                .into_iter()
                .find_map(|id| {
                    let sym = self.model.symbol(id)?;
                    (sym.kind == SymbolKind::Namespace).then_some(sym.members).flatten()
                });
            scope = match existing {
                Some(members) => members,
                None => {
                    let id = self.declare(scope, segment, SymbolKind::Namespace, None);
                    let members = self.open_scope(ScopeKind::Namespace, scope, Some(id));
                    if let Some(sym) = self.model.unit_symbol_mut(id) {
                        sym.members = Some(members);
                    }
                    members
                }
            };
        }
        self.model.bind_scope(node, scope);
        scope
    }

    fn declare_decl(&mut self, decl: &Decl, scope: ScopeId, in_module: bool) {
        match &decl.kind {
            DeclKind::Namespace { name, members } => {
                let ns_scope = self.namespace_scope(scope, name, decl.id);
                for member in members {
                    self.declare_decl(member, ns_scope, false);
                }
            }
            DeclKind::Type {
                name,
                kind,
                modifiers,
                bases,
                members,
            } => {
                let type_kind = TypeKind::from(*kind);
                let id = self.declare(scope, name, SymbolKind::Type(type_kind), Some(decl.id));
                let member_scope = self.open_scope(ScopeKind::Type, scope, Some(id));
                if let Some(sym) = self.model.unit_symbol_mut(id) {
                    sym.ty = ResolvedType::Named(id);
                    sym.members = Some(member_scope);
                }
                self.set_static(id, modifiers.is_static || type_kind == TypeKind::Module);
                self.model.bind_scope(decl.id, member_scope);
                if !bases.is_empty() {
                    self.defer(id, scope, decl.range, PendingKind::Bases(bases.clone()));
                }
                let module = type_kind == TypeKind::Module || modifiers.is_static;
                for member in members {
                    self.declare_decl(member, member_scope, module);
                }
            }
            DeclKind::Field {
                modifiers,
                declarators,
                ..
            } => {
                for d in declarators {
                    let id = self.declare_variable(d, scope, SymbolKind::Field);
                    self.set_static(id, modifiers.is_static || in_module);
                }
            }
            DeclKind::Method {
                name,
                modifiers,
                params,
                return_type,
                body,
            } => {
                let id = self.declare(scope, name, SymbolKind::Method, Some(decl.id));
                self.set_static(id, modifiers.is_static || in_module);
                let member_scope = self.open_scope(ScopeKind::Member, scope, Some(id));
                if let Some(sym) = self.model.unit_symbol_mut(id) {
                    sym.members = Some(member_scope);
                }
                self.model.bind_scope(decl.id, member_scope);
                self.declare_params(params, member_scope);
                self.defer(
                    id,
                    scope,
                    decl.range,
                    PendingKind::Signature {
                        params: params.iter().map(|p| p.ty.clone()).collect(),
                        ret: return_type.clone(),
                    },
                );
                if let Some(body) = body {
                    self.declare_block(body, member_scope);
                }
            }
            DeclKind::Property {
                name,
                modifiers,
                ty,
                getter,
                setter,
            } => {
                let id = self.declare(scope, name, SymbolKind::Property, Some(decl.id));
                self.set_static(id, modifiers.is_static || in_module);
                self.defer(
                    id,
                    scope,
                    decl.range,
                    PendingKind::Declared {
                        ty: ty.clone(),
                        array_rank: None,
                    },
                );
                let member_scope = self.open_scope(ScopeKind::Member, scope, Some(id));
                self.model.bind_scope(decl.id, member_scope);
                if let Some(getter) = getter {
                    self.declare_block(getter, member_scope);
                }
                if let Some(setter) = setter {
                    let setter_scope = self.declare_block(setter, member_scope);
                    let value = self.declare(setter_scope, "value", SymbolKind::Parameter, None);
                    self.defer(
                        value,
                        member_scope,
                        setter.range,
                        PendingKind::Declared {
                            ty: ty.clone(),
                            array_rank: None,
                        },
                    );
                }
            }
            DeclKind::Event {
                name,
                modifiers,
                ty,
                params,
            } => {
                let id = self.declare(scope, name, SymbolKind::Event, Some(decl.id));
                self.set_static(id, modifiers.is_static || in_module);
                if let Some(ty) = ty {
                    self.defer(
                        id,
                        scope,
                        decl.range,
                        PendingKind::Declared {
                            ty: ty.clone(),
                            array_rank: None,
                        },
                    );
                } else {
                    let params = params.clone().unwrap_or_default();
                    self.defer(
                        id,
                        scope,
                        decl.range,
                        PendingKind::EventSignature(params.iter().map(|p| p.ty.clone()).collect()),
                    );
                }
            }
            DeclKind::Delegate {
                name,
                modifiers,
                params,
                return_type,
            } => {
                let id = self.declare(scope, name, SymbolKind::Type(TypeKind::Delegate), Some(decl.id));
                self.set_type(id, ResolvedType::Named(id));
                self.set_static(id, modifiers.is_static);
                self.defer(
                    id,
                    scope,
                    decl.range,
                    PendingKind::Signature {
                        params: params.iter().map(|p| p.ty.clone()).collect(),
                        ret: return_type.clone(),
                    },
                );
            }
            DeclKind::Unsupported(_) => {}
        }
    }

    fn declare_params(&mut self, params: &[Param], scope: ScopeId) {
        for p in params {
            let id = self.declare(scope, &p.name, SymbolKind::Parameter, Some(p.id));
            self.defer(
                id,
                scope,
                p.range,
                PendingKind::Declared {
                    ty: p.ty.clone(),
                    array_rank: None,
                },
            );
        }
    }

    fn declare_variable(&mut self, d: &VariableDeclarator, scope: ScopeId, kind: SymbolKind) -> SymbolId {
        let id = self.declare(scope, &d.name, kind, Some(d.id));
        let rank = d.bounds.as_ref().map(|b| b.len().max(1));
        match (&d.ty, &d.init) {
            (Some(ty), _) => self.defer(
                id,
                scope,
                d.range,
                PendingKind::Declared {
                    ty: ty.clone(),
                    array_rank: rank,
                },
            ),
            (None, Some(init)) if rank.is_none() => {
                self.defer(id, scope, d.range, PendingKind::Inferred(init.clone()))
            }
            (None, _) => {
                // 型のない VB 変数は Object
                let object = ResolvedType::Builtin(BuiltinType::Object);
                let ty = match rank {
                    Some(rank) => ResolvedType::array_of(object, rank),
                    None if self.model.language() == Language::VBNet => object,
                    None => ResolvedType::Unknown,
                };
                self.set_type(id, ty);
            }
        }
        id
    }

    fn declare_block(&mut self, block: &Block, parent: ScopeId) -> ScopeId {
        let scope = self.open_scope(ScopeKind::Block, parent, None);
        self.model.bind_scope(block.id, scope);
        for stmt in &block.stmts {
            self.declare_stmt(stmt, scope);
        }
        scope
    }

    fn declare_stmt(&mut self, stmt: &Stmt, scope: ScopeId) {
        match &stmt.kind {
            StmtKind::Local { declarators, .. } => {
                for d in declarators {
                    self.declare_variable(d, scope, SymbolKind::Local);
                }
            }
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                self.declare_block(then_block, scope);
                if let Some(else_block) = else_block {
                    self.declare_block(else_block, scope);
                }
            }
            StmtKind::While { body, .. } => {
                self.declare_block(body, scope);
            }
            StmtKind::For {
                var,
                var_type,
                start,
                body,
                ..
            } => {
                let loop_scope = self.open_scope(ScopeKind::Block, scope, None);
                self.model.bind_scope(stmt.id, loop_scope);
                match var_type {
                    Some(ty) => {
                        let id = self.declare(loop_scope, var, SymbolKind::Local, None);
                        self.defer(
                            id,
                            loop_scope,
                            stmt.range,
                            PendingKind::Declared {
                                ty: ty.clone(),
                                array_rank: None,
                            },
                        );
                    }
                    None if self.model.lookup(scope, var).is_empty() => {
                        let id = self.declare(loop_scope, var, SymbolKind::Local, None);
                        self.defer(id, scope, stmt.range, PendingKind::Inferred(start.clone()));
                    }
                    None => {}
                }
                self.declare_block(body, loop_scope);
            }
            StmtKind::CFor {
                init,
                iterators,
                body,
                ..
            } => {
                let loop_scope = self.open_scope(ScopeKind::Block, scope, None);
                self.model.bind_scope(stmt.id, loop_scope);
                for s in init.iter().chain(iterators) {
                    self.declare_stmt(s, loop_scope);
                }
                self.declare_block(body, loop_scope);
            }
            StmtKind::ForEach {
                var,
                var_type,
                collection,
                body,
            } => {
                let loop_scope = self.open_scope(ScopeKind::Block, scope, None);
                self.model.bind_scope(stmt.id, loop_scope);
                let id = self.declare(loop_scope, var, SymbolKind::Local, None);
                let kind = match var_type {
                    Some(ty) => PendingKind::Declared {
                        ty: ty.clone(),
                        array_rank: None,
                    },
                    None => PendingKind::Element(collection.clone()),
                };
                self.defer(id, scope, stmt.range, kind);
                self.declare_block(body, loop_scope);
            }
            StmtKind::Try {
                body,
                catches,
                finally,
            } => {
                self.declare_block(body, scope);
                for c in catches {
                    let catch_scope = self.open_scope(ScopeKind::Block, scope, None);
                    self.model.bind_scope(c.id, catch_scope);
                    if let Some(var) = &c.var {
                        let id = self.declare(catch_scope, var, SymbolKind::Local, None);
                        match &c.ty {
                            Some(ty) => self.defer(
                                id,
                                catch_scope,
                                c.range,
                                PendingKind::Declared {
                                    ty: ty.clone(),
                                    array_rank: None,
                                },
                            ),
                            None => {
                                let exception = self
                                    .model
                                    .library()
                                    .by_qualified_name("System.Exception")
                                    .map(ResolvedType::Named)
                                    .unwrap_or(ResolvedType::Unknown);
                                self.set_type(id, exception);
                            }
                        }
                    }
                    self.declare_block(&c.body, catch_scope);
                }
                if let Some(finally) = finally {
                    self.declare_block(finally, scope);
                }
            }
            StmtKind::Block(block) | StmtKind::Unsafe(block) => {
                self.declare_block(block, scope);
            }
            StmtKind::Assign { .. }
            | StmtKind::Expr(_)
            | StmtKind::Return(_)
            | StmtKind::Throw(_)
            | StmtKind::Exit { .. }
            | StmtKind::Continue { .. }
            | StmtKind::RaiseEvent { .. }
            | StmtKind::AddHandler { .. }
            | StmtKind::ReDim { .. }
            | StmtKind::OnError { .. }
            | StmtKind::Unsupported(_) => {}
        }
    }
}
