//! Casing normalizer
//!
//! VB の識別子は大文字小文字を区別しないので、書かれた綴りではなく宣言の綴り
//! を出力する。変換規則はここの関数で名前の綴りを決める。
//! `normalize_unit` は同じ処理を VB → VB の単独パスとして提供する。

use crate::ast::{
    Block, CatchClause, CompilationUnit, Decl, DeclKind, Expr, ExprKind, Language, NodeId, Param,
    SourceRange, Stmt, StmtKind, TypeRef, VariableDeclarator,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSpan, Diagnostics};
use crate::semantic::{ResolutionKind, Resolver};
use crate::symbols::{BuiltinType, ScopeId, SymbolId, SymbolModel};
use tracing::debug;

/// Spelling of a built-in type in `target`
pub fn builtin_spelling(builtin: BuiltinType, target: Language) -> String {
    match builtin.keyword(target) {
        Some(kw) => kw.to_string(),
        None => builtin
            .clr_name()
            .rsplit('.')
            .next()
            .unwrap_or(builtin.clr_name())
            .to_string(),
    }
}

/// Text to emit for a name written as `written` that resolved to `symbol`.
///
/// Keyword type names (`integer`, `string`) map to `target`'s keyword.
/// Returns `None` when nothing was bound; the caller keeps the written text.
pub fn identifier_spelling(
    model: &SymbolModel,
    written: &str,
    kind: ResolutionKind,
    symbol: Option<SymbolId>,
    target: Language,
) -> Option<String> {
    if kind == ResolutionKind::Type {
        if let Some(builtin) = BuiltinType::from_keyword(model.language(), written) {
            return Some(builtin_spelling(builtin, target));
        }
    }
    let symbol = symbol?;
    if model.language().is_case_insensitive() {
        Some(model.name_of(symbol).to_string())
    } else {
        Some(written.to_string())
    }
}

/// Declared spelling of an import target; unknown namespaces are kept as written
pub fn normalize_namespace(model: &SymbolModel, dotted: &str) -> String {
    if !model.language().is_case_insensitive() {
        return dotted.to_string();
    }
    match model.resolve_import(dotted).first() {
        Some(id) => model.qualified_name(*id),
        None => dotted.to_string(),
    }
}

/// Declared spelling of a (possibly qualified) type name, segment by segment
pub fn normalize_type_name(
    model: &SymbolModel,
    name: &str,
    scope: ScopeId,
    target: Language,
) -> Option<String> {
    if let Some(builtin) = BuiltinType::from_keyword(model.language(), name) {
        return Some(builtin_spelling(builtin, target));
    }
    let mut segments = name.split('.');
    let first = segments.next()?;
    let mut current = model
        .lookup(scope, first)
        .into_iter()
        .find(|id| model.symbol(*id).is_some_and(|s| s.kind.is_container()))?;
    let mut spelled = vec![model.name_of(current).to_string()];
    for segment in segments {
        current = model
            .members_of(current, segment)
            .into_iter()
            .find(|id| model.symbol(*id).is_some_and(|s| s.kind.is_container()))?;
        spelled.push(model.name_of(current).to_string());
    }
    if model.language().is_case_insensitive() {
        Some(spelled.join("."))
    } else {
        Some(name.to_string())
    }
}

/// Rewrite every identifier of a VB unit to its declared casing.
///
/// 入力は変更しない。正規化済みの木に再度適用しても結果は変わらない。
pub fn normalize_unit(
    unit: &CompilationUnit,
    model: &SymbolModel,
    file: Option<&str>,
) -> (CompilationUnit, Diagnostics) {
    let mut out = unit.clone();
    let mut normalizer = Normalizer {
        model,
        resolver: Resolver::new(model),
        scope: model.global(),
        diagnostics: Diagnostics::new(),
        file,
        renamed: 0,
    };
    if model.language().is_case_insensitive() {
        normalizer.unit(&mut out);
    }
    debug!(renamed = normalizer.renamed, "casing normalized");
    (out, normalizer.diagnostics)
}

struct Normalizer<'a> {
    model: &'a SymbolModel,
    resolver: Resolver<'a>,
    scope: ScopeId,
    diagnostics: Diagnostics,
    file: Option<&'a str>,
    renamed: usize,
}

impl Normalizer<'_> {
    fn rename(&mut self, slot: &mut String, spelled: String) {
        if *slot != spelled {
            *slot = spelled;
            self.renamed += 1;
        }
    }

    fn warn(&mut self, range: SourceRange, name: &str) {
        let span = DiagnosticSpan::from_range(self.file, range);
        self.diagnostics.add(Diagnostic::new(
            DiagnosticKind::UnresolvedSymbol,
            format!("'{name}' could not be resolved; casing left as written"),
            span,
            "resolve",
        ));
    }

    fn enter(&mut self, node: NodeId) -> ScopeId {
        let saved = self.scope;
        if let Some(scope) = self.model.scope_of_node(node) {
            self.scope = scope;
        }
        saved
    }

    fn unit(&mut self, unit: &mut CompilationUnit) {
        for import in &mut unit.imports {
            let spelled = normalize_namespace(self.model, &import.namespace);
            self.rename(&mut import.namespace, spelled);
        }
        let saved = self.enter(unit.id);
        for decl in &mut unit.members {
            self.decl(decl);
        }
        self.scope = saved;
    }

    fn type_ref(&mut self, ty: &mut TypeRef) {
        match normalize_type_name(self.model, &ty.name, self.scope, Language::VBNet) {
            Some(spelled) => self.rename(&mut ty.name, spelled),
            None => self.warn(ty.range, &ty.name.clone()),
        }
        for arg in &mut ty.type_args {
            self.type_ref(arg);
        }
    }

    fn params(&mut self, params: &mut [Param]) {
        for p in params {
            self.type_ref(&mut p.ty);
        }
    }

    fn decl(&mut self, decl: &mut Decl) {
        let saved = self.enter(decl.id);
        match &mut decl.kind {
            DeclKind::Namespace { members, .. } => {
                for m in members {
                    self.decl(m);
                }
            }
            DeclKind::Type { bases, members, .. } => {
                for b in bases {
                    self.type_ref(b);
                }
                for m in members {
                    self.decl(m);
                }
            }
            DeclKind::Field { declarators, .. } => {
                for d in declarators {
                    self.declarator(d);
                }
            }
            DeclKind::Method {
                params,
                return_type,
                body,
                ..
            } => {
                self.params(params);
                if let Some(ret) = return_type {
                    self.type_ref(ret);
                }
                if let Some(body) = body {
                    self.block(body);
                }
            }
            DeclKind::Property {
                ty, getter, setter, ..
            } => {
                self.type_ref(ty);
                if let Some(g) = getter {
                    self.block(g);
                }
                if let Some(s) = setter {
                    self.block(s);
                }
            }
            DeclKind::Event { ty, params, .. } => {
                if let Some(ty) = ty {
                    self.type_ref(ty);
                }
                if let Some(params) = params {
                    self.params(params);
                }
            }
            DeclKind::Delegate {
                params,
                return_type,
                ..
            } => {
                self.params(params);
                if let Some(ret) = return_type {
                    self.type_ref(ret);
                }
            }
            DeclKind::Unsupported(_) => {}
        }
        self.scope = saved;
    }

    fn declarator(&mut self, d: &mut VariableDeclarator) {
        if let Some(ty) = &mut d.ty {
            self.type_ref(ty);
        }
        for bound in d.bounds.iter_mut().flatten().flatten() {
            self.expr(bound);
        }
        if let Some(init) = &mut d.init {
            self.expr(init);
        }
    }

    fn block(&mut self, block: &mut Block) {
        let saved = self.enter(block.id);
        for s in &mut block.stmts {
            self.stmt(s);
        }
        self.scope = saved;
    }

    fn catch(&mut self, clause: &mut CatchClause) {
        let saved = self.enter(clause.id);
        if let Some(ty) = &mut clause.ty {
            self.type_ref(ty);
        }
        self.block(&mut clause.body);
        self.scope = saved;
    }

    fn bound_name(&mut self, var: &mut String, range: SourceRange) {
        match self.model.lookup(self.scope, var).first() {
            Some(id) => {
                let spelled = self.model.name_of(*id).to_string();
                self.rename(var, spelled);
            }
            None => self.warn(range, &var.clone()),
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        let saved = self.enter(stmt.id);
        let range = stmt.range;
        match &mut stmt.kind {
            StmtKind::Local { declarators, .. } => {
                for d in declarators {
                    self.declarator(d);
                }
            }
            StmtKind::Assign { target, value, .. } => {
                self.expr(target);
                self.expr(value);
            }
            StmtKind::Expr(e) => self.expr(e),
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.expr(cond);
                self.block(then_block);
                if let Some(e) = else_block {
                    self.block(e);
                }
            }
            StmtKind::While { cond, body } => {
                self.expr(cond);
                self.block(body);
            }
            StmtKind::For {
                var,
                var_type,
                start,
                end,
                step,
                body,
            } => {
                if var_type.is_none() {
                    self.bound_name(var, range);
                }
                if let Some(t) = var_type {
                    self.type_ref(t);
                }
                self.expr(start);
                self.expr(end);
                if let Some(s) = step {
                    self.expr(s);
                }
                self.block(body);
            }
            StmtKind::CFor {
                init,
                cond,
                iterators,
                body,
            } => {
                for s in init {
                    self.stmt(s);
                }
                if let Some(c) = cond {
                    self.expr(c);
                }
                for s in iterators {
                    self.stmt(s);
                }
                self.block(body);
            }
            StmtKind::ForEach {
                var,
                var_type,
                collection,
                body,
            } => {
                if var_type.is_none() {
                    self.bound_name(var, range);
                }
                if let Some(t) = var_type {
                    self.type_ref(t);
                }
                self.expr(collection);
                self.block(body);
            }
            StmtKind::Return(e) | StmtKind::Throw(e) => {
                if let Some(e) = e {
                    self.expr(e);
                }
            }
            StmtKind::Try {
                body,
                catches,
                finally,
            } => {
                self.block(body);
                for c in catches {
                    self.catch(c);
                }
                if let Some(f) = finally {
                    self.block(f);
                }
            }
            StmtKind::Block(b) | StmtKind::Unsafe(b) => self.block(b),
            StmtKind::RaiseEvent { event, args } => {
                self.bound_name(event, range);
                for a in args {
                    self.expr(a);
                }
            }
            StmtKind::AddHandler { event, handler, .. } => {
                self.expr(event);
                self.expr(handler);
            }
            StmtKind::ReDim { clauses, .. } => {
                for clause in clauses {
                    self.expr(&mut clause.target);
                    for b in &mut clause.bounds {
                        self.expr(b);
                    }
                }
            }
            StmtKind::Exit { .. }
            | StmtKind::Continue { .. }
            | StmtKind::OnError { .. }
            | StmtKind::Unsupported(_) => {}
        }
        self.scope = saved;
    }

    fn expr(&mut self, expr: &mut Expr) {
        // 子を書き換える前に解決する (照合は大文字小文字を区別しない)
        let resolution = self.resolver.resolve(expr, self.scope);
        match &mut expr.kind {
            ExprKind::Identifier(name) => {
                match identifier_spelling(
                    self.model,
                    name,
                    resolution.kind,
                    resolution.symbol,
                    Language::VBNet,
                ) {
                    Some(spelled) => self.rename(name, spelled),
                    None => self.warn(expr.range, &name.clone()),
                }
            }
            ExprKind::MemberAccess { target, member } => {
                let target_resolved = !self.resolver.resolve(target, self.scope).is_unresolved();
                match identifier_spelling(
                    self.model,
                    member,
                    resolution.kind,
                    resolution.symbol,
                    Language::VBNet,
                ) {
                    Some(spelled) => self.rename(member, spelled),
                    None if target_resolved && resolution.is_unresolved() => {
                        self.warn(expr.range, &member.clone())
                    }
                    None => {}
                }
                self.expr(target);
            }
            ExprKind::Invocation { target, args } | ExprKind::Index { target, args } => {
                self.expr(target);
                for a in args {
                    self.expr(a);
                }
            }
            ExprKind::RefArgument(inner)
            | ExprKind::AddressOf(inner)
            | ExprKind::Parenthesized(inner) => self.expr(inner),
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.expr(cond);
                self.expr(then_expr);
                self.expr(else_expr);
            }
            ExprKind::TypeTest { expr: inner, ty } | ExprKind::Cast { expr: inner, ty, .. } => {
                self.expr(inner);
                self.type_ref(ty);
            }
            ExprKind::ObjectCreation { ty, args } => {
                self.type_ref(ty);
                for a in args {
                    self.expr(a);
                }
            }
            ExprKind::ArrayCreation {
                element,
                dims,
                initializer,
                ..
            } => {
                self.type_ref(element);
                for d in dims {
                    self.expr(d);
                }
                for e in initializer.iter_mut().flatten() {
                    self.expr(e);
                }
            }
            ExprKind::DefaultValue(ty) | ExprKind::TypeOf(ty) => self.type_ref(ty),
            ExprKind::StackAlloc { element, size } => {
                self.type_ref(element);
                self.expr(size);
            }
            ExprKind::Literal(_)
            | ExprKind::This
            | ExprKind::Base
            | ExprKind::XmlLiteral(_)
            | ExprKind::Unsupported(_) => {}
        }
    }
}
