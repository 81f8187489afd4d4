//! Conversion rule engine
//!
//! 入力木は変更せず、規則の表を使って後順 (子を先に) で新しい木を組み立てる。
//! 規則のないノードは "unsupported" のプレースホルダーとエラー診断になり、
//! 走査はそのまま続く。
//!
//! ## サブモジュール
//! - `table` - 規則の表 (RuleTable)
//! - `exprs` - 式の規則
//! - `stmts` - 文の規則
//! - `decls` - 宣言の規則
//! - `arrays` - 配列の上限・ReDim の規則
//! - `events` - イベント宣言・発火・購読の規則
//! - `types` - 型参照の変換

mod arrays;
mod decls;
mod events;
mod exprs;
mod stmts;
pub mod table;
mod types;

pub use table::{NodeKind, RuleTable, STANDARD_RULES};

use crate::ast::{
    visit::max_node_id, AstBuilder, Block, CompilationUnit, Decl, DeclKind, Expr, ExprKind,
    Import, JumpTarget, Language, NodeId, NodeMap, Placeholder, SourceRange, Stmt, StmtKind,
    TypeRef,
};
use crate::config::ConversionOptions;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSpan, Diagnostics};
use crate::error::{ConvertError, Result};
use crate::semantic::Resolver;
use crate::symbols::{ScopeId, SymbolId, SymbolModel, TypeKind};
use tracing::{debug, trace};

/// Result of converting one unit
#[derive(Debug, Clone)]
pub struct Converted {
    pub unit: CompilationUnit,
    pub node_map: NodeMap,
    pub diagnostics: Diagnostics,
}

/// Per-unit state threaded through every rule
pub struct ConversionContext<'a> {
    pub model: &'a SymbolModel,
    pub resolver: Resolver<'a>,
    pub source: Language,
    pub target: Language,
    pub options: &'a ConversionOptions,
    pub builder: AstBuilder,
    rules: &'static RuleTable,
    scope: ScopeId,
    diagnostics: Diagnostics,
    node_map: NodeMap,
    file: Option<String>,
    loop_stack: Vec<JumpTarget>,
    /// Return type of the method being converted (`None` for `Sub`/`void`)
    return_type: Option<Option<TypeRef>>,
    /// Kind of the type whose members are being converted
    type_kind: Option<TypeKind>,
    /// Set by `convert_callee` for the next expression converted
    pending_callee: bool,
    /// The expression whose rule is running is the target of a call
    callee: bool,
}

impl<'a> ConversionContext<'a> {
    pub fn new(
        model: &'a SymbolModel,
        target: Language,
        options: &'a ConversionOptions,
        unit: &CompilationUnit,
        file: Option<&str>,
    ) -> Result<Self> {
        let source = model.language();
        if source == target {
            return Err(ConvertError::InvalidLanguagePair {
                source_language: source,
                target,
            });
        }
        Ok(Self {
            model,
            resolver: Resolver::new(model),
            source,
            target,
            options,
            builder: AstBuilder::starting_at(target, max_node_id(unit) + 1),
            rules: &STANDARD_RULES,
            scope: model.global(),
            diagnostics: Diagnostics::new(),
            node_map: NodeMap::new(),
            file: file.map(str::to_string),
            loop_stack: Vec::new(),
            return_type: None,
            type_kind: None,
            pending_callee: false,
            callee: false,
        })
    }

    /// Use another rule table (tests register partial tables)
    pub fn with_rules(mut self, rules: &'static RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Run `f` inside the scope opened by `node`, if it opened one
    pub fn in_scope<T>(&mut self, node: NodeId, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.scope;
        if let Some(scope) = self.model.scope_of_node(node) {
            self.scope = scope;
        }
        let out = f(self);
        self.scope = saved;
        out
    }

    /// Run `f` with `target` as the innermost loop
    pub fn in_loop<T>(&mut self, target: JumpTarget, f: impl FnOnce(&mut Self) -> T) -> T {
        self.loop_stack.push(target);
        let out = f(self);
        self.loop_stack.pop();
        out
    }

    pub fn innermost_loop(&self) -> Option<JumpTarget> {
        self.loop_stack.last().copied()
    }

    /// Run `f` as the body of a member returning `ret`
    pub fn in_member<T>(&mut self, ret: Option<TypeRef>, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved_ret = self.return_type.replace(ret);
        let saved_loops = std::mem::take(&mut self.loop_stack);
        let out = f(self);
        self.return_type = saved_ret;
        self.loop_stack = saved_loops;
        out
    }

    /// Converted return type of the enclosing method; `None` outside methods
    pub fn return_type(&self) -> Option<&Option<TypeRef>> {
        self.return_type.as_ref()
    }

    pub fn in_type<T>(&mut self, kind: TypeKind, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.type_kind.replace(kind);
        let out = f(self);
        self.type_kind = saved;
        out
    }

    pub fn current_type_kind(&self) -> Option<TypeKind> {
        self.type_kind
    }

    /// Builder positioned at `range`
    pub fn at(&self, range: SourceRange) -> &AstBuilder {
        self.builder.at_range(range);
        &self.builder
    }

    /// Whether the current expression is a call target; read before converting children
    pub fn take_callee(&mut self) -> bool {
        std::mem::take(&mut self.callee)
    }

    // --- 診断 ---

    pub fn report(&mut self, kind: DiagnosticKind, range: SourceRange, message: String) {
        let span = DiagnosticSpan::from_range(self.file.as_deref(), range);
        self.diagnostics
            .add(Diagnostic::new(kind, message, span, "convert"));
    }

    pub fn warn_unresolved(&mut self, range: SourceRange, message: String) {
        self.report(DiagnosticKind::UnresolvedSymbol, range, message);
    }

    pub fn warn_ambiguous(&mut self, range: SourceRange, message: String) {
        self.report(DiagnosticKind::AmbiguousSemantics, range, message);
    }

    pub fn unsupported(&mut self, range: SourceRange, message: String) {
        self.report(DiagnosticKind::UnsupportedConstruct, range, message);
    }

    /// Declared name of a symbol
    pub fn declared_name(&self, symbol: SymbolId) -> String {
        self.model.name_of(symbol).to_string()
    }

    fn record(&mut self, original: NodeId, produced: NodeId) {
        self.node_map.record(original, produced);
    }

    fn no_rule_message(&self, kind: NodeKind) -> String {
        format!(
            "{} has no conversion from {} to {}",
            kind.name(),
            self.source,
            self.target
        )
    }

    fn placeholder(&mut self, kind: NodeKind, original: NodeId, range: SourceRange) -> Placeholder {
        debug!(kind = %kind.name(), node = %original, "no rule registered");
        let message = self.no_rule_message(kind);
        self.unsupported(range, message);
        Placeholder {
            kind: kind.name().to_string(),
            original,
        }
    }

    // --- 走査 ---

    /// Convert an expression (post-order through its rule)
    pub fn convert_expr(&mut self, expr: &Expr) -> Expr {
        let kind = NodeKind::of_expr(&expr.kind);
        self.callee = std::mem::take(&mut self.pending_callee);
        let Some(rule) = self.rules.expr_rule(kind, self.source, self.target) else {
            let placeholder = self.placeholder(kind, expr.id, expr.range);
            let out = self.at(expr.range).expr(ExprKind::Unsupported(placeholder));
            self.record(expr.id, out.id);
            return out;
        };
        trace!(kind = ?kind, node = %expr.id, "expr rule");
        let sem = self.resolver.semantics(expr, self.scope);
        if sem.ambiguous {
            self.warn_ambiguous(
                expr.range,
                "expression has more than one interpretation; the first was used".to_string(),
            );
        }
        let mut out = rule(expr, &sem, self);
        out.range = expr.range;
        self.record(expr.id, out.id);
        out
    }

    /// Convert the target of a call; a method group there is not an implicit call
    pub fn convert_callee(&mut self, expr: &Expr) -> Expr {
        self.pending_callee = true;
        self.convert_expr(expr)
    }

    pub fn convert_exprs(&mut self, exprs: &[Expr]) -> Vec<Expr> {
        exprs.iter().map(|e| self.convert_expr(e)).collect()
    }

    /// Convert a statement into zero or more target statements
    pub fn convert_stmt(&mut self, stmt: &Stmt) -> Vec<Stmt> {
        let kind = NodeKind::of_stmt(&stmt.kind);
        let Some(rule) = self.rules.stmt_rule(kind, self.source, self.target) else {
            let placeholder = self.placeholder(kind, stmt.id, stmt.range);
            let out = self.at(stmt.range).stmt(StmtKind::Unsupported(placeholder));
            self.record(stmt.id, out.id);
            return vec![out];
        };
        trace!(kind = ?kind, node = %stmt.id, "stmt rule");
        let sem = self.resolver.stmt_semantics(stmt, self.scope);
        let mut out = rule(stmt, &sem, self);
        for s in &mut out {
            if !s.range.is_known() {
                s.range = stmt.range;
            }
            self.node_map.record(stmt.id, s.id);
        }
        out
    }

    /// Convert a block in its own scope
    pub fn convert_block(&mut self, block: &Block) -> Block {
        let stmts = self.in_scope(block.id, |ctx| {
            block
                .stmts
                .iter()
                .flat_map(|s| ctx.convert_stmt(s))
                .collect::<Vec<_>>()
        });
        let out = Block {
            id: self.builder.next_id(),
            range: block.range,
            stmts,
        };
        self.record(block.id, out.id);
        out
    }

    /// Convert a declaration into zero or more target declarations
    pub fn convert_decl(&mut self, decl: &Decl) -> Vec<Decl> {
        let kind = NodeKind::of_decl(&decl.kind);
        let Some(rule) = self.rules.decl_rule(kind, self.source, self.target) else {
            let placeholder = self.placeholder(kind, decl.id, decl.range);
            let out = self.at(decl.range).decl(DeclKind::Unsupported(placeholder));
            self.record(decl.id, out.id);
            return vec![out];
        };
        trace!(kind = ?kind, node = %decl.id, "decl rule");
        self.check_case_conflict(decl);
        let out = rule(decl, self);
        for d in &out {
            self.node_map.record(decl.id, d.id);
        }
        out
    }

    pub fn convert_decls(&mut self, decls: &[Decl]) -> Vec<Decl> {
        decls.iter().flat_map(|d| self.convert_decl(d)).collect()
    }

    /// Warn when a case-sensitive declaration would collide in the target
    fn check_case_conflict(&mut self, decl: &Decl) {
        if self.target.is_case_insensitive() == self.source.is_case_insensitive() {
            return;
        }
        let mut symbols: Vec<SymbolId> = self.model.symbol_of_node(decl.id).into_iter().collect();
        if let DeclKind::Field { declarators, .. } = &decl.kind {
            symbols.extend(declarators.iter().filter_map(|d| self.model.symbol_of_node(d.id)));
        }
        for symbol in symbols {
            let conflict = self
                .model
                .case_conflicts()
                .iter()
                .find(|group| group.contains(&symbol))
                .cloned();
            if let Some(group) = conflict {
                let names: Vec<&str> = group.iter().map(|s| self.model.name_of(*s)).collect();
                let message = format!(
                    "'{}' differs only by case from another declaration ({}) and collides in {}",
                    self.model.name_of(symbol),
                    names.join(", "),
                    self.target
                );
                self.warn_ambiguous(decl.range, message);
            }
        }
    }

    /// Convert a whole compilation unit
    pub fn convert_unit(mut self, unit: &CompilationUnit) -> Converted {
        debug!(source = %self.source, target = %self.target, "converting unit");
        let imports = self.convert_imports(&unit.imports);
        let members = self.in_scope(unit.id, |ctx| ctx.convert_decls(&unit.members));
        let out = CompilationUnit {
            id: self.builder.next_id(),
            range: unit.range,
            imports,
            members,
        };
        self.record(unit.id, out.id);
        debug!(
            diagnostics = self.diagnostics.len(),
            mapped = self.node_map.len(),
            "unit converted"
        );
        Converted {
            unit: out,
            node_map: self.node_map,
            diagnostics: self.diagnostics,
        }
    }

    /// `using` ⇄ `Imports`; VB → C# writes VB's implicit imports out first
    fn convert_imports(&mut self, imports: &[Import]) -> Vec<Import> {
        let mut out: Vec<Import> = Vec::new();
        let target = self.target;
        let mut push = |ctx: &mut Self, namespace: String, alias: Option<String>, range: SourceRange, original: Option<NodeId>| {
            if alias.is_none()
                && out
                    .iter()
                    .any(|i| i.alias.is_none() && target.names_match(&i.namespace, &namespace))
            {
                return;
            }
            let import = Import {
                id: ctx.builder.next_id(),
                range,
                namespace,
                alias,
            };
            if let Some(original) = original {
                ctx.record(original, import.id);
            }
            out.push(import);
        };
        if self.source == Language::VBNet && self.options.emit_implicit_imports {
            for ns in self.options.implicit_imports_for(self.source) {
                push(self, ns, None, SourceRange::unknown(), None);
            }
        }
        for import in imports {
            let namespace = crate::casing::normalize_namespace(self.model, &import.namespace);
            push(self, namespace, import.alias.clone(), import.range, Some(import.id));
        }
        out
    }
}

/// Convert `unit` (already modelled by `model`) into `target`
pub fn convert_unit(
    unit: &CompilationUnit,
    model: &SymbolModel,
    target: Language,
    options: &ConversionOptions,
    file: Option<&str>,
) -> Result<Converted> {
    let ctx = ConversionContext::new(model, target, options, unit, file)?;
    Ok(ctx.convert_unit(unit))
}

#[cfg(test)]
mod tests;
