//! Rule table
//!
//! 規則は (ノード種別, 元言語, 先言語) をキーにした純粋関数の表で引く。
//! 言語の組を増やすときは表に項目を足すだけでよい。

use super::{arrays, decls, events, exprs, stmts, ConversionContext};
use crate::ast::{Decl, DeclKind, Expr, ExprKind, Language, Stmt, StmtKind};
use crate::semantic::{ExprSemantics, StmtSemantics};
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub type ExprRule = fn(&Expr, &ExprSemantics, &mut ConversionContext<'_>) -> Expr;
pub type StmtRule = fn(&Stmt, &StmtSemantics, &mut ConversionContext<'_>) -> Vec<Stmt>;
pub type DeclRule = fn(&Decl, &mut ConversionContext<'_>) -> Vec<Decl>;

/// Node kinds rules are registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // 式
    Literal,
    Identifier,
    MemberAccess,
    Invocation,
    Index,
    RefArgument,
    AddressOf,
    Binary,
    Unary,
    Conditional,
    TypeTest,
    Cast,
    Parenthesized,
    ObjectCreation,
    ArrayCreation,
    DefaultValue,
    TypeOf,
    This,
    Base,
    XmlLiteral,
    StackAlloc,
    // 文
    Local,
    Assign,
    ExprStmt,
    If,
    While,
    For,
    CFor,
    ForEach,
    Return,
    Throw,
    Try,
    Exit,
    Continue,
    Block,
    RaiseEvent,
    AddHandler,
    ReDim,
    OnError,
    Unsafe,
    // 宣言
    Namespace,
    Type,
    Field,
    Method,
    Property,
    Event,
    Delegate,
    /// Placeholder already present in the input
    Unsupported,
}

impl NodeKind {
    pub fn of_expr(kind: &ExprKind) -> Self {
        match kind {
            ExprKind::Literal(_) => NodeKind::Literal,
            ExprKind::Identifier(_) => NodeKind::Identifier,
            ExprKind::MemberAccess { .. } => NodeKind::MemberAccess,
            ExprKind::Invocation { .. } => NodeKind::Invocation,
            ExprKind::Index { .. } => NodeKind::Index,
            ExprKind::RefArgument(_) => NodeKind::RefArgument,
            ExprKind::AddressOf(_) => NodeKind::AddressOf,
            ExprKind::Binary { .. } => NodeKind::Binary,
            ExprKind::Unary { .. } => NodeKind::Unary,
            ExprKind::Conditional { .. } => NodeKind::Conditional,
            ExprKind::TypeTest { .. } => NodeKind::TypeTest,
            ExprKind::Cast { .. } => NodeKind::Cast,
            ExprKind::Parenthesized(_) => NodeKind::Parenthesized,
            ExprKind::ObjectCreation { .. } => NodeKind::ObjectCreation,
            ExprKind::ArrayCreation { .. } => NodeKind::ArrayCreation,
            ExprKind::DefaultValue(_) => NodeKind::DefaultValue,
            ExprKind::TypeOf(_) => NodeKind::TypeOf,
            ExprKind::This => NodeKind::This,
            ExprKind::Base => NodeKind::Base,
            ExprKind::XmlLiteral(_) => NodeKind::XmlLiteral,
            ExprKind::StackAlloc { .. } => NodeKind::StackAlloc,
            ExprKind::Unsupported(_) => NodeKind::Unsupported,
        }
    }

    pub fn of_stmt(kind: &StmtKind) -> Self {
        match kind {
            StmtKind::Local { .. } => NodeKind::Local,
            StmtKind::Assign { .. } => NodeKind::Assign,
            StmtKind::Expr(_) => NodeKind::ExprStmt,
            StmtKind::If { .. } => NodeKind::If,
            StmtKind::While { .. } => NodeKind::While,
            StmtKind::For { .. } => NodeKind::For,
            StmtKind::CFor { .. } => NodeKind::CFor,
            StmtKind::ForEach { .. } => NodeKind::ForEach,
            StmtKind::Return(_) => NodeKind::Return,
            StmtKind::Throw(_) => NodeKind::Throw,
            StmtKind::Try { .. } => NodeKind::Try,
            StmtKind::Exit { .. } => NodeKind::Exit,
            StmtKind::Continue { .. } => NodeKind::Continue,
            StmtKind::Block(_) => NodeKind::Block,
            StmtKind::RaiseEvent { .. } => NodeKind::RaiseEvent,
            StmtKind::AddHandler { .. } => NodeKind::AddHandler,
            StmtKind::ReDim { .. } => NodeKind::ReDim,
            StmtKind::OnError { .. } => NodeKind::OnError,
            StmtKind::Unsafe(_) => NodeKind::Unsafe,
            StmtKind::Unsupported(_) => NodeKind::Unsupported,
        }
    }

    pub fn of_decl(kind: &DeclKind) -> Self {
        match kind {
            DeclKind::Namespace { .. } => NodeKind::Namespace,
            DeclKind::Type { .. } => NodeKind::Type,
            DeclKind::Field { .. } => NodeKind::Field,
            DeclKind::Method { .. } => NodeKind::Method,
            DeclKind::Property { .. } => NodeKind::Property,
            DeclKind::Event { .. } => NodeKind::Event,
            DeclKind::Delegate { .. } => NodeKind::Delegate,
            DeclKind::Unsupported(_) => NodeKind::Unsupported,
        }
    }

    /// Name used in placeholders and diagnostics
    pub fn name(&self) -> String {
        format!("{self:?}")
    }
}

type Key = (NodeKind, Language, Language);

/// Registered rules per language pair
#[derive(Default)]
pub struct RuleTable {
    exprs: HashMap<Key, ExprRule>,
    stmts: HashMap<Key, StmtRule>,
    decls: HashMap<Key, DeclRule>,
}

impl RuleTable {
    pub fn expr_rule(&self, kind: NodeKind, source: Language, target: Language) -> Option<ExprRule> {
        self.exprs.get(&(kind, source, target)).copied()
    }

    pub fn stmt_rule(&self, kind: NodeKind, source: Language, target: Language) -> Option<StmtRule> {
        self.stmts.get(&(kind, source, target)).copied()
    }

    pub fn decl_rule(&self, kind: NodeKind, source: Language, target: Language) -> Option<DeclRule> {
        self.decls.get(&(kind, source, target)).copied()
    }

    fn expr(&mut self, kind: NodeKind, source: Language, target: Language, rule: ExprRule) {
        self.exprs.insert((kind, source, target), rule);
    }

    fn stmt(&mut self, kind: NodeKind, source: Language, target: Language, rule: StmtRule) {
        self.stmts.insert((kind, source, target), rule);
    }

    fn decl(&mut self, kind: NodeKind, source: Language, target: Language, rule: DeclRule) {
        self.decls.insert((kind, source, target), rule);
    }

    /// Rules for C# ⇄ VB.NET
    pub fn standard() -> Self {
        use Language::{CSharp as CS, VBNet as VB};
        let mut t = RuleTable::default();

        // 両方向で共通の規則
        for (src, dst) in [(CS, VB), (VB, CS)] {
            t.expr(NodeKind::Literal, src, dst, exprs::literal);
            t.expr(NodeKind::Identifier, src, dst, exprs::identifier);
            t.expr(NodeKind::MemberAccess, src, dst, exprs::member_access);
            t.expr(NodeKind::Invocation, src, dst, exprs::invocation);
            t.expr(NodeKind::Binary, src, dst, exprs::binary);
            t.expr(NodeKind::Unary, src, dst, exprs::unary);
            t.expr(NodeKind::Conditional, src, dst, exprs::conditional);
            t.expr(NodeKind::TypeTest, src, dst, exprs::type_test);
            t.expr(NodeKind::Cast, src, dst, exprs::cast);
            t.expr(NodeKind::Parenthesized, src, dst, exprs::parenthesized);
            t.expr(NodeKind::ObjectCreation, src, dst, exprs::object_creation);
            t.expr(NodeKind::ArrayCreation, src, dst, arrays::array_creation);
            t.expr(NodeKind::TypeOf, src, dst, exprs::type_of);
            t.expr(NodeKind::This, src, dst, exprs::keyword);
            t.expr(NodeKind::Base, src, dst, exprs::keyword);

            t.stmt(NodeKind::Local, src, dst, stmts::local);
            t.stmt(NodeKind::Assign, src, dst, stmts::assign);
            t.stmt(NodeKind::ExprStmt, src, dst, stmts::expr_stmt);
            t.stmt(NodeKind::If, src, dst, stmts::if_stmt);
            t.stmt(NodeKind::While, src, dst, stmts::while_stmt);
            t.stmt(NodeKind::ForEach, src, dst, stmts::for_each);
            t.stmt(NodeKind::Return, src, dst, stmts::return_stmt);
            t.stmt(NodeKind::Throw, src, dst, stmts::throw_stmt);
            t.stmt(NodeKind::Try, src, dst, stmts::try_stmt);
            t.stmt(NodeKind::Exit, src, dst, stmts::exit_stmt);
            t.stmt(NodeKind::Continue, src, dst, stmts::continue_stmt);
            t.stmt(NodeKind::Block, src, dst, stmts::block_stmt);

            t.decl(NodeKind::Namespace, src, dst, decls::namespace);
            t.decl(NodeKind::Type, src, dst, decls::type_decl);
            t.decl(NodeKind::Field, src, dst, decls::field);
            t.decl(NodeKind::Method, src, dst, decls::method);
            t.decl(NodeKind::Property, src, dst, decls::property);
            t.decl(NodeKind::Event, src, dst, events::event_decl);
            t.decl(NodeKind::Delegate, src, dst, decls::delegate);
        }

        // C# → VB
        t.expr(NodeKind::Index, CS, VB, exprs::index_to_call);
        t.expr(NodeKind::RefArgument, CS, VB, exprs::strip_ref);
        t.expr(NodeKind::DefaultValue, CS, VB, exprs::default_to_nothing);
        t.stmt(NodeKind::CFor, CS, VB, stmts::c_for);

        // VB → C#
        t.expr(NodeKind::AddressOf, VB, CS, exprs::address_of);
        t.stmt(NodeKind::For, VB, CS, stmts::vb_for);
        t.stmt(NodeKind::RaiseEvent, VB, CS, events::raise_event);
        t.stmt(NodeKind::AddHandler, VB, CS, events::add_handler);
        t.stmt(NodeKind::ReDim, VB, CS, arrays::redim);

        t
    }
}

/// Table shared by every conversion
pub static STANDARD_RULES: Lazy<RuleTable> = Lazy::new(RuleTable::standard);
