//! AST construction helpers
//!
//! The converter builds its output tree through `AstBuilder` so that every
//! new node receives a fresh id and the source range of the node it was
//! produced from. Tests use the same builder to stand in for a front end.

use super::decls::{
    Access, CompilationUnit, Decl, DeclKind, Import, Modifiers, Param, TypeDeclKind,
};
use super::exprs::{CastKind, Expr, ExprKind, Literal, NodeId};
use super::language::Language;
use super::location::SourceRange;
use super::nodes::{Block, ReDimClause, Stmt, StmtKind, VariableDeclarator};
use super::ops::{AssignOp, BinaryOp, UnaryOp};
use super::types::TypeRef;
use std::cell::Cell;

/// Allocates node ids and stamps source ranges onto new nodes
#[derive(Debug)]
pub struct AstBuilder {
    language: Language,
    next_id: Cell<u32>,
    range: Cell<SourceRange>,
}

impl AstBuilder {
    pub fn new(language: Language) -> Self {
        Self::starting_at(language, 1)
    }

    /// Builder whose first id is `first_id`
    pub fn starting_at(language: Language, first_id: u32) -> Self {
        Self {
            language,
            next_id: Cell::new(first_id),
            range: Cell::new(SourceRange::on_line(1, 1, 1)),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Subsequent nodes are placed on `line`
    pub fn at_line(&self, line: usize) {
        self.range.set(SourceRange::on_line(line, 1, 80));
    }

    /// Subsequent nodes carry `range`
    pub fn at_range(&self, range: SourceRange) {
        self.range.set(range);
    }

    pub fn current_range(&self) -> SourceRange {
        self.range.get()
    }

    pub fn next_id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn span<'a>(&self, ranges: impl Iterator<Item = &'a SourceRange>) -> SourceRange {
        let current = self.range.get();
        ranges.fold(current, |acc, r| {
            if !r.is_known() {
                return acc;
            }
            SourceRange::new(acc.start.min(r.start), acc.end.max(r.end))
        })
    }

    // --- 型 ---

    pub fn ty(&self, name: &str) -> TypeRef {
        TypeRef {
            id: self.next_id(),
            range: self.range.get(),
            name: name.to_string(),
            type_args: vec![],
            array_ranks: vec![],
        }
    }

    pub fn array_ty(&self, name: &str, ranks: Vec<usize>) -> TypeRef {
        let mut ty = self.ty(name);
        ty.array_ranks = ranks;
        ty
    }

    pub fn generic_ty(&self, name: &str, args: Vec<TypeRef>) -> TypeRef {
        let mut ty = self.ty(name);
        ty.type_args = args;
        ty
    }

    // --- 式 ---

    pub fn expr(&self, kind: ExprKind) -> Expr {
        Expr {
            id: self.next_id(),
            range: self.range.get(),
            kind,
        }
    }

    pub fn ident(&self, name: &str) -> Expr {
        self.expr(ExprKind::Identifier(name.to_string()))
    }

    pub fn member(&self, target: Expr, member: &str) -> Expr {
        self.expr(ExprKind::MemberAccess {
            target: Box::new(target),
            member: member.to_string(),
        })
    }

    pub fn call(&self, target: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Invocation {
            target: Box::new(target),
            args,
        })
    }

    pub fn index(&self, target: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Index {
            target: Box::new(target),
            args,
        })
    }

    pub fn int(&self, value: i64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn str_lit(&self, value: &str) -> Expr {
        self.expr(ExprKind::Literal(Literal::Str(value.to_string())))
    }

    pub fn bool_lit(&self, value: bool) -> Expr {
        self.expr(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn null(&self) -> Expr {
        self.expr(ExprKind::Literal(Literal::Null))
    }

    pub fn binary(&self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(&self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn new_object(&self, ty: TypeRef, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::ObjectCreation { ty, args })
    }

    pub fn new_array(&self, element: TypeRef, dims: Vec<Expr>) -> Expr {
        let rank = dims.len().max(1);
        self.expr(ExprKind::ArrayCreation {
            element,
            rank,
            dims,
            initializer: None,
        })
    }

    pub fn cast(&self, kind: CastKind, ty: TypeRef, expr: Expr) -> Expr {
        self.expr(ExprKind::Cast {
            kind,
            ty,
            expr: Box::new(expr),
        })
    }

    pub fn paren(&self, inner: Expr) -> Expr {
        self.expr(ExprKind::Parenthesized(Box::new(inner)))
    }

    pub fn ref_arg(&self, inner: Expr) -> Expr {
        self.expr(ExprKind::RefArgument(Box::new(inner)))
    }

    pub fn address_of(&self, inner: Expr) -> Expr {
        self.expr(ExprKind::AddressOf(Box::new(inner)))
    }

    pub fn this(&self) -> Expr {
        self.expr(ExprKind::This)
    }

    /// `a.b.c` as nested member accesses
    pub fn path(&self, dotted: &str) -> Expr {
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        parts.fold(self.ident(first), |acc, part| self.member(acc, part))
    }

    // --- 文 ---

    pub fn stmt(&self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.next_id(),
            range: self.range.get(),
            kind,
        }
    }

    pub fn block(&self, stmts: Vec<Stmt>) -> Block {
        let range = self.span(stmts.iter().map(|s| &s.range));
        Block {
            id: self.next_id(),
            range,
            stmts,
        }
    }

    pub fn declarator(&self, name: &str, ty: Option<TypeRef>, init: Option<Expr>) -> VariableDeclarator {
        VariableDeclarator {
            id: self.next_id(),
            range: self.range.get(),
            name: name.to_string(),
            ty,
            bounds: None,
            init,
            as_new: false,
        }
    }

    pub fn local(&self, name: &str, ty: Option<TypeRef>, init: Option<Expr>) -> Stmt {
        let d = self.declarator(name, ty, init);
        self.local_decl(vec![d], false)
    }

    /// VB `Dim name(bounds) As ty`
    pub fn local_array(&self, name: &str, ty: TypeRef, bounds: Vec<Option<Expr>>) -> Stmt {
        let mut d = self.declarator(name, Some(ty), None);
        d.bounds = Some(bounds);
        self.local_decl(vec![d], false)
    }

    /// VB `Dim name As New ty(args)`
    pub fn local_as_new(&self, name: &str, ty: TypeRef, args: Vec<Expr>) -> Stmt {
        let creation = self.new_object(ty.clone(), args);
        let mut d = self.declarator(name, Some(ty), Some(creation));
        d.as_new = true;
        self.local_decl(vec![d], false)
    }

    pub fn local_decl(&self, declarators: Vec<VariableDeclarator>, is_const: bool) -> Stmt {
        self.stmt(StmtKind::Local {
            declarators,
            is_const,
        })
    }

    pub fn assign(&self, target: Expr, value: Expr) -> Stmt {
        self.assign_op(target, AssignOp::Assign, value)
    }

    pub fn assign_op(&self, target: Expr, op: AssignOp, value: Expr) -> Stmt {
        self.stmt(StmtKind::Assign { target, op, value })
    }

    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn if_stmt(&self, cond: Expr, then_stmts: Vec<Stmt>, else_stmts: Option<Vec<Stmt>>) -> Stmt {
        let then_block = self.block(then_stmts);
        let else_block = else_stmts.map(|s| self.block(s));
        self.stmt(StmtKind::If {
            cond,
            then_block,
            else_block,
        })
    }

    pub fn while_stmt(&self, cond: Expr, body: Vec<Stmt>) -> Stmt {
        let body = self.block(body);
        self.stmt(StmtKind::While { cond, body })
    }

    pub fn ret(&self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    pub fn redim(&self, preserve: bool, target: Expr, bounds: Vec<Expr>) -> Stmt {
        let clause = ReDimClause {
            id: self.next_id(),
            range: self.range.get(),
            target,
            bounds,
        };
        self.stmt(StmtKind::ReDim {
            preserve,
            clauses: vec![clause],
        })
    }

    pub fn raise_event(&self, event: &str, args: Vec<Expr>) -> Stmt {
        self.stmt(StmtKind::RaiseEvent {
            event: event.to_string(),
            args,
        })
    }

    // --- 宣言 ---

    pub fn decl(&self, kind: DeclKind) -> Decl {
        Decl {
            id: self.next_id(),
            range: self.range.get(),
            kind,
        }
    }

    pub fn import(&self, namespace: &str) -> Import {
        Import {
            id: self.next_id(),
            range: self.range.get(),
            namespace: namespace.to_string(),
            alias: None,
        }
    }

    pub fn unit(&self, imports: Vec<Import>, members: Vec<Decl>) -> CompilationUnit {
        let range = self.span(
            imports
                .iter()
                .map(|i| &i.range)
                .chain(members.iter().map(|m| &m.range)),
        );
        CompilationUnit {
            id: self.next_id(),
            range,
            imports,
            members,
        }
    }

    pub fn namespace(&self, name: &str, members: Vec<Decl>) -> Decl {
        let range = self.span(members.iter().map(|m| &m.range));
        Decl {
            id: self.next_id(),
            range,
            kind: DeclKind::Namespace {
                name: name.to_string(),
                members,
            },
        }
    }

    pub fn type_decl(
        &self,
        kind: TypeDeclKind,
        name: &str,
        modifiers: Modifiers,
        bases: Vec<TypeRef>,
        members: Vec<Decl>,
    ) -> Decl {
        let range = self.span(members.iter().map(|m| &m.range));
        Decl {
            id: self.next_id(),
            range,
            kind: DeclKind::Type {
                name: name.to_string(),
                kind,
                modifiers,
                bases,
                members,
            },
        }
    }

    pub fn class(&self, name: &str, members: Vec<Decl>) -> Decl {
        self.type_decl(TypeDeclKind::Class, name, Modifiers::default(), vec![], members)
    }

    pub fn field(&self, modifiers: Modifiers, declarators: Vec<VariableDeclarator>) -> Decl {
        self.decl(DeclKind::Field {
            modifiers,
            declarators,
            is_const: false,
        })
    }

    pub fn param(&self, name: &str, ty: TypeRef) -> Param {
        Param {
            id: self.next_id(),
            range: self.range.get(),
            name: name.to_string(),
            ty,
            by_ref: false,
        }
    }

    pub fn method_full(
        &self,
        name: &str,
        modifiers: Modifiers,
        params: Vec<Param>,
        return_type: Option<TypeRef>,
        body: Vec<Stmt>,
    ) -> Decl {
        let body = self.block(body);
        Decl {
            id: self.next_id(),
            range: body.range,
            kind: DeclKind::Method {
                name: name.to_string(),
                modifiers,
                params,
                return_type,
                body: Some(body),
            },
        }
    }

    /// Parameterless `void`/`Sub` method with no modifiers
    pub fn method(&self, name: &str, body: Vec<Stmt>) -> Decl {
        self.method_full(name, Modifiers::default(), vec![], None, body)
    }

    /// Parameterless `Private Sub` / `private void`
    pub fn private_method(&self, name: &str, body: Vec<Stmt>) -> Decl {
        self.method_full(name, Modifiers::with_access(Access::Private), vec![], None, body)
    }

    pub fn event(&self, name: &str, modifiers: Modifiers, ty: TypeRef) -> Decl {
        self.decl(DeclKind::Event {
            name: name.to_string(),
            modifiers,
            ty: Some(ty),
            params: None,
        })
    }

    pub fn event_with_params(&self, name: &str, modifiers: Modifiers, params: Vec<Param>) -> Decl {
        self.decl(DeclKind::Event {
            name: name.to_string(),
            modifiers,
            ty: None,
            params: Some(params),
        })
    }

    pub fn property(
        &self,
        name: &str,
        modifiers: Modifiers,
        ty: TypeRef,
        getter: Option<Vec<Stmt>>,
        setter: Option<Vec<Stmt>>,
    ) -> Decl {
        let getter = getter.map(|s| self.block(s));
        let setter = setter.map(|s| self.block(s));
        self.decl(DeclKind::Property {
            name: name.to_string(),
            modifiers,
            ty,
            getter,
            setter,
        })
    }
}
