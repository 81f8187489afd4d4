//! AST visitor infrastructure for traversing converted and unconverted trees

use super::decls::{CompilationUnit, Decl, DeclKind, Param};
use super::exprs::{Expr, ExprKind};
use super::nodes::{Block, Stmt, StmtKind, VariableDeclarator};
use super::types::TypeRef;

/// Read-only visitor. Every method defaults to walking the children.
pub trait Visit {
    fn visit_unit(&mut self, unit: &CompilationUnit) {
        walk_unit(self, unit);
    }

    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_type_ref(&mut self, ty: &TypeRef) {
        for arg in &ty.type_args {
            self.visit_type_ref(arg);
        }
    }

    fn visit_declarator(&mut self, declarator: &VariableDeclarator) {
        walk_declarator(self, declarator);
    }

    fn visit_param(&mut self, param: &Param) {
        self.visit_type_ref(&param.ty);
    }
}

pub fn walk_unit<V: Visit + ?Sized>(v: &mut V, unit: &CompilationUnit) {
    for member in &unit.members {
        v.visit_decl(member);
    }
}

pub fn walk_decl<V: Visit + ?Sized>(v: &mut V, decl: &Decl) {
    match &decl.kind {
        DeclKind::Namespace { members, .. } => {
            for member in members {
                v.visit_decl(member);
            }
        }
        DeclKind::Type { bases, members, .. } => {
            for base in bases {
                v.visit_type_ref(base);
            }
            for member in members {
                v.visit_decl(member);
            }
        }
        DeclKind::Field { declarators, .. } => {
            for d in declarators {
                v.visit_declarator(d);
            }
        }
        DeclKind::Method {
            params,
            return_type,
            body,
            ..
        } => {
            for p in params {
                v.visit_param(p);
            }
            if let Some(ret) = return_type {
                v.visit_type_ref(ret);
            }
            if let Some(body) = body {
                v.visit_block(body);
            }
        }
        DeclKind::Property {
            ty, getter, setter, ..
        } => {
            v.visit_type_ref(ty);
            if let Some(g) = getter {
                v.visit_block(g);
            }
            if let Some(s) = setter {
                v.visit_block(s);
            }
        }
        DeclKind::Event { ty, params, .. } => {
            if let Some(ty) = ty {
                v.visit_type_ref(ty);
            }
            for p in params.iter().flatten() {
                v.visit_param(p);
            }
        }
        DeclKind::Delegate {
            params,
            return_type,
            ..
        } => {
            for p in params {
                v.visit_param(p);
            }
            if let Some(ret) = return_type {
                v.visit_type_ref(ret);
            }
        }
        DeclKind::Unsupported(_) => {}
    }
}

pub fn walk_block<V: Visit + ?Sized>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_declarator<V: Visit + ?Sized>(v: &mut V, d: &VariableDeclarator) {
    if let Some(ty) = &d.ty {
        v.visit_type_ref(ty);
    }
    for bound in d.bounds.iter().flatten().flatten() {
        v.visit_expr(bound);
    }
    if let Some(init) = &d.init {
        v.visit_expr(init);
    }
}

pub fn walk_stmt<V: Visit + ?Sized>(v: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Local { declarators, .. } => {
            for d in declarators {
                v.visit_declarator(d);
            }
        }
        StmtKind::Assign { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        StmtKind::Expr(e) => v.visit_expr(e),
        StmtKind::If {
            cond,
            then_block,
            else_block,
        } => {
            v.visit_expr(cond);
            v.visit_block(then_block);
            if let Some(b) = else_block {
                v.visit_block(b);
            }
        }
        StmtKind::While { cond, body } => {
            v.visit_expr(cond);
            v.visit_block(body);
        }
        StmtKind::For {
            var_type,
            start,
            end,
            step,
            body,
            ..
        } => {
            if let Some(ty) = var_type {
                v.visit_type_ref(ty);
            }
            v.visit_expr(start);
            v.visit_expr(end);
            if let Some(s) = step {
                v.visit_expr(s);
            }
            v.visit_block(body);
        }
        StmtKind::CFor {
            init,
            cond,
            iterators,
            body,
        } => {
            for s in init {
                v.visit_stmt(s);
            }
            if let Some(c) = cond {
                v.visit_expr(c);
            }
            for s in iterators {
                v.visit_stmt(s);
            }
            v.visit_block(body);
        }
        StmtKind::ForEach {
            var_type,
            collection,
            body,
            ..
        } => {
            if let Some(ty) = var_type {
                v.visit_type_ref(ty);
            }
            v.visit_expr(collection);
            v.visit_block(body);
        }
        StmtKind::Return(value) | StmtKind::Throw(value) => {
            if let Some(e) = value {
                v.visit_expr(e);
            }
        }
        StmtKind::Try {
            body,
            catches,
            finally,
        } => {
            v.visit_block(body);
            for c in catches {
                if let Some(ty) = &c.ty {
                    v.visit_type_ref(ty);
                }
                v.visit_block(&c.body);
            }
            if let Some(f) = finally {
                v.visit_block(f);
            }
        }
        StmtKind::Block(b) | StmtKind::Unsafe(b) => v.visit_block(b),
        StmtKind::RaiseEvent { args, .. } => {
            for a in args {
                v.visit_expr(a);
            }
        }
        StmtKind::AddHandler { event, handler, .. } => {
            v.visit_expr(event);
            v.visit_expr(handler);
        }
        StmtKind::ReDim { clauses, .. } => {
            for c in clauses {
                v.visit_expr(&c.target);
                for b in &c.bounds {
                    v.visit_expr(b);
                }
            }
        }
        StmtKind::Exit { .. }
        | StmtKind::Continue { .. }
        | StmtKind::OnError { .. }
        | StmtKind::Unsupported(_) => {}
    }
}

pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::MemberAccess { target, .. } => v.visit_expr(target),
        ExprKind::Invocation { target, args } | ExprKind::Index { target, args } => {
            v.visit_expr(target);
            for a in args {
                v.visit_expr(a);
            }
        }
        ExprKind::RefArgument(inner)
        | ExprKind::AddressOf(inner)
        | ExprKind::Parenthesized(inner) => v.visit_expr(inner),
        ExprKind::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Unary { operand, .. } => v.visit_expr(operand),
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => {
            v.visit_expr(cond);
            v.visit_expr(then_expr);
            v.visit_expr(else_expr);
        }
        ExprKind::TypeTest { expr, ty } | ExprKind::Cast { expr, ty, .. } => {
            v.visit_expr(expr);
            v.visit_type_ref(ty);
        }
        ExprKind::ObjectCreation { ty, args } => {
            v.visit_type_ref(ty);
            for a in args {
                v.visit_expr(a);
            }
        }
        ExprKind::ArrayCreation {
            element,
            dims,
            initializer,
            ..
        } => {
            v.visit_type_ref(element);
            for d in dims {
                v.visit_expr(d);
            }
            for e in initializer.iter().flatten() {
                v.visit_expr(e);
            }
        }
        ExprKind::DefaultValue(ty) | ExprKind::TypeOf(ty) => v.visit_type_ref(ty),
        ExprKind::StackAlloc { element, size } => {
            v.visit_type_ref(element);
            v.visit_expr(size);
        }
        ExprKind::Literal(_)
        | ExprKind::Identifier(_)
        | ExprKind::This
        | ExprKind::Base
        | ExprKind::XmlLiteral(_)
        | ExprKind::Unsupported(_) => {}
    }
}

/// Largest node id in a unit, so freshly allocated output ids never collide
pub fn max_node_id(unit: &CompilationUnit) -> u32 {
    struct MaxId(u32);

    impl MaxId {
        fn see(&mut self, id: super::NodeId) {
            self.0 = self.0.max(id.0);
        }
    }

    impl Visit for MaxId {
        fn visit_decl(&mut self, decl: &Decl) {
            self.see(decl.id);
            walk_decl(self, decl);
        }
        fn visit_block(&mut self, block: &Block) {
            self.see(block.id);
            walk_block(self, block);
        }
        fn visit_stmt(&mut self, stmt: &Stmt) {
            self.see(stmt.id);
            match &stmt.kind {
                StmtKind::Try { catches, .. } => catches.iter().for_each(|c| self.see(c.id)),
                StmtKind::ReDim { clauses, .. } => clauses.iter().for_each(|c| self.see(c.id)),
                _ => {}
            }
            walk_stmt(self, stmt);
        }
        fn visit_expr(&mut self, expr: &Expr) {
            self.see(expr.id);
            walk_expr(self, expr);
        }
        fn visit_type_ref(&mut self, ty: &TypeRef) {
            self.see(ty.id);
            for arg in &ty.type_args {
                self.visit_type_ref(arg);
            }
        }
        fn visit_declarator(&mut self, d: &VariableDeclarator) {
            self.see(d.id);
            walk_declarator(self, d);
        }
        fn visit_param(&mut self, param: &Param) {
            self.see(param.id);
            self.visit_type_ref(&param.ty);
        }
    }

    let mut v = MaxId(unit.id.0);
    for import in &unit.imports {
        v.see(import.id);
    }
    v.visit_unit(unit);
    v.0
}
