//! Expression and statement classification
//!
//! 変換規則の選択に必要な実行時の性質を判定する:
//! 値型・参照型・文字列のどれか、メンバー呼び出しかイベントか、など。

use super::resolver::{ResolutionKind, Resolver};
use crate::ast::{AssignOp, BinaryOp, Expr, ExprKind, NodeId, Stmt, StmtKind};
use crate::symbols::{BuiltinType, ResolvedType, ScopeId, SymbolId, SymbolKind};

/// Run-time nature of a type as far as conversion cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Value,
    String,
    Reference,
    /// The `null` / `Nothing` literal
    Null,
    Unknown,
}

/// How an equality operator must be written in the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityKind {
    /// Reference identity (`Is`, `==` on non-string references)
    Identity,
    /// Value or content comparison (`=`, `==` on values and strings)
    Value,
    /// An operand type is unknown
    Unresolved,
}

/// What a call-syntax expression actually does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    Method,
    /// VB `F(1)` meaning `F()(1)`
    IndexedCall,
    /// Array element or indexer access
    ElementAccess,
    /// `obj.Item(i)` where `Item` is the default property
    DefaultProperty,
    DelegateInvoke,
    /// Invocation of an event identifier
    Event,
    Unresolved,
}

/// Resolved semantics handed to a conversion rule together with its node
#[derive(Debug, Clone, PartialEq)]
pub struct ExprSemantics {
    pub ty: ResolvedType,
    pub symbol: Option<SymbolId>,
    pub kind: ResolutionKind,
    pub ambiguous: bool,
    /// Operand types of unary and binary operators
    pub operands: Vec<ResolvedType>,
    pub equality: Option<EqualityKind>,
    pub invocation: Option<InvocationKind>,
    /// Names a parameterless method without calling it
    pub implicit_call: bool,
}

impl ExprSemantics {
    /// Semantics of a node the resolver knows nothing about
    pub fn unknown() -> Self {
        Self {
            ty: ResolvedType::Unknown,
            symbol: None,
            kind: ResolutionKind::Unresolved,
            ambiguous: false,
            operands: Vec::new(),
            equality: None,
            invocation: None,
            implicit_call: false,
        }
    }

    pub fn operand(&self, index: usize) -> &ResolvedType {
        self.operands.get(index).unwrap_or(&ResolvedType::Unknown)
    }
}

/// An event raise, written with or without a null guard
#[derive(Debug, Clone, PartialEq)]
pub struct EventRaise {
    pub event: SymbolId,
    /// Source wrapped the call in `if (E != null)`
    pub guarded: bool,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSubscription {
    pub event: SymbolId,
    pub remove: bool,
}

/// Statement-level patterns that depend on resolved symbols
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StmtSemantics {
    pub event_raise: Option<EventRaise>,
    pub event_subscription: Option<EventSubscription>,
}

impl Resolver<'_> {
    pub fn categorize(&self, ty: &ResolvedType) -> TypeCategory {
        match ty {
            ResolvedType::Builtin(BuiltinType::String) => TypeCategory::String,
            ResolvedType::Null => TypeCategory::Null,
            ResolvedType::Unknown => TypeCategory::Unknown,
            other => match self.model().is_value_type(other) {
                Some(true) => TypeCategory::Value,
                Some(false) => TypeCategory::Reference,
                None => TypeCategory::Unknown,
            },
        }
    }

    /// Classify an equality between two operand types
    pub fn equality_kind(&self, left: &ResolvedType, right: &ResolvedType) -> EqualityKind {
        use TypeCategory as C;
        let (l, r) = (self.categorize(left), self.categorize(right));
        match (l, r) {
            (C::Null, C::Value) | (C::Value, C::Null) => EqualityKind::Value,
            (C::Null, _) | (_, C::Null) => EqualityKind::Identity,
            // 片方が値型か文字列なら、もう片方が不明でも内容比較
            (C::Value | C::String, _) | (_, C::Value | C::String) => EqualityKind::Value,
            (C::Unknown, _) | (_, C::Unknown) => EqualityKind::Unresolved,
            (C::Reference, C::Reference) => EqualityKind::Identity,
        }
    }

    /// Classify a call-syntax expression
    pub fn invocation_kind(&self, target: &Expr, arity: usize, scope: ScopeId) -> InvocationKind {
        let t = self.resolve(target, scope);
        match t.kind {
            ResolutionKind::MethodGroup => {
                if t.candidates.is_empty() {
                    InvocationKind::DelegateInvoke
                } else if self.select_overload(&t.candidates, arity).is_some() {
                    InvocationKind::Method
                } else if self.indexed_call(&t.candidates, arity).is_some() {
                    InvocationKind::IndexedCall
                } else {
                    InvocationKind::Method
                }
            }
            ResolutionKind::Value => {
                let sym = t.symbol.and_then(|s| self.model().symbol(s));
                match sym {
                    Some(s) if s.kind == SymbolKind::Event => return InvocationKind::Event,
                    Some(s) if s.kind == SymbolKind::Property && s.signature.is_some() => {
                        return if s.is_default {
                            InvocationKind::DefaultProperty
                        } else {
                            InvocationKind::Method
                        };
                    }
                    _ => {}
                }
                if self.delegate_signature(&t.ty).is_some() {
                    InvocationKind::DelegateInvoke
                } else if t.ty.as_array().is_some() || self.model().default_member(&t.ty).is_some() {
                    InvocationKind::ElementAccess
                } else {
                    InvocationKind::Unresolved
                }
            }
            ResolutionKind::Type | ResolutionKind::Namespace | ResolutionKind::Unresolved => {
                InvocationKind::Unresolved
            }
        }
    }

    /// Everything a rule needs to know about `expr`
    pub fn semantics(&self, expr: &Expr, scope: ScopeId) -> ExprSemantics {
        let r = self.resolve(expr, scope);
        let mut sem = ExprSemantics {
            implicit_call: r.kind == ResolutionKind::MethodGroup
                && !r.candidates.is_empty()
                && r.symbol
                    .and_then(|s| self.model().symbol(s))
                    .and_then(|s| s.param_count())
                    == Some(0),
            ty: r.ty,
            symbol: r.symbol,
            kind: r.kind,
            ambiguous: r.ambiguous,
            operands: Vec::new(),
            equality: None,
            invocation: None,
        };
        match &expr.kind {
            ExprKind::Binary { op, left, right } => {
                let l = self.type_of(left, scope);
                let r = self.type_of(right, scope);
                if op.is_equality() {
                    sem.equality = Some(self.equality_kind(&l, &r));
                }
                sem.operands = vec![l, r];
            }
            ExprKind::Unary { operand, .. } => {
                sem.operands = vec![self.type_of(operand, scope)];
            }
            ExprKind::Cast { expr: inner, .. } => {
                sem.operands = vec![self.type_of(inner, scope)];
            }
            ExprKind::Invocation { target, args } => {
                sem.invocation = Some(self.invocation_kind(target, args.len(), scope));
            }
            _ => {}
        }
        sem
    }

    /// Event symbol an expression refers to (`E`, `this.E`, `Me.E`)
    pub fn event_symbol(&self, expr: &Expr, scope: ScopeId) -> Option<SymbolId> {
        let r = self.resolve(expr.unparenthesized(), scope);
        let id = r.symbol?;
        (self.model().symbol(id)?.kind == SymbolKind::Event).then_some(id)
    }

    /// Unguarded raise: `E(args)` or `E.Invoke(args)` as a statement
    fn raise_in(&self, stmt: &Stmt, scope: ScopeId) -> Option<EventRaise> {
        let StmtKind::Expr(expr) = &stmt.kind else {
            return None;
        };
        let ExprKind::Invocation { target, args } = &expr.kind else {
            return None;
        };
        let event = match &target.kind {
            ExprKind::MemberAccess { target: inner, member }
                if self.model().language().names_match(member, "Invoke") =>
            {
                self.event_symbol(inner, scope)
            }
            _ => self.event_symbol(target, scope),
        }?;
        Some(EventRaise {
            event,
            guarded: false,
            args: args.clone(),
        })
    }

    /// Recognize event raises and subscriptions in a statement
    pub fn stmt_semantics(&self, stmt: &Stmt, scope: ScopeId) -> StmtSemantics {
        let mut sem = StmtSemantics::default();
        match &stmt.kind {
            StmtKind::Expr(_) => {
                sem.event_raise = self.raise_in(stmt, scope);
            }
            StmtKind::If {
                cond,
                then_block,
                else_block: None,
            } => {
                sem.event_raise = self.guarded_raise(cond, &then_block.stmts, then_block.id, scope);
            }
            StmtKind::RaiseEvent { event, args } => {
                let hit = self
                    .model()
                    .lookup(scope, event)
                    .into_iter()
                    .find(|id| self.model().symbol(*id).is_some_and(|s| s.kind == SymbolKind::Event));
                sem.event_raise = hit.map(|event| EventRaise {
                    event,
                    guarded: false,
                    args: args.clone(),
                });
            }
            StmtKind::Assign { target, op, .. }
                if matches!(op, AssignOp::AddAssign | AssignOp::SubAssign) =>
            {
                sem.event_subscription = self.event_symbol(target, scope).map(|event| EventSubscription {
                    event,
                    remove: *op == AssignOp::SubAssign,
                });
            }
            StmtKind::AddHandler { event, remove, .. } => {
                sem.event_subscription = self.event_symbol(event, scope).map(|e| EventSubscription {
                    event: e,
                    remove: *remove,
                });
            }
            _ => {}
        }
        sem
    }

    /// `if (E != null) { E(args); }` with no else branch
    fn guarded_raise(
        &self,
        cond: &Expr,
        then_stmts: &[Stmt],
        then_block: NodeId,
        scope: ScopeId,
    ) -> Option<EventRaise> {
        let ExprKind::Binary { op, left, right } = &cond.unparenthesized().kind else {
            return None;
        };
        if !matches!(op, BinaryOp::NotEq | BinaryOp::RefNotEq) {
            return None;
        }
        let guarded = if right.is_null_literal() {
            left
        } else if left.is_null_literal() {
            right
        } else {
            return None;
        };
        let guard_event = self.event_symbol(guarded, scope)?;
        let [only] = then_stmts else {
            return None;
        };
        let inner_scope = self.model().scope_of_node(then_block).unwrap_or(scope);
        let raise = self.raise_in(only, inner_scope)?;
        (raise.event == guard_event).then_some(EventRaise {
            guarded: true,
            ..raise
        })
    }
}
