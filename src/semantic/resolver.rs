//! Expression resolver
//!
//! 式の静的な型と束縛されたシンボルを求める。シンボルモデルに対する純粋な
//! 参照であり、副作用はない。解決できない参照は例外ではなく
//! `ResolvedType::Unknown` になる。

use crate::ast::{BinaryOp, Expr, ExprKind, Language, Literal, UnaryOp};
use crate::symbols::{
    BuiltinType, ResolvedType, ScopeId, Signature, SymbolId, SymbolKind, SymbolModel, TypeKind,
};

/// What an expression denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    Value,
    Type,
    Namespace,
    /// One or more methods; `ty` is the return type of the selected overload
    MethodGroup,
    Unresolved,
}

/// Result of resolving one expression
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub ty: ResolvedType,
    pub symbol: Option<SymbolId>,
    pub kind: ResolutionKind,
    /// Every symbol the name could have bound to
    pub candidates: Vec<SymbolId>,
    /// More than one equally valid interpretation; the first was used
    pub ambiguous: bool,
}

impl Resolution {
    fn value(ty: ResolvedType) -> Self {
        Self {
            ty,
            symbol: None,
            kind: ResolutionKind::Value,
            candidates: Vec::new(),
            ambiguous: false,
        }
    }

    fn unresolved() -> Self {
        Self {
            ty: ResolvedType::Unknown,
            symbol: None,
            kind: ResolutionKind::Unresolved,
            candidates: Vec::new(),
            ambiguous: false,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.kind == ResolutionKind::Unresolved
    }
}

/// Resolves expressions against a built symbol model
pub struct Resolver<'a> {
    model: &'a SymbolModel,
}

impl<'a> Resolver<'a> {
    pub fn new(model: &'a SymbolModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &'a SymbolModel {
        self.model
    }

    fn language(&self) -> Language {
        self.model.language()
    }

    /// Static type of `expr`, or Unknown
    pub fn type_of(&self, expr: &Expr, scope: ScopeId) -> ResolvedType {
        self.resolve(expr, scope).ty
    }

    /// Resolve `expr` as seen from `scope`
    pub fn resolve(&self, expr: &Expr, scope: ScopeId) -> Resolution {
        match &expr.kind {
            ExprKind::Literal(lit) => Resolution::value(literal_type(lit)),
            ExprKind::Identifier(name) => {
                let hits = self.model.lookup(scope, name);
                if hits.is_empty() {
                    // `Integer.MaxValue`, `string.Empty`
                    if let Some(builtin) = BuiltinType::from_keyword(self.language(), name) {
                        let symbol = self.model.library().builtin_symbol(builtin);
                        return Resolution {
                            ty: ResolvedType::Builtin(builtin),
                            symbol,
                            kind: ResolutionKind::Type,
                            candidates: symbol.into_iter().collect(),
                            ambiguous: false,
                        };
                    }
                }
                self.select(hits)
            }
            ExprKind::MemberAccess { target, member } => self.resolve_member(target, member, scope),
            ExprKind::Invocation { target, args } => self.resolve_invocation(target, args.len(), scope),
            ExprKind::Index { target, .. } => {
                let target_ty = self.type_of(target, scope);
                Resolution::value(self.model.element_type(&target_ty))
            }
            ExprKind::RefArgument(inner) | ExprKind::Parenthesized(inner) | ExprKind::AddressOf(inner) => {
                self.resolve(inner, scope)
            }
            ExprKind::Binary { op, left, right } => {
                let l = self.type_of(left, scope);
                let r = self.type_of(right, scope);
                Resolution::value(self.binary_type(*op, &l, &r))
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.type_of(operand, scope);
                // VB の Not は整数ではビット反転、それ以外は論理否定
                let ty = if *op == UnaryOp::Not && !ty.is_unknown() && !ty.is_integral() {
                    ResolvedType::Builtin(BuiltinType::Bool)
                } else {
                    ty
                };
                Resolution::value(ty)
            }
            ExprKind::Conditional {
                then_expr,
                else_expr,
                ..
            } => {
                let then_ty = self.type_of(then_expr, scope);
                let ty = if then_ty == ResolvedType::Null {
                    self.type_of(else_expr, scope)
                } else {
                    then_ty
                };
                Resolution::value(ty)
            }
            ExprKind::TypeTest { .. } => Resolution::value(ResolvedType::Builtin(BuiltinType::Bool)),
            ExprKind::Cast { ty, .. } | ExprKind::ObjectCreation { ty, .. } | ExprKind::DefaultValue(ty) => {
                Resolution::value(self.model.resolve_type_ref(ty, scope))
            }
            ExprKind::ArrayCreation { element, rank, .. } => {
                let element = self.model.resolve_type_ref(element, scope);
                Resolution::value(ResolvedType::array_of(element, *rank))
            }
            ExprKind::TypeOf(_) => Resolution::value(
                self.model
                    .library()
                    .by_qualified_name("System.Type")
                    .map(ResolvedType::Named)
                    .unwrap_or(ResolvedType::Unknown),
            ),
            ExprKind::This => match self.model.enclosing_type(scope) {
                Some(ty) => Resolution::value(ResolvedType::Named(ty)),
                None => Resolution::unresolved(),
            },
            ExprKind::Base => {
                let base = self
                    .model
                    .enclosing_type(scope)
                    .and_then(|t| self.model.symbol(t))
                    .and_then(|s| s.bases.first().cloned())
                    .unwrap_or(ResolvedType::Builtin(BuiltinType::Object));
                Resolution::value(base)
            }
            ExprKind::XmlLiteral(_) | ExprKind::StackAlloc { .. } | ExprKind::Unsupported(_) => {
                Resolution::unresolved()
            }
        }
    }

    /// Pick the interpretation of a set of name hits
    fn select(&self, hits: Vec<SymbolId>) -> Resolution {
        let Some(first) = hits.first().copied() else {
            return Resolution::unresolved();
        };
        let Some(sym) = self.model.symbol(first) else {
            return Resolution::unresolved();
        };
        let all_methods = hits
            .iter()
            .all(|h| self.model.symbol(*h).is_some_and(|s| s.kind == SymbolKind::Method));
        if all_methods {
            // 括弧なしの参照は引数なしのオーバーロードを呼ぶ
            let chosen = self.select_overload(&hits, 0);
            return Resolution {
                ty: chosen
                    .and_then(|c| self.model.symbol(c))
                    .map(|s| s.ty.clone())
                    .unwrap_or(ResolvedType::Unknown),
                symbol: chosen.or(Some(first)),
                kind: ResolutionKind::MethodGroup,
                candidates: hits,
                ambiguous: false,
            };
        }
        let ambiguous = hits.len() > 1;
        let (kind, ty) = match sym.kind {
            SymbolKind::Namespace => (ResolutionKind::Namespace, ResolvedType::Unknown),
            SymbolKind::Type(_) => (ResolutionKind::Type, self.model.named_type(first)),
            _ => (ResolutionKind::Value, sym.ty.clone()),
        };
        Resolution {
            ty,
            symbol: Some(first),
            kind,
            candidates: hits,
            ambiguous,
        }
    }

    /// Overload with exactly `arity` parameters
    pub fn select_overload(&self, candidates: &[SymbolId], arity: usize) -> Option<SymbolId> {
        candidates
            .iter()
            .copied()
            .find(|c| self.model.symbol(*c).and_then(|s| s.param_count()) == Some(arity))
    }

    fn resolve_member(&self, target: &Expr, member: &str, scope: ScopeId) -> Resolution {
        let t = self.resolve(target, scope);
        let hits = match t.kind {
            ResolutionKind::Namespace => {
                let qualified = t
                    .symbol
                    .map(|id| self.model.qualified_name(id))
                    .unwrap_or_default();
                let mut hits = Vec::new();
                for container in self.model.resolve_import(&qualified) {
                    for hit in self.model.members_of(container, member) {
                        if !hits.contains(&hit) {
                            hits.push(hit);
                        }
                    }
                }
                hits
            }
            ResolutionKind::Type => match t.symbol {
                Some(ty) => self.model.members_of(ty, member),
                None => Vec::new(),
            },
            ResolutionKind::Value | ResolutionKind::MethodGroup => {
                if self.language().names_match(member, "Invoke") {
                    if let Some(sig) = self.delegate_signature(&t.ty) {
                        return Resolution {
                            ty: sig.ret,
                            symbol: None,
                            kind: ResolutionKind::MethodGroup,
                            candidates: Vec::new(),
                            ambiguous: false,
                        };
                    }
                }
                self.model.members_of_type(&t.ty, member)
            }
            ResolutionKind::Unresolved => Vec::new(),
        };
        self.select(hits)
    }

    fn resolve_invocation(&self, target: &Expr, arity: usize, scope: ScopeId) -> Resolution {
        let t = self.resolve(target, scope);
        match t.kind {
            ResolutionKind::MethodGroup => {
                if t.candidates.is_empty() {
                    // デリゲートの Invoke
                    return Resolution::value(t.ty);
                }
                if let Some(chosen) = self.select_overload(&t.candidates, arity) {
                    let ty = self.model.symbol(chosen).map(|s| s.ty.clone()).unwrap_or(ResolvedType::Unknown);
                    let ambiguous = t
                        .candidates
                        .iter()
                        .filter(|c| self.model.symbol(**c).and_then(|s| s.param_count()) == Some(arity))
                        .filter_map(|c| self.model.symbol(*c).map(|s| &s.ty))
                        .any(|other| *other != ty);
                    return Resolution {
                        ty,
                        symbol: Some(chosen),
                        kind: ResolutionKind::Value,
                        candidates: t.candidates,
                        ambiguous,
                    };
                }
                if let Some(indexed) = self.indexed_call(&t.candidates, arity) {
                    return Resolution {
                        ty: self.model.element_type(&indexed.1),
                        symbol: Some(indexed.0),
                        kind: ResolutionKind::Value,
                        candidates: t.candidates,
                        ambiguous: false,
                    };
                }
                // 引数の数が合わなくても、戻り値の型が一つなら採用する
                let mut returns = t
                    .candidates
                    .iter()
                    .filter_map(|c| self.model.symbol(*c).map(|s| s.ty.clone()));
                let first = returns.next().unwrap_or(ResolvedType::Unknown);
                let ty = if returns.all(|r| r == first) {
                    first
                } else {
                    ResolvedType::Unknown
                };
                Resolution {
                    ty,
                    symbol: t.symbol,
                    kind: ResolutionKind::Value,
                    candidates: t.candidates,
                    ambiguous: false,
                }
            }
            ResolutionKind::Value => {
                let symbol = t.symbol.and_then(|s| self.model.symbol(s));
                if let Some(sym) = symbol {
                    if sym.kind == SymbolKind::Event {
                        return Resolution {
                            ty: ResolvedType::Builtin(BuiltinType::Void),
                            symbol: t.symbol,
                            kind: ResolutionKind::Value,
                            candidates: t.candidates,
                            ambiguous: t.ambiguous,
                        };
                    }
                    if sym.kind == SymbolKind::Property && sym.signature.is_some() {
                        return Resolution {
                            ty: sym.ty.clone(),
                            symbol: t.symbol,
                            kind: ResolutionKind::Value,
                            candidates: t.candidates,
                            ambiguous: t.ambiguous,
                        };
                    }
                }
                if let Some(sig) = self.delegate_signature(&t.ty) {
                    return Resolution::value(sig.ret);
                }
                Resolution::value(self.model.element_type(&t.ty))
            }
            ResolutionKind::Type | ResolutionKind::Namespace | ResolutionKind::Unresolved => {
                Resolution::unresolved()
            }
        }
    }

    /// VB reads `F(1)` as `F()(1)` when `F` only has a parameterless
    /// overload returning something indexable
    pub fn indexed_call(&self, candidates: &[SymbolId], arity: usize) -> Option<(SymbolId, ResolvedType)> {
        if self.language() != Language::VBNet || arity == 0 {
            return None;
        }
        let zero = self.select_overload(candidates, 0)?;
        let ret = self.model.symbol(zero)?.ty.clone();
        let indexable = ret.as_array().is_some() || self.model.default_member(&ret).is_some();
        indexable.then_some((zero, ret))
    }

    /// Signature of a delegate-typed value
    pub fn delegate_signature(&self, ty: &ResolvedType) -> Option<Signature> {
        match ty {
            ResolvedType::Delegate(sig) => Some((**sig).clone()),
            ResolvedType::Named(id) => {
                let sym = self.model.symbol(*id)?;
                if sym.type_kind() == Some(TypeKind::Delegate) {
                    sym.signature.clone()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Result type of a binary operation under the model's language
    pub fn binary_type(&self, op: BinaryOp, l: &ResolvedType, r: &ResolvedType) -> ResolvedType {
        if op.is_boolean_result() {
            return ResolvedType::Builtin(BuiltinType::Bool);
        }
        let numeric = |t: &ResolvedType| t.as_builtin().filter(|b| b.is_numeric());
        match op {
            BinaryOp::Concat => ResolvedType::Builtin(BuiltinType::String),
            BinaryOp::Pow => ResolvedType::Builtin(BuiltinType::Double),
            BinaryOp::Add if l.is_string() || r.is_string() => ResolvedType::Builtin(BuiltinType::String),
            BinaryOp::Div if self.language() == Language::VBNet => match (numeric(l), numeric(r)) {
                (Some(BuiltinType::Decimal), _) | (_, Some(BuiltinType::Decimal)) => {
                    ResolvedType::Builtin(BuiltinType::Decimal)
                }
                (Some(BuiltinType::Single), Some(b)) | (Some(b), Some(BuiltinType::Single))
                    if b != BuiltinType::Double =>
                {
                    ResolvedType::Builtin(BuiltinType::Single)
                }
                (Some(_), Some(_)) => ResolvedType::Builtin(BuiltinType::Double),
                _ => ResolvedType::Unknown,
            },
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
                if *l == ResolvedType::Builtin(BuiltinType::Bool) =>
            {
                ResolvedType::Builtin(BuiltinType::Bool)
            }
            BinaryOp::Shl | BinaryOp::Shr => l.clone(),
            _ => match (numeric(l), numeric(r)) {
                (Some(a), Some(b)) => ResolvedType::Builtin(BuiltinType::promote(a, b)),
                _ if l.is_unknown() || r.is_unknown() => ResolvedType::Unknown,
                _ => l.clone(),
            },
        }
    }
}

/// Type of a literal
pub fn literal_type(lit: &Literal) -> ResolvedType {
    match lit {
        Literal::Int(v) if i32::try_from(*v).is_ok() => ResolvedType::Builtin(BuiltinType::Int32),
        Literal::Int(_) => ResolvedType::Builtin(BuiltinType::Int64),
        Literal::Float(_) => ResolvedType::Builtin(BuiltinType::Double),
        Literal::Str(_) => ResolvedType::Builtin(BuiltinType::String),
        Literal::Char(_) => ResolvedType::Builtin(BuiltinType::Char),
        Literal::Bool(_) => ResolvedType::Builtin(BuiltinType::Bool),
        Literal::Null => ResolvedType::Null,
    }
}
