//! Expression Definitions
//!
//! 式ノードを定義する。両言語の式を一つの閉じた列挙で表し、
//! 片方の言語にだけ存在する構文も含める。

use super::location::SourceRange;
use super::ops::{BinaryOp, UnaryOp};
use super::types::TypeRef;
use serde::{Deserialize, Serialize};

/// ノードの一意な ID (一つの木の中で一意)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 変換規則が存在しない構文の代わりに出力されるマーカー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    /// 元ノードの種類名 (`OnError`, `XmlLiteral` など)
    pub kind: String,
    /// 元ノードの ID
    pub original: NodeId,
}

/// リテラル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    /// C# `null`, VB `Nothing`
    Null,
}

/// キャストの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastKind {
    /// C# `(T)x`
    Cast,
    /// C# `x as T`
    As,
    /// VB `CType(x, T)` (CInt などの変換関数も含む)
    CType,
    /// VB `DirectCast(x, T)`
    DirectCast,
    /// VB `TryCast(x, T)`
    TryCast,
}

/// 式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub range: SourceRange,
    pub kind: ExprKind,
}

/// 式の種類 (実体)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum ExprKind {
    // --- リテラル・名前 ---
    Literal(Literal),
    /// 識別子 (書かれたままの大文字小文字)
    Identifier(String),
    /// メンバーアクセス (obj.member)
    MemberAccess { target: Box<Expr>, member: String },

    // --- 呼び出し ---
    /// 呼び出し構文。VB では配列要素アクセスもこの形になる
    Invocation { target: Box<Expr>, args: Vec<Expr> },
    /// C# のインデクサー構文 (a[i])
    Index { target: Box<Expr>, args: Vec<Expr> },
    /// C# の `ref x` 引数
    RefArgument(Box<Expr>),
    /// VB `AddressOf M`
    AddressOf(Box<Expr>),

    // --- 演算 ---
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// C# `c ? a : b`, VB `If(c, a, b)`
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// C# `x is T`, VB `TypeOf x Is T`
    TypeTest { expr: Box<Expr>, ty: TypeRef },
    Cast {
        kind: CastKind,
        ty: TypeRef,
        expr: Box<Expr>,
    },
    Parenthesized(Box<Expr>),

    // --- 生成 ---
    ObjectCreation { ty: TypeRef, args: Vec<Expr> },
    /// 配列生成。`dims` は C# では長さ、VB では上限 (包含) を表す
    ArrayCreation {
        element: TypeRef,
        rank: usize,
        dims: Vec<Expr>,
        initializer: Option<Vec<Expr>>,
    },
    /// C# `default(T)`
    DefaultValue(TypeRef),
    /// C# `typeof(T)`, VB `GetType(T)`
    TypeOf(TypeRef),

    // --- 特殊 ---
    /// C# `this`, VB `Me`
    This,
    /// C# `base`, VB `MyBase`
    Base,
    /// VB XML リテラル
    XmlLiteral(String),
    /// C# `stackalloc T[n]`
    StackAlloc { element: TypeRef, size: Box<Expr> },
    /// 変換できなかった式
    Unsupported(Placeholder),
}

impl Expr {
    /// 括弧を剥がした内側の式
    pub fn unparenthesized(&self) -> &Expr {
        match &self.kind {
            ExprKind::Parenthesized(inner) => inner.unparenthesized(),
            _ => self,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(
            self.unparenthesized().kind,
            ExprKind::Literal(Literal::Null)
        )
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_int_literal(&self) -> Option<i64> {
        match &self.unparenthesized().kind {
            ExprKind::Literal(Literal::Int(v)) => Some(*v),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => operand.as_int_literal().and_then(i64::checked_neg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(kind: ExprKind) -> Expr {
        Expr {
            id: NodeId(0),
            range: SourceRange::unknown(),
            kind,
        }
    }

    #[test]
    fn test_unparenthesized() {
        let inner = expr(ExprKind::Literal(Literal::Null));
        let outer = expr(ExprKind::Parenthesized(Box::new(expr(
            ExprKind::Parenthesized(Box::new(inner.clone())),
        ))));
        assert_eq!(outer.unparenthesized(), &inner);
        assert!(outer.is_null_literal());
    }

    #[test]
    fn test_as_int_literal_negative() {
        let neg = expr(ExprKind::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(expr(ExprKind::Literal(Literal::Int(2)))),
        });
        assert_eq!(neg.as_int_literal(), Some(-2));
    }
}
