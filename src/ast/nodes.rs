//! Statement Definitions
//!
//! 文ノードを定義する。VB 固有の文 (ReDim, RaiseEvent, AddHandler, On Error)
//! と C# 固有の文 (unsafe, C 形式の for) も同じ列挙に置く。

use super::exprs::{Expr, NodeId, Placeholder};
use super::location::SourceRange;
use super::ops::AssignOp;
use super::types::TypeRef;
use serde::{Deserialize, Serialize};

/// ブロック (スコープを持つ文の列)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    pub range: SourceRange,
    pub stmts: Vec<Stmt>,
}

/// 変数宣言子 (`i(10) As Integer`, `a = new object()`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclarator {
    pub id: NodeId,
    pub range: SourceRange,
    pub name: String,
    /// 宣言された型 (推論の場合は None)
    pub ty: Option<TypeRef>,
    /// VB の名前に付く配列上限。`i(,)` は `[None, None]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Vec<Option<Expr>>>,
    pub init: Option<Expr>,
    /// VB `Dim a As New T(...)`。`init` に ObjectCreation が入る
    #[serde(default)]
    pub as_new: bool,
}

/// catch 節
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub id: NodeId,
    pub range: SourceRange,
    pub var: Option<String>,
    pub ty: Option<TypeRef>,
    pub body: Block,
}

/// `ReDim [Preserve] a(10), b(2, 3)` の一要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReDimClause {
    pub id: NodeId,
    pub range: SourceRange,
    pub target: Expr,
    /// 新しい上限 (包含)
    pub bounds: Vec<Expr>,
}

/// Exit / Continue の対象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JumpTarget {
    For,
    While,
    Do,
    Sub,
    Function,
}

/// 文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub id: NodeId,
    pub range: SourceRange,
    pub kind: StmtKind,
}

/// 文の種類 (実体)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum StmtKind {
    // --- 変数 ---
    /// ローカル変数宣言 (`Dim` / `T x = ...;`)
    Local {
        declarators: Vec<VariableDeclarator>,
        is_const: bool,
    },
    /// 代入
    Assign {
        target: Expr,
        op: AssignOp,
        value: Expr,
    },
    /// 式文
    Expr(Expr),

    // --- 制御構造 ---
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    While { cond: Expr, body: Block },
    /// VB `For i [As T] = a To b [Step s]`
    For {
        var: String,
        var_type: Option<TypeRef>,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Block,
    },
    /// C# `for (init; cond; iterators)`
    CFor {
        init: Vec<Stmt>,
        cond: Option<Expr>,
        iterators: Vec<Stmt>,
        body: Block,
    },
    ForEach {
        var: String,
        var_type: Option<TypeRef>,
        collection: Expr,
        body: Block,
    },
    Return(Option<Expr>),
    Throw(Option<Expr>),
    Try {
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
    },
    /// C# `break` (target = None), VB `Exit For` など
    Exit { target: Option<JumpTarget> },
    /// C# `continue` (target = None), VB `Continue For` など
    Continue { target: Option<JumpTarget> },
    Block(Block),

    // --- イベント ---
    /// VB `RaiseEvent E(args)`
    RaiseEvent { event: String, args: Vec<Expr> },
    /// VB `AddHandler E, h` / `RemoveHandler E, h`
    AddHandler {
        event: Expr,
        handler: Expr,
        remove: bool,
    },

    // --- 配列 ---
    /// VB `ReDim [Preserve] ...`
    ReDim {
        preserve: bool,
        clauses: Vec<ReDimClause>,
    },

    // --- 対応のない構文 ---
    /// VB `On Error GoTo label`
    OnError { label: String },
    /// C# `unsafe { ... }`
    Unsafe(Block),
    Unsupported(Placeholder),
}
