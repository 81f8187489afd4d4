//! Declaration Definitions
//!
//! 宣言ノードとコンパイル単位を定義する。

use super::exprs::{NodeId, Placeholder};
use super::location::SourceRange;
use super::nodes::{Block, VariableDeclarator};
use super::types::TypeRef;
use serde::{Deserialize, Serialize};

/// アクセス修飾子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    Public,
    Private,
    Protected,
    /// C# `internal`, VB `Friend`
    Internal,
    ProtectedInternal,
}

/// 宣言修飾子。キーワードの綴りは出力側の責務
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub access: Option<Access>,
    /// C# `static`, VB `Shared`
    #[serde(default)]
    pub is_static: bool,
    /// C# `abstract`, VB `MustOverride` / `MustInherit`
    #[serde(default)]
    pub is_abstract: bool,
    /// C# `virtual`, VB `Overridable`
    #[serde(default)]
    pub is_virtual: bool,
    /// C# `override`, VB `Overrides`
    #[serde(default)]
    pub is_override: bool,
    /// C# `readonly`, VB `ReadOnly`
    #[serde(default)]
    pub is_readonly: bool,
}

impl Modifiers {
    pub fn with_access(access: Access) -> Self {
        Self {
            access: Some(access),
            ..Self::default()
        }
    }
}

/// 型宣言の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDeclKind {
    Class,
    Struct,
    Interface,
    Enum,
    /// VB `Module`
    Module,
}

/// 仮引数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub id: NodeId,
    pub range: SourceRange,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub by_ref: bool,
}

/// `using X;` / `Imports X`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub id: NodeId,
    pub range: SourceRange,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// コンパイル単位 (1 ファイル)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub id: NodeId,
    pub range: SourceRange,
    pub imports: Vec<Import>,
    pub members: Vec<Decl>,
}

/// 宣言
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub id: NodeId,
    pub range: SourceRange,
    pub kind: DeclKind,
}

/// 宣言の種類 (実体)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum DeclKind {
    Namespace {
        name: String,
        members: Vec<Decl>,
    },
    Type {
        name: String,
        kind: TypeDeclKind,
        modifiers: Modifiers,
        bases: Vec<TypeRef>,
        members: Vec<Decl>,
    },
    Field {
        modifiers: Modifiers,
        declarators: Vec<VariableDeclarator>,
        is_const: bool,
    },
    Method {
        name: String,
        modifiers: Modifiers,
        params: Vec<Param>,
        /// None は C# `void` / VB `Sub`
        return_type: Option<TypeRef>,
        body: Option<Block>,
    },
    Property {
        name: String,
        modifiers: Modifiers,
        ty: TypeRef,
        getter: Option<Block>,
        setter: Option<Block>,
    },
    /// イベント。VB では型の代わりに引数リストを書ける
    Event {
        name: String,
        modifiers: Modifiers,
        ty: Option<TypeRef>,
        params: Option<Vec<Param>>,
    },
    Delegate {
        name: String,
        modifiers: Modifiers,
        params: Vec<Param>,
        return_type: Option<TypeRef>,
    },
    Unsupported(Placeholder),
}

impl Decl {
    /// 宣言された名前 (フィールドは最初の宣言子)
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            DeclKind::Namespace { name, .. }
            | DeclKind::Type { name, .. }
            | DeclKind::Method { name, .. }
            | DeclKind::Property { name, .. }
            | DeclKind::Event { name, .. }
            | DeclKind::Delegate { name, .. } => Some(name),
            DeclKind::Field { declarators, .. } => declarators.first().map(|d| d.name.as_str()),
            DeclKind::Unsupported(_) => None,
        }
    }
}
