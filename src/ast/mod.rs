//! AST module
//!
//! 両言語共通の構文木を提供する。パーサーとプリンターは外部にあり、
//! この木が入力と出力の両方の形になる。
//!
//! ## サブモジュール
//! - `ops` - 演算子定義 (BinaryOp, UnaryOp, AssignOp)
//! - `exprs` - 式定義 (Expr)
//! - `nodes` - 文定義 (Stmt)
//! - `decls` - 宣言とコンパイル単位 (Decl, CompilationUnit)
//! - `types` - 型参照 (TypeRef)
//! - `location` - ソースコード位置情報 (SourceLocation, SourceRange)
//! - `trivia` - コメント等と新旧ノード対応表 (TriviaStream, NodeMap)
//! - `build` - ノード構築ヘルパー (AstBuilder)
//! - `visit` - 走査 (Visit)

pub mod build;
pub mod decls;
pub mod exprs;
pub mod language;
pub mod location;
pub mod nodes;
pub mod ops;
pub mod trivia;
pub mod types;
pub mod visit;

pub use build::*;
pub use decls::*;
pub use exprs::*;
pub use language::*;
pub use location::*;
pub use nodes::*;
pub use ops::*;
pub use trivia::*;
pub use types::*;
