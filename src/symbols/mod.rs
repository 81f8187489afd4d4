//! Symbol model module
//!
//! 変換の前に一度だけ構築される、単位から見えるすべての型とメンバーの目録。
//!
//! ## サブモジュール
//! - `types` - 解決済みの型 (ResolvedType, BuiltinType)
//! - `table` - シンボルとスコープの表 (Symbol, Scope, SymbolTable)
//! - `library` - 参照ライブラリのカタログ (LibraryCatalog)
//! - `model` - 単位のモデルと名前解決 (SymbolModel)
//! - `builder` - 宣言パスと前方参照の解決 (SymbolModelBuilder)

mod builder;
mod library;
mod model;
mod table;
mod types;

pub use builder::*;
pub use library::*;
pub use model::*;
pub use table::*;
pub use types::*;
