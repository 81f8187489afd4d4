//! Expression semantics module
//!
//! 構築済みのシンボルモデルに対して式を解決し、変換規則の選択に必要な
//! 性質 (等価比較の種類、呼び出しの種類、イベント発火のパターン) を判定する。

mod classify;
mod resolver;

pub use classify::*;
pub use resolver::*;

#[cfg(test)]
mod tests;
