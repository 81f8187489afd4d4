//! Type Reference Definitions
//!
//! ソースに書かれた型参照。解決前の名前をそのまま保持する。

use super::exprs::NodeId;
use super::location::SourceRange;
use serde::{Deserialize, Serialize};

/// 型参照 (`int[,]`, `System.IDisposable`, `List(Of Integer)` など)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    pub id: NodeId,
    pub range: SourceRange,
    /// 書かれたままの名前 (修飾名・キーワードを含む)
    pub name: String,
    /// 型引数
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_args: Vec<TypeRef>,
    /// 配列の次元 (外側から順)。`int[,]` → `[2]`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub array_ranks: Vec<usize>,
}

impl TypeRef {
    /// 修飾名を `.` で分割したセグメント
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }

    /// 最後のセグメント (単純名)
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn is_array(&self) -> bool {
        !self.array_ranks.is_empty()
    }

    /// 配列の一段を剥がした要素型
    pub fn element_type(&self) -> TypeRef {
        let mut elem = self.clone();
        elem.array_ranks.pop();
        elem
    }

    /// 配列ランクを一つ追加した型
    pub fn with_array_rank(&self, rank: usize) -> TypeRef {
        let mut arr = self.clone();
        arr.array_ranks.push(rank);
        arr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tref(name: &str, ranks: Vec<usize>) -> TypeRef {
        TypeRef {
            id: NodeId(1),
            range: SourceRange::unknown(),
            name: name.to_string(),
            type_args: vec![],
            array_ranks: ranks,
        }
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(tref("System.IDisposable", vec![]).simple_name(), "IDisposable");
        assert_eq!(tref("Integer", vec![]).simple_name(), "Integer");
    }

    #[test]
    fn test_array_rank_helpers() {
        let arr = tref("int", vec![]).with_array_rank(2);
        assert!(arr.is_array());
        assert_eq!(arr.array_ranks, vec![2]);
        assert!(!arr.element_type().is_array());
    }
}
