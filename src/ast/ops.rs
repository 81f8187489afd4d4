//! Operator Definitions
//!
//! 両言語の演算子を一つの列挙にまとめる。
//! 片方の言語にしか存在しない演算子 (VB の `&`, `\`, `^`, `Is` など) も含む。

use serde::{Deserialize, Serialize};

/// 二項演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // 算術演算子
    Add,
    Sub,
    Mul,
    /// C# `/` (整数同士なら整数除算), VB `/` (常に浮動小数点除算)
    Div,
    /// VB `\`
    IntDiv,
    Mod,
    /// VB `^`
    Pow,
    /// VB `&`
    Concat,

    // 比較演算子
    /// C# `==`, VB `=`
    Eq,
    /// C# `!=`, VB `<>`
    NotEq,
    /// VB `Is`
    RefEq,
    /// VB `IsNot`
    RefNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // 論理演算子
    /// C# `&&`, VB `AndAlso`
    AndAlso,
    /// C# `||`, VB `OrElse`
    OrElse,

    // ビット演算子 (VB の And/Or/Xor は Boolean にも使う)
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn is_equality(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::RefEq | BinaryOp::RefNotEq
        )
    }

    /// 否定形の比較 (`!=`, `<>`, `IsNot`)
    pub fn is_negated_equality(&self) -> bool {
        matches!(self, BinaryOp::NotEq | BinaryOp::RefNotEq)
    }

    /// 結果が常に Boolean になる演算子
    pub fn is_boolean_result(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::RefEq
                | BinaryOp::RefNotEq
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::LtEq
                | BinaryOp::GtEq
                | BinaryOp::AndAlso
                | BinaryOp::OrElse
        )
    }
}

/// 単項演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    /// C# `!`, VB `Not`
    Not,
    /// C# `~`
    BitNot,
    /// C# `++x`
    PreIncrement,
    /// C# `--x`
    PreDecrement,
    /// C# `x++`
    PostIncrement,
    /// C# `x--`
    PostDecrement,
}

impl UnaryOp {
    pub fn is_increment(&self) -> bool {
        matches!(
            self,
            UnaryOp::PreIncrement
                | UnaryOp::PreDecrement
                | UnaryOp::PostIncrement
                | UnaryOp::PostDecrement
        )
    }
}

/// 代入演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    /// VB `&=`
    ConcatAssign,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_classification() {
        assert!(BinaryOp::RefNotEq.is_equality());
        assert!(BinaryOp::RefNotEq.is_negated_equality());
        assert!(!BinaryOp::Concat.is_equality());
        assert!(BinaryOp::AndAlso.is_boolean_result());
        assert!(!BinaryOp::BitAnd.is_boolean_result());
    }

    #[test]
    fn test_unary_increment() {
        assert!(UnaryOp::PostIncrement.is_increment());
        assert!(!UnaryOp::Not.is_increment());
    }
}
