//! Source Location Definitions
//!
//! ソースコード位置情報を定義する。
//! 変換の前後で同じ位置情報を保持し、診断とトリビアの再配置に使う。

use serde::{Deserialize, Serialize};

/// ソースコード上の一点 (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 行番号 (1-indexed)
    pub line: usize,
    /// 列番号 (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// 新しい SourceLocation を作成
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// 位置が不明な場合の SourceLocation
    pub fn unknown() -> Self {
        Self::default()
    }

    /// 位置情報があるかどうか
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

/// ノードが占めるソース範囲 (start..=end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// 一行内の範囲
    pub fn on_line(line: usize, column: usize, end_column: usize) -> Self {
        Self {
            start: SourceLocation::new(line, column),
            end: SourceLocation::new(line, end_column),
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_known(&self) -> bool {
        self.start.is_known()
    }

    /// 位置 `loc` がこの範囲に含まれるか
    pub fn contains(&self, loc: SourceLocation) -> bool {
        self.start <= loc && loc <= self.end
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_known() {
            return Ok(());
        }
        write!(f, "[line {}:{}]", self.start.line, self.start.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_order() {
        assert!(SourceLocation::new(2, 1) > SourceLocation::new(1, 80));
        assert!(SourceLocation::new(3, 4) < SourceLocation::new(3, 5));
    }

    #[test]
    fn test_source_range_contains() {
        let range = SourceRange::new(SourceLocation::new(2, 5), SourceLocation::new(4, 1));
        assert!(range.contains(SourceLocation::new(3, 1)));
        assert!(!range.contains(SourceLocation::new(4, 2)));
    }

    #[test]
    fn test_source_range_display() {
        assert_eq!(format!("{}", SourceRange::on_line(10, 3, 7)), "[line 10:3]");
        assert_eq!(format!("{}", SourceRange::unknown()), "");
    }
}
