//! Trivia and node identity mapping
//!
//! Comments, blank lines and directives live outside the tree. After the
//! tree is restructured they are re-anchored through the original→new
//! node identity map rather than by raw source position.

use super::decls::{CompilationUnit, Decl};
use super::exprs::NodeId;
use super::location::{SourceLocation, SourceRange};
use super::nodes::Stmt;
use super::visit::{walk_decl, walk_stmt, Visit};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriviaKind {
    Comment,
    BlankLine,
    /// `#region`, `#If` and friends
    Directive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub location: SourceLocation,
}

/// Trivia of one unit, in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriviaStream {
    pub items: Vec<Trivia>,
}

impl TriviaStream {
    pub fn new(mut items: Vec<Trivia>) -> Self {
        items.sort_by_key(|t| t.location);
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Before,
    After,
}

/// Trivia item attached to a node of the converted tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchoredTrivia {
    pub trivia: Trivia,
    /// None when the unit had no anchorable node at all
    pub anchor: Option<NodeId>,
    pub placement: Placement,
}

/// Original node identity → identities of the nodes produced from it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ForwardIds", into = "ForwardIds")]
pub struct NodeMap {
    forward: HashMap<u32, Vec<NodeId>>,
    /// produced → original; the last original recorded for a node wins
    reverse: HashMap<u32, NodeId>,
}

/// Serialized form; older files without `reverse` get it rebuilt on load
#[derive(Serialize, Deserialize)]
struct ForwardIds {
    forward: HashMap<u32, Vec<NodeId>>,
    #[serde(default)]
    reverse: HashMap<u32, NodeId>,
}

impl From<ForwardIds> for NodeMap {
    fn from(ids: ForwardIds) -> Self {
        let mut reverse = ids.reverse;
        for (orig, produced) in &ids.forward {
            for p in produced {
                reverse.entry(p.0).or_insert(NodeId(*orig));
            }
        }
        Self {
            forward: ids.forward,
            reverse,
        }
    }
}

impl From<NodeMap> for ForwardIds {
    fn from(map: NodeMap) -> Self {
        Self {
            forward: map.forward,
            reverse: map.reverse,
        }
    }
}

impl NodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, original: NodeId, produced: NodeId) {
        let entry = self.forward.entry(original.0).or_default();
        if !entry.contains(&produced) {
            entry.push(produced);
        }
        self.reverse.insert(produced.0, original);
    }

    /// Nodes produced from `original`, in production order
    pub fn produced_from(&self, original: NodeId) -> &[NodeId] {
        self.forward
            .get(&original.0)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The original node a converted node came from
    pub fn original_of(&self, produced: NodeId) -> Option<NodeId> {
        self.reverse.get(&produced.0).copied()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Declarations and statements of a unit in source order, with ranges
fn anchor_candidates(unit: &CompilationUnit) -> Vec<(NodeId, SourceRange)> {
    struct Collect(Vec<(NodeId, SourceRange)>);

    impl Visit for Collect {
        fn visit_decl(&mut self, decl: &Decl) {
            self.0.push((decl.id, decl.range));
            walk_decl(self, decl);
        }
        fn visit_stmt(&mut self, stmt: &Stmt) {
            self.0.push((stmt.id, stmt.range));
            walk_stmt(self, stmt);
        }
    }

    let mut c = Collect(unit.imports.iter().map(|i| (i.id, i.range)).collect());
    c.visit_unit(unit);
    c.0.retain(|(_, r)| r.is_known());
    c.0.sort_by_key(|(_, r)| r.start);
    c.0
}

/// Re-anchor the original trivia onto the converted tree.
///
/// Each item attaches before the first original node starting at or after it,
/// else after the last node preceding it. Originals that produced no output
/// fall through to the next candidate.
pub fn realign_trivia(
    trivia: &TriviaStream,
    original: &CompilationUnit,
    map: &NodeMap,
) -> Vec<AnchoredTrivia> {
    let candidates: Vec<(NodeId, SourceRange)> = anchor_candidates(original)
        .into_iter()
        .filter(|(id, _)| !map.produced_from(*id).is_empty())
        .collect();

    trivia
        .items
        .iter()
        .map(|item| {
            let following = candidates
                .iter()
                .find(|(_, range)| range.start >= item.location);
            let (anchor, placement) = match following {
                Some((id, _)) => (Some(*id), Placement::Before),
                None => (
                    candidates
                        .iter()
                        .rev()
                        .find(|(_, range)| range.start < item.location)
                        .map(|(id, _)| *id),
                    Placement::After,
                ),
            };
            AnchoredTrivia {
                trivia: item.clone(),
                anchor: anchor.and_then(|id| map.produced_from(id).first().copied()),
                placement,
            }
        })
        .collect()
}
