//! Flat rows to title-keyed node graph.
//!
//! Every row becomes a [`Node`]; node ids equal row indexes. Parent links
//! are resolved once through a title map, and unresolved or duplicate
//! titles are recorded for the preflight validator instead of failing here,
//! so all problems can be reported together.

use std::collections::{HashMap, HashSet};

use issuegraph_types::Row;

/// Handle of a node inside its [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A row plus its resolved relations.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub row: Row,
    pub parent: Option<NodeId>,
    /// Children in input order.
    pub children: Vec<NodeId>,
}

/// Result of walking a node's parent chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ancestry {
    /// Chain ends at a root after `depth` hops.
    Rooted { depth: usize },
    /// The node itself is on a cycle; `path` starts and ends with it.
    Cycle { path: Vec<NodeId> },
    /// Chain runs into a cycle the node is not part of.
    LeadsIntoCycle,
}

/// Owner of every node.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    by_title: HashMap<String, NodeId>,
    /// Later rows whose title was already taken, with the first holder.
    duplicates: Vec<(NodeId, NodeId)>,
    /// Rows whose `parent_title` matched nothing.
    dangling: Vec<NodeId>,
}

impl Graph {
    /// Build the graph. Pure; never fails.
    #[must_use]
    pub fn build(rows: Vec<Row>) -> Self {
        let mut graph = Self {
            nodes: Vec::with_capacity(rows.len()),
            ..Self::default()
        };

        for (index, row) in rows.into_iter().enumerate() {
            let id = NodeId(index);
            if !row.title.is_empty() {
                match graph.by_title.get(&row.title) {
                    Some(&first) => graph.duplicates.push((id, first)),
                    None => {
                        graph.by_title.insert(row.title.clone(), id);
                    }
                }
            }
            graph.nodes.push(Node {
                id,
                row,
                parent: None,
                children: Vec::new(),
            });
        }

        let duplicate_ids: HashSet<NodeId> = graph.duplicates.iter().map(|(d, _)| *d).collect();
        for index in 0..graph.nodes.len() {
            let id = NodeId(index);
            if duplicate_ids.contains(&id) {
                continue;
            }
            let Some(parent_title) = graph.nodes[index].row.parent_title.as_deref() else {
                continue;
            };
            match graph.by_title.get(parent_title).copied() {
                Some(parent) => {
                    graph.nodes[index].parent = Some(parent);
                    if parent != id {
                        graph.nodes[parent.0].children.push(id);
                    }
                }
                None => graph.dangling.push(id),
            }
        }

        graph
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `id` came from a different graph.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn lookup(&self, title: &str) -> Option<NodeId> {
        self.by_title.get(title).copied()
    }

    /// `(duplicate, first occurrence)` pairs.
    #[must_use]
    pub fn duplicates(&self) -> &[(NodeId, NodeId)] {
        &self.duplicates
    }

    #[must_use]
    pub fn dangling(&self) -> &[NodeId] {
        &self.dangling
    }

    #[must_use]
    pub fn is_duplicate(&self, id: NodeId) -> bool {
        self.duplicates.iter().any(|(d, _)| *d == id)
    }

    /// Walk the parent chain from `id`, stopping at a root or at the first
    /// revisited node.
    #[must_use]
    pub fn ancestry(&self, id: NodeId) -> Ancestry {
        let mut path = vec![id];
        let mut visited = HashSet::from([id]);
        let mut current = id;

        while let Some(parent) = self.nodes[current.0].parent {
            if parent == id {
                path.push(id);
                return Ancestry::Cycle { path };
            }
            if !visited.insert(parent) {
                return Ancestry::LeadsIntoCycle;
            }
            path.push(parent);
            current = parent;
        }
        Ancestry::Rooted {
            depth: path.len() - 1,
        }
    }

    /// Hops to the root, or `None` when the chain cycles.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        match self.ancestry(id) {
            Ancestry::Rooted { depth } => Some(depth),
            Ancestry::Cycle { .. } | Ancestry::LeadsIntoCycle => None,
        }
    }
}
