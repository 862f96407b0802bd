//! Bottom-up processing order.

use crate::graph::{Graph, NodeId};
use crate::preflight::Forest;

/// Post-order over every tree of `forest`: each node follows all of its
/// descendants, siblings keep input order, trees keep first-appearance
/// order.
///
/// Iterative, so depth never touches the call stack.
#[must_use]
pub fn schedule(graph: &Graph, forest: &Forest) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(graph.len());
    // (node, index of the next child to visit)
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for &root in forest.roots() {
        stack.push((root, 0));
        while let Some(top) = stack.last_mut() {
            let (id, next) = *top;
            match graph.node(id).children.get(next) {
                Some(&child) => {
                    top.1 += 1;
                    stack.push((child, 0));
                }
                None => {
                    order.push(id);
                    stack.pop();
                }
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::rows;
    use crate::preflight::validate;
    use issuegraph_types::{RawRow, Row};
    use proptest::prelude::*;

    fn titles(graph: &Graph, order: &[NodeId]) -> Vec<String> {
        order
            .iter()
            .map(|id| graph.node(*id).row.title.clone())
            .collect()
    }

    #[test]
    fn children_precede_parents_and_siblings_keep_order() {
        let validated = validate(
            Graph::build(rows(&[
                ("R1", None),
                ("M1", Some("R1")),
                ("L1", Some("M1")),
                ("M2", Some("R1")),
                ("R2", None),
                ("L2", Some("M1")),
            ])),
            &[],
        )
        .unwrap();
        let order = schedule(&validated.graph, &validated.forest);
        assert_eq!(
            titles(&validated.graph, &order),
            vec!["L1", "L2", "M1", "M2", "R1", "R2"]
        );
    }

    #[test]
    fn child_listed_before_parent_in_input() {
        let validated = validate(
            Graph::build(rows(&[("L", Some("M")), ("M", Some("R")), ("R", None)])),
            &[],
        )
        .unwrap();
        let order = schedule(&validated.graph, &validated.forest);
        assert_eq!(titles(&validated.graph, &order), vec!["L", "M", "R"]);
    }

    /// Random forests of depth at most two, emitted in a shuffled row order.
    fn forest_rows() -> impl Strategy<Value = Vec<Row>> {
        prop::collection::vec(any::<Option<prop::sample::Index>>(), 1..40)
            .prop_flat_map(|picks| {
                let mut parents: Vec<Option<usize>> = Vec::with_capacity(picks.len());
                let mut depths: Vec<usize> = Vec::with_capacity(picks.len());
                for (i, pick) in picks.iter().enumerate() {
                    let parent = match pick {
                        Some(idx) if i > 0 => {
                            let p = idx.index(i);
                            (depths[p] < 2).then_some(p)
                        }
                        _ => None,
                    };
                    depths.push(parent.map_or(0, |p| depths[p] + 1));
                    parents.push(parent);
                }
                let n = parents.len();
                (Just(parents), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
            })
            .prop_map(|(parents, permutation)| {
                permutation
                    .iter()
                    .enumerate()
                    .map(|(index, &node)| {
                        Row::from_raw(
                            index,
                            RawRow {
                                repository: Some("acme/app".into()),
                                title: Some(format!("T{node}")),
                                parent_title: parents[node].map(|p| format!("T{p}")),
                                body: Some("b".into()),
                                project_number: Some("1".into()),
                                ..RawRow::default()
                            },
                        )
                    })
                    .collect()
            })
    }

    proptest! {
        #[test]
        fn every_node_follows_its_descendants(rows in forest_rows()) {
            let count = rows.len();
            let validated = validate(Graph::build(rows), &[]).unwrap();
            let graph = &validated.graph;
            let order = schedule(graph, &validated.forest);

            prop_assert_eq!(order.len(), count);
            let mut position = vec![usize::MAX; count];
            for (pos, id) in order.iter().enumerate() {
                prop_assert_eq!(position[id.index()], usize::MAX);
                position[id.index()] = pos;
            }
            for node in graph.nodes() {
                let mut ancestor = node.parent;
                while let Some(a) = ancestor {
                    prop_assert!(position[node.id.index()] < position[a.index()]);
                    ancestor = graph.node(a).parent;
                }
            }
        }
    }
}
