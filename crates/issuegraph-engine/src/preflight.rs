//! Preflight validation of the whole batch.
//!
//! Every structural and field problem is collected before anything is sent
//! remotely. A [`Forest`] only exists for a graph that passed, which is what
//! lets the scheduler assume an acyclic, at most three-level hierarchy.

use issuegraph_types::{ValidationIssue, ViolationKind};

use crate::graph::{Ancestry, Graph, NodeId};

/// Deepest allowed node: root (0), mid (1), leaf (2).
pub const MAX_DEPTH: usize = 2;

/// Root nodes of a validated graph, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest {
    roots: Vec<NodeId>,
}

impl Forest {
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }
}

/// A graph that passed preflight, together with its forest.
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
    pub graph: Graph,
    pub forest: Forest,
}

/// Validate `graph`. `missing_columns` are header columns the input lacked.
///
/// # Errors
///
/// Returns every [`ValidationIssue`] found, ordered by row (table-level
/// issues first).
pub fn validate(
    graph: Graph,
    missing_columns: &[&str],
) -> Result<ValidatedGraph, Vec<ValidationIssue>> {
    let mut issues: Vec<ValidationIssue> = missing_columns
        .iter()
        .map(|col| ValidationIssue {
            row: None,
            kind: ViolationKind::MissingColumn,
            message: format!("Missing required column: '{col}'"),
        })
        .collect();

    for node in graph.nodes() {
        check_fields(node.id, &graph, &mut issues);
    }

    for &(duplicate, first) in graph.duplicates() {
        let row = &graph.node(duplicate).row;
        issues.push(ValidationIssue {
            row: Some(row.index),
            kind: ViolationKind::DuplicateTitle,
            message: format!(
                "title '{}' already used by row {}",
                row.title,
                graph.node(first).row.line()
            ),
        });
    }

    for &id in graph.dangling() {
        let row = &graph.node(id).row;
        issues.push(ValidationIssue {
            row: Some(row.index),
            kind: ViolationKind::DanglingParent,
            message: format!(
                "'parent_title' ('{}') does not match any 'title' in the file",
                row.parent_title.as_deref().unwrap_or_default()
            ),
        });
    }

    for node in graph.nodes() {
        if graph.is_duplicate(node.id) {
            continue;
        }
        match graph.ancestry(node.id) {
            Ancestry::Cycle { path } => {
                let chain = path
                    .iter()
                    .map(|id| format!("'{}'", graph.node(*id).row.title))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                issues.push(ValidationIssue {
                    row: Some(node.row.index),
                    kind: ViolationKind::Cycle,
                    message: format!("parent chain forms a cycle: {chain}"),
                });
            }
            Ancestry::Rooted { depth } if depth > MAX_DEPTH => {
                issues.push(ValidationIssue {
                    row: Some(node.row.index),
                    kind: ViolationKind::DepthExceeded,
                    message: format!(
                        "'{}' is nested {} levels deep; at most {} levels (root, mid, leaf) are supported",
                        node.row.title,
                        depth + 1,
                        MAX_DEPTH + 1
                    ),
                });
            }
            // Members of the cycle report it.
            Ancestry::Rooted { .. } | Ancestry::LeadsIntoCycle => {}
        }
    }

    if !issues.is_empty() {
        issues.sort_by_key(|issue| issue.row.map_or(0, |r| r + 1));
        return Err(issues);
    }

    let roots = graph
        .nodes()
        .filter(|node| node.parent.is_none())
        .map(|node| node.id)
        .collect();
    Ok(ValidatedGraph {
        graph,
        forest: Forest { roots },
    })
}

fn check_fields(id: NodeId, graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    let row = &graph.node(id).row;
    let mut push = |kind: ViolationKind, message: String| {
        issues.push(ValidationIssue {
            row: Some(row.index),
            kind,
            message,
        });
    };

    if row.repository.is_empty() {
        push(
            ViolationKind::MissingField,
            "'repository' field cannot be empty".to_string(),
        );
    } else if row.repository().is_none() {
        push(
            ViolationKind::MalformedRepository,
            format!(
                "'repository' ('{}') must have the form 'owner/name'",
                row.repository
            ),
        );
    }

    if row.title.is_empty() {
        push(
            ViolationKind::MissingField,
            "'title' field cannot be empty".to_string(),
        );
    }

    if row.body.trim().is_empty() {
        push(
            ViolationKind::MissingField,
            "'body' field cannot be empty".to_string(),
        );
    }

    let raw_number = row.raw.project_number.as_deref().map(str::trim).unwrap_or_default();
    if raw_number.is_empty() {
        push(
            ViolationKind::MissingField,
            "'project_number' field cannot be empty".to_string(),
        );
    } else if row.project_number.is_none() {
        push(
            ViolationKind::InvalidProjectNumber,
            format!("'project_number' ('{raw_number}') must be a positive integer"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{row, rows};
    use issuegraph_types::Row;

    fn kinds(issues: &[ValidationIssue]) -> Vec<ViolationKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn valid_three_level_forest_passes() {
        let validated = validate(
            Graph::build(rows(&[
                ("R1", None),
                ("M", Some("R1")),
                ("L", Some("M")),
                ("R2", None),
            ])),
            &[],
        )
        .unwrap();
        assert_eq!(validated.forest.roots(), &[NodeId(0), NodeId(3)]);
    }

    #[test]
    fn dangling_parent_is_structural_error() {
        let issues =
            validate(Graph::build(rows(&[("A", None), ("B", Some("Nope"))])), &[]).unwrap_err();
        assert_eq!(kinds(&issues), vec![ViolationKind::DanglingParent]);
        assert_eq!(issues[0].row, Some(1));
        assert!(issues[0].message.contains("'Nope'"));
    }

    #[test]
    fn cycle_is_reported_for_each_member_without_looping() {
        let issues = validate(
            Graph::build(rows(&[("A", Some("B")), ("B", Some("A")), ("C", Some("A"))])),
            &[],
        )
        .unwrap_err();
        assert_eq!(kinds(&issues), vec![ViolationKind::Cycle, ViolationKind::Cycle]);
        assert!(issues[0].message.contains("'A' -> 'B' -> 'A'"));
        assert_eq!(issues[1].row, Some(1));
    }

    #[test]
    fn fourth_level_is_rejected() {
        let issues = validate(
            Graph::build(rows(&[
                ("R", None),
                ("M", Some("R")),
                ("L", Some("M")),
                ("Too deep", Some("L")),
            ])),
            &[],
        )
        .unwrap_err();
        assert_eq!(kinds(&issues), vec![ViolationKind::DepthExceeded]);
        assert_eq!(issues[0].row, Some(3));
        assert!(issues[0].message.contains("4 levels"));
    }

    #[test]
    fn duplicate_titles_are_rejected() {
        let issues =
            validate(Graph::build(rows(&[("A", None), ("A", None)])), &[]).unwrap_err();
        assert_eq!(kinds(&issues), vec![ViolationKind::DuplicateTitle]);
        assert!(issues[0].message.contains("row 2"));
    }

    #[test]
    fn field_errors_are_collected_with_structural_errors() {
        let mut bad = row(1, "B", Some("Ghost"));
        bad.repository = "not-a-repo".into();
        bad.body = "   ".into();
        bad.raw.project_number = Some("zero".into());
        bad.project_number = None;

        let mut missing = row(2, "", None);
        missing.repository = String::new();
        missing.raw.project_number = None;
        missing.project_number = None;

        let rows: Vec<Row> = vec![row(0, "A", None), bad, missing];
        let issues = validate(Graph::build(rows), &["parent_title"]).unwrap_err();

        assert_eq!(
            kinds(&issues),
            vec![
                ViolationKind::MissingColumn,
                ViolationKind::MalformedRepository,
                ViolationKind::MissingField,
                ViolationKind::InvalidProjectNumber,
                ViolationKind::DanglingParent,
                ViolationKind::MissingField,
                ViolationKind::MissingField,
                ViolationKind::MissingField,
            ]
        );
        assert!(issues.iter().any(|i| i.kind.is_structural()));
        assert!(issues[0].row.is_none());
    }
}
