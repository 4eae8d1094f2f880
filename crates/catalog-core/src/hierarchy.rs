//! Program hierarchy builder
//!
//! Rebuilds the program tree from flat, path-encoded rows:
//!
//! 1. Rows are ordered by path depth (stable), so every parent is seen
//!    before its children.
//! 2. The single row at minimal depth is the root. Several such rows are an
//!    integrity error; no partial tree is returned.
//! 3. Every other row is attached under the row whose path is its own path
//!    minus the last segment. Rows without such a parent are orphans: logged
//!    and skipped together with everything below them.
//! 4. `has_descendant_expecting_software_effort` is propagated leaves to root
//!    by visiting nodes in reverse insertion order.

use crate::error::HierarchyError;
use catalog_model::{Program, ProgramTreeNode};
use std::collections::HashMap;
use tracing::{error, warn};

struct Slot {
    node: Option<ProgramTreeNode>,
    parent: Option<usize>,
}

/// Build the program tree from the current program rows
///
/// Returns `Ok(None)` for an empty input. Children keep discovery order.
///
/// # Errors
/// Returns [`HierarchyError::MultipleRoots`] when more than one row sits at
/// the minimal path depth
pub fn build_program_tree(programs: &[Program]) -> Result<Option<ProgramTreeNode>, HierarchyError> {
    let mut ordered: Vec<&Program> = programs.iter().collect();
    ordered.sort_by_key(|p| p.path.depth());

    let Some(first) = ordered.first() else {
        return Ok(None);
    };
    let min_depth = first.path.depth();
    let root_count = ordered
        .iter()
        .take_while(|p| p.path.depth() == min_depth)
        .count();

    if root_count > 1 {
        let candidates: Vec<String> = ordered[..root_count]
            .iter()
            .map(|p| {
                error!(name = %p.name, path = %p.path, "program tree root candidate");
                format!("{} ({})", p.name, p.path)
            })
            .collect();
        return Err(HierarchyError::MultipleRoots {
            count: root_count,
            candidates,
        });
    }

    // Arena in insertion order; a parent always precedes its children.
    let mut slots: Vec<Slot> = Vec::with_capacity(ordered.len());
    let mut by_path: HashMap<String, usize> = HashMap::with_capacity(ordered.len());

    for program in ordered {
        let path = program.path.to_string();
        let parent = if slots.is_empty() {
            None
        } else {
            let parent_path = program.path.parent().map(|p| p.to_string());
            match parent_path.as_ref().and_then(|p| by_path.get(p)) {
                Some(&index) => Some(index),
                None => {
                    warn!(
                        program_id = %program.program_id,
                        path = %path,
                        parent_path = parent_path.as_deref().unwrap_or(""),
                        "orphan program, parent path not found"
                    );
                    continue;
                }
            }
        };

        by_path.insert(path, slots.len());
        slots.push(Slot {
            node: Some(ProgramTreeNode::from_program(program)),
            parent,
        });
    }

    // Descendant flags, leaves first.
    for index in (1..slots.len()).rev() {
        let (flagged, parent) = match (&slots[index].node, slots[index].parent) {
            (Some(node), Some(parent)) => (
                node.expecting_software_efforts || node.has_descendant_expecting_software_effort,
                parent,
            ),
            _ => continue,
        };
        if flagged {
            if let Some(parent) = slots[parent].node.as_mut() {
                parent.has_descendant_expecting_software_effort = true;
            }
        }
    }

    // Nest children, leaves first; each node's children arrive reversed.
    for index in (0..slots.len()).rev() {
        let Some(mut node) = slots[index].node.take() else {
            continue;
        };
        node.children.reverse();
        match slots[index].parent {
            Some(parent) => {
                if let Some(parent) = slots[parent].node.as_mut() {
                    parent.children.push(node);
                }
            }
            None => return Ok(Some(node)),
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_model::{NewProgram, ProgramKey};
    use chrono::{TimeZone, Utc};

    fn program(id: &str, path: &str, expects: bool) -> Program {
        NewProgram::new(
            id,
            catalog_model::ProgramPath::lexical(path),
            format!("Program {id}"),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        )
        .expecting_software_effort(expects)
        .into_program(ProgramKey(id.parse().unwrap_or(0)))
    }

    #[test]
    fn empty_input_has_no_tree() {
        assert_eq!(build_program_tree(&[]).unwrap(), None);
    }

    #[test]
    fn single_program_is_root() {
        let tree = build_program_tree(&[program("1", "1", true)]).unwrap().unwrap();
        assert_eq!(tree.program_id, "1");
        assert!(tree.expecting_software_efforts);
        assert!(!tree.has_descendant_expecting_software_effort);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn own_flag_does_not_count_as_descendant() {
        let tree = build_program_tree(&[program("1", "1", false), program("2", "1.1", true)])
            .unwrap()
            .unwrap();
        assert!(tree.has_descendant_expecting_software_effort);
        let child = &tree.children[0];
        assert!(child.expecting_software_efforts);
        assert!(!child.has_descendant_expecting_software_effort);
    }

    #[test]
    fn flag_propagates_through_every_ancestor() {
        let tree = build_program_tree(&[
            program("4", "1.1.1.1", true),
            program("1", "1", false),
            program("3", "1.1.1", false),
            program("2", "1.1", false),
            program("5", "1.2", false),
        ])
        .unwrap()
        .unwrap();

        assert!(tree.has_descendant_expecting_software_effort);
        assert!(tree.find("1.1").unwrap().has_descendant_expecting_software_effort);
        assert!(tree.find("1.1.1").unwrap().has_descendant_expecting_software_effort);
        assert!(!tree.find("1.1.1.1").unwrap().has_descendant_expecting_software_effort);
        assert!(!tree.find("1.2").unwrap().has_descendant_expecting_software_effort);
    }

    #[test]
    fn children_keep_discovery_order() {
        let tree = build_program_tree(&[
            program("1", "1", false),
            program("3", "1.3", false),
            program("2", "1.1", false),
            program("4", "1.2", false),
        ])
        .unwrap()
        .unwrap();
        let order: Vec<_> = tree.children.iter().map(|c| c.program_id.as_str()).collect();
        assert_eq!(order, vec!["3", "2", "4"]);
    }

    #[test]
    fn multiple_roots_is_an_error() {
        let err = build_program_tree(&[
            program("1", "1", false),
            program("2", "2", false),
            program("3", "1.1", false),
        ])
        .unwrap_err();
        let HierarchyError::MultipleRoots { count, candidates } = err;
        assert_eq!(count, 2);
        assert_eq!(candidates, vec!["Program 1 (1)", "Program 2 (2)"]);
    }

    #[test]
    fn orphans_are_skipped_with_their_descendants() {
        let tree = build_program_tree(&[
            program("1", "1", false),
            program("2", "1.1", false),
            program("3", "1.9.1", true),
            program("4", "1.9.1.1", true),
        ])
        .unwrap()
        .unwrap();

        assert_eq!(tree.node_count(), 2);
        assert!(tree.find("1.9.1").is_none());
        assert!(!tree.has_descendant_expecting_software_effort);
    }

    #[test]
    fn root_need_not_be_depth_one() {
        let tree = build_program_tree(&[program("2", "7.3.1", false), program("1", "7.3", false)])
            .unwrap()
            .unwrap();
        assert_eq!(tree.program_id, "1");
        assert_eq!(tree.children.len(), 1);
    }

    #[test]
    fn paths_are_compared_lexically() {
        let tree = build_program_tree(&[program("1", "01", false), program("2", "1.1", false)])
            .unwrap()
            .unwrap();
        assert_eq!(tree.node_count(), 1);
    }
}
