use dlg_core::StatusContext;
use tracing::debug;

use crate::node::{CaseTest, NodeKind, SceneNode};

pub fn assign_status_contexts(root: &mut SceneNode) -> StatusContext {
    let exit = assign(root, &StatusContext::start());
    debug!(exit = %exit, "assigned status contexts");
    exit
}

fn assign(node: &mut SceneNode, incoming: &StatusContext) -> StatusContext {
    node.context.union_with(incoming);

    let mut current = match node.status() {
        Some(status) => StatusContext::singleton(status),
        None => incoming.clone(),
    };

    if node.is_parallel() {
        let entry = current.clone();
        let mut joined = StatusContext::new();
        for child in &mut node.children {
            joined.union_with(&assign(child, &entry));
        }
        // Without a default arm control can skip every case.
        if falls_through(node) {
            joined.union_with(&entry);
        }
        current = joined;
    } else if node.has_children() {
        for child in &mut node.children {
            current = assign(child, &current);
        }
    }

    current
}

fn falls_through(node: &SceneNode) -> bool {
    matches!(node.kind, NodeKind::Switch { .. })
        && !node.children.iter().any(|case| {
            matches!(
                case.kind,
                NodeKind::Case {
                    test: CaseTest::Default
                }
            )
        })
}
