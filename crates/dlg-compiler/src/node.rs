use dlg_core::{StatusContext, StatusId};

use crate::features::Feature;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseTest {
    Values(Vec<String>),
    /// Raw boolean expression; `$x` stands for the switch subject.
    Condition(String),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStyle {
    Next,
    PrevNext,
    YesNo { no_text: String },
    Ok,
}

impl MessageStyle {
    pub fn feature_name(&self) -> &'static str {
        match self {
            Self::Next => "dlg_Next",
            Self::PrevNext => "dlg_PrevNext",
            Self::YesNo { .. } => "dlg_YesNo",
            Self::Ok => "dlg_Ok",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandArgs {
    pub x: Option<String>,
    pub y: Option<String>,
    pub z: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Block,
    Switch {
        feature: Feature,
    },
    Case {
        test: CaseTest,
    },
    Message {
        status: StatusId,
        style: MessageStyle,
        text: String,
    },
    Options {
        status: StatusId,
        text: String,
    },
    Option {
        label: String,
    },
    Command {
        feature: Feature,
        args: CommandArgs,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
    pub context: StatusContext,
}

impl SceneNode {
    pub fn new(kind: NodeKind, children: Vec<SceneNode>) -> Self {
        Self {
            kind,
            children,
            context: StatusContext::new(),
        }
    }

    pub fn leaf(kind: NodeKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn has_children(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Block
                | NodeKind::Switch { .. }
                | NodeKind::Case { .. }
                | NodeKind::Options { .. }
                | NodeKind::Option { .. }
        )
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self.kind, NodeKind::Switch { .. } | NodeKind::Options { .. })
    }

    pub fn is_suspend_point(&self) -> bool {
        self.status().is_some()
    }

    pub fn status(&self) -> Option<StatusId> {
        match self.kind {
            NodeKind::Message { status, .. } | NodeKind::Options { status, .. } => Some(status),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Block => "block",
            NodeKind::Switch { .. } => "switch",
            NodeKind::Case { .. } => "case",
            NodeKind::Message { .. } => "message",
            NodeKind::Options { .. } => "options",
            NodeKind::Option { .. } => "option",
            NodeKind::Command { .. } => "command",
        }
    }

    #[cfg(test)]
    pub(crate) fn walk(&self) -> Vec<&SceneNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn statuses(&self) -> Vec<StatusId> {
        let mut statuses = self
            .walk()
            .into_iter()
            .filter_map(SceneNode::status)
            .collect::<Vec<_>>();
        statuses.sort_unstable();
        statuses
    }
}
