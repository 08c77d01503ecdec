use serde::{Deserialize, Serialize};

use crate::status::StatusContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn synthetic() -> Self {
        Self {
            start: SourceLocation { line: 1, column: 1 },
            end: SourceLocation { line: 1, column: 1 },
        }
    }
}

/// Result of compiling one scene: the generated dispatch script plus the
/// bookkeeping callers use for reporting and fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledScene {
    pub source: String,
    pub dependencies: Vec<String>,
    /// Guard contexts of the dispatch routine, in emission order.
    pub status_groups: Vec<StatusContext>,
    pub status_count: usize,
}
