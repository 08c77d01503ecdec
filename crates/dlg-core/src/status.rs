use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type StatusId = i32;

/// Status the generated start routine dispatches with before any message
/// has been shown.
pub const START_STATUS: StatusId = -1;

/// Set of statuses whose resumption can reach a node.
///
/// Backed by an ordered set so two contexts holding the same statuses are
/// equal (and hash/order equally) regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusContext(BTreeSet<StatusId>);

impl StatusContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(status: StatusId) -> Self {
        Self(BTreeSet::from([status]))
    }

    pub fn start() -> Self {
        Self::singleton(START_STATUS)
    }

    pub fn insert(&mut self, status: StatusId) -> bool {
        self.0.insert(status)
    }

    pub fn union_with(&mut self, other: &StatusContext) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn contains(&self, status: StatusId) -> bool {
        self.0.contains(&status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Smallest status in the context.
    pub fn first(&self) -> Option<StatusId> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = StatusId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<StatusId> for StatusContext {
    fn from_iter<T: IntoIterator<Item = StatusId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for StatusContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, status) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", status)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod status_tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn contexts_compare_by_content() {
        let a = StatusContext::from_iter([3, 1, 2]);
        let b = StatusContext::from_iter([2, 3, 1, 1]);
        assert_eq!(a, b);

        let mut keyed = BTreeMap::new();
        keyed.insert(a, "first");
        assert_eq!(keyed.get(&b), Some(&"first"));
    }

    #[test]
    fn union_grows_and_first_reports_smallest() {
        let mut context = StatusContext::singleton(4);
        context.union_with(&StatusContext::from_iter([START_STATUS, 7]));
        assert_eq!(context.len(), 3);
        assert_eq!(context.first(), Some(START_STATUS));
        assert!(context.contains(7));
    }

    #[test]
    fn display_lists_statuses_in_order() {
        assert_eq!(StatusContext::from_iter([2, -1]).to_string(), "{-1, 2}");
        assert_eq!(StatusContext::new().to_string(), "{}");
        assert!(StatusContext::new().is_empty());
        assert!(StatusContext::start().contains(START_STATUS));
    }
}
