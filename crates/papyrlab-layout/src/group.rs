use papyrlab_core::{FragmentId, GroupId};
use std::collections::BTreeSet;

/// A named set of fragments that move and select together.
///
/// Membership is owned by [`crate::FragmentRegistry`], which keeps it in step
/// with each member's `group_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub(crate) members: BTreeSet<FragmentId>,
}

impl Group {
    pub(crate) fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            members: BTreeSet::new(),
        }
    }

    /// Default name for a group created by the operator.
    pub fn default_name(id: GroupId) -> String {
        format!("Group {}", id)
    }

    pub fn members(&self) -> &BTreeSet<FragmentId> {
        &self.members
    }

    pub fn contains(&self, id: FragmentId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
