//! Fragment and group registry.
//!
//! Fragments and groups live in id-keyed maps and refer to each other by id.
//! Every mutation that touches membership updates both the fragment's
//! `group_id` and the group's member set, so the two views can never drift
//! apart. Ordered maps keep iteration deterministic.

use crate::fragment::Fragment;
use crate::group::Group;
use papyrlab_core::types::lowest_free_id;
use papyrlab_core::{BoundingBox, FragmentId, GroupId, InputError, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct FragmentRegistry {
    fragments: BTreeMap<FragmentId, Fragment>,
    groups: BTreeMap<GroupId, Group>,
}

impl FragmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.values()
    }

    pub fn fragment_ids(&self) -> impl Iterator<Item = FragmentId> + '_ {
        self.fragments.keys().copied()
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments.get(&id)
    }

    pub fn contains(&self, id: FragmentId) -> bool {
        self.fragments.contains_key(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Fragment> {
        self.fragments.values().find(|f| f.name == name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Adds a fragment.
    ///
    /// If the fragment already carries a group id it joins that group, which
    /// is created on demand.
    pub fn add_fragment(&mut self, fragment: Fragment) -> Result<()> {
        if self.fragments.contains_key(&fragment.id) {
            return Err(InputError::DuplicateId {
                kind: "fragment".to_string(),
                id: fragment.id.0,
            }
            .into());
        }

        let id = fragment.id;
        if let Some(gid) = fragment.group_id {
            self.groups
                .entry(gid)
                .or_insert_with(|| Group::new(gid, Group::default_name(gid)))
                .members
                .insert(id);
        }
        self.fragments.insert(id, fragment);
        debug!("Added fragment {}", id);
        Ok(())
    }

    /// Removes a fragment, evicting it from its group.
    ///
    /// A group left empty is removed as well. The caller is responsible for
    /// dropping the id from any selection.
    pub fn remove_fragment(&mut self, id: FragmentId) -> Option<Fragment> {
        let mut fragment = self.fragments.remove(&id)?;
        if let Some(gid) = fragment.group_id.take() {
            let emptied = match self.groups.get_mut(&gid) {
                Some(group) => {
                    group.members.remove(&id);
                    group.members.is_empty()
                }
                None => false,
            };
            if emptied {
                self.groups.remove(&gid);
                debug!("Removed empty group {}", gid);
            }
        }
        debug!("Removed fragment {}", id);
        Some(fragment)
    }

    /// Smallest fragment id not in use.
    pub fn free_fragment_id(&self) -> FragmentId {
        FragmentId(lowest_free_id(self.fragments.keys().map(|id| id.0)))
    }

    /// Smallest group id not in use.
    pub fn free_group_id(&self) -> GroupId {
        GroupId(lowest_free_id(self.groups.keys().map(|id| id.0)))
    }

    /// The fragment under `(x, y)`.
    ///
    /// Among all fragments whose box contains the point, the one whose centre
    /// is nearest wins; equal distances go to the smaller id.
    pub fn fragment_at(&self, x: f64, y: f64) -> Option<&Fragment> {
        let mut best: Option<(f64, &Fragment)> = None;
        for fragment in self.fragments.values() {
            if !fragment.bbox.contains_point(x, y) {
                continue;
            }
            let dist = fragment.center_distance_sq(x, y);
            match best {
                Some((best_dist, _)) if best_dist <= dist => {}
                _ => best = Some((dist, fragment)),
            }
        }
        best.map(|(_, fragment)| fragment)
    }

    /// All members of the fragment's group, or `None` if it is ungrouped.
    pub fn fragments_of_group(&self, id: FragmentId) -> Option<&BTreeSet<FragmentId>> {
        let gid = self.fragments.get(&id)?.group_id?;
        self.groups.get(&gid).map(|g| g.members())
    }

    /// Groups the given fragments into one new group.
    ///
    /// Groups already touched by the selection are dissolved first. Needs at
    /// least two distinct, existing fragments.
    pub fn group_fragments(&mut self, selection: &[FragmentId]) -> Result<GroupId> {
        let ids: BTreeSet<FragmentId> = selection.iter().copied().collect();
        for id in &ids {
            if !self.fragments.contains_key(id) {
                return Err(InputError::UnknownId {
                    kind: "fragment".to_string(),
                    id: id.0,
                }
                .into());
            }
        }
        if ids.len() < 2 {
            return Err(InputError::SelectionTooSmall { count: ids.len() }.into());
        }

        let touched: BTreeSet<GroupId> = ids
            .iter()
            .filter_map(|id| self.fragments.get(id).and_then(|f| f.group_id))
            .collect();
        for gid in touched {
            self.dissolve(gid);
        }

        let gid = self.free_group_id();
        let mut group = Group::new(gid, Group::default_name(gid));
        for id in &ids {
            if let Some(fragment) = self.fragments.get_mut(id) {
                fragment.group_id = Some(gid);
                group.members.insert(*id);
            }
        }
        self.groups.insert(gid, group);
        debug!("Created group {} with {} fragments", gid, ids.len());
        Ok(gid)
    }

    /// Dissolves a group, returning its former members.
    pub fn dissolve_group(&mut self, gid: GroupId) -> Result<Vec<FragmentId>> {
        if !self.groups.contains_key(&gid) {
            return Err(InputError::UnknownId {
                kind: "group".to_string(),
                id: gid.0,
            }
            .into());
        }
        Ok(self.dissolve(gid))
    }

    /// Dissolves the group the fragment belongs to, if any.
    pub fn dissolve_group_of(&mut self, id: FragmentId) -> Option<GroupId> {
        let gid = self.fragments.get(&id)?.group_id?;
        self.dissolve(gid);
        Some(gid)
    }

    fn dissolve(&mut self, gid: GroupId) -> Vec<FragmentId> {
        let Some(group) = self.groups.remove(&gid) else {
            return Vec::new();
        };
        for id in &group.members {
            if let Some(fragment) = self.fragments.get_mut(id) {
                fragment.group_id = None;
            }
        }
        debug!("Dissolved group {}", gid);
        group.members.into_iter().collect()
    }

    /// Renames a group.
    pub fn rename_group(&mut self, gid: GroupId, name: impl Into<String>) -> Result<()> {
        match self.groups.get_mut(&gid) {
            Some(group) => {
                group.name = name.into();
                Ok(())
            }
            None => Err(InputError::UnknownId {
                kind: "group".to_string(),
                id: gid.0,
            }
            .into()),
        }
    }

    /// Largest bottom edge of all fragments, 0 when empty.
    pub fn bottom_edge(&self) -> i64 {
        self.fragments
            .values()
            .map(|f| f.bbox.bottom())
            .max()
            .unwrap_or(0)
            .max(0)
    }

    /// Joint box of all fragments.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::union_all(self.fragments.values().map(|f| &f.bbox))
    }

    /// Moves a fragment's top-left corner to `(x, y)`.
    pub fn set_position(&mut self, id: FragmentId, x: i32, y: i32) -> Result<()> {
        self.fragment_mut(id)?.set_position(x, y);
        Ok(())
    }

    /// Restores a saved box (and the matching centre shift).
    pub fn set_bbox(&mut self, id: FragmentId, bbox: BoundingBox) -> Result<()> {
        self.fragment_mut(id)?.set_position(bbox.left, bbox.top);
        Ok(())
    }

    /// Translates the listed fragments; unknown ids are skipped.
    pub fn translate_fragments(&mut self, ids: &[FragmentId], dx: i32, dy: i32) {
        let unique: BTreeSet<FragmentId> = ids.iter().copied().collect();
        for id in unique {
            if let Some(fragment) = self.fragments.get_mut(&id) {
                fragment.translate(dx, dy);
            }
        }
    }

    pub fn set_note(&mut self, id: FragmentId, note: impl Into<String>) -> Result<()> {
        self.fragment_mut(id)?.note = note.into();
        Ok(())
    }

    fn fragment_mut(&mut self, id: FragmentId) -> Result<&mut Fragment> {
        self.fragments.get_mut(&id).ok_or_else(|| {
            InputError::UnknownId {
                kind: "fragment".to_string(),
                id: id.0,
            }
            .into()
        })
    }

    /// Checks that group ids and member sets agree and no group is empty.
    pub fn is_consistent(&self) -> bool {
        for fragment in self.fragments.values() {
            if let Some(gid) = fragment.group_id {
                match self.groups.get(&gid) {
                    Some(group) if group.members.contains(&fragment.id) => {}
                    _ => return false,
                }
            }
        }
        self.groups.values().all(|group| {
            !group.members.is_empty()
                && group.members.iter().all(|id| {
                    self.fragments
                        .get(id)
                        .is_some_and(|f| f.group_id == Some(group.id))
                })
        })
    }
}
