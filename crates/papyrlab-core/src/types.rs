//! Typed identifiers.
//!
//! Fragments and groups are referenced by index-like ids rather than by
//! pointer, so relations between them can be stored in plain maps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a fragment, unique within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentId(pub u32);

/// Identifier of a fragment group, unique within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Smallest non-negative integer not present in `used`.
///
/// If `0..k` are all taken the result is `k`.
pub fn lowest_free_id<I>(used: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let mut taken: Vec<u32> = used.into_iter().collect();
    taken.sort_unstable();
    taken.dedup();
    let mut candidate = 0u32;
    for id in taken {
        if id != candidate {
            break;
        }
        candidate += 1;
    }
    candidate
}
