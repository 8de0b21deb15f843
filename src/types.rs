use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ChangeTag
// ---------------------------------------------------------------------------

/// Action code attached to a table row, shown as a review-screen badge and
/// carried on the outbound filing payload.
///
/// `Edited`, `Corrected` and `Replaced` are assigned by filing-specific
/// collaborators rather than computed by the diff, but they share the same
/// wire encoding and badge mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeTag {
    Added,
    Removed,
    NameChanged,
    AddressChanged,
    RolesChanged,
    EmailChanged,
    Edited,
    Corrected,
    Replaced,
}

/// The set of tags on one row. `BTreeSet` keeps payload ordering stable.
pub type TagSet = BTreeSet<ChangeTag>;

/// Create an empty tag set.
pub fn empty_tags() -> TagSet {
    BTreeSet::new()
}

/// Create a tag set from an iterable of tags.
pub fn tags_from(tags: impl IntoIterator<Item = ChangeTag>) -> TagSet {
    tags.into_iter().collect()
}

/// Collapse a raw computed tag set per the display/payload precedence rule:
/// `Added` suppresses everything else, then `Removed`, otherwise the set is
/// passed through unchanged. Preserved exactly as a contract.
pub fn apply_precedence(raw: &TagSet) -> TagSet {
    if raw.contains(&ChangeTag::Added) {
        return tags_from([ChangeTag::Added]);
    }
    if raw.contains(&ChangeTag::Removed) {
        return tags_from([ChangeTag::Removed]);
    }
    raw.clone()
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A semantically distinct sub-section of an entity, compared as a unit when
/// computing change tags. The set of sections is fixed per entity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Name,
    Address,
    Roles,
    Email,
    /// The whole legal definition of a share class or series, excluding
    /// display ordering (`priority`) and identity (`id`).
    Definition,
}

impl Section {
    /// The tag emitted when this section differs between old and new.
    /// A section with no mapping contributes nothing to the tag set.
    pub fn tag(self) -> Option<ChangeTag> {
        match self {
            Section::Name => Some(ChangeTag::NameChanged),
            Section::Address => Some(ChangeTag::AddressChanged),
            Section::Roles => Some(ChangeTag::RolesChanged),
            Section::Email => Some(ChangeTag::EmailChanged),
            Section::Definition => Some(ChangeTag::Edited),
        }
    }
}
