use crate::types::{apply_precedence, ChangeTag, TagSet};

/// A review-screen badge for one visible change tag. Labels are the
/// canonical English strings; locale-aware rendering is a collaborator's
/// concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub tag: ChangeTag,
    pub label: &'static str,
}

fn label(tag: ChangeTag) -> &'static str {
    match tag {
        ChangeTag::Added => "Added",
        ChangeTag::Removed => "Removed",
        ChangeTag::NameChanged => "Name Changed",
        ChangeTag::AddressChanged => "Address Changed",
        ChangeTag::RolesChanged => "Roles Changed",
        ChangeTag::EmailChanged => "Email Changed",
        ChangeTag::Edited => "Edited",
        ChangeTag::Corrected => "Corrected",
        ChangeTag::Replaced => "Replaced",
    }
}

/// Badges to display for a row's tag set. `Added` suppresses everything
/// else, then `Removed`; otherwise every tag gets a badge.
pub fn badges(tags: &TagSet) -> Vec<Badge> {
    apply_precedence(tags)
        .into_iter()
        .map(|tag| Badge {
            tag,
            label: label(tag),
        })
        .collect()
}
