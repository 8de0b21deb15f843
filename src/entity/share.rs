use serde::{Deserialize, Serialize};

use super::TableEntity;
use crate::types::Section;

/// A class of shares in the corporation's authorized share structure.
///
/// `priority` is display ordering and `id` is identity; neither is part of
/// the compared `Definition` section — reordering classes is not a legal
/// change to the class itself. Series are tracked in their own change table
/// keyed by the owning class id (see `table::share_structure`), not embedded
/// here, so a series edit never dirties the class row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareClass {
    pub id: String,
    pub name: String,
    pub priority: u32,
    pub max_number_of_shares: Option<u64>,
    pub par_value: Option<f64>,
    pub currency: Option<String>,
    pub has_maximum_shares: bool,
    pub has_par_value: bool,
    pub has_rights_or_restrictions: bool,
}

impl ShareClass {
    fn definition_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.max_number_of_shares == other.max_number_of_shares
            && self.par_value == other.par_value
            && self.currency == other.currency
            && self.has_maximum_shares == other.has_maximum_shares
            && self.has_par_value == other.has_par_value
            && self.has_rights_or_restrictions == other.has_rights_or_restrictions
    }
}

impl TableEntity for ShareClass {
    const SECTIONS: &'static [Section] = &[Section::Definition];

    fn section_eq(&self, other: &Self, section: Section) -> bool {
        match section {
            Section::Definition => self.definition_eq(other),
            _ => true,
        }
    }

    fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// A series within a share class. Same identity/ordering carve-out as the
/// class itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSeries {
    pub id: String,
    pub name: String,
    pub priority: u32,
    pub max_number_of_shares: Option<u64>,
    pub has_maximum_shares: bool,
    pub has_rights_or_restrictions: bool,
}

impl ShareSeries {
    fn definition_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.max_number_of_shares == other.max_number_of_shares
            && self.has_maximum_shares == other.has_maximum_shares
            && self.has_rights_or_restrictions == other.has_rights_or_restrictions
    }
}

impl TableEntity for ShareSeries {
    const SECTIONS: &'static [Section] = &[Section::Definition];

    fn section_eq(&self, other: &Self, section: Section) -> bool {
        match section {
            Section::Definition => self.definition_eq(other),
            _ => true,
        }
    }

    fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}
