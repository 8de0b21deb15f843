use serde::{Deserialize, Serialize};

use super::address::AddressBlock;
use super::TableEntity;
use crate::types::Section;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OfficeType {
    #[default]
    Registered,
    Records,
    Liquidation,
}

/// A registered, records, or liquidation office. The office type is fixed
/// identity within a filing; only the address block is user-editable, so it
/// is the only compared section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Office {
    #[serde(rename = "type")]
    pub office_type: OfficeType,
    pub address: AddressBlock,
}

impl TableEntity for Office {
    const SECTIONS: &'static [Section] = &[Section::Address];

    fn section_eq(&self, other: &Self, section: Section) -> bool {
        match section {
            Section::Address => self.address == other.address,
            _ => true,
        }
    }

    fn is_empty(&self) -> bool {
        self.address.is_blank()
    }
}
