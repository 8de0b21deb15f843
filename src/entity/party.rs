use serde::{Deserialize, Serialize};

use super::address::AddressBlock;
use super::TableEntity;
use crate::types::Section;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyType {
    #[default]
    Person,
    Organization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleType {
    Ceo,
    Cfo,
    President,
    Director,
    Officer,
    Receiver,
    Liquidator,
    Partner,
    Proprietor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleClass {
    Director,
    Officer,
    Agent,
}

/// Name block for a person or organization party. Person fields and
/// `business_name` are mutually exclusive in practice but both live here;
/// the form layer enforces which applies for the `party_type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyName {
    pub party_type: PartyType,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub business_name: String,
}

impl PartyName {
    pub fn is_blank(&self) -> bool {
        self.first_name.is_empty()
            && self.middle_name.is_empty()
            && self.last_name.is_empty()
            && self.business_name.is_empty()
    }
}

/// One role a party holds on the business, with its appointment window.
/// Dates are ISO 8601 strings as delivered by the registry API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRole {
    pub role_type: RoleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_class: Option<RoleClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cessation_date: Option<String>,
}

impl PartyRole {
    pub fn new(role_type: RoleType) -> Self {
        Self {
            role_type,
            role_class: None,
            appointment_date: None,
            cessation_date: None,
        }
    }
}

/// A director, officer, receiver, or other person/organization related to
/// the business.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: String,
    pub name: PartyName,
    pub address: AddressBlock,
    pub roles: Vec<PartyRole>,
}

impl TableEntity for Party {
    const SECTIONS: &'static [Section] = &[Section::Name, Section::Address, Section::Roles];

    fn section_eq(&self, other: &Self, section: Section) -> bool {
        match section {
            Section::Name => self.name == other.name,
            Section::Address => self.address == other.address,
            Section::Roles => self.roles == other.roles,
            _ => true,
        }
    }

    fn is_empty(&self) -> bool {
        self.name.is_blank() && self.address.is_blank() && self.roles.is_empty()
    }
}
