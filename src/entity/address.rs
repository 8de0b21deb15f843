use serde::{Deserialize, Serialize};

/// A civic address in the registry API wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub street_additional: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub location_description: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            street: String::new(),
            street_additional: String::new(),
            city: String::new(),
            region: String::new(),
            postal_code: String::new(),
            country: "CA".to_string(),
            location_description: String::new(),
        }
    }
}

impl Address {
    /// True when every user-entered field is blank (country defaults to CA
    /// before the user touches the form, so it is not considered).
    pub fn is_blank(&self) -> bool {
        self.street.is_empty()
            && self.street_additional.is_empty()
            && self.city.is_empty()
            && self.region.is_empty()
            && self.postal_code.is_empty()
            && self.location_description.is_empty()
    }
}

/// The mailing/delivery address pair carried by parties and offices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBlock {
    pub mailing_address: Address,
    pub delivery_address: Address,
    /// UI convenience flag — mailing mirrors delivery. Part of the compared
    /// address section because toggling it is a user-visible change.
    pub same_as: bool,
}

impl AddressBlock {
    pub fn is_blank(&self) -> bool {
        self.mailing_address.is_blank() && self.delivery_address.is_blank()
    }
}
