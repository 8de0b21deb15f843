//! Typed entity categories tracked by filing change tables.
//!
//! Each category declares a fixed list of comparable sections; the table's
//! diff walks that list and nothing else, so the tag computation is identical
//! across categories.

pub mod address;
pub mod office;
pub mod party;
pub mod share;

pub use address::{Address, AddressBlock};
pub use office::{Office, OfficeType};
pub use party::{Party, PartyName, PartyRole, PartyType, RoleClass, RoleType};
pub use share::{ShareClass, ShareSeries};

use serde::Serialize;

use crate::types::Section;

/// An entity that can live in an `EntityChangeTable`.
///
/// `section_eq` must be a pure deep comparison of the named section; the
/// table relies on it being order-independent and side-effect free.
pub trait TableEntity: Clone + PartialEq + Serialize {
    /// The fixed, ordered list of sections compared when computing tags.
    const SECTIONS: &'static [Section];

    /// Deep equality for one section. Sections not in `SECTIONS` are never
    /// passed in.
    fn section_eq(&self, other: &Self, section: Section) -> bool;

    /// Structural emptiness — the guard that turns `add_new`/`apply_edit`
    /// into silent no-ops. Not field validation; that is a collaborator's
    /// job upstream.
    fn is_empty(&self) -> bool;
}
