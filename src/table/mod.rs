//! Old/new edit tracking for filing sessions.
//!
//! A table holds one row per entity of a single category; each row keeps the
//! pre-edit snapshot (when one exists) next to the current value and a
//! derived set of change tags. Filing stores seed a table from reference
//! data, let the user mutate it, and serialize `snapshot_all` into the
//! outbound payload.

pub mod badges;
pub mod change_table;
pub mod share_structure;

pub use badges::{badges, Badge};
pub use change_table::{ChangeRow, EntityChangeTable, RowSnapshot};
pub use share_structure::{ShareStructureSnapshot, ShareStructureTable};
