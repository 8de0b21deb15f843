use serde::Serialize;

use crate::entity::TableEntity;
use crate::error::TableError;
use crate::types::{apply_precedence, empty_tags, tags_from, ChangeTag, TagSet};

// ============================================================================
// ChangeRow
// ============================================================================

/// One tracked entity: the value as the user currently has it, the value as
/// it was before any edits (absent for rows created this session), and the
/// derived change tags.
///
/// `Removed` never deletes data — the row keeps its last-known `current` so
/// undo can restore it and review screens can still render it.
#[derive(Debug, Clone)]
pub struct ChangeRow<T> {
    current: T,
    previous: Option<T>,
    tags: TagSet,
}

impl<T> ChangeRow<T> {
    pub fn current(&self) -> &T {
        &self.current
    }

    /// The pre-edit snapshot, or `None` for a row added this session.
    pub fn previous(&self) -> Option<&T> {
        self.previous.as_ref()
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// True for rows created by the user in this session.
    pub fn is_new(&self) -> bool {
        self.previous.is_none()
    }

    pub fn is_removed(&self) -> bool {
        self.tags.contains(&ChangeTag::Removed)
    }
}

/// An owned, independent copy of a row's current value and tags, used to
/// build the outbound filing payload. Serializes with the entity flattened
/// and the tags under `actions`, the registry payload row shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSnapshot<T> {
    #[serde(flatten)]
    pub entity: T,
    pub actions: TagSet,
}

// ============================================================================
// EntityChangeTable
// ============================================================================

/// Ordered sequence of [`ChangeRow`]s for one entity category within a single
/// filing session.
///
/// Domain-level oddities (empty entity, undo with no history) degrade to
/// silent no-ops; only an out-of-range row index is an error, and that is a
/// programming defect rather than a user-facing condition. Single-writer:
/// one interactive user edits one form.
#[derive(Debug, Clone)]
pub struct EntityChangeTable<T: TableEntity> {
    rows: Vec<ChangeRow<T>>,
}

impl<T: TableEntity> Default for EntityChangeTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TableEntity> EntityChangeTable<T> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Load reference data: one row per entity, `previous == current`, no
    /// tags. Replaces any existing contents.
    pub fn seed(&mut self, entities: impl IntoIterator<Item = T>) {
        self.rows = entities
            .into_iter()
            .map(|e| ChangeRow {
                previous: Some(e.clone()),
                current: e,
                tags: empty_tags(),
            })
            .collect();
    }

    /// Append a row created by the user this session. Empty entities are
    /// ignored — a guard against accidental blank submits, not an error.
    pub fn add_new(&mut self, entity: T) {
        if entity.is_empty() {
            return;
        }
        self.rows.push(ChangeRow {
            current: entity,
            previous: None,
            tags: tags_from([ChangeTag::Added]),
        });
    }

    /// Remove the row at `index`. A row added this session is spliced out;
    /// an existing row keeps its data and is tagged exactly `{Removed}`.
    pub fn remove(&mut self, index: usize) -> Result<(), TableError> {
        self.check_index(index)?;
        if self.rows[index].previous.is_none() {
            self.rows.remove(index);
        } else {
            self.rows[index].tags = tags_from([ChangeTag::Removed]);
        }
        Ok(())
    }

    /// Restore the row at `index` to its pre-edit snapshot and clear its
    /// tags. A row with no snapshot has nothing to undo — no-op.
    pub fn undo(&mut self, index: usize) -> Result<(), TableError> {
        self.check_index(index)?;
        let row = &mut self.rows[index];
        if let Some(previous) = &row.previous {
            row.current = previous.clone();
            row.tags = empty_tags();
        }
        Ok(())
    }

    /// Replace the row's current value and recompute its tags from scratch
    /// against the pre-edit snapshot. Tags are replaced, never merged, so
    /// the result is the same however many edits came before.
    pub fn apply_edit(&mut self, index: usize, entity: T) -> Result<(), TableError> {
        self.check_index(index)?;
        if entity.is_empty() {
            return Ok(());
        }
        let row = &mut self.rows[index];
        row.tags = compute_tags(row.previous.as_ref(), &entity);
        row.current = entity;
        Ok(())
    }

    /// Deep, independent copies of every current value with its tags.
    /// Mutating the returned rows never affects table state.
    pub fn snapshot_all(&self) -> Vec<RowSnapshot<T>> {
        self.rows
            .iter()
            .map(|row| RowSnapshot {
                entity: row.current.clone(),
                actions: row.tags.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&ChangeRow<T>> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> impl Iterator<Item = &ChangeRow<T>> {
        self.rows.iter()
    }

    /// Mutate a row's current value without touching its tags. Reserved for
    /// tag-neutral bookkeeping (share-class priority renumbering); anything
    /// user-visible must go through `apply_edit`.
    pub(crate) fn with_current_mut(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut T),
    ) -> Result<(), TableError> {
        self.check_index(index)?;
        f(&mut self.rows[index].current);
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), TableError> {
        if index >= self.rows.len() {
            return Err(TableError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tag computation
// ============================================================================

/// Compute the tag set for a row whose current value is being set to `next`.
///
/// No prior state forces `{Added}`. Otherwise every section in the entity
/// category's fixed list is deep-compared and the section's mapped tag is
/// collected for each difference; the raw set is then collapsed by the
/// Added/Removed precedence rule. Pure and order-independent.
pub fn compute_tags<T: TableEntity>(previous: Option<&T>, next: &T) -> TagSet {
    let previous = match previous {
        Some(p) => p,
        None => return tags_from([ChangeTag::Added]),
    };
    apply_precedence(&raw_section_tags(previous, next))
}

/// The section-wise diff without the precedence filter, kept separate so the
/// diff itself stays identical across add/edit/remove paths and testable on
/// its own.
pub fn raw_section_tags<T: TableEntity>(previous: &T, next: &T) -> TagSet {
    let mut tags = empty_tags();
    for &section in T::SECTIONS {
        if !previous.section_eq(next, section) {
            if let Some(tag) = section.tag() {
                tags.insert(tag);
            }
        }
    }
    tags
}
