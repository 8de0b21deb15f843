//! Share-structure editing: a class table plus one series table per class.
//!
//! Classes carry a display `priority` that the structure keeps dense and
//! ordered: a class added this session goes to the top (priority 1) and
//! everything else shifts down; removing a session-added class closes the
//! gap. Priority bookkeeping is tag-neutral — it never marks a class edited.

use std::collections::HashMap;

use serde::Serialize;

use crate::entity::{ShareClass, ShareSeries, TableEntity};
use crate::error::TableError;

use super::change_table::{EntityChangeTable, RowSnapshot};

// ============================================================================
// Snapshot types
// ============================================================================

/// One class with its series, as shaped for the filing payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareStructureRow {
    #[serde(flatten)]
    pub class: RowSnapshot<ShareClass>,
    pub series: Vec<RowSnapshot<ShareSeries>>,
}

/// Full share structure, classes ordered by priority.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareStructureSnapshot {
    pub classes: Vec<ShareStructureRow>,
}

// ============================================================================
// ShareStructureTable
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ShareStructureTable {
    classes: EntityChangeTable<ShareClass>,
    /// Series change table per owning class id.
    series: HashMap<String, EntityChangeTable<ShareSeries>>,
}

impl ShareStructureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the existing share structure from reference data.
    pub fn seed(&mut self, classes: impl IntoIterator<Item = (ShareClass, Vec<ShareSeries>)>) {
        let mut class_list = Vec::new();
        self.series.clear();
        for (class, series) in classes {
            let mut table = EntityChangeTable::new();
            table.seed(series);
            self.series.insert(class.id.clone(), table);
            class_list.push(class);
        }
        self.classes.seed(class_list);
    }

    pub fn classes(&self) -> &EntityChangeTable<ShareClass> {
        &self.classes
    }

    pub fn series(&self, class_id: &str) -> Option<&EntityChangeTable<ShareSeries>> {
        self.series.get(class_id)
    }

    // -----------------------------------------------------------------------
    // Class operations
    // -----------------------------------------------------------------------

    /// Add a class created this session. It takes priority 1; every other
    /// class shifts down one.
    pub fn add_class(&mut self, mut class: ShareClass) {
        if class.is_empty() {
            return;
        }
        for i in 0..self.classes.len() {
            // renumbering only, tags stay as they are
            let _ = self.classes.with_current_mut(i, |c| c.priority += 1);
        }
        class.priority = 1;
        self.series
            .insert(class.id.clone(), EntityChangeTable::new());
        self.classes.add_new(class);
    }

    /// Remove the class at `index`. A session-added class is spliced out and
    /// higher-priority classes close the gap; an existing class is tagged
    /// removed and keeps its slot.
    pub fn remove_class(&mut self, index: usize) -> Result<(), TableError> {
        let row = self
            .classes
            .row(index)
            .ok_or(TableError::IndexOutOfRange {
                index,
                len: self.classes.len(),
            })?;
        let removed_priority = row.current().priority;
        let removed_id = row.current().id.clone();
        let was_new = row.is_new();

        self.classes.remove(index)?;

        if was_new {
            self.series.remove(&removed_id);
            for i in 0..self.classes.len() {
                let _ = self.classes.with_current_mut(i, |c| {
                    if c.priority > removed_priority {
                        c.priority -= 1;
                    }
                });
            }
        }
        Ok(())
    }

    /// Restore the class definition to its pre-edit snapshot, keeping the
    /// priority it currently holds so the list order is undisturbed.
    pub fn undo_class(&mut self, index: usize) -> Result<(), TableError> {
        let current_priority = match self.classes.row(index) {
            Some(row) => row.current().priority,
            None => {
                return Err(TableError::IndexOutOfRange {
                    index,
                    len: self.classes.len(),
                })
            }
        };
        self.classes.undo(index)?;
        self.classes
            .with_current_mut(index, |c| c.priority = current_priority)
    }

    /// Apply an edited definition. Priority is preserved from the row being
    /// edited — reordering is a separate concern.
    pub fn update_class(&mut self, index: usize, mut class: ShareClass) -> Result<(), TableError> {
        let current_priority = match self.classes.row(index) {
            Some(row) => row.current().priority,
            None => {
                return Err(TableError::IndexOutOfRange {
                    index,
                    len: self.classes.len(),
                })
            }
        };
        class.priority = current_priority;
        self.classes.apply_edit(index, class)
    }

    // -----------------------------------------------------------------------
    // Series operations
    // -----------------------------------------------------------------------

    pub fn add_series(&mut self, class_id: &str, series: ShareSeries) -> Result<(), TableError> {
        self.series_table_mut(class_id)?.add_new(series);
        Ok(())
    }

    pub fn update_series(
        &mut self,
        class_id: &str,
        index: usize,
        series: ShareSeries,
    ) -> Result<(), TableError> {
        self.series_table_mut(class_id)?.apply_edit(index, series)
    }

    pub fn undo_series(&mut self, class_id: &str, index: usize) -> Result<(), TableError> {
        self.series_table_mut(class_id)?.undo(index)
    }

    pub fn remove_series(&mut self, class_id: &str, index: usize) -> Result<(), TableError> {
        self.series_table_mut(class_id)?.remove(index)
    }

    // -----------------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------------

    /// Deep copy of the whole structure, classes ordered by priority.
    pub fn snapshot(&self) -> ShareStructureSnapshot {
        let mut classes: Vec<ShareStructureRow> = self
            .classes
            .snapshot_all()
            .into_iter()
            .map(|class| {
                let series = self
                    .series
                    .get(&class.entity.id)
                    .map(|t| t.snapshot_all())
                    .unwrap_or_default();
                ShareStructureRow { class, series }
            })
            .collect();
        classes.sort_by_key(|row| row.class.entity.priority);
        ShareStructureSnapshot { classes }
    }

    fn series_table_mut(
        &mut self,
        class_id: &str,
    ) -> Result<&mut EntityChangeTable<ShareSeries>, TableError> {
        self.series
            .get_mut(class_id)
            .ok_or_else(|| TableError::UnknownShareClass(class_id.to_string()))
    }
}
