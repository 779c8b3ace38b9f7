//! In-memory filtering and sorting over a loaded row set
//!
//! Nothing here touches the database. A [`TableView`] keeps the last-loaded
//! [`RowSet`] untouched and derives projections from it on demand.

use crate::schema::{Row, RowSet, SortOrder};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Keep rows whose rendered value in `column` is one of `allowed`
///
/// Matching is exact and case-sensitive. An empty `allowed` set keeps nothing.
pub fn filter(rows: &[Row], column: &str, allowed: &BTreeSet<String>) -> Vec<Row> {
    rows.iter()
        .filter(|row| allowed.contains(&row.value_or_null(column).render()))
        .cloned()
        .collect()
}

/// Stable sort on one column's native order
///
/// Ties keep their original relative order in both directions.
pub fn sort(rows: &[Row], column: &str, order: SortOrder) -> Vec<Row> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|left, right| {
        let ordering = left
            .value_or_null(column)
            .compare(right.value_or_null(column));
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    sorted
}

/// Distinct rendered values of a column, ascending
pub fn distinct_values(rows: &[Row], column: &str) -> Vec<String> {
    rows.iter()
        .map(|row| row.value_or_null(column).render())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Narrow filter candidates by case-insensitive substring
pub fn search_values(candidates: &[String], search: &str) -> Vec<String> {
    let needle = search.to_lowercase();
    candidates
        .iter()
        .filter(|candidate| candidate.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub column: String,
    pub order: SortOrder,
}

/// Active filters and sort of a view
///
/// Filters on different columns combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    #[serde(default)]
    pub filters: BTreeMap<String, BTreeSet<String>>,

    #[serde(default)]
    pub sort: Option<SortSpec>,
}

impl ViewState {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.sort.is_none()
    }
}

/// A loaded row set plus the projection currently applied to it
#[derive(Debug, Clone)]
pub struct TableView {
    loaded: RowSet,
    state: ViewState,
}

impl TableView {
    pub fn new(loaded: RowSet) -> Self {
        Self {
            loaded,
            state: ViewState::default(),
        }
    }

    /// The rows as last loaded from the store
    pub fn loaded(&self) -> &RowSet {
        &self.loaded
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Replace the whole view state, validating its columns
    pub fn set_state(&mut self, state: ViewState) -> Result<()> {
        for column in state.filters.keys() {
            self.ensure_column(column)?;
        }
        if let Some(sort) = &state.sort {
            self.ensure_column(&sort.column)?;
        }
        self.state = state;
        Ok(())
    }

    /// Set the allowed values of one column, replacing any earlier filter on it
    pub fn apply_filter(&mut self, column: &str, allowed: BTreeSet<String>) -> Result<()> {
        self.ensure_column(column)?;
        self.state.filters.insert(column.to_string(), allowed);
        Ok(())
    }

    pub fn clear_filter(&mut self, column: &str) {
        self.state.filters.remove(column);
    }

    pub fn apply_sort(&mut self, column: &str, order: SortOrder) -> Result<()> {
        self.ensure_column(column)?;
        self.state.sort = Some(SortSpec {
            column: column.to_string(),
            order,
        });
        Ok(())
    }

    /// Drop all filters and the sort, returning the rows as loaded
    pub fn reset(&mut self) -> &RowSet {
        self.state = ViewState::default();
        &self.loaded
    }

    /// Rows after applying the current filters, then the current sort
    pub fn project(&self) -> RowSet {
        let mut rows = self.loaded.rows.clone();

        for (column, allowed) in &self.state.filters {
            rows = filter(&rows, column, allowed);
        }
        if let Some(spec) = &self.state.sort {
            rows = sort(&rows, &spec.column, spec.order);
        }

        RowSet {
            table: self.loaded.table.clone(),
            columns: self.loaded.columns.clone(),
            rows,
        }
    }

    /// Filter candidates for a column, computed over all loaded rows
    pub fn distinct_values(&self, column: &str, search: Option<&str>) -> Result<Vec<String>> {
        self.ensure_column(column)?;
        let candidates = distinct_values(&self.loaded.rows, column);
        Ok(match search {
            Some(search) if !search.is_empty() => search_values(&candidates, search),
            _ => candidates,
        })
    }

    fn ensure_column(&self, column: &str) -> Result<()> {
        if self.loaded.columns.iter().any(|name| name == column) {
            Ok(())
        } else {
            Err(Error::UnknownColumn {
                table: self.loaded.table.clone(),
                column: column.to_string(),
            })
        }
    }
}
