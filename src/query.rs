//! Query state, sorting, pagination, and the one-shot table pipeline.

use serde::{Deserialize, Serialize};

use crate::filter::{self, FilterSet};
use crate::join::CombinedRecord;
use crate::visibility::{is_hidden, VisibilityMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityMode {
    All,
    VisibleOnly,
    HiddenOnly,
}

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// One query cycle's worth of user intent. Mutated only through the methods
/// below; `page` is clamped against the filtered row count on every
/// recomputation, not at set time.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub filters: FilterSet,
    pub sort_key: Option<String>,
    pub sort_dir: SortDirection,
    pub visibility: VisibilityMode,
    pub page_size: usize,
    pub page: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            filters: FilterSet::new(),
            sort_key: None,
            sort_dir: SortDirection::Ascending,
            visibility: VisibilityMode::VisibleOnly,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl QueryState {
    pub fn set_filter(&mut self, field: &str, raw: impl Into<String>) {
        let raw = raw.into();
        if raw.trim().is_empty() {
            self.filters.remove(field);
        } else {
            self.filters.insert(field.to_string(), raw);
        }
    }

    /// Column-click semantics: a new key sorts ascending, the active key
    /// flips direction.
    pub fn sort_by(&mut self, key: &str) {
        if self.sort_key.as_deref() == Some(key) {
            self.sort_dir = match self.sort_dir {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            };
        } else {
            self.sort_key = Some(key.to_string());
            self.sort_dir = SortDirection::Ascending;
        }
    }

    pub fn set_visibility_mode(&mut self, mode: VisibilityMode) {
        self.visibility = mode;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }
}

/// Stable sort on the numeric view of `key`, absent values counting as 0.
/// A `None` key leaves the input order untouched.
pub fn sort_records(records: &mut [CombinedRecord], key: Option<&str>, dir: SortDirection) {
    let Some(key) = key else {
        return;
    };

    records.sort_by(|a, b| {
        let left = a.numeric_field(key).unwrap_or(0.0);
        let right = b.numeric_field(key).unwrap_or(0.0);
        let ordering = left.total_cmp(&right);
        match dir {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

pub fn total_pages(row_count: usize, page_size: usize) -> usize {
    row_count.div_ceil(page_size).max(1)
}

/// Slices one page out of the ordered set. Out-of-range pages yield an empty
/// slice rather than an error.
pub fn paginate(records: &[CombinedRecord], page_size: usize, page: usize) -> &[CombinedRecord] {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let end = page.saturating_mul(page_size);
    &records[start.min(records.len())..end.min(records.len())]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPage {
    pub rows: Vec<CombinedRecord>,
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
}

/// The full pipeline for one query cycle: visibility mode, field filters,
/// sort, clamp, page. Pure except for the page clamp written back to `state`.
pub fn run_query(
    records: &[CombinedRecord],
    visibility: &VisibilityMap,
    state: &mut QueryState,
) -> QueryPage {
    let mut kept: Vec<CombinedRecord> = records
        .iter()
        .filter(|record| match state.visibility {
            VisibilityMode::All => true,
            VisibilityMode::VisibleOnly => !is_hidden(visibility, record.id),
            VisibilityMode::HiddenOnly => is_hidden(visibility, record.id),
        })
        .filter(|record| filter::matches(record, &state.filters))
        .cloned()
        .collect();

    sort_records(&mut kept, state.sort_key.as_deref(), state.sort_dir);

    let total_pages = total_pages(kept.len(), state.page_size);
    state.page = state.page.clamp(1, total_pages);

    let rows = paginate(&kept, state.page_size, state.page).to_vec();
    QueryPage {
        rows,
        page: state.page,
        total_pages,
        total_rows: kept.len(),
    }
}
