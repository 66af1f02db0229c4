// src/view/mod.rs

//! Dashboard view state.
//!
//! [`ViewState`] is a plain value; [`reduce`] maps `(state, event)` to the next
//! state and [`current_view`] derives what the list and chart show. The default
//! selection (first row of the list) is derived, never stored, so repeated
//! calls with the same state and data give the same view.

pub mod event;

pub use event::Event;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::breakdown::Breakdown;
use crate::model::{Collections, Dataset, EntityMetric};
use crate::query::{query, SortSpec};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub dataset: Dataset,
    pub search: String,
    pub sort: SortSpec,
    pub selected_key: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            dataset: Dataset::Publisher,
            search: String::new(),
            sort: SortSpec::default(),
            selected_key: None,
        }
    }
}

impl ViewState {
    pub fn new(dataset: Dataset, sort: SortSpec) -> Self {
        Self {
            dataset,
            sort,
            ..Default::default()
        }
    }

    pub fn apply(self, event: Event) -> Self {
        reduce(self, event)
    }
}

/// Next state for `event`. Search and sort are global: they survive dataset
/// switches. Switching to the dataset already shown changes nothing.
pub fn reduce(state: ViewState, event: Event) -> ViewState {
    debug!(?event, "view event");
    match event {
        Event::SwitchDataset(dataset) if dataset == state.dataset => state,
        Event::SwitchDataset(dataset) => ViewState { dataset, ..state },
        Event::Search(search) => ViewState { search, ..state },
        Event::Sort(sort) => ViewState { sort, ..state },
        Event::Select(key) => ViewState {
            selected_key: Some(key),
            ..state
        },
        Event::ClearSelection => ViewState {
            selected_key: None,
            ..state
        },
    }
}

/// What the rendering boundary draws for one state.
#[derive(Debug, Serialize)]
pub struct View<'a> {
    pub dataset: Dataset,
    /// Filtered and sorted list.
    pub rows: Vec<&'a EntityMetric>,
    /// Entity shown in the chart and detail strip.
    pub selected: Option<&'a EntityMetric>,
    /// Position of `selected` in `rows`, if it is listed (highlighted).
    pub selected_index: Option<usize>,
}

impl<'a> View<'a> {
    pub fn breakdown(&self) -> Option<Breakdown> {
        self.selected.map(Breakdown::derive)
    }
}

/// Derive the view: `selected` is the explicitly selected key if it exists in
/// the active dataset, else the first listed row. An explicit selection hidden
/// by the search stays selected but is not highlighted.
pub fn current_view<'a>(state: &ViewState, data: &'a Collections) -> View<'a> {
    let rows = query(data.rows(state.dataset), &state.search, &state.sort);

    let selected = state
        .selected_key
        .as_deref()
        .and_then(|key| data.find(state.dataset, key))
        .or_else(|| rows.first().copied());

    let selected_index =
        selected.and_then(|sel| rows.iter().position(|r| r.key == sel.key));

    View {
        dataset: state.dataset,
        rows,
        selected,
        selected_index,
    }
}
