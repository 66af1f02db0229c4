// src/query.rs

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::model::{EntityMetric, Metric, TOTAL_RECORDS};

pub const DEFAULT_SORT: &str = "pct_valid_recordedbyid-desc";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort column plus direction, written `"<column>-<asc|desc>"` by the sort selector.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(Metric::ValidRecordedById.pct_column(), SortDirection::Desc)
    }
}

impl FromStr for SortSpec {
    type Err = std::convert::Infallible;

    /// Anything after the last `-` other than `asc` means descending, and a
    /// missing direction means descending too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (key, dir) = match s.rsplit_once('-') {
            Some((key, dir)) => (key, dir),
            None => (s, "desc"),
        };
        let direction = if dir.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        };
        Ok(Self::new(key, direction))
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}-{}", self.key, dir)
    }
}

/// Case-insensitive substring match on the display name.
pub fn matches_search(name: &str, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    if name.is_empty() {
        return false;
    }
    name.to_lowercase().contains(&search.to_lowercase())
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Total order used by the list: the chosen column in the chosen direction,
/// then valid count descending, then total records descending. The two
/// tie-breaks ignore the direction.
pub fn compare(a: &EntityMetric, b: &EntityMetric, sort: &SortSpec) -> Ordering {
    let av = a.numeric_field(&sort.key).unwrap_or(0.0);
    let bv = b.numeric_field(&sort.key).unwrap_or(0.0);
    let primary = match sort.direction {
        SortDirection::Asc => cmp_f64(av, bv),
        SortDirection::Desc => cmp_f64(bv, av),
    };
    primary
        .then_with(|| cmp_f64(b.valid_recordedbyid.count, a.valid_recordedbyid.count))
        .then_with(|| {
            let at = a.numeric_field(TOTAL_RECORDS).unwrap_or(0.0);
            let bt = b.numeric_field(TOTAL_RECORDS).unwrap_or(0.0);
            cmp_f64(bt, at)
        })
}

/// Filter `rows` by `search` and order them by `sort`.
///
/// `rows` is left untouched; the result borrows from it.
pub fn query<'a>(rows: &'a [EntityMetric], search: &str, sort: &SortSpec) -> Vec<&'a EntityMetric> {
    let mut out: Vec<&EntityMetric> = rows
        .iter()
        .filter(|r| matches_search(&r.name, search))
        .collect();
    out.sort_by(|a, b| compare(a, b, sort));
    out
}
