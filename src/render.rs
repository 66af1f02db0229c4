// src/render.rs

//! Text rendering of a [`View`]: the entity list, the detail strip of the
//! selected entity and its breakdown chart, either as tables on stdout or as
//! a serializable model.

use prettytable::{format, Cell, Row, Table};
use serde::Serialize;

use crate::breakdown::{Breakdown, Bucket};
use crate::model::{Dataset, EntityMetric};
use crate::view::{View, ViewState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub key: String,
    pub title: String,
    /// `"35.00% valid"`
    pub valid_pct: String,
    /// `"350 / 1000"`
    pub counts: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaStrip {
    pub name: String,
    pub url: Option<String>,
    pub total: String,
    pub with_recordedbyid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub bucket: Bucket,
    pub label: &'static str,
    pub color: &'static str,
    pub value: f64,
    /// Percentage of the chart total.
    pub share: f64,
    /// `"ORCID: 1,234 (12.34%)"`
    pub hover: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedView {
    pub dataset: Dataset,
    pub search: String,
    pub sort: String,
    pub items: Vec<ListItem>,
    pub meta: Option<MetaStrip>,
    pub chart: Vec<ChartSlice>,
}

/// Format a count with `,` thousands separators (`1234567` → `1,234,567`).
/// Fractional values keep up to two decimals.
pub fn format_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = (value.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if cents > 0 {
        if cents % 10 == 0 {
            out.push_str(&format!(".{}", cents / 10));
        } else {
            out.push_str(&format!(".{:02}", cents));
        }
    }
    if negative && (whole > 0 || cents > 0) {
        out.insert(0, '-');
    }
    out
}

/// Plain rendering of a numeric cell: integral values without a fraction.
pub fn format_plain(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn title(row: &EntityMetric, position: usize) -> String {
    if !row.name.is_empty() {
        row.name.clone()
    } else if !row.key.is_empty() {
        row.key.clone()
    } else {
        format!("Item {}", position + 1)
    }
}

pub fn list_item(row: &EntityMetric, position: usize, active: bool) -> ListItem {
    ListItem {
        key: row.key.clone(),
        title: title(row, position),
        valid_pct: format!("{:.2}% valid", row.valid_recordedbyid.pct),
        counts: format!(
            "{} / {}",
            format_plain(row.valid_recordedbyid.count),
            format_plain(row.total_records)
        ),
        active,
    }
}

pub fn meta_strip(row: &EntityMetric) -> MetaStrip {
    MetaStrip {
        name: row.name.clone(),
        url: (!row.url.is_empty()).then(|| row.url.clone()),
        total: format!("Total: {}", format_thousands(row.total_records)),
        with_recordedbyid: format!(
            "With recordedById: {} ({:.2}%)",
            format_thousands(row.with_recordedbyid.count),
            row.with_recordedbyid.pct
        ),
    }
}

pub fn chart(breakdown: &Breakdown) -> Vec<ChartSlice> {
    breakdown
        .slices()
        .iter()
        .map(|(bucket, value)| {
            let share = breakdown.share(*bucket);
            ChartSlice {
                bucket: *bucket,
                label: bucket.label(),
                color: bucket.color(),
                value: *value,
                share,
                hover: format!("{}: {} ({:.2}%)", bucket.label(), format_thousands(*value), share),
            }
        })
        .collect()
}

pub fn render(state: &ViewState, view: &View<'_>) -> RenderedView {
    let items = view
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| list_item(row, i, view.selected_index == Some(i)))
        .collect();
    RenderedView {
        dataset: view.dataset,
        search: state.search.clone(),
        sort: state.sort.to_string(),
        items,
        meta: view.selected.map(meta_strip),
        chart: view.breakdown().map(|b| chart(&b)).unwrap_or_default(),
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).style_spec("bFg")
}

/// Print the list (at most `limit` rows), the detail strip and the chart.
pub fn print_view(rendered: &RenderedView, limit: Option<usize>) {
    println!(
        "\n--- {} | search: {:?} | sort: {} ---",
        rendered.dataset, rendered.search, rendered.sort
    );

    let mut list = Table::new();
    list.set_format(*format::consts::FORMAT_BOX_CHARS);
    list.add_row(Row::new(vec![
        header_cell(""),
        header_cell("Name"),
        header_cell("Valid"),
        header_cell("Valid / Total"),
    ]));
    let shown = limit.unwrap_or(rendered.items.len());
    for item in rendered.items.iter().take(shown) {
        let marker = if item.active { "▶" } else { "" };
        let style = if item.active { "b" } else { "" };
        list.add_row(Row::new(vec![
            Cell::new(marker),
            Cell::new(&item.title).style_spec(style),
            Cell::new(&item.valid_pct).style_spec("r"),
            Cell::new(&item.counts).style_spec("r"),
        ]));
    }
    if rendered.items.is_empty() {
        println!("No matching entities.");
    } else {
        list.printstd();
        if rendered.items.len() > shown {
            println!("… {} more", rendered.items.len() - shown);
        }
    }

    let Some(meta) = &rendered.meta else {
        return;
    };
    let mut parts = vec![meta.name.clone()];
    if let Some(url) = &meta.url {
        parts.push(format!("GBIF page: {}", url));
    }
    parts.push(meta.total.clone());
    parts.push(meta.with_recordedbyid.clone());
    println!("\n{}", parts.join(" • "));

    let mut chart = Table::new();
    chart.set_format(*format::consts::FORMAT_BOX_CHARS);
    chart.add_row(Row::new(vec![
        header_cell("Identifier"),
        header_cell("Records"),
        header_cell("Share"),
    ]));
    for slice in &rendered.chart {
        chart.add_row(Row::new(vec![
            Cell::new(slice.label),
            Cell::new(&format_thousands(slice.value)).style_spec("r"),
            Cell::new(&format!("{:.2}%", slice.share)).style_spec("r"),
        ]));
    }
    chart.printstd();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Collections, MetricPair};
    use crate::view::{current_view, Event};

    fn entity() -> EntityMetric {
        EntityMetric {
            key: "X1".into(),
            name: "X1".into(),
            url: "https://www.gbif.org/publisher/X1".into(),
            total_records: 1000.0,
            with_recordedbyid: MetricPair::new(400.0, 40.0),
            valid_recordedbyid: MetricPair::new(350.0, 35.0),
            invalid_recordedbyid: MetricPair::new(50.0, 5.0),
            orcid: MetricPair::new(100.0, 10.0),
            google_scholar: MetricPair::new(50.0, 5.0),
            ..Default::default()
        }
    }

    #[test]
    fn list_item_labels() {
        let item = list_item(&entity(), 0, true);
        assert_eq!(item.title, "X1");
        assert_eq!(item.valid_pct, "35.00% valid");
        assert_eq!(item.counts, "350 / 1000");

        let unnamed = EntityMetric::default();
        assert_eq!(list_item(&unnamed, 4, false).title, "Item 5");
    }

    #[test]
    fn meta_strip_formats_counts() {
        let meta = meta_strip(&entity());
        assert_eq!(meta.total, "Total: 1,000");
        assert_eq!(meta.with_recordedbyid, "With recordedById: 400 (40.00%)");
        assert_eq!(meta.url.as_deref(), Some("https://www.gbif.org/publisher/X1"));
        assert_eq!(meta_strip(&EntityMetric::default()).url, None);
    }

    #[test]
    fn chart_hover_shows_share_of_chart_total() {
        let slices = chart(&Breakdown::derive(&entity()));
        assert_eq!(slices.len(), 8);
        assert_eq!(slices[0].hover, "ORCID: 100 (10.00%)");
        assert_eq!(slices[7].label, "None");
        assert_eq!(slices[7].value, 600.0);
        assert_eq!(slices[7].hover, "None: 600 (60.00%)");
    }

    #[test]
    fn render_marks_the_selected_row() {
        let data = Collections::new(vec![entity()], vec![]);
        let state = ViewState::default();
        let rendered = render(&state, &current_view(&state, &data));
        assert_eq!(rendered.items.len(), 1);
        assert!(rendered.items[0].active);
        assert!(rendered.meta.is_some());
        assert_eq!(rendered.sort, "pct_valid_recordedbyid-desc");

        let hosting = ViewState::default().apply(Event::SwitchDataset(Dataset::Hosting));
        let rendered = render(&hosting, &current_view(&hosting, &data));
        assert!(rendered.items.is_empty());
        assert!(rendered.meta.is_none());
        assert!(rendered.chart.is_empty());
    }

    #[test]
    fn thousands_formatting() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1234567.0), "1,234,567");
        assert_eq!(format_thousands(1234.5), "1,234.5");
    }

    #[test]
    fn plain_formatting() {
        assert_eq!(format_plain(350.0), "350");
        assert_eq!(format_plain(12.5), "12.5");
    }
}
