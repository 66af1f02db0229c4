// src/model/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two statistics files the dashboard is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Publisher,
    Hosting,
}

impl Dataset {
    pub const ALL: [Dataset; 2] = [Dataset::Publisher, Dataset::Hosting];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Publisher => "publisher",
            Dataset::Hosting => "hosting",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "publisher" | "publishers" => Ok(Dataset::Publisher),
            "hosting" | "hostingorg" | "hosting-organization" => Ok(Dataset::Hosting),
            other => Err(anyhow::anyhow!("unknown dataset '{}'", other)),
        }
    }
}

/// One (count, percentage) column pair of the statistics files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    WithRecordedById,
    ValidRecordedById,
    InvalidRecordedById,
    Orcid,
    GoogleScholar,
    ResearcherId,
    Wikidata,
    Linkedin,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::WithRecordedById,
        Metric::ValidRecordedById,
        Metric::InvalidRecordedById,
        Metric::Orcid,
        Metric::GoogleScholar,
        Metric::ResearcherId,
        Metric::Wikidata,
        Metric::Linkedin,
    ];

    /// The identifier-type families a valid recordedById can belong to.
    pub const FAMILIES: [Metric; 5] = [
        Metric::Orcid,
        Metric::GoogleScholar,
        Metric::ResearcherId,
        Metric::Wikidata,
        Metric::Linkedin,
    ];

    pub fn count_column(&self) -> &'static str {
        match self {
            Metric::WithRecordedById => "records_with_recordedbyid",
            Metric::ValidRecordedById => "records_with_valid_recordedbyid",
            Metric::InvalidRecordedById => "records_with_invalid_recordedbyid",
            Metric::Orcid => "records_with_orcid",
            Metric::GoogleScholar => "records_with_google_scholar",
            Metric::ResearcherId => "records_with_researcherid",
            Metric::Wikidata => "records_with_wikidata",
            Metric::Linkedin => "records_with_linkedin",
        }
    }

    pub fn pct_column(&self) -> &'static str {
        match self {
            Metric::WithRecordedById => "pct_with_recordedbyid",
            Metric::ValidRecordedById => "pct_valid_recordedbyid",
            Metric::InvalidRecordedById => "pct_invalid_recordedbyid",
            Metric::Orcid => "pct_with_orcid",
            Metric::GoogleScholar => "pct_with_google_scholar",
            Metric::ResearcherId => "pct_with_researcherid",
            Metric::Wikidata => "pct_with_wikidata",
            Metric::Linkedin => "pct_with_linkedin",
        }
    }
}

pub const TOTAL_RECORDS: &str = "total_records";

/// A count with the percentage of `total_records` it represents, as published.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricPair {
    pub count: f64,
    pub pct: f64,
}

impl MetricPair {
    pub fn new(count: f64, pct: f64) -> Self {
        Self { count, pct }
    }
}

/// A publisher or hosting organization with its recordedById statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetric {
    pub key: String,
    pub name: String,
    pub url: String,
    pub total_records: f64,
    pub with_recordedbyid: MetricPair,
    pub valid_recordedbyid: MetricPair,
    pub invalid_recordedbyid: MetricPair,
    pub orcid: MetricPair,
    pub google_scholar: MetricPair,
    pub researcherid: MetricPair,
    pub wikidata: MetricPair,
    pub linkedin: MetricPair,
}

impl EntityMetric {
    pub fn pair(&self, metric: Metric) -> MetricPair {
        match metric {
            Metric::WithRecordedById => self.with_recordedbyid,
            Metric::ValidRecordedById => self.valid_recordedbyid,
            Metric::InvalidRecordedById => self.invalid_recordedbyid,
            Metric::Orcid => self.orcid,
            Metric::GoogleScholar => self.google_scholar,
            Metric::ResearcherId => self.researcherid,
            Metric::Wikidata => self.wikidata,
            Metric::Linkedin => self.linkedin,
        }
    }

    pub fn pair_mut(&mut self, metric: Metric) -> &mut MetricPair {
        match metric {
            Metric::WithRecordedById => &mut self.with_recordedbyid,
            Metric::ValidRecordedById => &mut self.valid_recordedbyid,
            Metric::InvalidRecordedById => &mut self.invalid_recordedbyid,
            Metric::Orcid => &mut self.orcid,
            Metric::GoogleScholar => &mut self.google_scholar,
            Metric::ResearcherId => &mut self.researcherid,
            Metric::Wikidata => &mut self.wikidata,
            Metric::Linkedin => &mut self.linkedin,
        }
    }

    /// Look up a numeric field by its source column name.
    /// Returns `None` for columns that are not numeric fields of the record.
    pub fn numeric_field(&self, column: &str) -> Option<f64> {
        if column == TOTAL_RECORDS {
            return Some(self.total_records);
        }
        Metric::ALL.iter().find_map(|m| {
            if m.count_column() == column {
                Some(self.pair(*m).count)
            } else if m.pct_column() == column {
                Some(self.pair(*m).pct)
            } else {
                None
            }
        })
    }
}

/// Both loaded datasets. Immutable once built.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Collections {
    publisher: Vec<EntityMetric>,
    hosting: Vec<EntityMetric>,
}

impl Collections {
    pub fn new(publisher: Vec<EntityMetric>, hosting: Vec<EntityMetric>) -> Self {
        Self { publisher, hosting }
    }

    pub fn rows(&self, dataset: Dataset) -> &[EntityMetric] {
        match dataset {
            Dataset::Publisher => &self.publisher,
            Dataset::Hosting => &self.hosting,
        }
    }

    pub fn find(&self, dataset: Dataset, key: &str) -> Option<&EntityMetric> {
        self.rows(dataset).iter().find(|r| r.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_field_resolves_count_and_pct_columns() {
        let mut m = EntityMetric {
            key: "k".into(),
            total_records: 10.0,
            ..Default::default()
        };
        m.pair_mut(Metric::Wikidata).count = 3.0;
        m.pair_mut(Metric::Wikidata).pct = 30.0;

        assert_eq!(m.numeric_field("total_records"), Some(10.0));
        assert_eq!(m.numeric_field("records_with_wikidata"), Some(3.0));
        assert_eq!(m.numeric_field("pct_with_wikidata"), Some(30.0));
        assert_eq!(m.numeric_field("publishername"), None);
    }

    #[test]
    fn dataset_parses_tab_names() {
        assert_eq!("publisher".parse::<Dataset>().unwrap(), Dataset::Publisher);
        assert_eq!(" Hosting ".parse::<Dataset>().unwrap(), Dataset::Hosting);
        assert!("nodes".parse::<Dataset>().is_err());
    }
}
