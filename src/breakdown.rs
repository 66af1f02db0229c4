// src/breakdown.rs

use serde::Serialize;

use crate::model::EntityMetric;

/// One slice of the identifier-type chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Orcid,
    GoogleScholar,
    ResearcherId,
    Wikidata,
    Linkedin,
    OtherValid,
    Invalid,
    None,
}

impl Bucket {
    pub const ALL: [Bucket; 8] = [
        Bucket::Orcid,
        Bucket::GoogleScholar,
        Bucket::ResearcherId,
        Bucket::Wikidata,
        Bucket::Linkedin,
        Bucket::OtherValid,
        Bucket::Invalid,
        Bucket::None,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Orcid => "ORCID",
            Bucket::GoogleScholar => "Google Scholar",
            Bucket::ResearcherId => "ResearcherID",
            Bucket::Wikidata => "Wikidata",
            Bucket::Linkedin => "LinkedIn",
            Bucket::OtherValid => "Other valid",
            Bucket::Invalid => "Invalid",
            Bucket::None => "None",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Bucket::Orcid => "#7ed3b2",
            Bucket::GoogleScholar => "#5b8cff",
            Bucket::ResearcherId => "#8e87ff",
            Bucket::Wikidata => "#f2a97f",
            Bucket::Linkedin => "#e67dd5",
            Bucket::OtherValid => "#4fd1c5",
            Bucket::Invalid => "#ff6b6b",
            Bucket::None => "#a8b3cf",
        }
    }
}

/// Identifier-type breakdown of one entity. Every bucket is `>= 0`.
///
/// The five family counts are treated as a possibly incomplete subdivision of
/// the valid bucket; when they overflow it, `other_valid` clamps to zero
/// instead of reconciling the overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Breakdown {
    pub orcid: f64,
    pub google_scholar: f64,
    pub researcher_id: f64,
    pub wikidata: f64,
    pub linkedin: f64,
    pub other_valid: f64,
    pub invalid: f64,
    pub none: f64,
}

fn non_negative(v: f64) -> f64 {
    v.max(0.0)
}

impl Breakdown {
    pub fn derive(m: &EntityMetric) -> Self {
        let orcid = non_negative(m.orcid.count);
        let google_scholar = non_negative(m.google_scholar.count);
        let researcher_id = non_negative(m.researcherid.count);
        let wikidata = non_negative(m.wikidata.count);
        let linkedin = non_negative(m.linkedin.count);

        let known = orcid + google_scholar + researcher_id + wikidata + linkedin;

        Self {
            orcid,
            google_scholar,
            researcher_id,
            wikidata,
            linkedin,
            other_valid: non_negative(m.valid_recordedbyid.count - known),
            invalid: non_negative(m.invalid_recordedbyid.count),
            none: non_negative(m.total_records - m.with_recordedbyid.count),
        }
    }

    pub fn get(&self, bucket: Bucket) -> f64 {
        match bucket {
            Bucket::Orcid => self.orcid,
            Bucket::GoogleScholar => self.google_scholar,
            Bucket::ResearcherId => self.researcher_id,
            Bucket::Wikidata => self.wikidata,
            Bucket::Linkedin => self.linkedin,
            Bucket::OtherValid => self.other_valid,
            Bucket::Invalid => self.invalid,
            Bucket::None => self.none,
        }
    }

    /// Buckets in chart order.
    pub fn slices(&self) -> [(Bucket, f64); 8] {
        Bucket::ALL.map(|b| (b, self.get(b)))
    }

    /// Sum of all buckets, the denominator for slice percentages.
    pub fn total(&self) -> f64 {
        Bucket::ALL.iter().map(|b| self.get(*b)).sum()
    }

    /// Share of the chart total held by `bucket`, in percent. Zero for an empty chart.
    pub fn share(&self, bucket: Bucket) -> f64 {
        let total = self.total();
        if total > 0.0 {
            self.get(bucket) / total * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetricPair;

    fn entity(total: f64, with_id: f64, valid: f64, invalid: f64, families: [f64; 5]) -> EntityMetric {
        EntityMetric {
            key: "k".into(),
            name: "k".into(),
            total_records: total,
            with_recordedbyid: MetricPair::new(with_id, 0.0),
            valid_recordedbyid: MetricPair::new(valid, 0.0),
            invalid_recordedbyid: MetricPair::new(invalid, 0.0),
            orcid: MetricPair::new(families[0], 0.0),
            google_scholar: MetricPair::new(families[1], 0.0),
            researcherid: MetricPair::new(families[2], 0.0),
            wikidata: MetricPair::new(families[3], 0.0),
            linkedin: MetricPair::new(families[4], 0.0),
            ..Default::default()
        }
    }

    #[test]
    fn derives_other_valid_and_none() {
        let b = Breakdown::derive(&entity(1000.0, 400.0, 350.0, 50.0, [100.0, 50.0, 0.0, 0.0, 0.0]));
        assert_eq!(
            b,
            Breakdown {
                orcid: 100.0,
                google_scholar: 50.0,
                researcher_id: 0.0,
                wikidata: 0.0,
                linkedin: 0.0,
                other_valid: 200.0,
                invalid: 50.0,
                none: 600.0,
            }
        );
        assert_eq!(b.total(), 1000.0);
    }

    #[test]
    fn overlapping_families_clamp_other_valid() {
        let b = Breakdown::derive(&entity(100.0, 80.0, 50.0, 30.0, [40.0, 30.0, 0.0, 10.0, 0.0]));
        assert_eq!(b.other_valid, 0.0);
        assert!(b.slices().iter().all(|(_, v)| *v >= 0.0));
    }

    #[test]
    fn with_id_above_total_clamps_none() {
        let b = Breakdown::derive(&entity(10.0, 25.0, 20.0, 5.0, [0.0; 5]));
        assert_eq!(b.none, 0.0);
        assert_eq!(b.other_valid, 20.0);
    }

    #[test]
    fn negative_inputs_never_leak() {
        let b = Breakdown::derive(&entity(-5.0, 0.0, -1.0, -3.0, [-2.0, 0.0, 0.0, 0.0, 0.0]));
        assert!(b.slices().iter().all(|(_, v)| *v >= 0.0));
    }

    #[test]
    fn share_of_empty_chart_is_zero() {
        let b = Breakdown::default();
        assert_eq!(b.share(Bucket::Orcid), 0.0);
    }
}
