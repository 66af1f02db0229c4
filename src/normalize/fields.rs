// src/normalize/fields.rs

use crate::model::Dataset;

pub const GBIF_PUBLISHER_PAGE: &str = "https://www.gbif.org/publisher/";

/// Column aliases for the identity fields of one source schema.
/// Aliases are tried in order; the first non-empty value wins.
#[derive(Debug)]
pub struct SchemaFields {
    pub key: &'static [&'static str],
    pub name: &'static [&'static str],
    pub url: &'static [&'static str],
    /// Prefix of a canonical page URL synthesized from the key when no URL column is set.
    pub canonical_url_prefix: Option<&'static str>,
}

pub static PUBLISHER_FIELDS: SchemaFields = SchemaFields {
    key: &["publishingorgkey", "publishingOrgKey"],
    name: &["publishername"],
    url: &["publisherurl"],
    canonical_url_prefix: None,
};

pub static HOSTING_FIELDS: SchemaFields = SchemaFields {
    key: &["hostingorganizationkey"],
    name: &["publisherName", "publishername"],
    url: &["publisherUrl"],
    canonical_url_prefix: Some(GBIF_PUBLISHER_PAGE),
};

pub fn fields_for(dataset: Dataset) -> &'static SchemaFields {
    match dataset {
        Dataset::Publisher => &PUBLISHER_FIELDS,
        Dataset::Hosting => &HOSTING_FIELDS,
    }
}

/// Canonical GBIF page for an organization key.
pub fn publisher_page(key: &str) -> String {
    format!("{}{}", GBIF_PUBLISHER_PAGE, key)
}
