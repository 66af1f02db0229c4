use anyhow::{anyhow, bail, Result};
use std::str::FromStr;

use crate::model::Dataset;
use crate::query::SortSpec;

/// A user interaction that changes the view.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    SwitchDataset(Dataset),
    Search(String),
    Sort(SortSpec),
    Select(String),
    ClearSelection,
}

impl FromStr for Event {
    type Err = anyhow::Error;

    /// Parses the line commands of the interactive dashboard:
    /// `tab <dataset>`, `search [text]`, `sort <column-dir>`, `select <key>`, `clear`.
    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_start();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line.trim_end(), ""),
        };
        match cmd.to_lowercase().as_str() {
            "tab" | "dataset" => Ok(Event::SwitchDataset(rest.parse()?)),
            "search" | "find" => Ok(Event::Search(rest.to_string())),
            "sort" => {
                if rest.is_empty() {
                    bail!("sort needs a column, e.g. `sort total_records-desc`");
                }
                Ok(Event::Sort(rest.parse()?))
            }
            "select" => {
                if rest.is_empty() {
                    bail!("select needs an entity key");
                }
                Ok(Event::Select(rest.to_string()))
            }
            "clear" => Ok(Event::ClearSelection),
            other => Err(anyhow!("unknown command '{}'", other)),
        }
    }
}
