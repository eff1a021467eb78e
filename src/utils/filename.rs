use crate::error::ProcessingError;
use crate::models::WindowedSubset;
use crate::utils::constants::{DOCUMENT_EXTENSION, IMAGE_EXTENSION};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the interactive document file is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentNaming {
    /// `{station}.html`
    #[default]
    Plain,
    /// `{station}_{MM-YYYY}.html`
    MonthYear,
}

impl FromStr for DocumentNaming {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(DocumentNaming::Plain),
            "month-year" | "month_year" | "monthyear" => Ok(DocumentNaming::MonthYear),
            _ => Err(ProcessingError::Config(format!(
                "Unsupported document naming: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for DocumentNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentNaming::Plain => write!(f, "plain"),
            DocumentNaming::MonthYear => write!(f, "month-year"),
        }
    }
}

/// Display label for a raw station key: underscores become spaces.
pub fn station_label(raw: &str) -> String {
    raw.replace('_', " ")
}

/// Strip characters that cannot appear in a file name on common platforms.
fn sanitize_file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Generate the interactive document file name for a station window
pub fn document_file_name(subset: &WindowedSubset, naming: DocumentNaming) -> String {
    let stem = sanitize_file_stem(&subset.label);
    match naming {
        DocumentNaming::Plain => format!("{}.{}", stem, DOCUMENT_EXTENSION),
        DocumentNaming::MonthYear => format!(
            "{}_{}.{}",
            stem,
            subset.month_year_tag(),
            DOCUMENT_EXTENSION
        ),
    }
}

/// Generate the static image file name for a station window
pub fn image_file_name(subset: &WindowedSubset) -> String {
    format!("{}.{}", sanitize_file_stem(&subset.label), IMAGE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn subset(label: &str) -> WindowedSubset {
        WindowedSubset {
            key: label.replace(' ', "_"),
            label: label.to_string(),
            start: NaiveDate::from_ymd_opt(2023, 12, 2).unwrap(),
            latest: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            observations: Vec::new(),
        }
    }

    #[test]
    fn test_station_label() {
        assert_eq!(station_label("Station_A"), "Station A");
        assert_eq!(station_label("San_Jose_Pinula_"), "San Jose Pinula ");
        assert_eq!(station_label("Plain"), "Plain");
    }

    #[test]
    fn test_document_file_name() {
        let s = subset("Station A");
        assert_eq!(document_file_name(&s, DocumentNaming::Plain), "Station A.html");
        assert_eq!(
            document_file_name(&s, DocumentNaming::MonthYear),
            "Station A_01-2024.html"
        );
        assert_eq!(image_file_name(&s), "Station A.png");
    }

    #[test]
    fn test_path_separators_are_replaced() {
        let s = subset("Finca 1/2");
        assert_eq!(image_file_name(&s), "Finca 1-2.png");
    }

    #[test]
    fn test_naming_parsing() {
        assert_eq!(
            "month-year".parse::<DocumentNaming>().unwrap(),
            DocumentNaming::MonthYear
        );
        assert_eq!("PLAIN".parse::<DocumentNaming>().unwrap(), DocumentNaming::Plain);
        assert!("weekly".parse::<DocumentNaming>().is_err());
    }
}
