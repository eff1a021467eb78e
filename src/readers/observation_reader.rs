use crate::error::{ProcessingError, Result};
use crate::models::Observation;
use crate::utils::constants::{
    COL_HUMIDITY, DEFAULT_BUFFER_SIZE, INPUT_DATE_FORMAT, REQUIRED_COLUMNS,
};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::{UTF_8, WINDOWS_1252};
use memmap2::Mmap;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Row layout of the observation CSV. Text cells are kept verbatim; numeric
/// cells that fail to parse become `None`.
#[derive(Debug, Deserialize)]
struct RawObservation {
    #[serde(rename = "Nombre")]
    station: String,

    #[serde(rename = "fecha")]
    date: String,

    #[serde(rename = "lluvia", deserialize_with = "lenient_number")]
    precipitation: Option<f64>,

    #[serde(rename = "tmin", deserialize_with = "lenient_number")]
    min_temp: Option<f64>,

    #[serde(rename = "tseca", deserialize_with = "lenient_number")]
    dry_temp: Option<f64>,

    #[serde(rename = "tmax", deserialize_with = "lenient_number")]
    max_temp: Option<f64>,

    #[serde(rename = "hum_rel", default, deserialize_with = "lenient_number")]
    humidity: Option<f64>,
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = Option::<String>::deserialize(deserializer)?;
    Ok(cell.and_then(|v| v.trim().parse::<f64>().ok()))
}

pub struct ObservationReader {
    use_mmap: bool,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Read every observation in the file. Any malformed date fails the whole load.
    pub fn read_observations(&self, path: &Path) -> Result<Vec<Observation>> {
        let input_error = |source| ProcessingError::InputFile {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(input_error)?;

        let observations = if self.use_mmap {
            let mmap = unsafe { Mmap::map(&file).map_err(input_error)? };
            self.parse_bytes(&mmap)?
        } else {
            let mut bytes = Vec::new();
            BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file)
                .read_to_end(&mut bytes)
                .map_err(input_error)?;
            self.parse_bytes(&bytes)?
        };

        debug!(
            "Read {} observations from {}",
            observations.len(),
            path.display()
        );
        Ok(observations)
    }

    /// Decode raw file content and parse it.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Vec<Observation>> {
        let text = decode_text(bytes)?;
        self.parse_str(&text)
    }

    /// Parse CSV text with a header row.
    pub fn parse_str(&self, text: &str) -> Result<Vec<Observation>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::Headers)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        check_required_columns(&headers)?;

        let mut observations = Vec::new();
        for (index, record_result) in reader.records().enumerate() {
            let record = record_result?;

            // Header is line 1
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 2);

            let raw: RawObservation = record.deserialize(Some(&headers))?;
            observations.push(to_observation(raw, line)?);
        }

        Ok(observations)
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

fn check_required_columns(headers: &StringRecord) -> Result<()> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ProcessingError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    if !headers.iter().any(|h| h == COL_HUMIDITY) {
        debug!("Optional column '{}' not present", COL_HUMIDITY);
    }
    Ok(())
}

fn to_observation(raw: RawObservation, line: usize) -> Result<Observation> {
    let date = parse_date(&raw.date).ok_or_else(|| ProcessingError::InvalidDate {
        line,
        value: raw.date.clone(),
    })?;

    Ok(Observation::new(
        raw.station,
        date,
        raw.precipitation,
        raw.min_temp,
        raw.dry_temp,
        raw.max_temp,
    )
    .with_humidity(raw.humidity))
}

/// Parse a `DD/MM/YYYY` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, INPUT_DATE_FORMAT).ok()
}

/// UTF-8 first (BOM stripped), falling back to Windows-1252 for legacy spreadsheet exports.
fn decode_text(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    let text = if had_errors {
        warn!("Input is not valid UTF-8, decoding as Windows-1252");
        let (text, _, _) = WINDOWS_1252.decode(bytes);
        text
    } else {
        text
    };

    if text.contains('\0') {
        return Err(ProcessingError::Encoding(
            "input contains NUL bytes; expected a comma-delimited text file".to_string(),
        ));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Nombre,fecha,lluvia,tmin,tseca,tmax,hum_rel,estacion";

    #[test]
    fn test_parse_rows() -> Result<()> {
        let text = format!(
            "{}\nLa_Aurora,01/03/2024,2.5,14.1,19.0,25.3,80,INSIVUMEH-1\nLa_Aurora,02/03/2024,,13.0,18.2,24.9,,INSIVUMEH-1\n",
            HEADER
        );
        let rows = ObservationReader::new().parse_str(&text)?;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].station, "La_Aurora");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(rows[0].precipitation, Some(2.5));
        assert_eq!(rows[0].max_temp, Some(25.3));
        assert_eq!(rows[0].humidity, Some(80.0));
        assert_eq!(rows[1].precipitation, None);
        assert_eq!(rows[1].humidity, None);
        Ok(())
    }

    #[test]
    fn test_unparseable_number_becomes_missing() -> Result<()> {
        let text = "Nombre,fecha,lluvia,tmin,tseca,tmax\nA,05/01/2024,ND,1,2,x\n";
        let rows = ObservationReader::new().parse_str(text)?;

        assert_eq!(rows[0].precipitation, None);
        assert_eq!(rows[0].min_temp, Some(1.0));
        assert_eq!(rows[0].max_temp, None);
        Ok(())
    }

    #[test]
    fn test_station_keys_are_not_trimmed() -> Result<()> {
        let text = " Nombre ,fecha,lluvia,tmin,tseca,tmax\nStation_A ,01/01/2024, 2.5 ,1,2,3\nStation_A,02/01/2024,0,1,2,3\n";
        let rows = ObservationReader::new().parse_str(text)?;

        assert_eq!(rows[0].station, "Station_A ");
        assert_eq!(rows[1].station, "Station_A");
        assert_eq!(rows[0].precipitation, Some(2.5));
        Ok(())
    }

    #[test]
    fn test_malformed_date_fails_whole_load() {
        let text = "Nombre,fecha,lluvia,tmin,tseca,tmax\nA,01/01/2024,0,1,2,3\nA,2024-01-02,0,1,2,3\n";
        let err = ObservationReader::new().parse_str(text).unwrap_err();

        match err {
            ProcessingError::InvalidDate { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "2024-01-02");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_column() {
        let text = "Nombre,fecha,lluvia,tmin,tseca\nA,01/01/2024,0,1,2\n";
        let err = ObservationReader::new().parse_str(text).unwrap_err();

        assert!(matches!(
            err,
            ProcessingError::MissingColumn { ref column } if column == "tmax"
        ));
    }

    #[test]
    fn test_header_only_is_empty() -> Result<()> {
        let rows = ObservationReader::new().parse_str("Nombre,fecha,lluvia,tmin,tseca,tmax\n")?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[test]
    fn test_windows_1252_fallback() -> Result<()> {
        let mut bytes = b"Nombre,fecha,lluvia,tmin,tseca,tmax\n".to_vec();
        // "Peñas" with 0xF1 for ñ
        bytes.extend_from_slice(b"Pe\xF1as,01/02/2024,1,2,3,4\n");

        let rows = ObservationReader::new().parse_bytes(&bytes)?;
        assert_eq!(rows[0].station, "Peñas");
        Ok(())
    }

    #[test]
    fn test_utf8_bom_is_stripped() -> Result<()> {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Nombre,fecha,lluvia,tmin,tseca,tmax\nA,01/02/2024,1,2,3,4\n");

        let rows = ObservationReader::new().parse_bytes(&bytes)?;
        assert_eq!(rows.len(), 1);
        Ok(())
    }

    #[test]
    fn test_read_file_buffered_and_mmap() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "{}", HEADER)?;
        writeln!(temp_file, "Station_A,10/01/2024,0.0,10,15,20,60,1")?;
        writeln!(temp_file, "Station_B,11/01/2024,3.0,11,16,21,65,2")?;

        let buffered = ObservationReader::new().read_observations(temp_file.path())?;
        let mapped = ObservationReader::with_mmap(true).read_observations(temp_file.path())?;

        assert_eq!(buffered.len(), 2);
        assert_eq!(buffered, mapped);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let err = ObservationReader::new()
            .read_observations(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, ProcessingError::InputFile { .. }));
    }
}
