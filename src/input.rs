//! Readers for transaction records exported from the persistence layer.

use std::{fmt, io::Read, str::FromStr};

use serde::Deserialize;

use crate::{Error, RecordAmount, TransactionRecord};

/// The file formats transaction records can be read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// A JSON array of records, or an object with a `transactions` array.
    #[default]
    Json,
    /// Comma separated values with a header row naming the record fields.
    Csv,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Csv => f.write_str("csv"),
        }
    }
}

impl FromStr for InputFormat {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(Error::InvalidInputFormat(text.to_owned())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRecords {
    List(Vec<TransactionRecord>),
    Wrapped { transactions: Vec<TransactionRecord> },
}

/// A CSV row. Every CSV field is text, so the amount is kept as written and
/// goes through the exact decimal parser when validated.
#[derive(Deserialize)]
struct CsvRecord {
    #[serde(default, alias = "_id")]
    id: Option<String>,
    date: String,
    #[serde(rename = "type")]
    kind: String,
    amount: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl From<CsvRecord> for TransactionRecord {
    fn from(row: CsvRecord) -> Self {
        TransactionRecord {
            id: row.id,
            date: row.date,
            kind: row.kind,
            amount: RecordAmount::Text(row.amount),
            category: row.category,
            description: row.description,
        }
    }
}

/// Read transaction records in `format` from `reader`.
///
/// # Errors
/// Returns [Error::Io] if `reader` fails, or [Error::InvalidJson] or
/// [Error::InvalidCsv] if the input does not contain transaction records.
pub fn read_records(
    reader: impl Read,
    format: InputFormat,
) -> Result<Vec<TransactionRecord>, Error> {
    match format {
        InputFormat::Json => read_json_records(reader),
        InputFormat::Csv => read_csv_records(reader),
    }
}

/// Read transaction records from JSON.
///
/// Accepts either an array of records or an object of the form
/// `{"transactions": [...]}`.
///
/// # Errors
/// Returns [Error::Io] if `reader` fails, or [Error::InvalidJson] if the input
/// is not JSON in one of those shapes.
pub fn read_json_records(reader: impl Read) -> Result<Vec<TransactionRecord>, Error> {
    let records: JsonRecords = serde_json::from_reader(reader).map_err(|error| {
        if error.is_io() {
            Error::Io(error.to_string())
        } else {
            Error::InvalidJson(error.to_string())
        }
    })?;

    let records = match records {
        JsonRecords::List(records) => records,
        JsonRecords::Wrapped { transactions } => transactions,
    };

    tracing::debug!("Read {} transaction records from JSON", records.len());

    Ok(records)
}

/// Read transaction records from CSV.
///
/// The header row must name the `date`, `type` and `amount` columns and may
/// also name `category`, `description` and `id`, in any order. Amounts are
/// read as [RecordAmount::Text].
///
/// # Errors
/// Returns [Error::Io] if `reader` fails, or [Error::InvalidCsv] if a row
/// cannot be parsed or is missing a required column.
pub fn read_csv_records(reader: impl Read) -> Result<Vec<TransactionRecord>, Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    // A read error while the header row is taken implicitly ends the rows early.
    csv_reader.headers().map_err(csv_error)?;

    let records = csv_reader
        .deserialize::<CsvRecord>()
        .map(|row| row.map(TransactionRecord::from))
        .collect::<Result<Vec<_>, csv::Error>>()
        .map_err(csv_error)?;

    tracing::debug!("Read {} transaction records from CSV", records.len());

    Ok(records)
}

fn csv_error(error: csv::Error) -> Error {
    if error.is_io_error() {
        Error::Io(error.to_string())
    } else {
        Error::InvalidCsv(error.to_string())
    }
}
