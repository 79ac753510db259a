use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Demand input unparseable, missing `DateTime`, or no O-D columns (§7
/// `DemandError`). Invalid-id rows and empty demand are warnings, not
/// errors, and are reported via `IngestReport` instead.
#[derive(Debug)]
pub enum DemandError {
    Csv(csv::Error),
    MissingDateTimeColumn,
    NoOdColumns,
}

impl fmt::Display for DemandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv(why) => write!(f, "could not read demand csv: {why}"),
            Self::MissingDateTimeColumn => write!(f, "demand csv has no DateTime column"),
            Self::NoOdColumns => write!(f, "demand csv has no origin,destination columns"),
        }
    }
}

impl std::error::Error for DemandError {}

impl From<csv::Error> for DemandError {
    fn from(why: csv::Error) -> Self {
        Self::Csv(why)
    }
}

/// One non-zero cell of the wide per-minute origin/destination table (§6).
#[derive(Debug, Clone, Copy)]
pub struct RawDemandRecord {
    pub timestamp: NaiveDateTime,
    pub origin_station_id: u32,
    pub destination_station_id: u32,
    pub passenger_count: u32,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IngestReport {
    pub skipped_rows: u32,
    pub skipped_columns: u32,
    pub skipped_cells: u32,
}

struct OdColumn {
    index: usize,
    origin_station_id: u32,
    destination_station_id: u32,
}

/// Parses a wide demand table: a `DateTime` column plus one
/// `"origin,destination"` column per O-D pair, both 1-based ids in
/// `1..=station_count` (§6). Unparseable rows and out-of-range columns are
/// skipped with a warning rather than failing the whole ingest (§7).
pub fn parse(data: &str, station_count: u32) -> Result<(Vec<RawDemandRecord>, IngestReport), DemandError> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let headers = reader.headers()?.clone();

    let datetime_index = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("DateTime"))
        .ok_or(DemandError::MissingDateTimeColumn)?;

    let mut report = IngestReport::default();
    let mut od_columns = Vec::new();
    for (index, header) in headers.iter().enumerate() {
        if index == datetime_index {
            continue;
        }
        match parse_od_header(header, station_count) {
            Some((origin_station_id, destination_station_id)) => od_columns.push(OdColumn {
                index,
                origin_station_id,
                destination_station_id,
            }),
            None => {
                log::warn!("skipping demand column with invalid header: {header:?}");
                report.skipped_columns += 1;
            }
        }
    }
    if od_columns.is_empty() {
        return Err(DemandError::NoOdColumns);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let Some(timestamp) = parse_datetime(row.get(datetime_index).unwrap_or("")) else {
            log::warn!("skipping demand row with unparseable DateTime: {row:?}");
            report.skipped_rows += 1;
            continue;
        };

        for column in &od_columns {
            let cell = row.get(column.index).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            match cell.parse::<i64>() {
                Ok(count) if count > 0 => records.push(RawDemandRecord {
                    timestamp,
                    origin_station_id: column.origin_station_id,
                    destination_station_id: column.destination_station_id,
                    passenger_count: count as u32,
                }),
                Ok(_) => {} // zero demand for this minute, nothing to record
                Err(_) => {
                    log::warn!(
                        "skipping non-integer demand cell {cell:?} at column {}",
                        column.index
                    );
                    report.skipped_cells += 1;
                }
            }
        }
    }

    if records.is_empty() {
        log::warn!("demand input parsed to zero passenger groups");
    }

    Ok((records, report))
}

fn parse_od_header(header: &str, station_count: u32) -> Option<(u32, u32)> {
    let (origin, destination) = header.split_once(',')?;
    let origin: u32 = origin.trim().parse().ok()?;
    let destination: u32 = destination.trim().parse().ok()?;
    if origin == 0 || destination == 0 || origin > station_count || destination > station_count {
        return None;
    }
    if origin == destination {
        return None;
    }
    Some((origin, destination))
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// The date portion of the first record's `DateTime`, establishing the
/// simulation day (§6).
pub fn simulation_date(records: &[RawDemandRecord]) -> Option<NaiveDate> {
    records.first().map(|record| record.timestamp.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wide_table() {
        let csv = "DateTime,\"1,3\",\"2,3\"\n2025-01-01 05:00:00,10,0\n2025-01-01 05:01:00,0,5\n";
        let (records, report) = parse(csv, 3).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(records[0].origin_station_id, 1);
        assert_eq!(records[0].destination_station_id, 3);
        assert_eq!(records[0].passenger_count, 10);
    }

    #[test]
    fn skips_out_of_range_columns() {
        let csv = "DateTime,\"1,3\",\"1,9\"\n2025-01-01 05:00:00,10,4\n";
        let (records, report) = parse(csv, 3).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.skipped_columns, 1);
    }

    #[test]
    fn skips_unparseable_rows() {
        let csv = "DateTime,\"1,3\"\nnot-a-date,10\n2025-01-01 05:00:00,5\n";
        let (records, report) = parse(csv, 3).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.skipped_rows, 1);
    }

    #[test]
    fn missing_datetime_column_is_an_error() {
        let csv = "\"1,3\"\n10\n";
        assert!(matches!(
            parse(csv, 3),
            Err(DemandError::MissingDateTimeColumn)
        ));
    }

    #[test]
    fn no_od_columns_is_an_error() {
        let csv = "DateTime\n2025-01-01 05:00:00\n";
        assert!(matches!(parse(csv, 3), Err(DemandError::NoOdColumns)));
    }

    #[test]
    fn simulation_date_is_first_records_date() {
        let csv = "DateTime,\"1,3\"\n2025-03-04 06:00:00,10\n";
        let (records, _) = parse(csv, 3).unwrap();
        assert_eq!(
            simulation_date(&records),
            Some(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap())
        );
    }
}
