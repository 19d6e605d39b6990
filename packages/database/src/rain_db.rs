//! Rain observation storage.
//!
//! The `rain_data` table mirrors the latest batch only. [`replace_all`]
//! drops and recreates it inside one transaction, so readers see either
//! the previous batch or the new one and row ids restart at 1.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use rain_map_camera_models::AggregateRainRecord;

use crate::DbError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A persisted aggregate record with its row id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRainRecord {
    /// Row id, 1-based in insertion order.
    pub id: i64,
    /// The stored record. Timestamps are kept at second precision.
    pub record: AggregateRainRecord,
}

/// Opens (or creates) the rain `DuckDB` and ensures the schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the data directory, connection, or schema
/// creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;

    log::debug!("Opened rain database at {}", path.display());
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE SEQUENCE IF NOT EXISTS rain_data_id_seq START 1;

        CREATE TABLE IF NOT EXISTS rain_data (
            id INTEGER PRIMARY KEY DEFAULT nextval('rain_data_id_seq'),
            neighborhood TEXT NOT NULL,
            street TEXT NOT NULL,
            average_density DOUBLE NOT NULL,
            rain_detected BOOLEAN NOT NULL,
            \"timestamp\" TIMESTAMP NOT NULL
        );",
    )?;

    Ok(())
}

/// Replaces the stored batch with `records`.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails. The previous contents are
/// left untouched in that case.
pub fn replace_all(conn: &mut Connection, records: &[AggregateRainRecord]) -> Result<u64, DbError> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "DROP TABLE IF EXISTS rain_data;
         DROP SEQUENCE IF EXISTS rain_data_id_seq;",
    )?;
    create_schema(&tx)?;

    let mut inserted = 0u64;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO rain_data
                (neighborhood, street, average_density, rain_detected, \"timestamp\")
             VALUES (?, ?, ?, ?, ?)",
        )?;

        for record in records {
            let rows = stmt.execute(duckdb::params![
                record.neighborhood,
                record.street_label,
                record.average_density,
                record.rain_detected,
                record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            ])?;
            inserted += u64::try_from(rows).unwrap_or(0);
        }
    }

    tx.commit()?;

    log::info!("Stored {inserted} rain records");
    Ok(inserted)
}

/// Reads back every stored record in id order.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored timestamp cannot be
/// parsed.
pub fn list_records(conn: &Connection) -> Result<Vec<StoredRainRecord>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, neighborhood, street, average_density, rain_detected, \"timestamp\"::TEXT
         FROM rain_data
         ORDER BY id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, bool>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, neighborhood, street_label, average_density, rain_detected, ts) = row?;
        let timestamp = parse_timestamp(&ts).ok_or_else(|| DbError::Conversion {
            message: format!("Row {id} has unreadable timestamp {ts:?}"),
        })?;
        records.push(StoredRainRecord {
            id,
            record: AggregateRainRecord {
                neighborhood,
                street_label,
                average_density,
                rain_detected,
                timestamp,
            },
        });
    }

    Ok(records)
}

/// Parses `DuckDB`'s text form of a `TIMESTAMP`, with or without
/// fractional seconds, as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_in_memory() -> Result<Connection, DbError> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(conn)
    }

    fn record(neighborhood: &str, street: &str, density: f64) -> AggregateRainRecord {
        AggregateRainRecord {
            neighborhood: neighborhood.to_string(),
            street_label: street.to_string(),
            average_density: density,
            rain_detected: density > 0.0,
            timestamp: Utc.with_ymd_and_hms(2024, 11, 19, 8, 30, 15).unwrap(),
        }
    }

    #[test]
    fn fresh_database_is_empty() {
        let conn = open_in_memory().unwrap();
        assert!(list_records(&conn).unwrap().is_empty());
    }

    #[test]
    fn stores_and_reads_back_records() {
        let mut conn = open_in_memory().unwrap();
        let records = vec![
            record("Ballard", "15th and Market", 0.05),
            record("Fremont", "Fremont and 34th", 0.0),
        ];

        assert_eq!(replace_all(&mut conn, &records).unwrap(), 2);

        let stored = list_records(&conn).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, 1);
        assert_eq!(stored[0].record, records[0]);
        assert_eq!(stored[1].id, 2);
        assert_eq!(stored[1].record, records[1]);
    }

    #[test]
    fn replace_discards_previous_batch() {
        let mut conn = open_in_memory().unwrap();
        replace_all(
            &mut conn,
            &[
                record("Ballard", "15th and Market", 0.05),
                record("Ballard", "Leary and Market", 0.02),
            ],
        )
        .unwrap();
        replace_all(&mut conn, &[record("Wallingford", "45th and Meridian", 0.3)]).unwrap();

        let stored = list_records(&conn).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, 1);
        assert_eq!(stored[0].record.neighborhood, "Wallingford");
    }

    #[test]
    fn replacing_with_nothing_clears_table() {
        let mut conn = open_in_memory().unwrap();
        replace_all(&mut conn, &[record("Ballard", "15th and Market", 0.05)]).unwrap();
        assert_eq!(replace_all(&mut conn, &[]).unwrap(), 0);
        assert!(list_records(&conn).unwrap().is_empty());
    }

    #[test]
    fn parses_fractional_timestamps() {
        let parsed = parse_timestamp("2024-11-19 08:30:15.250").unwrap();
        assert_eq!(
            parsed.timestamp_millis(),
            Utc.with_ymd_and_hms(2024, 11, 19, 8, 30, 15).unwrap().timestamp_millis() + 250
        );
        assert!(parse_timestamp("yesterday").is_none());
    }
}
