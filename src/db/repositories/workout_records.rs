use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::{
    db::{
        helpers::{format_datetime, parse_datetime, to_u32, to_u64},
        Database,
    },
    models::{CompletedWorkoutRecord, SetResult},
    workout::RecordSink,
};

fn row_to_record(row: &Row) -> Result<CompletedWorkoutRecord> {
    let recorded_at: String = row.get("recorded_at")?;
    let target_reps: i64 = row.get("target_reps")?;
    let total_sets: i64 = row.get("total_sets")?;
    let rest_secs: i64 = row.get("rest_secs")?;
    let set_details: String = row.get("set_details")?;

    let sets: Vec<SetResult> =
        serde_json::from_str(&set_details).context("failed to parse set_details")?;

    Ok(CompletedWorkoutRecord {
        id: row.get("id")?,
        exercise: row.get("exercise")?,
        target_reps: to_u32(target_reps, "target_reps")?,
        total_sets: to_u32(total_sets, "total_sets")?,
        rest_secs: to_u32(rest_secs, "rest_secs")?,
        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
        sets,
    })
}

fn insert_record(conn: &Connection, record: &CompletedWorkoutRecord) -> Result<()> {
    let set_details = serde_json::to_string(&record.sets)?;
    conn.execute(
        "INSERT INTO workout_records (id, exercise, recorded_at, target_reps, total_sets, rest_secs, set_details)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.exercise,
            format_datetime(&record.recorded_at),
            record.target_reps,
            record.total_sets,
            record.rest_secs,
            set_details,
        ],
    )
    .context("failed to insert workout record")?;
    Ok(())
}

impl Database {
    pub async fn insert_workout_record(&self, record: &CompletedWorkoutRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| insert_record(conn, &record)).await
    }

    /// Queues the insert without waiting for it.
    pub fn submit_workout_record(&self, record: &CompletedWorkoutRecord) -> Result<()> {
        let record = record.clone();
        self.submit("insert workout record", move |conn| insert_record(conn, &record))
    }

    /// Records for `exercise`, newest first.
    pub async fn list_records_by_exercise(
        &self,
        exercise: &str,
        limit: u32,
    ) -> Result<Vec<CompletedWorkoutRecord>> {
        let exercise = exercise.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, exercise, recorded_at, target_reps, total_sets, rest_secs, set_details
                 FROM workout_records
                 WHERE exercise = ?1
                 ORDER BY recorded_at DESC, rowid DESC
                 LIMIT ?2",
            )?;

            let mut rows = stmt.query(params![exercise, limit])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }

            Ok(records)
        })
        .await
    }

    pub async fn count_records(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM workout_records", [], |row| row.get(0))?;
            to_u64(count, "count")
        })
        .await
    }
}

impl RecordSink for Database {
    fn save(&self, record: &CompletedWorkoutRecord) -> Result<()> {
        self.submit_workout_record(record)
    }
}
