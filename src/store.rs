use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::allocate::SeatAssignment;
use crate::roster::Session;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// A store failure mid-batch. Sync is atomic per record, not per batch;
/// `partial` reports what succeeded before the failure so the caller can
/// surface true counts with a retryable error.
#[derive(Debug)]
pub struct StoreError {
    pub partial: SyncSummary,
    pub message: String,
}

/// Upserts each assignment by its natural key: insert if absent, overwrite
/// the mutable fields if present and different, count as unchanged
/// otherwise. Re-running sync on an unchanged batch reports zero inserts.
pub fn sync_assignments(
    conn: &Connection,
    assignments: &[SeatAssignment],
) -> Result<SyncSummary, StoreError> {
    let mut summary = SyncSummary::default();

    for a in assignments {
        let existing: Option<(String, String, String, String, String)> = conn
            .query_row(
                "SELECT name, department, subject, class_room, seat_number
                 FROM seat_assignments
                 WHERE register_number = ? AND exam_date = ? AND session = ?",
                (&a.register_number, &a.exam_date, a.session.as_str()),
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
            )
            .optional()
            .map_err(|e| store_err(summary, e))?;

        match existing {
            None => {
                let id = Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO seat_assignments(
                        id, register_number, name, department, subject,
                        class_room, seat_number, exam_date, session, updated_at
                     ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    (
                        &id,
                        &a.register_number,
                        &a.name,
                        &a.department,
                        &a.subject,
                        &a.class_room,
                        &a.seat_number,
                        &a.exam_date,
                        a.session.as_str(),
                        Utc::now().to_rfc3339(),
                    ),
                )
                .map_err(|e| store_err(summary, e))?;
                summary.inserted += 1;
            }
            Some((name, department, subject, class_room, seat_number))
                if name == a.name
                    && department == a.department
                    && subject == a.subject
                    && class_room == a.class_room
                    && seat_number == a.seat_number =>
            {
                summary.unchanged += 1;
            }
            Some(_) => {
                conn.execute(
                    "UPDATE seat_assignments SET
                        name = ?, department = ?, subject = ?,
                        class_room = ?, seat_number = ?, updated_at = ?
                     WHERE register_number = ? AND exam_date = ? AND session = ?",
                    (
                        &a.name,
                        &a.department,
                        &a.subject,
                        &a.class_room,
                        &a.seat_number,
                        Utc::now().to_rfc3339(),
                        &a.register_number,
                        &a.exam_date,
                        a.session.as_str(),
                    ),
                )
                .map_err(|e| store_err(summary, e))?;
                summary.updated += 1;
            }
        }
    }

    Ok(summary)
}

fn store_err(partial: SyncSummary, e: rusqlite::Error) -> StoreError {
    StoreError {
        partial,
        message: e.to_string(),
    }
}

fn assignment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SeatAssignment> {
    let session_text: String = row.get(7)?;
    let session = Session::parse(&session_text).unwrap_or(Session::Forenoon);
    Ok(SeatAssignment {
        register_number: row.get(0)?,
        name: row.get(1)?,
        department: row.get(2)?,
        subject: row.get(3)?,
        class_room: row.get(4)?,
        seat_number: row.get(5)?,
        exam_date: row.get(6)?,
        session,
    })
}

const ASSIGNMENT_COLUMNS: &str =
    "register_number, name, department, subject, class_room, seat_number, exam_date, session";

/// All persisted assignments for one (exam_date, session) group, in stable
/// register-number order. Renderers read through here; nothing mutates.
pub fn assignments_for_key(
    conn: &Connection,
    exam_date: &str,
    session: Session,
) -> anyhow::Result<Vec<SeatAssignment>> {
    let sql = format!(
        "SELECT {} FROM seat_assignments
         WHERE exam_date = ? AND session = ?
         ORDER BY register_number",
        ASSIGNMENT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map((exam_date, session.as_str()), |r| assignment_from_row(r))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn assignments_for_register(
    conn: &Connection,
    register_number: &str,
    exam_date: &str,
    session: Option<Session>,
) -> anyhow::Result<Vec<SeatAssignment>> {
    let rows = match session {
        Some(s) => {
            let sql = format!(
                "SELECT {} FROM seat_assignments
                 WHERE register_number = ? AND exam_date = ? AND session = ?
                 ORDER BY session",
                ASSIGNMENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let x = stmt
                .query_map((register_number, exam_date, s.as_str()), |r| {
                    assignment_from_row(r)
                })?
                .collect::<Result<Vec<_>, _>>()?;
            x
        }
        None => {
            let sql = format!(
                "SELECT {} FROM seat_assignments
                 WHERE register_number = ? AND exam_date = ?
                 ORDER BY session",
                ASSIGNMENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let x = stmt
                .query_map((register_number, exam_date), |r| assignment_from_row(r))?
                .collect::<Result<Vec<_>, _>>()?;
            x
        }
    };
    Ok(rows)
}

#[derive(Debug, Clone)]
pub struct GroupKeySummary {
    pub exam_date: String,
    pub session: String,
    pub students: usize,
    pub class_rooms: usize,
}

/// Distinct persisted (exam_date, session) pairs with their sizes.
pub fn group_keys(conn: &Connection) -> anyhow::Result<Vec<GroupKeySummary>> {
    let mut stmt = conn.prepare(
        "SELECT exam_date, session, COUNT(*), COUNT(DISTINCT class_room)
         FROM seat_assignments
         GROUP BY exam_date, session
         ORDER BY exam_date, session",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(GroupKeySummary {
                exam_date: r.get(0)?,
                session: r.get(1)?,
                students: r.get::<_, i64>(2)? as usize,
                class_rooms: r.get::<_, i64>(3)? as usize,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
