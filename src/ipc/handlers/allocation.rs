use crate::allocate;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, RawRow};
use crate::store;
use log::{info, warn};
use serde_json::json;

fn handle_upload(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(rows_value) = req.params.get("rows") else {
        return err(&req.id, "bad_params", "missing rows", None);
    };
    let rows: Vec<RawRow> = match serde_json::from_value(rows_value.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("invalid rows: {}", e), None),
    };
    if rows.is_empty() {
        return err(&req.id, "bad_params", "rows must not be empty", None);
    }

    let parsed = roster::parse_rows(&rows);
    if parsed.records.is_empty() {
        return err(
            &req.id,
            "no_valid_records",
            "no row yielded a register number",
            Some(json!({ "droppedRows": parsed.dropped_rows })),
        );
    }

    let outcome = allocate::allocate_seats(parsed.records);
    for g in &outcome.unseated {
        warn!(
            "unseated {} students for {} {}: departments beyond column capacity: {}",
            g.student_count,
            g.exam_date,
            g.session.as_str(),
            g.departments.join(", ")
        );
    }
    let unseated_students: usize = outcome.unseated.iter().map(|g| g.student_count).sum();

    match store::sync_assignments(conn, &outcome.assignments) {
        Ok(summary) => {
            info!(
                "upload processed: {} assignments ({} new, {} updated, {} unchanged, {} rows dropped)",
                outcome.assignments.len(),
                summary.inserted,
                summary.updated,
                summary.unchanged,
                parsed.dropped_rows
            );
            ok(
                &req.id,
                json!({
                    "totalProcessed": outcome.assignments.len(),
                    "newRecords": summary.inserted,
                    "updatedRecords": summary.updated,
                    "unchanged": summary.unchanged,
                    "droppedRows": parsed.dropped_rows,
                    "unseatedStudents": unseated_students,
                }),
            )
        }
        Err(e) => err(
            &req.id,
            "db_write_failed",
            e.message,
            Some(json!({
                "retryable": true,
                "newRecords": e.partial.inserted,
                "updatedRecords": e.partial.updated,
                "unchanged": e.partial.unchanged,
            })),
        ),
    }
}

fn handle_keys(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match store::group_keys(conn) {
        Ok(keys) => {
            let keys: Vec<serde_json::Value> = keys
                .iter()
                .map(|k| {
                    json!({
                        "examDate": k.exam_date,
                        "session": k.session,
                        "students": k.students,
                        "classRooms": k.class_rooms,
                    })
                })
                .collect();
            ok(&req.id, json!({ "keys": keys }))
        }
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "allocation.upload" => Some(handle_upload(state, req)),
        "allocation.keys" => Some(handle_keys(state, req)),
        _ => None,
    }
}
