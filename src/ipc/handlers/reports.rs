use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::reports;
use crate::roster::Session;
use crate::store;
use log::{info, warn};
use rusqlite::Connection;
use serde_json::json;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use uuid::Uuid;

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn parse_group_key(req: &Request) -> Result<(String, Session), serde_json::Value> {
    let exam_date = required_str(req, "examDate")?;
    let session_raw = required_str(req, "session")?;
    let session = Session::parse(&session_raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "session must be Forenoon or Afternoon",
            Some(json!({ "session": session_raw })),
        )
    })?;
    Ok((exam_date, session))
}

fn load_group(
    conn: &Connection,
    req: &Request,
    exam_date: &str,
    session: Session,
) -> Result<Vec<crate::allocate::SeatAssignment>, serde_json::Value> {
    let assignments = store::assignments_for_key(conn, exam_date, session)
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;
    if assignments.is_empty() {
        // A key with no assignments is "not found", never an empty document.
        return Err(err(
            &req.id,
            "not_found",
            "no assignments for exam date and session",
            Some(json!({ "examDate": exam_date, "session": session.as_str() })),
        ));
    }
    Ok(assignments)
}

fn handle_seat_grid_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (exam_date, session) = match parse_group_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let assignments = match load_group(conn, req, &exam_date, session) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let columns: Vec<String> = reports::GRID_COLUMN_LETTERS
        .iter()
        .map(|c| c.to_string())
        .collect();
    let rooms: Vec<serde_json::Value> = reports::classrooms(&assignments)
        .iter()
        .map(|room| {
            let cells = reports::grid_cells(room);
            json!({
                "classRoom": room.class_room,
                "columns": columns.clone(),
                "rows": cells.len(),
                "cells": cells,
                "students": room.assignments.len(),
            })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "examDate": exam_date,
            "session": session.as_str(),
            "classRooms": rooms,
        }),
    )
}

fn handle_seat_grid(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (exam_date, session) = match parse_group_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let out_path = match required_str(req, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    let assignments = match load_group(conn, req, &exam_date, session) {
        Ok(v) => v,
        Err(e) => return e,
    };

    if let Some(parent) = out_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return err(&req.id, "report_write_failed", e.to_string(), None);
        }
    }
    let file = match File::create(&out_path) {
        Ok(f) => f,
        Err(e) => return err(&req.id, "report_write_failed", e.to_string(), None),
    };

    match reports::render_grid_document(BufWriter::new(file), &exam_date, session, &assignments)
    {
        Ok(summary) => {
            info!(
                "seat grid written: {} ({} pages, {} classrooms)",
                out_path.to_string_lossy(),
                summary.pages,
                summary.class_rooms
            );
            ok(
                &req.id,
                json!({
                    "outPath": out_path.to_string_lossy(),
                    "pages": summary.pages,
                    "classRooms": summary.class_rooms,
                }),
            )
        }
        Err(e) => err(&req.id, "report_write_failed", e.to_string(), None),
    }
}

fn entry_name(class_room: &str) -> String {
    format!("{}_signing_sheet.txt", class_room.replace(' ', "_"))
}

fn write_signing_sheets(
    scratch: &Path,
    exam_date: &str,
    session: Session,
    rooms: &[reports::Classroom],
) -> anyhow::Result<Vec<(String, PathBuf)>> {
    std::fs::create_dir_all(scratch)?;
    let mut entries = Vec::with_capacity(rooms.len());
    for room in rooms {
        let name = entry_name(&room.class_room);
        let path = scratch.join(&name);
        let file = File::create(&path)?;
        reports::render_signing_sheet(BufWriter::new(file), exam_date, session, room)?;
        entries.push((name, path));
    }
    Ok(entries)
}

fn handle_signing_sheets(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (exam_date, session) = match parse_group_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let out_path = match required_str(req, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    let assignments = match load_group(conn, req, &exam_date, session) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let rooms = reports::classrooms(&assignments);
    // Scratch files are request-scoped; the archive is the deliverable.
    let scratch = workspace.join("scratch").join(Uuid::new_v4().to_string());

    let entries = match write_signing_sheets(&scratch, &exam_date, session, &rooms) {
        Ok(v) => v,
        Err(e) => {
            let _ = std::fs::remove_dir_all(&scratch);
            return err(&req.id, "report_write_failed", e.to_string(), None);
        }
    };

    let result = match crate::archive::bundle_documents(&entries, &out_path) {
        Ok(entry_count) => {
            info!(
                "signing sheets written: {} ({} classrooms)",
                out_path.to_string_lossy(),
                entry_count
            );
            ok(
                &req.id,
                json!({
                    "outPath": out_path.to_string_lossy(),
                    "entryCount": entry_count,
                    "classRooms": rooms.len(),
                }),
            )
        }
        Err(e) => err(&req.id, "report_write_failed", e.to_string(), None),
    };

    // Best-effort cleanup; scratch leftovers are not worth failing over.
    if let Err(e) = std::fs::remove_dir_all(&scratch) {
        warn!(
            "failed to clean scratch directory {}: {}",
            scratch.to_string_lossy(),
            e
        );
    }

    result
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.seatGridModel" => Some(handle_seat_grid_model(state, req)),
        "reports.seatGrid" => Some(handle_seat_grid(state, req)),
        "reports.signingSheets" => Some(handle_signing_sheets(state, req)),
        _ => None,
    }
}
