use crate::allocate::SeatAssignment;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::Session;
use crate::store;
use serde_json::json;

pub fn assignment_json(a: &SeatAssignment) -> serde_json::Value {
    json!({
        "registerNumber": a.register_number,
        "name": a.name,
        "department": a.department,
        "subject": a.subject,
        "classRoom": a.class_room,
        "seatNumber": a.seat_number,
        "examDate": a.exam_date,
        "session": a.session.as_str(),
    })
}

fn handle_find_seat(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let register_number = match req.params.get("registerNumber").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing registerNumber", None),
    };
    let exam_date = match req.params.get("examDate").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing examDate", None),
    };
    let session = match req.params.get("session").and_then(|v| v.as_str()) {
        None => None,
        Some(raw) => match Session::parse(raw) {
            Some(s) => Some(s),
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "session must be Forenoon or Afternoon",
                    Some(json!({ "session": raw })),
                )
            }
        },
    };

    let assignments =
        match store::assignments_for_register(conn, &register_number, &exam_date, session) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        };
    if assignments.is_empty() {
        return err(&req.id, "not_found", "student not found", None);
    }

    let assignments: Vec<serde_json::Value> = assignments.iter().map(assignment_json).collect();
    ok(&req.id, json!({ "assignments": assignments }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.findSeat" => Some(handle_find_seat(state, req)),
        _ => None,
    }
}
