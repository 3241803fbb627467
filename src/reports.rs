use std::io::{self, Write};

use crate::allocate::{SeatAssignment, ROWS_PER_CLASSROOM};
use crate::layout::DocumentWriter;
use crate::roster::Session;

/// Column letters of the printed seat grid. Wider than the six allocation
/// columns so the sheet layout stays fixed if more columns ever open up.
pub const GRID_COLUMN_LETTERS: [char; 13] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
];

const EMPTY_SEAT: &str = "---";
const GRID_CELL_WIDTH: usize = 14;
const SIGNATURE_RULE: &str = "_____________________";

/// One classroom's worth of assignments, in store order.
#[derive(Debug, Clone)]
pub struct Classroom {
    pub class_room: String,
    pub assignments: Vec<SeatAssignment>,
}

fn classroom_number(class_room: &str) -> u32 {
    class_room
        .strip_prefix("Room ")
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(u32::MAX)
}

/// Groups assignments by classroom, ordered by room number ("Room 999"
/// before "Room 1000", which plain string order would get wrong).
pub fn classrooms(assignments: &[SeatAssignment]) -> Vec<Classroom> {
    let mut rooms: Vec<Classroom> = Vec::new();
    for a in assignments {
        match rooms.iter_mut().find(|r| r.class_room == a.class_room) {
            Some(room) => room.assignments.push(a.clone()),
            None => rooms.push(Classroom {
                class_room: a.class_room.clone(),
                assignments: vec![a.clone()],
            }),
        }
    }
    rooms.sort_by_key(|r| (classroom_number(&r.class_room), r.class_room.clone()));
    rooms
}

/// Splits a seat label like "C4" into its column letter and row number.
pub fn seat_parts(seat: &str) -> Option<(char, u32)> {
    let mut chars = seat.chars();
    let letter = chars.next()?;
    let row: u32 = chars.as_str().parse().ok()?;
    Some((letter, row))
}

/// The fixed-size cell matrix for one classroom's grid table:
/// `ROWS_PER_CLASSROOM` rows by `GRID_COLUMN_LETTERS` columns, cells
/// holding register numbers.
pub fn grid_cells(room: &Classroom) -> Vec<Vec<Option<String>>> {
    let mut cells =
        vec![vec![None; GRID_COLUMN_LETTERS.len()]; ROWS_PER_CLASSROOM as usize];
    for a in &room.assignments {
        let Some((letter, row)) = seat_parts(&a.seat_number) else {
            continue;
        };
        let Some(col) = GRID_COLUMN_LETTERS.iter().position(|c| *c == letter) else {
            continue;
        };
        if row == 0 || row > ROWS_PER_CLASSROOM {
            continue;
        }
        cells[(row - 1) as usize][col] = Some(a.register_number.clone());
    }
    cells
}

fn grid_table_lines(room: &Classroom) -> Vec<String> {
    let cells = grid_cells(room);
    let mut lines = Vec::with_capacity(2 + ROWS_PER_CLASSROOM as usize);
    lines.push(room.class_room.clone());

    let mut header = String::from("      ");
    for letter in GRID_COLUMN_LETTERS {
        header.push_str(&format!("{:<width$}", letter, width = GRID_CELL_WIDTH));
    }
    lines.push(header.trim_end().to_string());

    for (i, row) in cells.iter().enumerate() {
        let mut line = format!("{:>4}  ", i + 1);
        for cell in row {
            let text = cell.as_deref().unwrap_or(EMPTY_SEAT);
            line.push_str(&format!("{:<width$}", text, width = GRID_CELL_WIDTH));
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

#[derive(Debug, Clone, Copy)]
pub struct GridDocumentSummary {
    pub pages: u32,
    pub class_rooms: usize,
}

/// Renders the paginated seat-grid document for one (exam_date, session)
/// group: one fixed-size table per classroom, whole tables only — a table
/// that does not fit moves to a fresh page with a continued title.
pub fn render_grid_document<W: Write>(
    out: W,
    exam_date: &str,
    session: Session,
    assignments: &[SeatAssignment],
) -> io::Result<GridDocumentSummary> {
    let title = format!("SEAT ALLOCATION  {}  {}", exam_date, session.as_str());
    let mut writer = DocumentWriter::new(out, title);

    let rooms = classrooms(assignments);
    for room in &rooms {
        let table = grid_table_lines(room);
        writer.ensure_space(table.len() + 1)?;
        for line in &table {
            writer.push_line(line)?;
        }
        writer.push_blank()?;
    }

    let pages = writer.finish()?;
    Ok(GridDocumentSummary {
        pages,
        class_rooms: rooms.len(),
    })
}

/// Renders one classroom's signing-sheet roster: students in seat order,
/// one line each with a blank signature rule, column headers re-printed
/// after every page break.
pub fn render_signing_sheet<W: Write>(
    out: W,
    exam_date: &str,
    session: Session,
    room: &Classroom,
) -> io::Result<u32> {
    let title = format!(
        "SIGNING SHEET  {}  {}  {}",
        exam_date,
        session.as_str(),
        room.class_room
    );
    let header = format!(
        "{:<6} {:<14} {:<32} {}",
        "Seat", "Register No", "Name", "Signature"
    );
    let rule = "-".repeat(header.len().max(SIGNATURE_RULE.len() + 55));
    let mut writer =
        DocumentWriter::new(out, title).with_continuation(vec![header, rule]);

    let mut roster = room.assignments.clone();
    roster.sort_by_key(|a| seat_parts(&a.seat_number).unwrap_or(('Z', u32::MAX)));

    for a in &roster {
        let line = format!(
            "{:<6} {:<14} {:<32} {}",
            a.seat_number, a.register_number, a.name, SIGNATURE_RULE
        );
        writer.push_line(line.trim_end())?;
    }

    writer.finish()
}
