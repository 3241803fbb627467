use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("examseat.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS seat_assignments(
            id TEXT PRIMARY KEY,
            register_number TEXT NOT NULL,
            name TEXT NOT NULL,
            department TEXT NOT NULL,
            subject TEXT NOT NULL,
            class_room TEXT NOT NULL,
            seat_number TEXT NOT NULL,
            exam_date TEXT NOT NULL,
            session TEXT NOT NULL,
            updated_at TEXT,
            UNIQUE(register_number, exam_date, session)
        )",
        [],
    )?;

    // Existing workspaces may predate the updated_at column. Add if needed.
    ensure_assignments_updated_at(&conn)?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_seat_assignments_key
         ON seat_assignments(exam_date, session)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_seat_assignments_register
         ON seat_assignments(register_number)",
        [],
    )?;

    Ok(conn)
}

fn ensure_assignments_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "seat_assignments", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE seat_assignments ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
