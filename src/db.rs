use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;

use crate::roster::Student;

pub const DB_FILE_NAME: &str = "rollboard.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.display()))?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    // Names are nullable: rows imported from partial exports still show up.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY,
            first_name TEXT,
            last_name TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .context("failed to create students table")?;

    // Older workspaces may have a students table without sort_order. Add and backfill if needed.
    ensure_students_sort_order(&conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_sort ON students(sort_order, id)",
        [],
    )?;

    Ok(conn)
}

pub fn list_roster(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, first_name, last_name
             FROM students
             ORDER BY sort_order, id",
        )
        .context("failed to query students")?;
    let rows = stmt
        .query_map([], |r| {
            Ok(Student {
                id: r.get(0)?,
                first_name: r.get::<_, Option<String>>(1)?.unwrap_or_default(),
                last_name: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn ensure_students_sort_order(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "sort_order")? {
        return Ok(());
    }

    conn.execute(
        "ALTER TABLE students ADD COLUMN sort_order INTEGER NOT NULL DEFAULT 0",
        [],
    )?;

    // Backfill using existing insert order as a best-effort.
    let mut stmt = conn.prepare("SELECT id FROM students ORDER BY rowid")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for (i, id) in ids.iter().enumerate() {
        conn.execute(
            "UPDATE students SET sort_order = ? WHERE id = ?",
            (i as i64, id),
        )?;
    }

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
