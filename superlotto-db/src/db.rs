use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;

use crate::models::Draw;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    draw_number     TEXT NOT NULL UNIQUE,
    date            TEXT NOT NULL,
    front_1         INTEGER NOT NULL,
    front_2         INTEGER NOT NULL,
    front_3         INTEGER NOT NULL,
    front_4         INTEGER NOT NULL,
    front_5         INTEGER NOT NULL,
    back_1          INTEGER NOT NULL,
    back_2          INTEGER NOT NULL,
    jackpot_amount  REAL,
    winners_count   INTEGER
);
CREATE INDEX IF NOT EXISTS idx_draws_date ON draws (date);
";

const DRAW_COLUMNS: &str = "id, draw_number, date, front_1, front_2, front_3, front_4, front_5, back_1, back_2, jackpot_amount, winners_count";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("superlotto.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("cannot open database {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA).context("migration failed")?;
    Ok(())
}

/// Inserts a draw, skipping duplicates by issue number. Returns true if a
/// row was actually inserted.
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (draw_number, date, front_1, front_2, front_3, front_4, front_5, back_1, back_2, jackpot_amount, winners_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            draw.draw_number,
            draw.date,
            draw.front[0],
            draw.front[1],
            draw.front[2],
            draw.front[3],
            draw.front[4],
            draw.back[0],
            draw.back[1],
            draw.jackpot_amount,
            draw.winners_count,
        ],
    )
    .context("insert failed")?;
    Ok(changed > 0)
}

fn row_to_draw(row: &rusqlite::Row<'_>) -> rusqlite::Result<Draw> {
    Ok(Draw {
        id: row.get(0)?,
        draw_number: row.get(1)?,
        date: row.get(2)?,
        front: [
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
            row.get::<_, u8>(7)?,
        ],
        back: [row.get::<_, u8>(8)?, row.get::<_, u8>(9)?],
        jackpot_amount: row.get(10)?,
        winners_count: row.get(11)?,
    })
}

/// The `limit` most recent draws, most recent first.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAW_COLUMNS} FROM draws ORDER BY date DESC, draw_number DESC LIMIT ?1"
    ))?;
    let draws = stmt
        .query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Draws with `start <= date <= end`, in chronological order.
pub fn fetch_draws_between(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAW_COLUMNS} FROM draws WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC, draw_number ASC"
    ))?;
    let draws = stmt
        .query_map(rusqlite::params![start, end], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// One page of draws, most recent first.
pub fn fetch_draws_page(conn: &Connection, limit: u32, offset: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAW_COLUMNS} FROM draws ORDER BY date DESC, draw_number DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let draws = stmt
        .query_map([limit, offset], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}
