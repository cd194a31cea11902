use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use superlotto_db::db::insert_draw;
use superlotto_db::models::{validate_draw, Draw};
use superlotto_db::rusqlite::Connection;
use tracing::info;

/// Expected CSV columns:
/// issue,date,f1,f2,f3,f4,f5,b1,b2[,jackpot[,winners]]
/// with dates in YYYY-MM-DD form. Trailing columns are optional.
fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("missing field at index {}", idx))
    };

    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("cannot parse '{}' (index {})", s, idx))
    };

    let draw_number = get(0)?;
    let raw_date = get(1)?;
    let date: NaiveDate = raw_date
        .parse()
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", raw_date))?;

    let front: [u8; 5] = [get_u8(2)?, get_u8(3)?, get_u8(4)?, get_u8(5)?, get_u8(6)?];
    let back: [u8; 2] = [get_u8(7)?, get_u8(8)?];
    validate_draw(&front, &back)?;

    let jackpot_amount = match get(9) {
        Ok(s) if !s.is_empty() => Some(
            s.parse::<f64>()
                .with_context(|| format!("cannot parse jackpot '{}'", s))?,
        ),
        _ => None,
    };
    let winners_count = match get(10) {
        Ok(s) if !s.is_empty() => Some(
            s.parse::<u32>()
                .with_context(|| format!("cannot parse winners '{}'", s))?,
        ),
        _ => None,
    };

    Ok(Draw {
        id: 0,
        draw_number,
        date,
        front,
        back,
        jackpot_amount,
        winners_count,
    })
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

/// Imports all records in one transaction. Bad rows are counted and
/// reported, never fatal; duplicate issues are skipped by the store.
pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("cannot open {:?}", path))?;

    let tx = conn
        .unchecked_transaction()
        .context("cannot start transaction")?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {pos} records")
            .expect("static template"),
    );

    for record_result in reader.records() {
        result.total_records += 1;
        bar.inc(1);
        match record_result {
            Ok(record) => match parse_record(&record) {
                Ok(draw) => match insert_draw(&tx, &draw) {
                    Ok(true) => result.inserted += 1,
                    Ok(false) => result.skipped += 1,
                    Err(e) => {
                        bar.suspend(|| {
                            eprintln!("insert error at record {}: {}", result.total_records, e)
                        });
                        result.errors += 1;
                    }
                },
                Err(e) => {
                    bar.suspend(|| {
                        eprintln!("parse error at record {}: {}", result.total_records, e)
                    });
                    result.errors += 1;
                }
            },
            Err(e) => {
                bar.suspend(|| {
                    eprintln!("read error at record {}: {}", result.total_records, e)
                });
                result.errors += 1;
            }
        }
    }
    bar.finish_and_clear();

    tx.commit().context("commit failed")?;
    info!(
        total = result.total_records,
        inserted = result.inserted,
        skipped = result.skipped,
        errors = result.errors,
        "csv import finished"
    );
    Ok(result)
}
