use crate::Database;
use crate::models::{AppendResult, NoticeBatch, NoticeRecord};
use anyhow::Result;
use noticeboard_types::models::Notice;
use rusqlite::{Connection, Row};

impl Database {
    // -- Append --

    /// Append one notice as a single row. Appends are serialized through the
    /// writer connection, so concurrent callers never share a row number.
    pub fn append_notice(&self, notice: &Notice) -> Result<AppendResult> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "INSERT INTO notices (id, author, content, timestamp) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO NOTHING",
                rusqlite::params![notice.id, notice.author, notice.content, notice.timestamp],
            )?;

            if changed == 0 {
                return Ok(AppendResult::DuplicateId);
            }

            Ok(AppendResult::Appended {
                row_number: conn.last_insert_rowid() as u64,
            })
        })
    }

    // -- List --

    /// Notices after `cursor`, oldest first.
    ///
    /// A cursor at or past the high-water mark yields an empty batch that
    /// echoes the cursor back. A zero cursor yields only the newest
    /// `first_load_limit` rows.
    pub fn list_since(&self, cursor: u64, first_load_limit: u32) -> Result<NoticeBatch> {
        self.with_conn(|conn| {
            let hwm = query_high_water_mark(conn)?;
            if cursor >= hwm {
                return Ok(NoticeBatch {
                    notices: vec![],
                    cursor,
                });
            }

            let records = if cursor == 0 {
                query_latest(conn, first_load_limit)?
            } else {
                query_after(conn, cursor)?
            };

            let new_cursor = records.last().map_or(cursor, |r| r.row_number);
            Ok(NoticeBatch {
                notices: records.into_iter().map(|r| r.notice).collect(),
                cursor: new_cursor,
            })
        })
    }

    pub fn high_water_mark(&self) -> Result<u64> {
        self.with_conn(query_high_water_mark)
    }

    pub fn count_notices(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM notices", [], |r| r.get(0))?;
            Ok(n as u64)
        })
    }
}

fn query_high_water_mark(conn: &Connection) -> Result<u64> {
    let hwm: i64 = conn.query_row(
        "SELECT COALESCE(MAX(row_number), 0) FROM notices",
        [],
        |r| r.get(0),
    )?;
    Ok(hwm as u64)
}

fn query_latest(conn: &Connection, limit: u32) -> Result<Vec<NoticeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT row_number, id, author, content, timestamp FROM (
             SELECT * FROM notices ORDER BY row_number DESC LIMIT ?1
         ) ORDER BY row_number ASC",
    )?;

    let rows = stmt
        .query_map([limit], map_record)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_after(conn: &Connection, cursor: u64) -> Result<Vec<NoticeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT row_number, id, author, content, timestamp FROM notices
         WHERE row_number > ?1
         ORDER BY row_number ASC",
    )?;

    let rows = stmt
        .query_map([cursor as i64], map_record)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<NoticeRecord> {
    Ok(NoticeRecord {
        row_number: row.get::<_, i64>(0)? as u64,
        notice: Notice {
            id: row.get(1)?,
            author: row.get(2)?,
            content: row.get(3)?,
            timestamp: row.get(4)?,
        },
    })
}
