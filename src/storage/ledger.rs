//! Ledger storage: one `SQLite` table, append-only.

use rusqlite::Connection;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};

use crate::model::{COLUMNS, Cell, LedgerRow};

use super::{Ledger, Result, Storage, StorageError};

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Integer(i) => ToSqlOutput::from(*i),
            Cell::Number(n) => ToSqlOutput::from(*n),
            Cell::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl Storage {
    /// Creates the ledger table if missing. Columns are the ledger header.
    pub(super) fn provision_ledger(&self) -> Result<()> {
        let columns = column_list();
        let conn = self.open_db()?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS ledger (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                {columns}
            );"
        ))?;
        Ok(())
    }

    /// Loads the most recent `limit` rows, oldest first.
    pub fn list_rows(&self, limit: usize) -> Result<Vec<LedgerRow>> {
        let conn = self.open_db()?;
        let columns = column_list();
        let mut stmt = conn.prepare(&format!(
            "SELECT {columns} FROM ledger ORDER BY seq DESC LIMIT ?1"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let raw = stmt
            .query_map([limit], |row| {
                (0..COLUMNS.len())
                    .map(|i| row.get::<_, SqlValue>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut rows = raw
            .into_iter()
            .map(|values| {
                values
                    .into_iter()
                    .map(cell_from_sql)
                    .collect::<Result<Vec<_>>>()
                    .map(LedgerRow)
            })
            .collect::<Result<Vec<_>>>()?;
        rows.reverse();
        Ok(rows)
    }

    fn open_db(&self) -> Result<Connection> {
        Ok(Connection::open(self.ledger_path())?)
    }
}

impl Ledger for Storage {
    fn append_row(&self, row: &LedgerRow) -> Result<()> {
        if row.cells().len() != COLUMNS.len() {
            return Err(StorageError::Corrupt(format!(
                "ledger row has {} cells, expected {}",
                row.cells().len(),
                COLUMNS.len()
            )));
        }
        let placeholders = (1..=COLUMNS.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let conn = self.open_db()?;
        conn.execute(
            &format!(
                "INSERT INTO ledger ({}) VALUES ({placeholders})",
                column_list()
            ),
            rusqlite::params_from_iter(row.cells()),
        )?;
        Ok(())
    }
}

fn column_list() -> String {
    COLUMNS
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn cell_from_sql(value: SqlValue) -> Result<Cell> {
    match value {
        SqlValue::Integer(i) => Ok(Cell::Integer(i)),
        SqlValue::Real(n) => Ok(Cell::Number(n)),
        SqlValue::Text(s) => Ok(Cell::Text(s)),
        SqlValue::Null => Ok(Cell::empty()),
        SqlValue::Blob(_) => Err(StorageError::Corrupt("unexpected blob in ledger".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("data"), None).unwrap();
        (dir, storage)
    }

    fn sample_row(ticket: &str) -> LedgerRow {
        let mut cells = vec![
            Cell::text("2025-03-14"),
            Cell::text("09:30:00"),
            Cell::Integer(7_175_478_712),
            Cell::text("a1b2c3d4"),
            Cell::text(ticket),
            Cell::text("12345678"),
            Cell::text("Ana"),
            Cell::Number(-12.05),
            Cell::Number(-77.03),
            Cell::text("CTO"),
            Cell::text("CTO-09"),
            Cell::Number(-12.06),
            Cell::Number(-77.04),
            Cell::text("u1"),
            Cell::text("NO"),
        ];
        cells.push(Cell::empty());
        cells.push(Cell::empty());
        LedgerRow(cells)
    }

    #[test]
    fn append_and_list_rows() {
        let (_dir, storage) = test_storage();

        storage.append_row(&sample_row("T-1")).unwrap();
        storage.append_row(&sample_row("T-2")).unwrap();

        let rows = storage.list_rows(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], sample_row("T-1"));
        assert_eq!(rows[1].get("TICKET"), Some(&Cell::text("T-2")));
    }

    #[test]
    fn list_rows_limits_to_most_recent() {
        let (_dir, storage) = test_storage();
        for t in ["T-1", "T-2", "T-3"] {
            storage.append_row(&sample_row(t)).unwrap();
        }

        let rows = storage.list_rows(2).unwrap();
        let tickets: Vec<_> = rows.iter().map(|r| r.get("TICKET").unwrap().to_string()).collect();
        assert_eq!(tickets, ["T-2", "T-3"]);
    }

    #[test]
    fn list_rows_empty() {
        let (_dir, storage) = test_storage();
        assert!(storage.list_rows(10).unwrap().is_empty());
    }

    #[test]
    fn rejects_short_rows() {
        let (_dir, storage) = test_storage();
        let err = storage
            .append_row(&LedgerRow(vec![Cell::text("x")]))
            .unwrap_err();

        assert!(matches!(err, StorageError::Corrupt(_)));
        assert!(storage.list_rows(10).unwrap().is_empty());
    }

    #[test]
    fn provisioning_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("data");
        let first = Storage::new(root.clone(), None).unwrap();
        first.append_row(&sample_row("T-1")).unwrap();

        let second = Storage::new(root, None).unwrap();
        assert_eq!(second.list_rows(10).unwrap().len(), 1);
    }
}
