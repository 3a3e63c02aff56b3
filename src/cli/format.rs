//! Output formatting for ledger rows.

use serde_json::{Map, Value};

use crate::model::{COLUMNS, LedgerRow};

/// One row as tab-separated cells, in column order.
pub(super) fn format_row(row: &LedgerRow) -> String {
    row.cells()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\t")
}

/// Rows as a pretty JSON array of `{column: cell}` objects.
pub(super) fn rows_to_json(rows: &[LedgerRow]) -> Result<String, String> {
    let objects = rows
        .iter()
        .map(|row| {
            COLUMNS
                .iter()
                .zip(row.cells())
                .map(|(column, cell)| {
                    serde_json::to_value(cell).map(|v| ((*column).to_string(), v))
                })
                .collect::<Result<Map<String, Value>, _>>()
                .map(Value::Object)
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("failed to encode rows: {e}"))?;

    serde_json::to_string_pretty(&objects).map_err(|e| format!("failed to encode rows: {e}"))
}
