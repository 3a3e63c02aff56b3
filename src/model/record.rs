//! Ledger rows: the persisted form of a finalized session.

use std::fmt;

use serde::Serialize;

/// Ledger header, in column order.
pub const COLUMNS: [&str; 17] = [
    "FECHA",
    "HORA",
    "USER_ID",
    "ID_REGISTRO",
    "TICKET",
    "DNI",
    "NOMBRE",
    "LAT_CLIENTE",
    "LNG_CLIENTE",
    "TIPO_CTO",
    "CODIGO_CTO",
    "LAT_CTO",
    "LNG_CTO",
    "FOTO_CTO",
    "SPLITTER",
    "PUERTO",
    "FOTO_SPLITTER",
];

/// One cell of a ledger row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A full ledger row, one cell per entry in [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LedgerRow(pub Vec<Cell>);

impl LedgerRow {
    /// The cell under a header name.
    pub fn get(&self, column: &str) -> Option<&Cell> {
        COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.0.get(i))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.0
    }
}
