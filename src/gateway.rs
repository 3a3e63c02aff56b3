//! Finalization: turns a summarized session into a ledger row and
//! announces it.
//!
//! The ledger append is the commit point. Fan-out to the owner and the
//! supervisory chats happens after it and never undoes it.

use std::sync::Arc;

use jiff::Timestamp;
use jiff::tz::TimeZone;
use tracing::{error, info, warn};

use crate::bot::render;
use crate::model::{
    COLUMNS, Cell, ChatId, LedgerRow, RecordId, Session, SessionState, StepKey, Value,
    step::SPLITTER_NOT_USED,
};
use crate::storage::{Ledger, StorageError};
use crate::transport::Transport;

/// Why a save did not happen.
#[derive(Debug, thiserror::Error)]
pub enum FinalizeError {
    #[error("session is not at the summary ({state:?})")]
    NotReady { state: SessionState },

    /// Nothing was written. The session is unchanged and save may be retried.
    #[error("ledger append failed: {0}")]
    Ledger(#[from] StorageError),
}

/// What was saved.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub record_id: RecordId,
    pub row: LedgerRow,
    /// Uploaded photos with their captions, in capture order.
    pub photos: Vec<(String, String)>,
}

/// Commits finished sessions and fans out the receipt.
pub struct Gateway {
    pub ledger: Arc<dyn Ledger>,
    pub transport: Arc<dyn Transport>,
    /// Chats that get a copy of every receipt and its photos.
    pub supervisors: Vec<ChatId>,
    pub time_zone: TimeZone,
}

impl Gateway {
    /// Appends the session's row to the ledger, then delivers the receipt.
    ///
    /// Does not remove the session; the caller does that once this returns
    /// `Ok`. Delivery failures are logged and do not fail the save.
    pub fn finalize(
        &self,
        session: &Session,
        captured_at: Timestamp,
    ) -> Result<Receipt, FinalizeError> {
        if session.state != SessionState::Summary {
            return Err(FinalizeError::NotReady {
                state: session.state,
            });
        }

        let row = assemble_row(session, captured_at, &self.time_zone);
        if let Err(e) = self.ledger.append_row(&row) {
            error!(record_id = %session.record_id, error = %e, "ledger append failed");
            return Err(e.into());
        }
        info!(record_id = %session.record_id, owner = %session.owner, "record saved");

        let receipt = Receipt {
            record_id: session.record_id.clone(),
            photos: photos(&row),
            row,
        };
        self.fan_out(session.chat, &receipt);
        Ok(receipt)
    }

    fn fan_out(&self, owner_chat: ChatId, receipt: &Receipt) {
        let message = render::receipt(receipt);

        if let Err(e) = self.transport.send(owner_chat, &message) {
            warn!(chat = %owner_chat, error = %e, "receipt not delivered to owner");
        }

        for &chat in &self.supervisors {
            if let Err(e) = self.transport.send(chat, &message) {
                error!(%chat, record_id = %receipt.record_id, error = %e, "supervisor delivery failed");
                continue;
            }
            for (caption, uri) in &receipt.photos {
                if let Err(e) = self.transport.send_photo(chat, uri, caption) {
                    error!(%chat, record_id = %receipt.record_id, error = %e, "photo forward failed");
                }
            }
        }
    }
}

/// Builds the 17-cell row in [`COLUMNS`] order.
///
/// Missing fields become empty cells. `SPLITTER` defaults to `NO`, and the
/// port and splitter photo are left empty unless a splitter was used.
pub fn assemble_row(session: &Session, captured_at: Timestamp, tz: &TimeZone) -> LedgerRow {
    let zoned = captured_at.to_zoned(tz.clone());
    let text = |key: StepKey| session.text(key).map_or_else(Cell::empty, Cell::text);
    let coords = |key: StepKey| match session.value(key) {
        Some(Value::Location(c)) => [Cell::Number(c.latitude), Cell::Number(c.longitude)],
        _ => [Cell::empty(), Cell::empty()],
    };

    let splitter = session.text(StepKey::SplitterUse).unwrap_or(SPLITTER_NOT_USED);
    let recorded = |key: StepKey| if session.records(key) { text(key) } else { Cell::empty() };

    let [lat_client, lng_client] = coords(StepKey::ClientLocation);
    let [lat_box, lng_box] = coords(StepKey::BoxLocation);

    let cells = vec![
        Cell::text(zoned.strftime("%Y-%m-%d").to_string()),
        Cell::text(zoned.strftime("%H:%M:%S").to_string()),
        Cell::Integer(session.owner.0),
        Cell::text(session.record_id.as_str()),
        text(StepKey::Ticket),
        text(StepKey::Dni),
        text(StepKey::Name),
        lat_client,
        lng_client,
        text(StepKey::BoxType),
        text(StepKey::BoxCode),
        lat_box,
        lng_box,
        text(StepKey::BoxPhoto),
        Cell::text(splitter),
        recorded(StepKey::Port),
        recorded(StepKey::SplitterPhoto),
    ];
    debug_assert_eq!(cells.len(), COLUMNS.len());
    LedgerRow(cells)
}

fn photos(row: &LedgerRow) -> Vec<(String, String)> {
    [("FOTO_CTO", "📸 CTO/NAP"), ("FOTO_SPLITTER", "📸 Splitter")]
        .into_iter()
        .filter_map(|(column, caption)| match row.get(column) {
            Some(Cell::Text(uri)) if !uri.is_empty() => Some((caption.to_string(), uri.clone())),
            _ => None,
        })
        .collect()
}
