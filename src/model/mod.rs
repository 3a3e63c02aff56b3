//! Core data model for fieldbook.
//!
//! These types describe the capture: the step catalog, captured values,
//! per-technician sessions, inbound events and button actions, and the
//! ledger row a finished session becomes.

mod action;
mod event;
mod record;
mod session;
pub mod step;
mod value;

pub use action::{Action, SummaryAction};
pub use event::{Command, Event, Inbound, MessageId, Update};
pub use record::{COLUMNS, Cell, LedgerRow};
pub use session::{ChatId, Correction, CorrectionOrigin, RecordId, Session, SessionState, UserId};
pub use step::{CATALOG, Next, StepDescriptor, StepKey, StepKind};
pub use value::{Coordinates, Value};
