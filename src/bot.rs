//! Conversation dispatcher: turns inbound updates into engine calls and
//! replies.
//!
//! Each update is handled under its owner's session lock from start to
//! finish. Sessions end here, on save, cancel, or discard.

pub mod dispatch;
pub mod render;

use std::sync::Arc;

use jiff::Timestamp;
use tracing::{debug, info, warn};

use crate::correction;
use crate::engine::{self, Outcome, Resume};
use crate::gateway::{FinalizeError, Gateway};
use crate::model::{
    Action, ChatId, Command, CorrectionOrigin, Event, Inbound, MessageId, Session, SessionState,
    StepKey, Update, UserId, step,
};
use crate::storage::BlobStore;
use crate::store::{Begin, SessionStore};
use crate::transport::{self, OutboundMessage, Transport};

use dispatch::{InputTag, Route};

/// Whether the session survives the update.
enum Flow {
    Continue,
    End,
}

pub struct Bot {
    store: SessionStore,
    blobs: Arc<dyn BlobStore>,
    transport: Arc<dyn Transport>,
    gateway: Gateway,
    clock: fn() -> Timestamp,
}

impl Bot {
    /// Replies go out through the gateway's transport.
    pub fn new(gateway: Gateway, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            store: SessionStore::new(),
            blobs,
            transport: Arc::clone(&gateway.transport),
            gateway,
            clock: Timestamp::now,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Handles one inbound update.
    pub fn handle(&self, update: Update) {
        let Update {
            chat,
            user,
            inbound,
        } = update;

        if self.gateway.supervisors.contains(&chat) {
            debug!(%chat, "ignoring update from supervisory chat");
            return;
        }

        match inbound {
            Inbound::Command(command) => self.command(chat, user, command),
            Inbound::Callback { message, token } => match token.parse::<Action>() {
                Ok(action) => {
                    self.with_session(chat, user, |bot, s| bot.action(chat, s, message, action));
                }
                Err(e) => warn!(%chat, %user, error = %e, "ignoring callback"),
            },
            Inbound::Text(text) => {
                self.with_session(chat, user, |bot, s| {
                    bot.message(chat, s, InputTag::Text, Event::Text(text))
                });
            }
            Inbound::Location(coords) => {
                self.with_session(chat, user, |bot, s| {
                    bot.message(chat, s, InputTag::Location, Event::Location(coords))
                });
            }
            Inbound::Photo(bytes) => {
                self.with_session(chat, user, |bot, s| {
                    bot.message(chat, s, InputTag::Photo, Event::Photo(bytes))
                });
            }
        }
    }

    fn command(&self, chat: ChatId, user: UserId, command: Command) {
        debug!(%chat, %user, ?command, "command");
        match command {
            Command::Start => match self.store.get(user) {
                Some(handle) => {
                    let pending = handle.lock().state;
                    self.send(chat, &render::collision(pending));
                }
                None => self.send(chat, &render::welcome()),
            },
            Command::New => match self.store.begin_session(user, chat) {
                Begin::Started(_) => {
                    debug!(active = self.store.len(), "sessions");
                    self.send(chat, &render::prompt(step::first_step(), false));
                }
                Begin::Collision(notice) => {
                    let record_id = notice.handle.lock().record_id.clone();
                    info!(%user, %record_id, pending = ?notice.pending, "session collision");
                    self.send(chat, &render::collision(notice.pending));
                }
            },
            Command::Cancel => self.with_session(chat, user, |bot, s| {
                s.close();
                info!(record_id = %s.record_id, "session cancelled");
                bot.send(chat, &render::cancelled());
                Flow::End
            }),
        }
    }

    /// Runs `f` under the owner's session lock and removes the session
    /// afterwards if `f` ended it.
    fn with_session(
        &self,
        chat: ChatId,
        user: UserId,
        f: impl FnOnce(&Self, &mut Session) -> Flow,
    ) {
        let Some(handle) = self.store.get(user) else {
            self.send(chat, &render::no_session());
            return;
        };

        let flow = {
            let mut session = handle.lock();
            if session.active {
                f(self, &mut *session)
            } else {
                Flow::Continue
            }
        };

        if let Flow::End = flow {
            self.store.destroy(user);
        }
    }

    fn message(&self, chat: ChatId, s: &mut Session, tag: InputTag, event: Event) -> Flow {
        match dispatch::route(s.state, tag) {
            Route::Submit => self.submit(chat, s, event, None),
            _ => self.out_of_turn(chat, s),
        }
        Flow::Continue
    }

    fn action(&self, chat: ChatId, s: &mut Session, message: MessageId, action: Action) -> Flow {
        let route = dispatch::route(s.state, InputTag::of_action(&action));
        debug!(record_id = %s.record_id, state = ?s.state, ?route, "callback");

        match route {
            Route::Submit => {
                if let Action::Select { tag, .. } = action {
                    self.submit(chat, s, Event::Choice(tag), Some(message));
                }
            }
            Route::Confirm(step) => match engine::confirm(s, step) {
                Ok(Outcome::Confirmed { step, resume }) => {
                    self.edit(chat, message, &render::confirmed(s, step));
                    self.resume(chat, s, resume);
                }
                Ok(outcome) => self.show(chat, s, outcome),
                Err(_) => self.out_of_turn(chat, s),
            },
            Route::Correct(step) => match engine::correct(s, step) {
                Ok(outcome) => {
                    self.edit(chat, message, &render::correcting(step));
                    self.show(chat, s, outcome);
                }
                Err(_) => self.out_of_turn(chat, s),
            },
            Route::Save => return self.save(chat, s, message),
            Route::OpenPicker => match correction::open_picker(s) {
                Ok(_) => self.edit(chat, message, &render::picker(s)),
                Err(_) => self.out_of_turn(chat, s),
            },
            Route::PickEarlier(step) => self.send(chat, &render::earlier_picker(s, step)),
            Route::Fix(field) => {
                let origin = match s.state {
                    SessionState::Confirming(left_off) => CorrectionOrigin::LinearFlow { left_off },
                    _ => CorrectionOrigin::Summary,
                };
                match correction::begin_correction(s, field, origin) {
                    Ok(outcome) => {
                        self.edit(chat, message, &render::correcting(field));
                        self.show(chat, s, outcome);
                    }
                    Err(_) => self.out_of_turn(chat, s),
                }
            }
            Route::Cancel => {
                s.close();
                info!(record_id = %s.record_id, "session cancelled from summary");
                self.edit(chat, message, &render::cancelled());
                return Flow::End;
            }
            Route::Discard => {
                s.close();
                info!(record_id = %s.record_id, "session discarded");
                self.edit(chat, message, &render::discarded());
                return Flow::End;
            }
            Route::Resume => {
                self.edit(
                    chat,
                    message,
                    &OutboundMessage::text("▶️ Resuming registration."),
                );
                self.redisplay(chat, s);
            }
            Route::OutOfTurn => self.out_of_turn(chat, s),
        }
        Flow::Continue
    }

    /// Hands a value to the engine. `button` is the keyboard message the
    /// value came from, if it was a choice.
    fn submit(&self, chat: ChatId, s: &mut Session, event: Event, button: Option<MessageId>) {
        match engine::submit(s, event, self.blobs.as_ref()) {
            Ok(outcome) => {
                if let Some(id) = button
                    && let Some(step) = chosen_step(outcome, s)
                {
                    self.edit(chat, id, &render::chosen(s, step));
                }
                self.show(chat, s, outcome);
            }
            Err(e) if e.is_retryable() => {
                self.send(chat, &render::rejected(&e));
                self.redisplay(chat, s);
            }
            Err(e) => {
                debug!(record_id = %s.record_id, error = %e, "submit refused");
                self.out_of_turn(chat, s);
            }
        }
    }

    fn save(&self, chat: ChatId, s: &mut Session, message: MessageId) -> Flow {
        self.edit(chat, message, &render::saving());
        match self.gateway.finalize(s, (self.clock)()) {
            Ok(_) => {
                s.close();
                self.send(chat, &render::next_registration());
                Flow::End
            }
            Err(FinalizeError::Ledger(_)) => {
                self.send(chat, &render::save_failed());
                self.send(chat, &render::summary(s, None));
                Flow::Continue
            }
            Err(FinalizeError::NotReady { .. }) => {
                self.out_of_turn(chat, s);
                Flow::Continue
            }
        }
    }

    fn show(&self, chat: ChatId, s: &mut Session, outcome: Outcome) {
        match outcome {
            Outcome::Ask { step, correcting } => self.send(chat, &render::prompt(step, correcting)),
            Outcome::AwaitConfirmation { step } => {
                self.send(chat, &render::confirm_echo(s, step));
            }
            Outcome::Confirmed { resume, .. } => self.resume(chat, s, resume),
            Outcome::Summary => {
                let highlight = s.take_highlight();
                self.send(chat, &render::summary(s, highlight));
            }
            Outcome::PickField => self.send(chat, &render::picker(s)),
        }
    }

    fn resume(&self, chat: ChatId, s: &mut Session, resume: Resume) {
        match resume {
            Resume::Ask(step) => self.send(chat, &render::prompt(step, false)),
            Resume::Reconfirm(step) => self.send(chat, &render::confirm_echo(s, step)),
            Resume::Summary => self.show(chat, s, Outcome::Summary),
        }
    }

    /// Shows whatever the session is waiting on again, without changing it.
    fn redisplay(&self, chat: ChatId, s: &Session) {
        let message = match s.state {
            SessionState::Awaiting(step) => {
                let correcting = s.correction.is_some_and(|c| c.target == step);
                render::prompt(step, correcting)
            }
            SessionState::Confirming(step) => render::confirm_echo(s, step),
            SessionState::Summary => render::summary(s, None),
            SessionState::PickingCorrection => render::picker(s),
        };
        self.send(chat, &message);
    }

    fn out_of_turn(&self, chat: ChatId, s: &Session) {
        debug!(record_id = %s.record_id, state = ?s.state, "out of turn");
        self.send(chat, &render::out_of_turn(s.state));
    }

    fn send(&self, chat: ChatId, message: &OutboundMessage) {
        if let Err(e) = self.transport.send(chat, message) {
            warn!(%chat, error = %e, "send failed");
        }
    }

    fn edit(&self, chat: ChatId, id: MessageId, message: &OutboundMessage) {
        if let Err(e) = transport::edit(self.transport.as_ref(), chat, id, message) {
            warn!(%chat, message = id.0, error = %e, "edit failed");
        }
    }
}

/// The choice step just answered, given the outcome of its submission.
fn chosen_step(outcome: Outcome, s: &Session) -> Option<StepKey> {
    match outcome {
        Outcome::AwaitConfirmation { step } => Some(step),
        Outcome::Summary => s.last_corrected,
        _ => None,
    }
}
