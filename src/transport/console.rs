//! Terminal transport: prints outbound messages and parses typed input.
//!
//! Input lines map onto inbound updates:
//!
//! ```text
//! /start  /new  /cancel     commands
//! @loc -12.05 -77.03        share a location
//! @photo ./box.jpg          send a photo from disk
//! @tap 2                    press button 2 of the latest keyboard
//! @tap confirm:TICKET       press a button by token
//! anything else             free text
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::Write;

use parking_lot::Mutex;

use super::{Button, OutboundMessage, Result, Transport, TransportError};
use crate::model::{ChatId, Coordinates, Inbound, MessageId};

struct State<W> {
    out: W,
    next_id: u64,
    sent: HashMap<MessageId, OutboundMessage>,
    /// Latest message that carries buttons.
    keyboard: Option<MessageId>,
}

/// A [`Transport`] that writes to any `Write`, normally stdout.
pub struct ConsoleTransport<W> {
    state: Mutex<State<W>>,
}

impl<W: Write + Send> ConsoleTransport<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Mutex::new(State {
                out,
                next_id: 1,
                sent: HashMap::new(),
                keyboard: None,
            }),
        }
    }

    /// Returns the writer, for inspecting output in tests.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.state.into_inner().out
    }

    /// Parses one input line. `Ok(None)` for a blank line.
    pub fn parse_line(&self, line: &str) -> core::result::Result<Option<Inbound>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(rest) = line.strip_prefix('@') else {
            return Ok(Some(Inbound::from_text(line)));
        };
        let (verb, args) = rest.split_once(' ').unwrap_or((rest, ""));
        let args = args.trim();

        let inbound = match verb {
            "loc" => {
                let mut parts = args.split_whitespace();
                let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err("usage: @loc LAT LNG".to_string());
                };
                let latitude = lat
                    .parse()
                    .map_err(|_| format!("invalid latitude: {lat}"))?;
                let longitude = lng
                    .parse()
                    .map_err(|_| format!("invalid longitude: {lng}"))?;
                Inbound::Location(Coordinates {
                    latitude,
                    longitude,
                })
            }
            "photo" => {
                if args.is_empty() {
                    return Err("usage: @photo PATH".to_string());
                }
                let bytes = fs::read(args).map_err(|e| format!("cannot read {args}: {e}"))?;
                Inbound::Photo(bytes)
            }
            "tap" => self.tap(args)?,
            _ => return Err(format!("unknown directive: @{verb}")),
        };
        Ok(Some(inbound))
    }

    /// Resolves a button press against the latest keyboard.
    fn tap(&self, arg: &str) -> core::result::Result<Inbound, String> {
        let state = self.state.lock();
        let keyboard = state
            .keyboard
            .and_then(|id| state.sent.get(&id).map(|m| (id, m)));

        if let Ok(index) = arg.parse::<usize>() {
            let (id, message) = keyboard.ok_or("no buttons to tap")?;
            let button = index
                .checked_sub(1)
                .and_then(|i| message.flat_buttons().nth(i))
                .ok_or_else(|| format!("no button {index}"))?;
            return Ok(Inbound::Callback {
                message: id,
                token: button.token.clone(),
            });
        }

        if arg.is_empty() {
            return Err("usage: @tap N|TOKEN".to_string());
        }
        Ok(Inbound::Callback {
            message: keyboard.map_or(MessageId(0), |(id, _)| id),
            token: arg.to_string(),
        })
    }
}

impl<W: Write + Send> Transport for ConsoleTransport<W> {
    fn send(&self, chat: ChatId, message: &OutboundMessage) -> Result<MessageId> {
        let mut state = self.state.lock();
        let id = MessageId(state.next_id);
        state.next_id += 1;

        print_message(&mut state.out, chat, id, "", message)?;
        if !message.buttons.is_empty() {
            state.keyboard = Some(id);
        }
        state.sent.insert(id, message.clone());
        Ok(id)
    }

    fn edit(&self, chat: ChatId, id: MessageId, message: &OutboundMessage) -> Result<()> {
        let mut state = self.state.lock();
        match state.sent.get(&id) {
            None => return Err(TransportError::Delivery(format!("no message #{}", id.0))),
            Some(previous) if previous == message => return Err(TransportError::NotModified),
            Some(_) => {}
        }

        print_message(&mut state.out, chat, id, " (edited)", message)?;
        if !message.buttons.is_empty() {
            state.keyboard = Some(id);
        } else if state.keyboard == Some(id) {
            state.keyboard = None;
        }
        state.sent.insert(id, message.clone());
        Ok(())
    }

    fn send_photo(&self, chat: ChatId, uri: &str, caption: &str) -> Result<MessageId> {
        let mut state = self.state.lock();
        let id = MessageId(state.next_id);
        state.next_id += 1;

        writeln!(state.out, "[#{} → {chat}] {caption} {uri}", id.0).map_err(delivery)?;
        Ok(id)
    }
}

fn print_message<W: Write>(
    out: &mut W,
    chat: ChatId,
    id: MessageId,
    note: &str,
    message: &OutboundMessage,
) -> Result<()> {
    writeln!(out, "[#{} → {chat}]{note}", id.0).map_err(delivery)?;
    for line in message.text.lines() {
        writeln!(out, "  {line}").map_err(delivery)?;
    }
    let mut n = 0;
    for row in &message.buttons {
        let labels: Vec<String> = row
            .iter()
            .map(|Button { label, .. }| {
                n += 1;
                format!("[{n}] {label}")
            })
            .collect();
        writeln!(out, "  {}", labels.join("  ")).map_err(delivery)?;
    }
    out.flush().map_err(delivery)
}

fn delivery(e: std::io::Error) -> TransportError {
    TransportError::Delivery(e.to_string())
}
