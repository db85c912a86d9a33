//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of email-parse.
//
// email-parse is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// email-parse is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along with
// email-parse. If not, see <http://www.gnu.org/licenses/>.

//! Per-parse diagnostic logging.
//!
//! Every parse runs with its own `ParseContext`. Lines logged through it are
//! forwarded to the `log` facade (prefixed with the context id, so concurrent
//! parses can be told apart) and are also retained so the caller can show the
//! log for exactly one message, for example when that message failed to
//! parse.

use std::fmt;

use chrono::prelude::*;
use log::Level;
use rand::{rngs::OsRng, Rng};

/// An opaque identifier for one parse invocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId([u8; 16]);

impl ContextId {
    pub fn generate() -> Self {
        ContextId(OsRng.gen())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ContextId({})", self)
    }
}

/// One retained diagnostic line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub logger: String,
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] ({}) {}: {}",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.logger,
            self.message
        )
    }
}

#[derive(Debug)]
pub struct ParseContext {
    id: ContextId,
    lines: Vec<LogLine>,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseContext {
    pub fn new() -> Self {
        ParseContext {
            id: ContextId::generate(),
            lines: Vec::new(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Consume the context, returning everything logged through it.
    pub fn into_lines(self) -> Vec<LogLine> {
        self.lines
    }

    pub fn log(&mut self, level: Level, logger: &str, args: fmt::Arguments) {
        let message = args.to_string();
        log::log!(target: logger, level, "{} {}", self.id, message);
        self.lines.push(LogLine {
            logger: logger.to_owned(),
            time: Utc::now(),
            level,
            message,
        });
    }

    pub fn debug(&mut self, logger: &str, args: fmt::Arguments) {
        self.log(Level::Debug, logger, args)
    }

    pub fn info(&mut self, logger: &str, args: fmt::Arguments) {
        self.log(Level::Info, logger, args)
    }

    pub fn warn(&mut self, logger: &str, args: fmt::Arguments) {
        self.log(Level::Warn, logger, args)
    }
}
