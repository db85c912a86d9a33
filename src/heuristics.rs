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

//! Best-effort guesses about a message based on its headers.
//!
//! None of these ever fail; when there is not enough information the answer
//! is simply `false` or `None`.

use chrono::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;

use crate::message::HeaderField;
use crate::mime::header::parse_datetime;
use crate::support::diagnostic::ParseContext;

lazy_static! {
    static ref OOO_SUBJECT: Regex = Regex::new(
        "(?i)^(?:out of office|out of the office|out of office autoreply|\
         out of office reply|automatic reply):|is out of the office$"
    )
    .unwrap();
    static ref REPLY_SUBJECT: Regex = Regex::new("(?i)^re:").unwrap();
    static ref FORWARD_SUBJECT: Regex = Regex::new("(?i)^fwd?:").unwrap();
}

fn first<'a>(headers: &'a [HeaderField], name: &str) -> Option<&'a HeaderField> {
    headers.iter().find(|h| h.is_named(name))
}

fn has_header(headers: &[HeaderField], name: &str) -> bool {
    first(headers, name).is_some()
}

/// Whether any `name` header has the value `expected`.
fn header_is(headers: &[HeaderField], name: &str, expected: &str) -> bool {
    headers
        .iter()
        .filter(|h| h.is_named(name))
        .any(|h| h.value().trim().eq_ignore_ascii_case(expected))
}

fn header_in(headers: &[HeaderField], name: &str, expected: &[&str]) -> bool {
    expected.iter().any(|e| header_is(headers, name, e))
}

/// Whether the message looks like it was generated automatically (vacation
/// responders, cron, mailing list software, ...).
pub fn is_auto_message(headers: &[HeaderField]) -> bool {
    const BULK: &[&str] = &["junk", "bulk", "list", "auto_reply"];

    header_is(headers, "Preference", "auto_reply")
        || header_is(headers, "Auto-Submitted", "auto-replied")
        || header_is(headers, "X-Autoreply", "yes")
        || header_is(headers, "X-POST-MessageClass", "9; Autoresponder")
        || has_header(headers, "X-Autorespond")
        || has_header(headers, "X-AutoReply-From")
        || has_header(headers, "X-Mail-Autoreply")
        || has_header(headers, "X-FC-MachineGenerated")
        || header_is(headers, "Delivered-To", "Autoresponder")
        || (has_header(headers, "Auto-Submitted")
            && !header_is(headers, "Auto-Submitted", "no"))
        || has_header(headers, "X-Cron-Env")
        || header_is(headers, "X-Auto-Response-Suppress", "OOF")
        || header_in(headers, "Precedence", BULK)
        || header_in(headers, "X-Precedence", BULK)
}

/// Whether `subject` looks like that of an out-of-office notice.
pub fn is_ooo_subject(subject: &str) -> bool {
    OOO_SUBJECT.is_match(subject)
}

pub fn is_reply(headers: &[HeaderField], subject: &str) -> bool {
    has_header(headers, "References") || REPLY_SUBJECT.is_match(subject)
}

pub fn is_forward(subject: &str) -> bool {
    FORWARD_SUBJECT.is_match(subject)
}

/// Work out when the message was sent.
///
/// This is the first `Date` header if it could be parsed. Failing that, it is
/// the date at the end of the first `Received` header, i.e., whatever follows
/// its first `;`. A `Received` header with no `;`, or whose tail is not
/// exactly one date, gives `None`.
pub fn guess_date(
    headers: &[HeaderField],
    ctx: &mut ParseContext,
) -> Option<DateTime<Utc>> {
    match first(headers, "Date") {
        Some(&HeaderField::Date { timestamp, .. }) => return Some(timestamp),
        Some(other) => ctx.debug(
            module_path!(),
            format_args!(
                "Date header {:?} unusable, trying Received",
                other.value()
            ),
        ),
        None => ctx.debug(
            module_path!(),
            format_args!("No Date header, trying Received"),
        ),
    }

    let received = match first(headers, "Received") {
        Some(received) => received.value(),
        None => {
            ctx.debug(module_path!(), format_args!("No Received header"));
            return None;
        }
    };

    let parts = received.splitn(2, ';').collect::<Vec<_>>();
    if 2 != parts.len() {
        ctx.debug(
            module_path!(),
            format_args!("Received header {:?} has no date part", received),
        );
        return None;
    }

    match parse_datetime(parts[1].as_bytes()) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(e) => {
            ctx.debug(
                module_path!(),
                format_args!("Bad date in Received header: {}", e),
            );
            None
        }
    }
}
