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

//! The entry point: turning a raw message into a `ParsedMessage`.

use std::io::Read;

use crate::heuristics::guess_date;
use crate::message::{Address, HeaderField, ParsedMessage};
use crate::mime::classify::{AttachmentSink, BodyCollector};
use crate::mime::encoded_word::decode_unstructured;
use crate::mime::fields::interpret_fields;
use crate::mime::tree::parse_entity;
use crate::mime::walk::walk;
use crate::support::config::ParserConfig;
use crate::support::counting_reader::CountingReader;
use crate::support::diagnostic::{ContextId, LogLine, ParseContext};
use crate::support::error::Error;

/// Parses messages according to a fixed configuration.
///
/// A `Parser` holds no state between calls and can be shared freely between
/// threads.
#[derive(Clone, Debug, Default)]
pub struct Parser {
    config: ParserConfig,
}

/// Everything that came out of `Parser::parse_to_outcome`.
#[derive(Debug)]
pub struct ParseOutcome {
    pub result: Result<ParsedMessage, Error>,
    /// Everything logged during the parse, including up to the point of
    /// failure if it failed.
    pub diagnostic_log: Vec<LogLine>,
    pub context_id: ContextId,
}

impl ParseOutcome {
    pub fn message(&self) -> Option<&ParsedMessage> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Parser { config }
    }

    /// Parse one message from `input`, discarding attachments, and capture
    /// the diagnostic log alongside the result.
    pub fn parse_to_outcome(&self, input: impl Read) -> ParseOutcome {
        let mut ctx = ParseContext::new();
        let result = self.parse(input, &mut ctx, &mut ());
        if let Err(ref e) = result {
            ctx.warn(module_path!(), format_args!("Parse failed: {}", e));
        }

        ParseOutcome {
            result,
            context_id: ctx.id(),
            diagnostic_log: ctx.into_lines(),
        }
    }

    /// Parse one message from `input`.
    ///
    /// Every attachment is passed to `sink` as it is found. Problems with
    /// individual header fields or parts are logged to `ctx` and otherwise
    /// tolerated; only I/O errors and messages exceeding the configured
    /// structural limits fail.
    pub fn parse(
        &self,
        input: impl Read,
        ctx: &mut ParseContext,
        sink: &mut (impl AttachmentSink + ?Sized),
    ) -> Result<ParsedMessage, Error> {
        let mut reader = CountingReader::new(input);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let size_bytes = reader.bytes_read();
        ctx.debug(
            module_path!(),
            format_args!("Read {} byte message", size_bytes),
        );

        let root = parse_entity(&data, &self.config, ctx)?;
        let headers = interpret_fields(root.headers.clone(), ctx);

        let mut collector = BodyCollector::new(sink, ctx);
        walk(&root, &mut collector);
        let (body_text, body_html) = collector.finish();

        let date = guess_date(&headers, ctx);

        Ok(ParsedMessage {
            subject: first(&headers, "Subject")
                .map(|h| decode_unstructured(h.value()))
                .unwrap_or_default(),
            message_id: first(&headers, "Message-ID")
                .map(|h| h.value().trim().to_owned()),
            from: first_single(&headers, "From"),
            sender: first_single(&headers, "Sender"),
            reply_to: first_list(&headers, "Reply-To"),
            return_path: first_single(&headers, "Return-Path"),
            to: first_list(&headers, "To"),
            cc: first_list(&headers, "Cc"),
            date,
            references: headers
                .iter()
                .filter(|h| h.is_named("References"))
                .flat_map(|h| h.value().split_whitespace())
                .map(str::to_owned)
                .collect(),
            body_text,
            body_html,
            headers,
            size_bytes,
        })
    }
}

fn first<'a>(headers: &'a [HeaderField], name: &str) -> Option<&'a HeaderField> {
    headers.iter().find(|h| h.is_named(name))
}

fn first_single(headers: &[HeaderField], name: &str) -> Option<Address> {
    headers.iter().find_map(|h| match *h {
        HeaderField::AddressSingle { ref address, .. } if h.is_named(name) => {
            Some(address.clone())
        }
        _ => None,
    })
}

fn first_list(headers: &[HeaderField], name: &str) -> Vec<Address> {
    headers
        .iter()
        .find_map(|h| match *h {
            HeaderField::AddressList { ref addresses, .. }
                if h.is_named(name) =>
            {
                Some(addresses.clone())
            }
            _ => None,
        })
        .unwrap_or_default()
}
