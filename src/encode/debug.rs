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

use std::io::Write;

use super::Encoder;
use crate::message::{date_format, Address, ParsedMessage};
use crate::support::error::Error;

/// Human-readable summary of the interesting parts of a message.
#[derive(Clone, Copy, Debug, Default)]
pub struct DebugEncoder;

fn join(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(Address::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Encoder for DebugEncoder {
    fn encode(
        &self,
        message: &ParsedMessage,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        writeln!(out, "Size: {}", message.readable_size(true))?;
        writeln!(out, "Subject: {}", message.subject())?;
        match message.date() {
            Some(date) => {
                writeln!(out, "Date: {}", date.format(date_format::FORMAT))?
            }
            None => writeln!(out, "Date:")?,
        }
        match message.from() {
            Some(from) => writeln!(out, "From: {}", from)?,
            None => writeln!(out, "From:")?,
        }

        for &(label, addresses) in &[
            ("To", message.to()),
            ("Cc", message.cc()),
        ] {
            if !addresses.is_empty() {
                writeln!(out, "{}: {}", label, join(addresses))?;
            }
        }
        if let Some(sender) = message.sender() {
            writeln!(out, "Sender: {}", sender)?;
        }
        if !message.reply_to().is_empty() {
            writeln!(out, "Reply-To: {}", join(message.reply_to()))?;
        }
        if let Some(return_path) = message.return_path() {
            writeln!(out, "Return-Path: {}", return_path)?;
        }
        if let Some(message_id) = message.message_id() {
            writeln!(out, "Message-ID: {}", message_id)?;
        }
        writeln!(out)?;

        let both = message.body_html().is_some() && message.body_text().is_some();
        if let Some(html) = message.body_html() {
            if both {
                writeln!(out, "HTML:")?;
            }
            writeln!(out, "{}", html)?;
        }
        if let Some(text) = message.body_text() {
            if both {
                writeln!(out, "Text:")?;
            }
            writeln!(out, "{}", text)?;
        }

        Ok(())
    }
}
