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

//! Splitting of the header block into individual fields.

use memchr::memchr;

/// One logical header line, unfolded but otherwise uninterpreted.
///
/// A line that does not look like a header field at all has an empty `name`
/// and the whole line as `value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub value: String,
}

/// Iterate the lines of `data`, each including its line ending.
fn lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = data;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }

        let end = memchr(b'\n', rest).map_or(rest.len(), |nl| nl + 1);
        let (line, tail) = rest.split_at(end);
        rest = tail;
        Some(line)
    })
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Split a message into its header block and its body.
///
/// The header block ends at the first empty line; that line belongs to
/// neither half. A message with no empty line is all headers.
pub fn split_header_block(message: &[u8]) -> (&[u8], &[u8]) {
    let mut offset = 0;
    for line in lines(message) {
        if strip_line_ending(line).is_empty() && line.ends_with(b"\n") {
            return (&message[..offset], &message[offset + line.len()..]);
        }
        offset += line.len();
    }

    (message, &[][..])
}

// RFC 5322 2.2 field names are printable ASCII other than ':'. Whitespace
// before the colon is allowed by the obsolete syntax and already trimmed.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b > b' ' && b < 0x7f)
}

fn to_field(line: &[u8]) -> RawField {
    // RFC 6532 allows raw UTF-8 in header values. Stray CRs left over from
    // unfolding are dropped.
    let text = String::from_utf8_lossy(line).replace('\r', "");
    if let Some(colon) = text.find(':') {
        let name = text[..colon].trim_end();
        if is_valid_name(name) {
            return RawField {
                name: name.to_owned(),
                value: text[colon + 1..].trim().to_owned(),
            };
        }
    }

    RawField {
        name: String::new(),
        value: text.trim().to_owned(),
    }
}

/// Split a header block into fields, in order and including duplicates.
///
/// Continuation lines (those starting with a space or tab) are joined onto
/// the preceding line with just the line break removed. This never fails;
/// garbage lines come out as fields with an empty name.
pub fn lex_header_block(block: &[u8]) -> Vec<RawField> {
    let mut logical: Vec<Vec<u8>> = Vec::new();
    for line in lines(block) {
        let content = strip_line_ending(line);
        let is_continuation =
            content.starts_with(b" ") || content.starts_with(b"\t");

        match logical.last_mut() {
            Some(prev) if is_continuation => prev.extend_from_slice(content),
            _ => logical.push(content.to_vec()),
        }
    }

    logical.iter().map(|line| to_field(line)).collect()
}
