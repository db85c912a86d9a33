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

//! Sample messages used by tests throughout the crate.
//!
//! All use DOS line endings.

/// A single-part plain text message with the common address headers.
pub static SIMPLE_TEXT: &[u8] = include_bytes!("simple-text.eml");

/// A single-part HTML message with no `Date` header.
pub static SIMPLE_HTML: &[u8] = include_bytes!("simple-html.eml");

/// `multipart/alternative` with quoted-printable Latin-1 text and base64 HTML,
/// plus encoded words in the headers.
pub static SIMPLE_MULTI: &[u8] = include_bytes!("simple-multi.eml");

/// A reply with a `multipart/related` HTML body, an inline image, and two
/// attachments.
pub static ATTACHMENTS: &[u8] = include_bytes!("attachments.eml");

/// A mailing list `multipart/digest` of two messages.
pub static DIGEST: &[u8] = include_bytes!("digest.eml");

/// Almost nothing in this message is well-formed.
pub static MALFORMED: &[u8] = include_bytes!("malformed.eml");

/// An automatic reply in windows-1252.
pub static OUT_OF_OFFICE: &[u8] = include_bytes!("out-of-office.eml");

pub static ALL: &[&[u8]] = &[
    SIMPLE_TEXT,
    SIMPLE_HTML,
    SIMPLE_MULTI,
    ATTACHMENTS,
    DIGEST,
    MALFORMED,
    OUT_OF_OFFICE,
];
