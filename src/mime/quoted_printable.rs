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

use std::borrow::Cow;

use memchr::memchr;

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Length of the soft line break starting right after an `=`, if there is
/// one.
///
/// Whitespace between the `=` and the line ending is tolerated, since
/// RFC 2045 allows transports to add it. An `=` at the very end of the data
/// is treated as a soft line break as well.
fn soft_break_len(s: &[u8]) -> Option<usize> {
    let ws = s.iter().take_while(|&&b| b' ' == b || b'\t' == b).count();
    match &s[ws..] {
        [] => Some(ws),
        [b'\n', ..] => Some(ws + 1),
        [b'\r', b'\n', ..] => Some(ws + 2),
        [b'\r'] => Some(ws + 1),
        _ => None,
    }
}

/// Decodes quoted-printable encoding, as described by RFC 2045.
///
/// Encoded bytes and soft line endings are both handled, the latter by
/// discarding. UNIX line endings are handled as well as DOS line endings.
///
/// This never fails. Invalid sequences are passed through untransformed.
/// 8-bit characters are passed through, including invalid UTF-8.
pub fn qp_decode(s: &[u8]) -> Cow<[u8]> {
    let mut pos = match memchr(b'=', s) {
        Some(pos) => pos,
        None => return Cow::Borrowed(s),
    };

    let mut decoded = Vec::with_capacity(s.len());
    decoded.extend_from_slice(&s[..pos]);

    while pos < s.len() {
        let rest = &s[pos + 1..];
        if let Some(len) = soft_break_len(rest) {
            pos += 1 + len;
        } else if let Some(byte) = rest
            .get(..2)
            .and_then(|hex| Some(hex_value(hex[0])? << 4 | hex_value(hex[1])?))
        {
            decoded.push(byte);
            pos += 3;
        } else {
            decoded.push(b'=');
            pos += 1;
        }

        let next = memchr(b'=', &s[pos..]).map_or(s.len(), |off| pos + off);
        decoded.extend_from_slice(&s[pos..next]);
        pos = next;
    }

    Cow::Owned(decoded)
}
