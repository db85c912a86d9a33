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

//! RFC 2047 "encoded words" and the header text that may contain them.

use std::borrow::Cow;

use encoding_rs::Encoding;
use lazy_static::lazy_static;
use regex::Regex;

use super::quoted_printable::qp_decode;

lazy_static! {
    static ref ENCODED_WORD: Regex =
        Regex::new(r"^=\?([!->@-~]*)\?([!->@-~]*)\?([!->@-~]*)\?=$").unwrap();
}

/// Test if `word` (in its entirety) is an RFC 2047 "encoded word".
///
/// If it is, decode it and return its decoded value.
///
/// Returns `None` if it is not an encoded word or if it could not be decoded.
/// The distinction from "unchanged" matters because whitespace between
/// adjacent encoded words is deleted, but left alone everywhere else.
///
/// RFC 2047 limits encoded words to 75 characters. Plenty of agents produce
/// longer ones and other readers accept them, so no limit is enforced.
pub fn ew_decode(word: &str) -> Option<String> {
    let captures = ENCODED_WORD.captures(word)?;

    // RFC 2231 allows a language suffix on the charset ("us-ascii*en")
    let charset = captures.get(1)?.as_str().split('*').next()?;
    let transfer_encoding = captures.get(2)?.as_str();
    let content = captures.get(3)?.as_str().as_bytes();

    let content = decode_xfer(transfer_encoding, content)?;
    decode_charset(charset, &content)
}

fn decode_xfer(xfer: &str, content: &[u8]) -> Option<Vec<u8>> {
    match xfer {
        "q" | "Q" => {
            // _ in the content (before transfer decoding) stands for ASCII
            // space regardless of charset
            let content = content
                .iter()
                .map(|&b| if b'_' == b { b' ' } else { b })
                .collect::<Vec<u8>>();
            Some(qp_decode(&content).into_owned())
        }
        // Some agents leave the padding off
        "b" | "B" => base64::decode_config(content, base64::STANDARD)
            .or_else(|_| {
                base64::decode_config(content, base64::STANDARD_NO_PAD)
            })
            .ok(),
        _ => None,
    }
}

fn decode_charset(charset: &str, content: &[u8]) -> Option<String> {
    Some(
        Encoding::for_label_no_replacement(charset.as_bytes())?
            .decode_with_bom_removal(content)
            .0
            .into_owned(),
    )
}

/// Decode all encoded words found in unstructured header text.
///
/// Words are delimited by whitespace. Whitespace between two encoded words is
/// removed; all other text is passed through as-is.
pub fn ew_decode_unstructured(text: &str) -> Cow<str> {
    if !text.contains("=?") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut prev_encoded = false;
    let mut rest = text;
    while !rest.is_empty() {
        let ws_len = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or_else(|| rest.len());
        let (ws, tail) = rest.split_at(ws_len);
        let word_len =
            tail.find(char::is_whitespace).unwrap_or_else(|| tail.len());
        let (word, tail) = tail.split_at(word_len);
        rest = tail;

        match ew_decode(word) {
            Some(decoded) => {
                if !prev_encoded {
                    out.push_str(ws);
                }
                out.push_str(&decoded);
                prev_encoded = true;
            }
            None => {
                out.push_str(ws);
                out.push_str(word);
                prev_encoded = false;
            }
        }
    }

    Cow::Owned(out)
}

fn to_utf8(cow: Cow<[u8]>) -> String {
    match cow {
        Cow::Owned(owned) => match String::from_utf8(owned) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        },
        Cow::Borrowed(borrowed) => {
            String::from_utf8_lossy(borrowed).into_owned()
        }
    }
}

/// Decode a display-name phrase into a single string.
///
/// Words are joined by single spaces, then encoded words are decoded.
pub fn decode_phrase(phrase: Vec<Cow<[u8]>>) -> String {
    let mut accum = Vec::new();
    for (ix, word) in phrase.into_iter().enumerate() {
        if ix > 0 {
            accum.push(b' ');
        }

        match word {
            Cow::Owned(mut owned) => accum.append(&mut owned),
            Cow::Borrowed(borrowed) => accum.extend_from_slice(borrowed),
        }
    }

    ew_decode_unstructured(&to_utf8(Cow::Owned(accum))).into_owned()
}

/// Decode unstructured header text: unfold it, trim it, and decode encoded
/// words.
pub fn decode_unstructured(s: &str) -> String {
    let unfolded = if s.contains(|c| '\r' == c || '\n' == c) {
        Cow::Owned(s.replace(|c| '\r' == c || '\n' == c, ""))
    } else {
        Cow::Borrowed(s)
    };

    ew_decode_unstructured(unfolded.trim()).into_owned()
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_ew_decode() {
        assert_eq!(None, ew_decode("hello world"));

        // Examples from RFC 2047
        assert_eq!(
            "Keith Moore",
            ew_decode("=?US-ASCII?Q?Keith_Moore?=").unwrap()
        );
        assert_eq!(
            "Keld Jørn Simonsen",
            ew_decode("=?ISO-8859-1?Q?Keld_J=F8rn_Simonsen?=").unwrap()
        );
        assert_eq!("André", ew_decode("=?ISO-8859-1?Q?Andr=E9?=").unwrap());
        assert_eq!(
            "If you can read this yo",
            ew_decode("=?ISO-8859-1?B?SWYgeW91IGNhbiByZWFkIHRoaXMgeW8=?=")
                .unwrap()
        );
        assert_eq!(
            "םולש ןב ילטפנ",
            ew_decode("=?iso-8859-8?b?7eXs+SDv4SDp7Oj08A==?=").unwrap()
        );
        assert_eq!("a", ew_decode("=?US-ASCII*EN?Q?a?=").unwrap());
        assert_eq!("hi", ew_decode("=?utf-8?B?aGk?=").unwrap());

        assert_eq!(None, ew_decode("=?x-no-such-charset?Q?a?="));
        assert_eq!(None, ew_decode("=?utf-8?X?a?="));
    }

    #[test]
    fn test_ew_decode_unstructured() {
        // More examples from RFC 2047
        assert_eq!("a b", ew_decode_unstructured("=?ISO-8859-1?Q?a?= b"));
        assert_eq!(
            "ab",
            ew_decode_unstructured("=?ISO-8859-1?Q?a?= =?ISO-8859-1?Q?b?=")
        );
        assert_eq!(
            "ab",
            ew_decode_unstructured(
                "=?ISO-8859-1?Q?a?=\r\n    =?ISO-8859-1?Q?b?="
            )
        );
        assert_eq!("a b", ew_decode_unstructured("=?ISO-8859-1?Q?a_b?="));
        assert_eq!(
            "Re: Grüße ok",
            ew_decode_unstructured("Re: =?utf-8?Q?Gr=C3=BC=C3=9Fe?= ok")
        );
        assert_matches!(
            Cow::Borrowed("nothing to see"),
            ew_decode_unstructured("nothing to see")
        );
    }

    #[test]
    fn test_decode_phrase() {
        assert_eq!(
            "Keld Jørn Simonsen",
            decode_phrase(vec![Cow::Borrowed(
                &b"=?ISO-8859-1?Q?Keld_J=F8rn_Simonsen?="[..]
            )])
        );
        assert_eq!(
            "John Q. Public",
            decode_phrase(vec![
                Cow::Borrowed(&b"John"[..]),
                Cow::Owned(b"Q.".to_vec()),
                Cow::Borrowed(&b"Public"[..]),
            ])
        );
    }

    #[test]
    fn test_decode_unstructured() {
        assert_eq!(
            "Test Subject",
            decode_unstructured("  Test\r\n Subject\r\n")
        );
        assert_eq!(
            "Grüße aus Köln",
            decode_unstructured(
                "=?utf-8?Q?Gr=C3=BC=C3=9Fe_aus?=\r\n =?utf-8?Q?_K=C3=B6ln?="
            )
        );
    }

    proptest! {
        #[test]
        fn ew_decode_never_panics(s in r"=\?.*\?.*\?.*\?=") {
            ew_decode(&s);
        }

        #[test]
        fn ew_decode_unstructured_never_panics(s in ".*") {
            ew_decode_unstructured(&s);
        }
    }
}
