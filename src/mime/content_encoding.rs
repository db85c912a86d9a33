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

//! Decoding of leaf content: transfer encoding first, then charset.

use std::borrow::Cow;

use super::quoted_printable::qp_decode;
use crate::support::diagnostic::ParseContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    SevenBit,
    EightBit,
    Binary,
    Base64,
    QuotedPrintable,
}

impl Default for ContentTransferEncoding {
    fn default() -> Self {
        ContentTransferEncoding::SevenBit
    }
}

/// Parse a `Content-Transfer-Encoding` value. Unknown encodings give `None`.
pub fn parse_content_transfer_encoding(
    value: &str,
) -> Option<ContentTransferEncoding> {
    use self::ContentTransferEncoding as CTE;

    let value = value.trim();
    if value.eq_ignore_ascii_case("7bit") {
        Some(CTE::SevenBit)
    } else if value.eq_ignore_ascii_case("8bit") {
        Some(CTE::EightBit)
    } else if value.eq_ignore_ascii_case("binary") {
        Some(CTE::Binary)
    } else if value.eq_ignore_ascii_case("base64") {
        Some(CTE::Base64)
    } else if value.eq_ignore_ascii_case("quoted-printable") {
        Some(CTE::QuotedPrintable)
    } else {
        None
    }
}

/// Undo the transfer encoding of `data`.
///
/// Base64 is decoded leniently: anything outside the base64 alphabet is
/// dropped and a truncated final group is ignored. If decoding still fails,
/// the raw data is returned.
pub fn decode_transfer<'a>(
    cte: ContentTransferEncoding,
    data: &'a [u8],
    ctx: &mut ParseContext,
) -> Cow<'a, [u8]> {
    use self::ContentTransferEncoding as CTE;

    match cte {
        CTE::SevenBit | CTE::EightBit | CTE::Binary => Cow::Borrowed(data),
        CTE::QuotedPrintable => qp_decode(data),
        CTE::Base64 => {
            let alphabet = data
                .iter()
                .copied()
                .filter(|&b| {
                    b.is_ascii_alphanumeric()
                        || b'+' == b
                        || b'/' == b
                        || b'=' == b
                })
                .collect::<Vec<u8>>();
            let usable_length = alphabet.len() / 4 * 4;

            let mut decoded = Vec::with_capacity(usable_length / 4 * 3);
            match base64::decode_config_buf(
                &alphabet[..usable_length],
                base64::STANDARD,
                &mut decoded,
            ) {
                Ok(()) => Cow::Owned(decoded),
                Err(e) => {
                    ctx.warn(
                        module_path!(),
                        format_args!("Bad base64 content, kept raw: {}", e),
                    );
                    Cow::Borrowed(data)
                }
            }
        }
    }
}

/// Decode text content from `charset` (default US-ASCII) into a `String`.
///
/// Unknown charsets are treated as UTF-8, with invalid sequences replaced.
pub fn decode_charset(
    charset: Option<&str>,
    data: &[u8],
    ctx: &mut ParseContext,
) -> String {
    let label = charset.unwrap_or("us-ascii");
    match encoding_rs::Encoding::for_label_no_replacement(label.as_bytes()) {
        Some(encoding) => {
            encoding.decode_with_bom_removal(data).0.into_owned()
        }
        None => {
            ctx.info(
                module_path!(),
                format_args!("Unknown charset {:?}, assuming UTF-8", label),
            );
            String::from_utf8_lossy(data).into_owned()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decode(cte: ContentTransferEncoding, data: &[u8]) -> Vec<u8> {
        decode_transfer(cte, data, &mut ParseContext::new()).into_owned()
    }

    #[test]
    fn transfer_encodings() {
        use super::ContentTransferEncoding as CTE;

        assert_eq!(b"hello\r\n".to_vec(), decode(CTE::SevenBit, b"hello\r\n"));
        assert_eq!(
            b"hello world".to_vec(),
            decode(CTE::Base64, b"aGVsbG8g\r\nd29ybGQ=\r\n")
        );
        assert_eq!(
            b"hello".to_vec(),
            decode(CTE::Base64, b" aGVs*bG8=\r\n\r\n")
        );
        assert_eq!(b"hel".to_vec(), decode(CTE::Base64, b"aGVsbG"));
        assert_eq!(
            b"caf\xe9 ok".to_vec(),
            decode(CTE::QuotedPrintable, b"caf=E9=\r\n ok")
        );
    }

    #[test]
    fn transfer_encoding_names() {
        use super::ContentTransferEncoding as CTE;

        assert_eq!(
            Some(CTE::Base64),
            parse_content_transfer_encoding(" BASE64 ")
        );
        assert_eq!(
            Some(CTE::QuotedPrintable),
            parse_content_transfer_encoding("Quoted-Printable")
        );
        assert_eq!(None, parse_content_transfer_encoding("x-uuencode"));
    }

    #[test]
    fn charsets() {
        let mut ctx = ParseContext::new();
        assert_eq!("café", decode_charset(Some("ISO-8859-1"), b"caf\xe9", &mut ctx));
        assert_eq!("café", decode_charset(Some("utf-8"), "café".as_bytes(), &mut ctx));
        assert_eq!("plain", decode_charset(None, b"plain", &mut ctx));
        assert!(ctx.lines().is_empty());

        assert_eq!(
            "caf\u{fffd}",
            decode_charset(Some("x-unknown"), b"caf\xe9", &mut ctx)
        );
        assert_eq!(1, ctx.lines().len());
    }
}
