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

//! Construction of the MIME entity tree of a message.
//!
//! The whole message is in memory, so unlike a streaming parser this simply
//! slices the buffer up recursively. Every entity owns its decoded content;
//! nothing borrows from the input once the tree is built.

use memchr::memchr;

use super::content_encoding::{
    decode_charset, decode_transfer, parse_content_transfer_encoding,
    ContentTransferEncoding,
};
use super::encoded_word::decode_unstructured;
use super::header::{parse_content_disposition, parse_content_type};
use super::lexer::{lex_header_block, split_header_block, RawField};
use super::model::ContentType;
use crate::support::config::ParserConfig;
use crate::support::diagnostic::ParseContext;
use crate::support::error::Error;

/// One MIME entity: the message itself, a part of a multipart, or an
/// embedded message.
#[derive(Clone, Debug)]
pub struct Entity {
    pub headers: Vec<RawField>,
    pub content_type: ContentType,
    pub body: BodyNode,
}

#[derive(Clone, Debug)]
pub enum BodyNode {
    Container { children: Vec<Entity> },
    EmbeddedMessage { child: Box<Entity> },
    Leaf(Leaf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaf {
    /// The lower-cased disposition type, e.g. `inline` or `attachment`.
    pub disposition: Option<String>,
    /// The `filename` parameter of the disposition.
    pub filename: Option<String>,
    /// The lower-cased `type/subtype`.
    pub mime_type: String,
    /// The decoded text, for `text/*` parts only.
    pub text_content: Option<String>,
    /// The content with transfer encoding removed.
    pub raw_content: Vec<u8>,
}

impl Entity {
    /// The value of the first header called `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn content_id(&self) -> Option<&str> {
        self.header("Content-Id")
    }
}

/// Parse a complete message (or embedded message) into an entity tree.
pub fn parse_entity(
    data: &[u8],
    config: &ParserConfig,
    ctx: &mut ParseContext,
) -> Result<Entity, Error> {
    TreeBuilder {
        config,
        total_parts: 0,
    }
    .entity(data, 0, ContentType::new("text", "plain"), ctx)
}

struct TreeBuilder<'c> {
    config: &'c ParserConfig,
    total_parts: u32,
}

impl TreeBuilder<'_> {
    fn entity(
        &mut self,
        data: &[u8],
        depth: u32,
        default_content_type: ContentType,
        ctx: &mut ParseContext,
    ) -> Result<Entity, Error> {
        self.total_parts += 1;
        if self.total_parts > self.config.max_parts {
            return Err(Error::TooManyParts {
                limit: self.config.max_parts,
            });
        }
        if depth > self.config.max_nesting_depth {
            return Err(Error::NestingTooDeep {
                limit: self.config.max_nesting_depth,
            });
        }

        let (header_block, content) = split_header_block(data);
        let headers = lex_header_block(header_block);
        // Extra or broken Content-Type headers are ignored
        let content_type = headers
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case("Content-Type"))
            .find_map(|h| parse_content_type(h.value.as_bytes()))
            .unwrap_or(default_content_type);

        let body = if content_type.is_type("multipart") {
            match content_type.parameter("boundary") {
                Some(boundary) if !boundary.is_empty() => {
                    let child_default = if "digest" == content_type.subtype {
                        ContentType::new("message", "rfc822")
                    } else {
                        ContentType::new("text", "plain")
                    };

                    let mut children = Vec::new();
                    for part in split_multipart(content, boundary.as_bytes()) {
                        children.push(self.entity(
                            part,
                            depth + 1,
                            child_default.clone(),
                            ctx,
                        )?);
                    }

                    BodyNode::Container { children }
                }

                _ => {
                    ctx.info(
                        module_path!(),
                        format_args!(
                            "{} without boundary treated as opaque",
                            content_type.mime_type()
                        ),
                    );
                    BodyNode::Leaf(leaf(
                        &headers,
                        &content_type,
                        content,
                        self.config,
                        ctx,
                    ))
                }
            }
        } else if content_type.is("message", "rfc822") {
            let cte = transfer_encoding(&headers, ctx);
            let inner = decode_transfer(cte, content, ctx);
            BodyNode::EmbeddedMessage {
                child: Box::new(self.entity(
                    &inner,
                    depth + 1,
                    ContentType::new("text", "plain"),
                    ctx,
                )?),
            }
        } else {
            BodyNode::Leaf(leaf(&headers, &content_type, content, self.config, ctx))
        };

        Ok(Entity {
            headers,
            content_type,
            body,
        })
    }
}

fn transfer_encoding(
    headers: &[RawField],
    ctx: &mut ParseContext,
) -> ContentTransferEncoding {
    let value = match headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("Content-Transfer-Encoding"))
    {
        Some(h) => &h.value,
        None => return ContentTransferEncoding::default(),
    };

    parse_content_transfer_encoding(value).unwrap_or_else(|| {
        ctx.info(
            module_path!(),
            format_args!("Unknown transfer encoding {:?} ignored", value),
        );
        ContentTransferEncoding::default()
    })
}

fn leaf(
    headers: &[RawField],
    content_type: &ContentType,
    content: &[u8],
    config: &ParserConfig,
    ctx: &mut ParseContext,
) -> Leaf {
    let disposition = headers
        .iter()
        .filter(|h| h.name.eq_ignore_ascii_case("Content-Disposition"))
        .find_map(|h| parse_content_disposition(h.value.as_bytes()));

    let cte = transfer_encoding(headers, ctx);
    let raw_content = decode_transfer(cte, content, ctx).into_owned();

    let text_content = if content_type.is_type("text") {
        Some(if config.decode_charset {
            decode_charset(content_type.parameter("charset"), &raw_content, ctx)
        } else {
            String::from_utf8_lossy(&raw_content).into_owned()
        })
    } else {
        None
    };

    Leaf {
        filename: disposition
            .as_ref()
            .and_then(|d| d.parameter("filename"))
            .map(decode_unstructured),
        disposition: disposition.map(|d| d.disposition),
        mime_type: content_type.mime_type(),
        text_content,
        raw_content,
    }
}

/// Strip the line ending that precedes a delimiter line; it belongs to the
/// delimiter and not to the content (RFC 2046 5.1.1).
fn trim_line_ending(content: &[u8]) -> &[u8] {
    if content.ends_with(b"\r\n") {
        &content[..content.len() - 2]
    } else if content.ends_with(b"\n") {
        &content[..content.len() - 1]
    } else {
        content
    }
}

/// Split the content of a multipart into the raw bytes of its parts.
///
/// A delimiter is a line holding `--boundary` and optional trailing
/// whitespace; `--boundary` followed by another `--` is the close delimiter.
/// Lines that merely begin with `--boundary`, like `--boundary2`, are content. The preamble and epilogue are discarded.
/// If the close delimiter is missing, the last part runs to the end of the
/// content.
///
/// Strictly, delimiters may only follow DOS line endings, but UNIX ones are
/// handled too; no sane agent picks a boundary that occurs in a payload only
/// after a bare LF.
fn split_multipart<'a>(content: &'a [u8], boundary: &[u8]) -> Vec<&'a [u8]> {
    let mut delimiter = Vec::with_capacity(boundary.len() + 2);
    delimiter.extend_from_slice(b"--");
    delimiter.extend_from_slice(boundary);

    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut line_start = 0;

    while line_start < content.len() {
        let line_end = memchr(b'\n', &content[line_start..])
            .map_or(content.len(), |nl| line_start + nl + 1);
        let line = &content[line_start..line_end];

        if let Some(close) = delimiter_line(line, &delimiter) {
            if let Some(start) = part_start.take() {
                parts.push(trim_line_ending(&content[start..line_start]));
            }

            if close {
                return parts;
            }

            part_start = Some(line_end);
        }

        line_start = line_end;
    }

    if let Some(start) = part_start {
        parts.push(&content[start..]);
    }

    parts
}

/// If `line` is a delimiter line, whether it is the close delimiter.
fn delimiter_line(line: &[u8], delimiter: &[u8]) -> Option<bool> {
    if !line.starts_with(delimiter) {
        return None;
    }

    let rest = &line[delimiter.len()..];
    if rest.starts_with(b"--") {
        Some(true)
    } else if rest.iter().all(|c| b" \t\r\n".contains(c)) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(message: &str) -> Result<Entity, Error> {
        parse_entity(
            message.replace('\n', "\r\n").as_bytes(),
            &ParserConfig::default(),
            &mut ParseContext::new(),
        )
    }

    fn leaf_of(entity: &Entity) -> &Leaf {
        match entity.body {
            BodyNode::Leaf(ref leaf) => leaf,
            ref other => panic!("Not a leaf: {:?}", other),
        }
    }

    fn children_of(entity: &Entity) -> &[Entity] {
        match entity.body {
            BodyNode::Container { ref children } => children,
            ref other => panic!("Not a container: {:?}", other),
        }
    }

    #[test]
    fn split_simple_multipart() {
        assert_eq!(
            vec![&b"part one"[..], &b"part\r\ntwo\r\n"[..]],
            split_multipart(
                b"preamble\r\n--b\r\npart one\r\n--b \r\npart\r\ntwo\r\n\
                  \r\n--b--\r\nepilogue\r\n",
                b"b"
            )
        );
    }

    #[test]
    fn split_edge_cases() {
        // No preamble, empty part, no close delimiter
        assert_eq!(
            vec![&b""[..], &b"x\n"[..]],
            split_multipart(b"--b\n--b\nx\n", b"b")
        );
        // Boundary must start the line
        assert_eq!(
            vec![&b"a --b\r\nc"[..]],
            split_multipart(b"--b\r\na --b\r\nc\r\n--b--", b"b")
        );
        // No delimiters at all
        assert!(split_multipart(b"just text\r\n", b"b").is_empty());
    }

    #[test]
    fn boundary_prefix_is_not_a_delimiter() {
        assert_eq!(
            vec![&b"one\r\n--bogus\r\n--b2--"[..], &b"two"[..]],
            split_multipart(
                b"--b\r\none\r\n--bogus\r\n--b2--\r\n--b\t \r\ntwo\r\n--b--",
                b"b"
            )
        );

        let entity = parse(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             \n\
             one\n\
             --bb\n\
             still one\n\
             --b--\n",
        )
        .unwrap();
        let children = children_of(&entity);
        assert_eq!(1, children.len());
        assert_eq!(
            Some("one\r\n--bb\r\nstill one"),
            leaf_of(&children[0]).text_content.as_deref()
        );
    }

    #[test]
    fn single_part_defaults() {
        let entity = parse("Subject: foo\n\nhello\n").unwrap();
        assert_eq!("text/plain", entity.content_type.mime_type());
        let leaf = leaf_of(&entity);
        assert_eq!(None, leaf.disposition);
        assert_eq!(Some("hello\r\n"), leaf.text_content.as_deref());
    }

    #[test]
    fn decoded_leaf() {
        let entity = parse(
            "Content-Type: text/plain; charset=ISO-8859-1\n\
             Content-Transfer-Encoding: quoted-printable\n\
             Content-Disposition: attachment;\n\
             \tfilename=\"=?utf-8?Q?r=C3=A9sum=C3=A9.txt?=\"\n\
             \n\
             caf=E9\n",
        )
        .unwrap();
        let leaf = leaf_of(&entity);
        assert_eq!(Some("attachment"), leaf.disposition.as_deref());
        assert_eq!(Some("résumé.txt"), leaf.filename.as_deref());
        assert_eq!(Some("café\r\n"), leaf.text_content.as_deref());
        assert_eq!(b"caf\xe9\r\n".to_vec(), leaf.raw_content);
    }

    #[test]
    fn binary_leaf_has_no_text() {
        let entity = parse(
            "Content-Type: application/octet-stream\n\
             Content-Transfer-Encoding: base64\n\
             \n\
             AAEC\n",
        )
        .unwrap();
        let leaf = leaf_of(&entity);
        assert_eq!(None, leaf.text_content);
        assert_eq!(vec![0u8, 1, 2], leaf.raw_content);
    }

    #[test]
    fn nested_structure() {
        let entity = parse(
            "Content-Type: multipart/mixed; boundary=outer\n\
             \n\
             --outer\n\
             Content-Type: multipart/alternative; boundary=inner\n\
             Content-Id: <alt@example.com>\n\
             \n\
             --inner\n\
             \n\
             plain\n\
             --inner\n\
             Content-Type: text/html\n\
             \n\
             <b>html</b>\n\
             --inner--\n\
             --outer\n\
             Content-Type: message/rfc822\n\
             \n\
             Subject: inner\n\
             \n\
             embedded\n\
             --outer--\n",
        )
        .unwrap();

        let outer = children_of(&entity);
        assert_eq!(2, outer.len());
        assert_eq!(Some("<alt@example.com>"), outer[0].content_id());

        let alternative = children_of(&outer[0]);
        assert_eq!(
            Some("plain"),
            leaf_of(&alternative[0]).text_content.as_deref()
        );
        assert_eq!("text/html", leaf_of(&alternative[1]).mime_type);

        match outer[1].body {
            BodyNode::EmbeddedMessage { ref child } => {
                assert_eq!(Some("inner"), child.header("subject"));
                assert_eq!(
                    Some("embedded"),
                    leaf_of(child).text_content.as_deref()
                );
            }
            ref other => panic!("Unexpected body: {:?}", other),
        }
    }

    #[test]
    fn digest_children_default_to_messages() {
        let entity = parse(
            "Content-Type: multipart/digest; boundary=d\n\
             \n\
             --d\n\
             \n\
             Subject: one\n\
             \n\
             body\n\
             --d--\n",
        )
        .unwrap();
        let children = children_of(&entity);
        assert_matches!(BodyNode::EmbeddedMessage { .. }, &children[0].body);
    }

    #[test]
    fn multipart_without_boundary_is_a_leaf() {
        let entity =
            parse("Content-Type: multipart/mixed\n\n--x\nfoo\n--x--\n").unwrap();
        assert_eq!("multipart/mixed", leaf_of(&entity).mime_type);
    }

    #[test]
    fn limits_enforced() {
        let mut message = String::new();
        for _ in 0..25 {
            message.push_str("Content-Type: message/rfc822\n\n");
        }
        message.push_str("Subject: deep\n\nbody\n");
        assert_matches!(
            Err(Error::NestingTooDeep { limit: 20 }),
            parse(&message)
        );

        let mut message =
            "Content-Type: multipart/mixed; boundary=b\n\n".to_owned();
        for _ in 0..5 {
            message.push_str("--b\n\npart\n");
        }
        assert_matches!(
            Err(Error::TooManyParts { limit: 3 }),
            parse_entity(
                message.as_bytes(),
                &ParserConfig {
                    max_parts: 3,
                    ..ParserConfig::default()
                },
                &mut ParseContext::new(),
            )
        );
    }
}
