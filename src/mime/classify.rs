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

//! Separation of the readable body of a message from its attachments.

use super::encoded_word::decode_unstructured;
use super::tree::{Entity, Leaf};
use super::walk::Visitor;
use crate::support::diagnostic::ParseContext;

/// A leaf which is not part of the readable body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attachment<'a> {
    pub filename: Option<&'a str>,
    pub mime_type: &'a str,
    /// The `Content-Id` of the entity directly enclosing the leaf.
    pub parent_content_id: Option<&'a str>,
    /// The content with any transfer encoding removed.
    pub content: &'a [u8],
}

/// Receives the attachments of a message as it is parsed.
///
/// Any `FnMut(Attachment)` closure is a sink. `()` discards everything.
pub trait AttachmentSink {
    fn attachment(&mut self, attachment: Attachment<'_>);
}

impl<F: FnMut(Attachment<'_>)> AttachmentSink for F {
    fn attachment(&mut self, attachment: Attachment<'_>) {
        self(attachment)
    }
}

impl AttachmentSink for () {
    fn attachment(&mut self, _: Attachment<'_>) {}
}

/// Collects body candidates into the text and HTML bodies and hands
/// everything else to an `AttachmentSink`.
pub struct BodyCollector<'a, S: ?Sized> {
    sink: &'a mut S,
    ctx: &'a mut ParseContext,
    text: Vec<String>,
    html: Vec<String>,
}

impl<'a, S: AttachmentSink + ?Sized> BodyCollector<'a, S> {
    pub fn new(sink: &'a mut S, ctx: &'a mut ParseContext) -> Self {
        BodyCollector {
            sink,
            ctx,
            text: Vec::new(),
            html: Vec::new(),
        }
    }

    /// Return the `(text, html)` bodies.
    pub fn finish(self) -> (Option<String>, Option<String>) {
        (join_body(self.text, "\n"), join_body(self.html, ""))
    }
}

fn join_body(parts: Vec<String>, separator: &str) -> Option<String> {
    if parts.is_empty() {
        return None;
    }

    Some(
        parts
            .join(separator)
            .replace("\r\n", "\n")
            .replace('\r', "\n"),
    )
}

fn is_body_candidate(leaf: &Leaf, parent: Option<&Entity>) -> bool {
    if leaf.text_content.is_none() {
        return false;
    }

    match leaf.disposition.as_deref() {
        None => true,
        // Inline parts with a name, or inside a related container that gives
        // them an identity, are meant to be referenced rather than read.
        Some("inline") => {
            leaf.filename.is_none()
                && parent.and_then(Entity::content_id).is_none()
        }
        Some(_) => false,
    }
}

impl<S: AttachmentSink + ?Sized> Visitor for BodyCollector<'_, S> {
    fn leaf(&mut self, entity: &Entity, leaf: &Leaf, parent: Option<&Entity>) {
        if is_body_candidate(leaf, parent) {
            if let Some(ref text) = leaf.text_content {
                if "text/html" == leaf.mime_type {
                    self.html.push(text.clone());
                } else {
                    self.text.push(text.clone());
                }
            }
            return;
        }

        let name_param = entity
            .content_type
            .parameter("name")
            .map(decode_unstructured);
        let filename = leaf.filename.as_deref().or(name_param.as_deref());

        self.ctx.debug(
            module_path!(),
            format_args!(
                "Attachment {:?} ({}, {} bytes)",
                filename,
                leaf.mime_type,
                leaf.raw_content.len()
            ),
        );

        self.sink.attachment(Attachment {
            filename,
            mime_type: &leaf.mime_type,
            parent_content_id: parent.and_then(Entity::content_id),
            content: &leaf.raw_content,
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mime::tree::parse_entity;
    use crate::mime::walk::walk;
    use crate::support::config::ParserConfig;

    #[derive(Debug, PartialEq, Eq)]
    struct OwnedAttachment {
        filename: Option<String>,
        mime_type: String,
        parent_content_id: Option<String>,
        content: Vec<u8>,
    }

    fn classify(
        message: &str,
    ) -> (Option<String>, Option<String>, Vec<OwnedAttachment>) {
        let mut ctx = ParseContext::new();
        let entity = parse_entity(
            message.replace('\n', "\r\n").as_bytes(),
            &ParserConfig::default(),
            &mut ctx,
        )
        .unwrap();

        let mut attachments = Vec::new();
        let mut sink = |a: Attachment<'_>| {
            attachments.push(OwnedAttachment {
                filename: a.filename.map(str::to_owned),
                mime_type: a.mime_type.to_owned(),
                parent_content_id: a.parent_content_id.map(str::to_owned),
                content: a.content.to_vec(),
            })
        };
        let mut collector = BodyCollector::new(&mut sink, &mut ctx);
        walk(&entity, &mut collector);
        let (text, html) = collector.finish();
        (text, html, attachments)
    }

    #[test]
    fn plain_message() {
        let (text, html, attachments) = classify("Subject: x\n\nline 1\nline 2\n");
        assert_eq!(Some("line 1\nline 2\n".to_owned()), text);
        assert_eq!(None, html);
        assert!(attachments.is_empty());
    }

    #[test]
    fn empty_body_is_not_absent() {
        let (text, _, _) = classify("Subject: x\n\n");
        assert_eq!(Some(String::new()), text);
    }

    #[test]
    fn alternative_bodies() {
        let (text, html, attachments) = classify(
            "Content-Type: multipart/alternative; boundary=b\n\
             \n\
             --b\n\
             Content-Type: text/html\n\
             \n\
             <p>one</p>\n\
             --b\n\
             Content-Type: text/plain\n\
             \n\
             one\n\
             --b\n\
             Content-Type: text/html\n\
             \n\
             <p>two</p>\n\
             --b--\n",
        );
        assert_eq!(Some("one".to_owned()), text);
        assert_eq!(Some("<p>one</p><p>two</p>".to_owned()), html);
        assert!(attachments.is_empty());
    }

    #[test]
    fn attachments_are_separated() {
        let (text, html, attachments) = classify(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             \n\
             see attached\n\
             --b\n\
             Content-Type: text/plain; name=notes.txt\n\
             Content-Disposition: attachment\n\
             \n\
             notes\n\
             --b\n\
             Content-Type: text/plain\n\
             Content-Disposition: inline; filename=inline.txt\n\
             \n\
             named inline\n\
             --b\n\
             Content-Type: image/png\n\
             Content-Id: <img@x>\n\
             Content-Transfer-Encoding: base64\n\
             \n\
             AAEC\n\
             --b\n\
             Content-Type: text/plain\n\
             Content-Disposition: INLINE\n\
             \n\
             more text\n\
             --b--\n",
        );

        assert_eq!(Some("see attached\nmore text".to_owned()), text);
        assert_eq!(None, html);
        assert_eq!(
            vec![
                OwnedAttachment {
                    filename: Some("notes.txt".to_owned()),
                    mime_type: "text/plain".to_owned(),
                    parent_content_id: None,
                    content: b"notes".to_vec(),
                },
                OwnedAttachment {
                    filename: Some("inline.txt".to_owned()),
                    mime_type: "text/plain".to_owned(),
                    parent_content_id: None,
                    content: b"named inline".to_vec(),
                },
                OwnedAttachment {
                    filename: None,
                    mime_type: "image/png".to_owned(),
                    parent_content_id: None,
                    content: vec![0, 1, 2],
                },
            ],
            attachments
        );
    }

    #[test]
    fn inline_text_in_identified_container_is_attachment() {
        let (text, _, attachments) = classify(
            "Content-Type: multipart/mixed; boundary=outer\n\
             \n\
             --outer\n\
             \n\
             body\n\
             --outer\n\
             Content-Type: multipart/related; boundary=inner\n\
             Content-Id: <rel@x>\n\
             \n\
             --inner\n\
             Content-Disposition: inline\n\
             \n\
             referenced\n\
             --inner--\n\
             --outer--\n",
        );
        assert_eq!(Some("body".to_owned()), text);
        assert_eq!(
            vec![OwnedAttachment {
                filename: None,
                mime_type: "text/plain".to_owned(),
                parent_content_id: Some("<rel@x>".to_owned()),
                content: b"referenced".to_vec(),
            }],
            attachments
        );
    }

    #[test]
    fn attachment_carries_enclosing_content_id() {
        let (_, _, attachments) = classify(
            "Content-Type: multipart/related; boundary=b\n\
             Content-Id: <parent@x>\n\
             \n\
             --b\n\
             Content-Type: text/html\n\
             \n\
             <img src=\"cid:own@x\">\n\
             --b\n\
             Content-Type: image/png\n\
             Content-Id: <own@x>\n\
             \n\
             png\n\
             --b--\n",
        );
        assert_eq!(1, attachments.len());
        assert_eq!(
            Some("<parent@x>".to_owned()),
            attachments[0].parent_content_id
        );
    }

    #[test]
    fn line_endings_normalised() {
        let mut ctx = ParseContext::new();
        let entity = parse_entity(
            b"Content-Type: text/plain\r\n\r\na\r\nb\rc\n",
            &ParserConfig::default(),
            &mut ctx,
        )
        .unwrap();
        let mut discard = ();
        let mut collector = BodyCollector::new(&mut discard, &mut ctx);
        walk(&entity, &mut collector);
        assert_eq!(
            (Some("a\nb\nc\n".to_owned()), None),
            collector.finish()
        );
    }
}
