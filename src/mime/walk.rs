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

//! Traversal of a built entity tree.

use super::tree::{BodyNode, Entity, Leaf};

/// Receives callbacks as `walk` descends through an entity tree.
///
/// All methods default to doing nothing.
pub trait Visitor {
    /// Called for a multipart entity before any of its children.
    fn container(&mut self, _entity: &Entity) {}

    /// Called for a `message/rfc822` entity before the embedded message.
    fn embedded_message(&mut self, _entity: &Entity) {}

    /// Called for every leaf. `parent` is the entity directly containing
    /// `entity`, if any.
    fn leaf(&mut self, _entity: &Entity, _leaf: &Leaf, _parent: Option<&Entity>) {
    }
}

/// Visit every entity under and including `root`, in document order.
pub fn walk(root: &Entity, visitor: &mut impl Visitor) {
    walk_impl(root, None, visitor);
}

fn walk_impl(
    entity: &Entity,
    parent: Option<&Entity>,
    visitor: &mut impl Visitor,
) {
    match entity.body {
        BodyNode::Container { ref children } => {
            visitor.container(entity);
            for child in children {
                walk_impl(child, Some(entity), visitor);
            }
        }
        BodyNode::EmbeddedMessage { ref child } => {
            visitor.embedded_message(entity);
            walk_impl(child, Some(entity), visitor);
        }
        BodyNode::Leaf(ref leaf) => visitor.leaf(entity, leaf, parent),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mime::tree::parse_entity;
    use crate::support::config::ParserConfig;
    use crate::support::diagnostic::ParseContext;

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl Visitor for Trace {
        fn container(&mut self, entity: &Entity) {
            self.0.push(format!("container {}", entity.content_type.mime_type()));
        }

        fn embedded_message(&mut self, _: &Entity) {
            self.0.push("message".to_owned());
        }

        fn leaf(&mut self, _: &Entity, leaf: &Leaf, parent: Option<&Entity>) {
            self.0.push(format!(
                "leaf {} in {}",
                leaf.mime_type,
                parent.map_or("nothing".to_owned(), |p| p
                    .content_type
                    .mime_type())
            ));
        }
    }

    #[test]
    fn document_order() {
        let entity = parse_entity(
            b"Content-Type: multipart/mixed; boundary=b\r\n\
              \r\n\
              --b\r\n\
              \r\n\
              one\r\n\
              --b\r\n\
              Content-Type: message/rfc822\r\n\
              \r\n\
              Content-Type: image/png\r\n\
              \r\n\
              two\r\n\
              --b\r\n\
              Content-Type: text/html\r\n\
              \r\n\
              three\r\n\
              --b--\r\n",
            &ParserConfig::default(),
            &mut ParseContext::new(),
        )
        .unwrap();

        let mut trace = Trace::default();
        walk(&entity, &mut trace);
        assert_eq!(
            vec![
                "container multipart/mixed",
                "leaf text/plain in multipart/mixed",
                "message",
                "leaf image/png in message/rfc822",
                "leaf text/html in multipart/mixed",
            ],
            trace.0
        );
    }

    #[test]
    fn lone_leaf_has_no_parent() {
        let entity = parse_entity(
            b"Subject: x\r\n\r\nbody",
            &ParserConfig::default(),
            &mut ParseContext::new(),
        )
        .unwrap();

        let mut trace = Trace::default();
        walk(&entity, &mut trace);
        assert_eq!(vec!["leaf text/plain in nothing"], trace.0);
    }
}
