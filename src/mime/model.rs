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

//! Syntax-level values produced by the header grammar.
//!
//! These still borrow from the raw header text where possible; conversion to
//! the public `Address` type happens in `mime::fields`.

use std::borrow::Cow;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddrSpec<'a> {
    pub local: Vec<Cow<'a, [u8]>>,
    pub domain: Vec<Cow<'a, [u8]>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailboxSpec<'a> {
    pub addr: AddrSpec<'a>,
    pub name: Vec<Cow<'a, [u8]>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSpec<'a> {
    pub name: Vec<Cow<'a, [u8]>>,
    pub boxes: Vec<MailboxSpec<'a>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressSpec<'a> {
    Mailbox(MailboxSpec<'a>),
    Group(GroupSpec<'a>),
}

impl<'a> AddressSpec<'a> {
    /// Flatten a list of addresses into the mailboxes it names, in order.
    ///
    /// Group names are discarded.
    pub fn into_mailboxes(list: Vec<Self>) -> Vec<MailboxSpec<'a>> {
        let mut boxes = Vec::new();
        for address in list {
            match address {
                AddressSpec::Mailbox(m) => boxes.push(m),
                AddressSpec::Group(g) => boxes.extend(g.boxes),
            }
        }
        boxes
    }
}

impl AddrSpec<'_> {
    /// Reassemble the `local@domain` form.
    pub fn to_email(&self) -> String {
        let mut s = join_bytes(&self.local, b'.');
        s.push('@');
        s.push_str(&join_bytes(&self.domain, b'.'));
        s
    }
}

fn join_bytes(parts: &[Cow<[u8]>], delim: u8) -> String {
    let mut accum = Vec::new();
    for (ix, part) in parts.iter().enumerate() {
        if ix > 0 {
            accum.push(delim);
        }
        accum.extend_from_slice(part);
    }
    String::from_utf8_lossy(&accum).into_owned()
}

/// A parsed `Content-Type` header.
///
/// The type, subtype, and parameter names are lower-cased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentType {
    pub typ: String,
    pub subtype: String,
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    pub fn new(typ: &str, subtype: &str) -> Self {
        ContentType {
            typ: typ.to_owned(),
            subtype: subtype.to_owned(),
            parameters: vec![],
        }
    }

    pub fn is_type(&self, typ: &str) -> bool {
        self.typ.eq_ignore_ascii_case(typ)
    }

    pub fn is(&self, typ: &str, subtype: &str) -> bool {
        self.is_type(typ) && self.subtype.eq_ignore_ascii_case(subtype)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        find_parameter(&self.parameters, name)
    }

    /// The `type/subtype` string.
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.typ, self.subtype)
    }
}

/// A parsed `Content-Disposition` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentDisposition {
    pub disposition: String,
    pub parameters: Vec<(String, String)>,
}

impl ContentDisposition {
    pub fn parameter(&self, name: &str) -> Option<&str> {
        find_parameter(&self.parameters, name)
    }
}

fn find_parameter<'a>(
    parameters: &'a [(String, String)],
    name: &str,
) -> Option<&'a str> {
    parameters
        .iter()
        .find(|&&(ref k, _)| k.eq_ignore_ascii_case(name))
        .map(|&(_, ref v)| v.as_str())
}
