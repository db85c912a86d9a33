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

//! Interpretation of raw header fields into `HeaderField`s.

use chrono::prelude::*;

use super::encoded_word::decode_phrase;
use super::header::{
    parse_address_list, parse_datetime, parse_mailbox, SyntaxError,
};
use super::lexer::RawField;
use super::model::{AddressSpec, MailboxSpec};
use crate::message::{Address, HeaderField};
use crate::support::diagnostic::ParseContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldKind {
    Date,
    /// An address list of which only the first mailbox is kept.
    FirstMailbox,
    Mailbox,
    ReturnPath,
    AddressList,
    Unstructured,
}

fn field_kind(name: &str) -> FieldKind {
    const KINDS: &[(&str, FieldKind)] = &[
        ("Date", FieldKind::Date),
        ("Resent-Date", FieldKind::Date),
        ("From", FieldKind::FirstMailbox),
        ("Resent-From", FieldKind::FirstMailbox),
        ("Sender", FieldKind::Mailbox),
        ("Resent-Sender", FieldKind::Mailbox),
        ("Return-Path", FieldKind::ReturnPath),
        ("Reply-To", FieldKind::AddressList),
        ("To", FieldKind::AddressList),
        ("Cc", FieldKind::AddressList),
        ("Bcc", FieldKind::AddressList),
        ("Resent-To", FieldKind::AddressList),
        ("Resent-Cc", FieldKind::AddressList),
        ("Resent-Bcc", FieldKind::AddressList),
    ];

    KINDS
        .iter()
        .find(|&&(n, _)| n.eq_ignore_ascii_case(name))
        .map_or(FieldKind::Unstructured, |&(_, kind)| kind)
}

fn to_address(mailbox: MailboxSpec<'_>) -> Address {
    let email = mailbox.addr.to_email();
    let name = decode_phrase(mailbox.name);
    Address::new(Some(&name), email)
}

/// Interpret one raw field.
///
/// Values that do not match the grammar their field calls for are kept as
/// `HeaderField::ParseError`; the reason is also logged to `ctx`.
pub fn interpret_field(field: RawField, ctx: &mut ParseContext) -> HeaderField {
    let RawField { name, value } = field;

    if name.is_empty() {
        ctx.info(
            module_path!(),
            format_args!("Header line without field name: {:?}", value),
        );
        return HeaderField::ParseError {
            name,
            value,
            reason: "header line has no field name".to_owned(),
        };
    }

    let bytes = value.as_bytes();
    let interpreted: Result<Option<Interpreted>, SyntaxError> =
        match field_kind(&name) {
            FieldKind::Unstructured => Ok(None),
            FieldKind::Date => parse_datetime(bytes)
                .map(|d| Some(Interpreted::Date(d.with_timezone(&Utc)))),
            FieldKind::FirstMailbox => parse_address_list(bytes).and_then(|list| {
                AddressSpec::into_mailboxes(list)
                    .into_iter()
                    .next()
                    .map(|m| Some(Interpreted::Single(to_address(m))))
                    .ok_or(SyntaxError::NoMailbox)
            }),
            FieldKind::ReturnPath if "<>" == value.trim() => {
                Ok(Some(Interpreted::Single(Address::no_return())))
            }
            FieldKind::Mailbox | FieldKind::ReturnPath => parse_mailbox(bytes)
                .map(|m| Some(Interpreted::Single(to_address(m)))),
            FieldKind::AddressList => parse_address_list(bytes).map(|list| {
                Some(Interpreted::List(
                    AddressSpec::into_mailboxes(list)
                        .into_iter()
                        .map(to_address)
                        .collect(),
                ))
            }),
        };

    match interpreted {
        Ok(None) => HeaderField::Unstructured { name, value },
        Ok(Some(Interpreted::Date(timestamp))) => HeaderField::Date {
            name,
            value,
            timestamp,
        },
        Ok(Some(Interpreted::Single(address))) => HeaderField::AddressSingle {
            name,
            value,
            address,
        },
        Ok(Some(Interpreted::List(addresses))) => HeaderField::AddressList {
            name,
            value,
            addresses,
        },
        Err(e) => {
            ctx.info(
                module_path!(),
                format_args!("Bad {} header {:?}: {}", name, value, e),
            );
            HeaderField::ParseError {
                name,
                value,
                reason: e.to_string(),
            }
        }
    }
}

enum Interpreted {
    Date(DateTime<Utc>),
    Single(Address),
    List(Vec<Address>),
}

/// Interpret every field of a header block, preserving order and
/// duplicates.
pub fn interpret_fields(
    fields: Vec<RawField>,
    ctx: &mut ParseContext,
) -> Vec<HeaderField> {
    fields
        .into_iter()
        .map(|field| interpret_field(field, ctx))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn interpret(name: &str, value: &str) -> HeaderField {
        interpret_field(
            RawField {
                name: name.to_owned(),
                value: value.to_owned(),
            },
            &mut ParseContext::new(),
        )
    }

    #[test]
    fn unstructured_fields() {
        assert_eq!(
            HeaderField::Unstructured {
                name: "Subject".to_owned(),
                value: "Test Subject".to_owned(),
            },
            interpret("Subject", "Test Subject")
        );
        assert_matches!(
            HeaderField::Unstructured { .. },
            interpret("X-From", "not <an address")
        );
    }

    #[test]
    fn date_fields() {
        assert_eq!(
            HeaderField::Date {
                name: "date".to_owned(),
                value: "Thu, 17 Aug 2017 14:18:33 +0200".to_owned(),
                timestamp: Utc.timestamp(1502972313, 0),
            },
            interpret("date", "Thu, 17 Aug 2017 14:18:33 +0200")
        );
        assert_matches!(
            HeaderField::Date { .. },
            interpret("Resent-Date", "17 Aug 2017 12:18:33 GMT")
        );
        assert_matches!(
            HeaderField::ParseError { .. },
            interpret("Date", "last Tuesday")
        );
    }

    #[test]
    fn from_takes_first_mailbox() {
        assert_eq!(
            HeaderField::AddressSingle {
                name: "From".to_owned(),
                value: "\"Name\" <a@b.com>, c@d.com".to_owned(),
                address: Address::new(Some("Name"), "a@b.com"),
            },
            interpret("From", "\"Name\" <a@b.com>, c@d.com")
        );

        match interpret("From", "undisclosed-recipients:;") {
            HeaderField::ParseError { reason, .. } => {
                assert_eq!(SyntaxError::NoMailbox.to_string(), reason)
            }
            other => panic!("Unexpected field: {:?}", other),
        }
    }

    #[test]
    fn encoded_display_names() {
        assert_eq!(
            HeaderField::AddressSingle {
                name: "Sender".to_owned(),
                value: "=?ISO-8859-1?Q?Andr=E9?= Pirard <PIRARD@vm1.ulg.ac.be>"
                    .to_owned(),
                address: Address::new(Some("André Pirard"), "PIRARD@vm1.ulg.ac.be"),
            },
            interpret(
                "Sender",
                "=?ISO-8859-1?Q?Andr=E9?= Pirard <PIRARD@vm1.ulg.ac.be>"
            )
        );
    }

    #[test]
    fn return_path() {
        assert_eq!(
            HeaderField::AddressSingle {
                name: "Return-Path".to_owned(),
                value: "<>".to_owned(),
                address: Address::no_return(),
            },
            interpret("Return-Path", "<>")
        );
        assert_matches!(
            HeaderField::AddressSingle { .. },
            interpret("Return-Path", "<bounce@example.com>")
        );
    }

    #[test]
    fn address_lists() {
        match interpret("CC", "Name <cc@email.com>, cc2@email.com") {
            HeaderField::AddressList { addresses, .. } => assert_eq!(
                vec![
                    Address::new(Some("Name"), "cc@email.com"),
                    Address::new(None, "cc2@email.com"),
                ],
                addresses
            ),
            other => panic!("Unexpected field: {:?}", other),
        }

        match interpret("Bcc", "") {
            HeaderField::AddressList { addresses, .. } => {
                assert!(addresses.is_empty())
            }
            other => panic!("Unexpected field: {:?}", other),
        }

        assert_matches!(
            HeaderField::ParseError { .. },
            interpret("To", "<<<")
        );
        assert_matches!(
            HeaderField::ParseError { .. },
            interpret("To", &"(".repeat(100_000))
        );
    }

    #[test]
    fn nameless_lines() {
        let mut ctx = ParseContext::new();
        let fields = interpret_fields(
            vec![
                RawField {
                    name: String::new(),
                    value: "garbage".to_owned(),
                },
                RawField {
                    name: "Subject".to_owned(),
                    value: "x".to_owned(),
                },
            ],
            &mut ctx,
        );
        assert_eq!(
            HeaderField::ParseError {
                name: String::new(),
                value: "garbage".to_owned(),
                reason: "header line has no field name".to_owned(),
            },
            fields[0]
        );
        assert!(fields[1].is_named("subject"));
        assert_eq!(1, ctx.lines().len());
    }
}
