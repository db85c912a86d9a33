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

//! The public result of parsing a message.

use std::fmt;

use chrono::prelude::*;
use serde::{Deserialize, Serialize};

use crate::heuristics;

/// Characters stripped from both ends of display names.
///
/// Agents routinely wrap names in extra layers of quotes, sometimes of the
/// typographic variety, which survive the grammar when they are not actually
/// RFC 5322 quoted strings.
const NAME_TRIM: &[char] = &['"', '\'', '“', '”', '‘', '’'];

/// Clean up a display name, returning `None` if nothing is left.
///
/// Surrounding whitespace and quote characters are removed until neither is
/// present, so applying this to its own output changes nothing.
pub fn clean_name(name: &str) -> Option<String> {
    let cleaned =
        name.trim_matches(|c: char| c.is_whitespace() || NAME_TRIM.contains(&c));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_owned())
    }
}

/// A single mailbox.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    name: Option<String>,
    email: String,
}

impl Address {
    /// Build an address, cleaning up `name` per `clean_name`.
    pub fn new(name: Option<&str>, email: impl Into<String>) -> Self {
        Address {
            name: name.and_then(clean_name),
            email: email.into(),
        }
    }

    /// The address representing an explicitly empty `Return-Path: <>`.
    pub fn no_return() -> Self {
        Address {
            name: Some("NORETURN".to_owned()),
            email: "<>".to_owned(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name {
            Some(ref name) => write!(f, "{} <{}>", name, self.email),
            None => write!(f, "{}", self.email),
        }
    }
}

/// One header line of the message, interpreted as far as we know how.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HeaderField {
    Unstructured {
        name: String,
        value: String,
    },
    AddressSingle {
        name: String,
        value: String,
        address: Address,
    },
    AddressList {
        name: String,
        value: String,
        addresses: Vec<Address>,
    },
    Date {
        name: String,
        value: String,
        #[serde(with = "date_format")]
        timestamp: DateTime<Utc>,
    },
    ParseError {
        name: String,
        value: String,
        reason: String,
    },
}

impl HeaderField {
    pub fn name(&self) -> &str {
        match *self {
            HeaderField::Unstructured { ref name, .. }
            | HeaderField::AddressSingle { ref name, .. }
            | HeaderField::AddressList { ref name, .. }
            | HeaderField::Date { ref name, .. }
            | HeaderField::ParseError { ref name, .. } => name,
        }
    }

    /// The raw (unfolded) value of the field.
    pub fn value(&self) -> &str {
        match *self {
            HeaderField::Unstructured { ref value, .. }
            | HeaderField::AddressSingle { ref value, .. }
            | HeaderField::AddressList { ref value, .. }
            | HeaderField::Date { ref value, .. }
            | HeaderField::ParseError { ref value, .. } => value,
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }
}

/// Dates are represented as `yyyy-MM-dd HH:mm:ss` in UTC in every
/// serialised form.
pub(crate) mod date_format {
    use chrono::prelude::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(
        date: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        Utc.datetime_from_str(&s, FORMAT)
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            date: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match *date {
                Some(ref date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) => Utc
                    .datetime_from_str(&s, FORMAT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

/// A fully parsed message.
///
/// Values are only ever produced by the parser and are read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMessage {
    pub(crate) subject: String,
    pub(crate) message_id: Option<String>,
    pub(crate) from: Option<Address>,
    pub(crate) sender: Option<Address>,
    pub(crate) reply_to: Vec<Address>,
    pub(crate) return_path: Option<Address>,
    pub(crate) to: Vec<Address>,
    pub(crate) cc: Vec<Address>,
    #[serde(with = "date_format::option")]
    pub(crate) date: Option<DateTime<Utc>>,
    pub(crate) references: Vec<String>,
    pub(crate) body_text: Option<String>,
    pub(crate) body_html: Option<String>,
    pub(crate) headers: Vec<HeaderField>,
    pub(crate) size_bytes: u64,
}

impl ParsedMessage {
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn from(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    pub fn sender(&self) -> Option<&Address> {
        self.sender.as_ref()
    }

    pub fn reply_to(&self) -> &[Address] {
        &self.reply_to
    }

    pub fn return_path(&self) -> Option<&Address> {
        self.return_path.as_ref()
    }

    pub fn to(&self) -> &[Address] {
        &self.to
    }

    pub fn cc(&self) -> &[Address] {
        &self.cc
    }

    /// The date the message was sent, or a best guess at it.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn body_text(&self) -> Option<&str> {
        self.body_text.as_deref()
    }

    pub fn body_html(&self) -> Option<&str> {
        self.body_html.as_deref()
    }

    /// Every header line of the top-level message, in order.
    pub fn headers(&self) -> &[HeaderField] {
        &self.headers
    }

    /// The size of the raw message in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Format the size for humans, in SI (kB = 1000) or binary (KiB = 1024)
    /// units.
    pub fn readable_size(&self, si: bool) -> String {
        readable_size(self.size_bytes, si)
    }

    pub fn is_auto_message(&self) -> bool {
        heuristics::is_auto_message(&self.headers)
    }

    pub fn is_ooo_subject(&self) -> bool {
        heuristics::is_ooo_subject(&self.subject)
    }

    pub fn is_reply(&self) -> bool {
        heuristics::is_reply(&self.headers, &self.subject)
    }

    pub fn is_forward(&self) -> bool {
        heuristics::is_forward(&self.subject)
    }
}

fn readable_size(size: u64, si: bool) -> String {
    let unit = if si { 1000.0 } else { 1024.0 };
    let prefixes = if si { "kMGTPE" } else { "KMGTPE" };

    if (size as f64) < unit {
        return format!("{} B", size);
    }

    let mut scaled = size as f64;
    let mut prefix = ' ';
    for p in prefixes.chars() {
        if scaled < unit {
            break;
        }
        scaled /= unit;
        prefix = p;
    }

    format!("{:.1} {}{}B", scaled, prefix, if si { "" } else { "i" })
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn name_cleanup() {
        assert_eq!(Some("Name".to_owned()), clean_name("  \"Name\" "));
        assert_eq!(Some("Name".to_owned()), clean_name("“Name”"));
        assert_eq!(Some("Name".to_owned()), clean_name("'\"Name\"'"));
        assert_eq!(
            Some("O'Brien".to_owned()),
            clean_name("O'Brien")
        );
        assert_eq!(None, clean_name(""));
        assert_eq!(None, clean_name(" \"\" "));

        assert_eq!(None, Address::new(Some("  "), "a@b.com").name());
        assert_eq!(
            "Name <a@b.com>",
            Address::new(Some("\"Name\""), "a@b.com").to_string()
        );
        assert_eq!("a@b.com", Address::new(None, "a@b.com").to_string());
    }

    #[test]
    fn readable_sizes() {
        assert_eq!("999 B", readable_size(999, true));
        assert_eq!("1.0 kB", readable_size(1000, true));
        assert_eq!("1000 B", readable_size(1000, false));
        assert_eq!("1.5 KiB", readable_size(1536, false));
        assert_eq!("2.5 MB", readable_size(2_500_000, true));
        assert_eq!("1.0 GiB", readable_size(1 << 30, false));
    }

    #[test]
    fn header_accessors() {
        let field = HeaderField::Date {
            name: "Date".to_owned(),
            value: "Thu, 17 Aug 2017 12:18:33 +0000".to_owned(),
            timestamp: Utc.timestamp(1502972313, 0),
        };
        assert_eq!("Date", field.name());
        assert!(field.is_named("DATE"));
        assert_eq!("Thu, 17 Aug 2017 12:18:33 +0000", field.value());
    }

    proptest! {
        #[test]
        fn name_cleanup_is_idempotent(s in "[ \"'“”‘’a-z]*") {
            let once = clean_name(&s);
            let twice = once.as_deref().and_then(clean_name);
            prop_assert_eq!(once, twice);
        }
    }
}
