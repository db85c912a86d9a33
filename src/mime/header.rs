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

//! Grammar for the structured header fields we care about.
//!
//! This follows RFC 5322, including the RFC 2822 4.4 "obsolete" syntax which
//! is still produced by real agents, and the RFC 6532 amendments which allow
//! raw UTF-8. The grammar is applied to header values that have already been
//! unfolded, but line breaks are still tolerated as plain whitespace.
//!
//! All parsers here are complete-input parsers: reaching the end of the value
//! is never "incomplete", it is just the end.

use std::borrow::Cow;

use chrono::prelude::*;
use nom::{
    branch::alt,
    bytes::complete::{is_a, is_not, take, take_while1, take_while_m_n},
    character::complete::char,
    combinator::{map, map_opt, opt},
    multi::{
        fold_many0, many0, many0_count, many1_count, separated_nonempty_list,
    },
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

use super::model::*;

/// Why a structured header value was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("Unparseable text at {0:?}")]
    Unparseable(String),
    #[error("Unexpected trailing text {0:?}")]
    TrailingText(String),
    #[error("No mailbox found")]
    NoMailbox,
    #[error("Date does not name a real point in time")]
    ImpossibleDate,
    #[error("Comments nested more than {0} levels deep")]
    CommentTooDeep(u32),
}

/// Deepest comment nesting the grammar will descend into.
const MAX_COMMENT_DEPTH: u32 = 64;

/// Whether `s` nests comments more deeply than `MAX_COMMENT_DEPTH`.
///
/// `comment` is recursive, so this must be checked before any parser which
/// accepts CFWS is run.
fn comments_too_deep(s: &[u8]) -> bool {
    let mut depth = 0u32;
    let mut quoted = false;
    let mut bytes = s.iter();
    while let Some(&c) = bytes.next() {
        match c {
            b'\\' => {
                bytes.next();
            }
            b'"' if 0 == depth => quoted = !quoted,
            b'(' if !quoted => {
                depth += 1;
                if depth > MAX_COMMENT_DEPTH {
                    return true;
                }
            }
            b')' if !quoted => depth = depth.saturating_sub(1),
            _ => (),
        }
    }

    false
}

fn snippet(s: &[u8]) -> String {
    String::from_utf8_lossy(&s[..s.len().min(40)]).into_owned()
}

/// Run `parser` over `input`, requiring it to consume everything.
fn complete<'a, T>(
    parser: impl Fn(&'a [u8]) -> IResult<&'a [u8], T>,
    input: &'a [u8],
) -> Result<T, SyntaxError> {
    if comments_too_deep(input) {
        return Err(SyntaxError::CommentTooDeep(MAX_COMMENT_DEPTH));
    }

    match parser(input) {
        Ok((rest, value)) if rest.is_empty() => Ok(value),
        Ok((rest, _)) => Err(SyntaxError::TrailingText(snippet(rest))),
        Err(nom::Err::Error((rest, _)))
        | Err(nom::Err::Failure((rest, _))) => {
            Err(SyntaxError::Unparseable(snippet(rest)))
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(SyntaxError::Unparseable(String::new()))
        }
    }
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

// Only ever called on runs of ASCII digits no longer than 4.
fn number(s: &[u8]) -> u32 {
    s.iter()
        .fold(0, |accum, &d| accum * 10 + u32::from(d.wrapping_sub(b'0')))
}

// RFC 5322 3.2.1 "quoted-pair", including the 8-bit clean obsolete syntax
fn quoted_pair(i: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(char('\\'), take(1usize))(i)
}

// RFC 5322 3.2.2 "Folding white space", collapsed to a single space.
fn fws(i: &[u8]) -> IResult<&[u8], &[u8]> {
    map(is_a(" \t\r\n"), |_| &b" "[..])(i)
}

// RFC 5322 3.2.2 "Comment text"
fn ctext(i: &[u8]) -> IResult<&[u8], &[u8]> {
    is_not("()\\ \t\r\n")(i)
}

// RFC 5322 3.2.2 "Comment content".
// FWS is moved in here from the comment production itself, which is
// equivalent and much simpler.
fn ccontent(i: &[u8]) -> IResult<&[u8], ()> {
    alt((
        map(ctext, |_| ()),
        map(quoted_pair, |_| ()),
        map(fws, |_| ()),
        comment,
    ))(i)
}

// RFC 5322 3.2.2 "Comment". Note it is recursive.
fn comment(i: &[u8]) -> IResult<&[u8], ()> {
    delimited(char('('), map(many0_count(ccontent), |_| ()), char(')'))(i)
}

// RFC 5322 3.2.2 "Comment or folding white space". Always optional here, so
// this matches the empty string too.
fn cfws(i: &[u8]) -> IResult<&[u8], ()> {
    map(many0_count(alt((map(fws, |_| ()), comment))), |_| ())(i)
}

// RFC 5322 3.2.3 "Atom text", amended by RFC 6532 to include all non-ASCII
fn is_atext(ch: u8) -> bool {
    ch.is_ascii_alphanumeric()
        || b"!#$%&'*+-/=?^_`{|}~".contains(&ch)
        || ch >= 0x80
}

fn atext(i: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(is_atext)(i)
}

// RFC 5322 3.2.3 "Atom"
fn atom(i: &[u8]) -> IResult<&[u8], &[u8]> {
    delimited(cfws, atext, cfws)(i)
}

// RFC 5322 3.2.4 "Quoted [string] text", amended by RFC 6532
fn qtext(i: &[u8]) -> IResult<&[u8], &[u8]> {
    is_not(" \t\r\n\\\"")(i)
}

// RFC 5322 3.2.4 "Quoted [string] content", with FWS moved in from
// quoted-string.
fn qcontent(i: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((qtext, quoted_pair, fws))(i)
}

// RFC 5322 3.2.4 "Quoted string"
fn quoted_string(i: &[u8]) -> IResult<&[u8], Cow<[u8]>> {
    delimited(
        pair(cfws, char('"')),
        fold_many0(
            qcontent,
            Cow::Borrowed(&[] as &[u8]),
            |mut accum: Cow<[u8]>, item| {
                if accum.is_empty() {
                    accum = Cow::Borrowed(item);
                } else {
                    accum.to_mut().extend_from_slice(item);
                }
                accum
            },
        ),
        pair(char('"'), cfws),
    )(i)
}

// RFC 5322 3.2.5 "word"
fn word(i: &[u8]) -> IResult<&[u8], Cow<[u8]>> {
    alt((map(atom, Cow::Borrowed), quoted_string))(i)
}

// Part of RFC 5322 4.1 "obs-phrase"; the unquoted '.' many agents put into
// display names. Only trailing CFWS is needed since it always follows a word.
fn obs_dot(i: &[u8]) -> IResult<&[u8], ()> {
    map(terminated(char('.'), cfws), |_| ())(i)
}

// RFC 5322 3.2.5 "phrase", plus the obsolete syntax. Dots are glued onto the
// preceding word so that "J. Smith" survives as two words.
fn phrase(i: &[u8]) -> IResult<&[u8], Vec<Cow<[u8]>>> {
    map(
        pair(word, many0(alt((map(word, Some), map(obs_dot, |_| None))))),
        |(head, tail)| {
            let mut words = vec![head];
            for item in tail {
                match item {
                    Some(word) => words.push(word),
                    None => {
                        if let Some(last) = words.last_mut() {
                            last.to_mut().push(b'.');
                        }
                    }
                }
            }
            words
        },
    )(i)
}

// RFC 5322 3.3 date/time syntax, including obsolete forms. The obsolete forms
// allow CFWS between all terms, so it is simply put everywhere.
//
// Beyond the RFC we accept a missing comma after the day of week, a missing
// seconds field, a single-digit hour, full month names, and a missing zone.

fn day_of_week(i: &[u8]) -> IResult<&[u8], ()> {
    map(
        tuple((take_while1(is_alpha), cfws, opt(char(',')), cfws)),
        |_| (),
    )(i)
}

fn day(i: &[u8]) -> IResult<&[u8], u32> {
    map(take_while_m_n(1, 2, is_digit), number)(i)
}

fn month_number(name: &[u8]) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];

    MONTHS
        .iter()
        .position(|full| {
            let full = full.as_bytes();
            name.eq_ignore_ascii_case(&full[..3])
                || name.eq_ignore_ascii_case(full)
        })
        .map(|ix| ix as u32 + 1)
}

fn month(i: &[u8]) -> IResult<&[u8], u32> {
    map_opt(take_while1(is_alpha), month_number)(i)
}

fn year(i: &[u8]) -> IResult<&[u8], i32> {
    map(take_while_m_n(2, 4, is_digit), |s: &[u8]| {
        let y = number(s) as i32;
        // Y2K compliance workarounds described by RFC 5322 4.3
        if 2 == s.len() && y < 50 {
            y + 2000
        } else if s.len() < 4 {
            y + 1900
        } else {
            y
        }
    })(i)
}

fn colon(i: &[u8]) -> IResult<&[u8], ()> {
    map(tuple((cfws, char(':'), cfws)), |_| ())(i)
}

fn two_digit(i: &[u8]) -> IResult<&[u8], u32> {
    map(take_while_m_n(2, 2, is_digit), number)(i)
}

fn time_of_day(i: &[u8]) -> IResult<&[u8], (u32, u32, u32)> {
    map(
        tuple((
            map(take_while_m_n(1, 2, is_digit), number),
            colon,
            two_digit,
            opt(preceded(colon, two_digit)),
        )),
        |(h, _, m, s)| (h, m, s.unwrap_or(0)),
    )(i)
}

// Offsets are in seconds east of UTC. `None` means the zone was syntactically
// fine but names an impossible offset.
fn numeric_zone(i: &[u8]) -> IResult<&[u8], Option<i32>> {
    map(
        pair(alt((char('+'), char('-'))), take_while_m_n(4, 4, is_digit)),
        |(sign, s): (char, &[u8])| {
            let hours = number(&s[..2]) as i32;
            let minutes = number(&s[2..]) as i32;
            if minutes >= 60 {
                return None;
            }

            let offset = hours * 3600 + minutes * 60;
            Some(if '-' == sign { -offset } else { offset })
        },
    )(i)
}

fn named_zone(i: &[u8]) -> IResult<&[u8], Option<i32>> {
    map(take_while1(is_alpha), |name: &[u8]| {
        let hours = match name.to_ascii_lowercase().as_slice() {
            b"edt" => -4,
            b"est" | b"cdt" => -5,
            b"cst" | b"mdt" => -6,
            b"mst" | b"pdt" => -7,
            b"pst" => -8,
            // UT, GMT, Z, the military zones, and anything unrecognised.
            // RFC 5322 4.3 says the military zones were so poorly defined
            // that they must be treated as +0000, as must unknown zones.
            _ => 0,
        };
        Some(hours * 3600)
    })(i)
}

fn zone(i: &[u8]) -> IResult<&[u8], Option<i32>> {
    alt((numeric_zone, named_zone))(i)
}

struct RawDateTime {
    year: i32,
    month: u32,
    day: u32,
    time: (u32, u32, u32),
    zone: Option<Option<i32>>,
}

fn date_time(i: &[u8]) -> IResult<&[u8], RawDateTime> {
    map(
        tuple((
            cfws,
            opt(day_of_week),
            day,
            cfws,
            month,
            cfws,
            year,
            cfws,
            time_of_day,
            cfws,
            opt(zone),
            cfws,
        )),
        |(_, _, day, _, month, _, year, _, time, _, zone, _)| RawDateTime {
            year,
            month,
            day,
            time,
            zone,
        },
    )(i)
}

/// Parse an RFC 5322 `date-time`.
///
/// A value that is syntactically fine but does not name a real point in time
/// (e.g., 30 February) is rejected with `SyntaxError::ImpossibleDate`.
pub fn parse_datetime(s: &[u8]) -> Result<DateTime<FixedOffset>, SyntaxError> {
    let raw = complete(date_time, s)?;
    let (hour, minute, second) = raw.time;

    let offset = raw
        .zone
        .unwrap_or(Some(0))
        .and_then(FixedOffset::east_opt)
        .ok_or(SyntaxError::ImpossibleDate)?;
    let date = offset
        .ymd_opt(raw.year, raw.month, raw.day)
        .single()
        .ok_or(SyntaxError::ImpossibleDate)?;

    let datetime = if 60 == second {
        // chrono represents leap seconds as an overlong 59th second
        date.and_hms_milli_opt(hour, minute, 59, 1000)
    } else {
        date.and_hms_opt(hour, minute, second)
    };
    datetime.ok_or(SyntaxError::ImpossibleDate)
}

// RFC 5322 3.4.1 local part of address.
// Formally `dot-atom / quoted-string / obs-local-part`, but the first two
// always conform to `obs-local-part` = `word *("." word)`.
fn local_part(i: &[u8]) -> IResult<&[u8], Vec<Cow<[u8]>>> {
    separated_nonempty_list(char('.'), word)(i)
}

// RFC 5322 4.4 obsolete domain format, which encompasses dot-atom
fn obs_domain(i: &[u8]) -> IResult<&[u8], Vec<Cow<[u8]>>> {
    separated_nonempty_list(char('.'), map(atom, Cow::Borrowed))(i)
}

// RFC 5322 3.4.1 domain literal text, amended by RFC 6532
fn dtext(i: &[u8]) -> IResult<&[u8], &[u8]> {
    is_not("[]\\ \t\r\n")(i)
}

fn dcontent(i: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((dtext, quoted_pair, fws))(i)
}

// RFC 5322 3.4.1 domain literal; the brackets are retained.
fn domain_literal(i: &[u8]) -> IResult<&[u8], Vec<u8>> {
    map(
        delimited(
            pair(cfws, char('[')),
            fold_many0(dcontent, vec![b'['], |mut accum: Vec<u8>, item| {
                accum.extend_from_slice(item);
                accum
            }),
            pair(char(']'), cfws),
        ),
        |mut literal| {
            literal.push(b']');
            literal
        },
    )(i)
}

fn domain(i: &[u8]) -> IResult<&[u8], Vec<Cow<[u8]>>> {
    alt((obs_domain, map(domain_literal, |v| vec![Cow::Owned(v)])))(i)
}

// RFC 5322 3.4.1 address specification
fn addr_spec(i: &[u8]) -> IResult<&[u8], AddrSpec> {
    map(
        pair(local_part, preceded(char('@'), domain)),
        |(local, domain)| AddrSpec { local, domain },
    )(i)
}

// Used in obsolete list syntax; one or more commas, possibly with nothing in
// between.
fn obs_list_delim(i: &[u8]) -> IResult<&[u8], ()> {
    map(many1_count(tuple((cfws, char(','), cfws))), |_| ())(i)
}

// RFC 5322 4.4 obsolete routing information. It is discarded.
fn obs_route(i: &[u8]) -> IResult<&[u8], ()> {
    map(
        tuple((
            separated_nonempty_list(
                obs_list_delim,
                preceded(pair(cfws, char('@')), domain),
            ),
            char(':'),
        )),
        |_| (),
    )(i)
}

// RFC 5322 3.4 angle-delimited address
fn angle_addr(i: &[u8]) -> IResult<&[u8], AddrSpec> {
    delimited(
        tuple((cfws, char('<'), opt(obs_route))),
        addr_spec,
        pair(char('>'), cfws),
    )(i)
}

// RFC 5322 3.4 mailbox
fn mailbox(i: &[u8]) -> IResult<&[u8], MailboxSpec> {
    map(
        alt((
            pair(opt(phrase), angle_addr),
            map(addr_spec, |a| (None, a)),
        )),
        |(name, addr)| MailboxSpec {
            name: name.unwrap_or_default(),
            addr,
        },
    )(i)
}

// RFC 5322 3.4 mailbox list, including 4.4 obsolete syntax
fn mailbox_list(i: &[u8]) -> IResult<&[u8], Vec<MailboxSpec>> {
    delimited(
        opt(obs_list_delim),
        separated_nonempty_list(obs_list_delim, mailbox),
        opt(obs_list_delim),
    )(i)
}

// RFC 5322 3.4 group. The terminating ';' is frequently missing in the wild
// ("undisclosed-recipients:") so it is optional.
fn group(i: &[u8]) -> IResult<&[u8], GroupSpec> {
    map(
        pair(
            terminated(phrase, char(':')),
            terminated(
                opt(mailbox_list),
                tuple((cfws, opt(char(';')), cfws)),
            ),
        ),
        |(name, boxes)| GroupSpec {
            name,
            boxes: boxes.unwrap_or_default(),
        },
    )(i)
}

// RFC 5322 3.4 address
fn address(i: &[u8]) -> IResult<&[u8], AddressSpec> {
    alt((map(mailbox, AddressSpec::Mailbox), map(group, AddressSpec::Group)))(
        i,
    )
}

// RFC 5322 3.4 address list, including 4.4 obsolete syntax. An empty list is
// accepted here; callers that need at least one mailbox check for it.
fn address_list(i: &[u8]) -> IResult<&[u8], Vec<AddressSpec>> {
    map(
        pair(
            cfws,
            opt(delimited(
                opt(obs_list_delim),
                separated_nonempty_list(obs_list_delim, address),
                opt(obs_list_delim),
            )),
        ),
        |(_, list)| list.unwrap_or_default(),
    )(i)
}

pub fn parse_address_list(s: &[u8]) -> Result<Vec<AddressSpec>, SyntaxError> {
    complete(address_list, s)
}

pub fn parse_mailbox(s: &[u8]) -> Result<MailboxSpec, SyntaxError> {
    complete(mailbox, s)
}

// RFC 2045 5.1 token
fn is_token_char(c: u8) -> bool {
    c > b' ' && c < 0x7f && !b"()<>@,;:\\\"/[]?=".contains(&c)
}

fn token(i: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(is_token_char)(i)
}

// RFC 2045 5.1 parameter. Unquoted values are taken to be everything up to
// the next ';' or whitespace, since boundaries like `----=_Part_0` are
// routinely sent without quotes.
fn parameter(i: &[u8]) -> IResult<&[u8], (String, String)> {
    map(
        pair(
            terminated(token, tuple((cfws, char('='), cfws))),
            alt((
                quoted_string,
                map(terminated(is_not("; \t\r\n\""), cfws), Cow::Borrowed),
            )),
        ),
        |(name, value)| {
            (
                String::from_utf8_lossy(name).to_ascii_lowercase(),
                String::from_utf8_lossy(&value).into_owned(),
            )
        },
    )(i)
}

// Parameters which do not parse are skipped up to the next ';'.
fn parameters(i: &[u8]) -> IResult<&[u8], Vec<(String, String)>> {
    map(
        many0(preceded(
            tuple((cfws, char(';'), cfws)),
            alt((
                map(terminated(parameter, opt(is_not(";"))), Some),
                map(opt(is_not(";")), |_| None),
            )),
        )),
        |params| params.into_iter().flatten().collect(),
    )(i)
}

fn content_type(i: &[u8]) -> IResult<&[u8], ContentType> {
    map(
        tuple((cfws, token, cfws, char('/'), cfws, token, cfws, parameters)),
        |(_, typ, _, _, _, subtype, _, parameters)| ContentType {
            typ: String::from_utf8_lossy(typ).to_ascii_lowercase(),
            subtype: String::from_utf8_lossy(subtype).to_ascii_lowercase(),
            parameters,
        },
    )(i)
}

fn content_disposition(i: &[u8]) -> IResult<&[u8], ContentDisposition> {
    map(
        tuple((cfws, token, cfws, parameters)),
        |(_, disposition, _, parameters)| ContentDisposition {
            disposition: String::from_utf8_lossy(disposition)
                .to_ascii_lowercase(),
            parameters,
        },
    )(i)
}

/// Parse a `Content-Type` value.
///
/// Anything after the last parameter that could be understood is ignored.
pub fn parse_content_type(s: &[u8]) -> Option<ContentType> {
    if comments_too_deep(s) {
        return None;
    }

    content_type(s).ok().map(|(_, ct)| ct)
}

/// Parse a `Content-Disposition` value, leniently in the same way as
/// `parse_content_type`.
pub fn parse_content_disposition(s: &[u8]) -> Option<ContentDisposition> {
    if comments_too_deep(s) {
        return None;
    }

    content_disposition(s).ok().map(|(_, cd)| cd)
}
