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

use serde::{Deserialize, Serialize};

use super::error::Error;

/// Tunables for the message parser.
///
/// The CLI loads this from the TOML file given by `--config`; library users
/// usually just take the `Default`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParserConfig {
    /// The maximum depth of nested multiparts and embedded messages.
    ///
    /// Anything nested deeper than this makes the whole parse fail, since a
    /// message shaped like that is almost certainly an attack on the parser
    /// rather than something a human wants to read.
    pub max_nesting_depth: u32,

    /// The maximum number of MIME entities (the message itself included)
    /// before the parse is aborted.
    pub max_parts: u32,

    /// Whether text parts are decoded from their declared charset.
    ///
    /// When false, text parts are interpreted as UTF-8 and invalid sequences
    /// are replaced.
    pub decode_charset: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_nesting_depth: 20,
            max_parts: 1000,
            decode_charset: true,
        }
    }
}

impl ParserConfig {
    pub fn from_toml(data: &[u8]) -> Result<Self, Error> {
        Ok(toml::from_slice(data)?)
    }
}
