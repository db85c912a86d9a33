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

use std::io::Write;

use super::Encoder;
use crate::message::ParsedMessage;
use crate::support::error::Error;

/// MessagePack output. Structs are written as maps keyed by the same field
/// names as the JSON form, not as positional arrays.
#[derive(Clone, Copy, Debug, Default)]
pub struct MsgPackEncoder;

impl Encoder for MsgPackEncoder {
    fn encode(
        &self,
        message: &ParsedMessage,
        mut out: &mut dyn Write,
    ) -> Result<(), Error> {
        rmp_serde::encode::write_named(&mut out, message)?;
        Ok(())
    }
}
