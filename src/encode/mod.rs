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

//! Rendering of parsed messages for output.

use std::io::Write;

use crate::message::ParsedMessage;
use crate::support::error::Error;

pub mod cbor;
pub mod debug;
pub mod json;
pub mod msgpack;

pub use self::cbor::CborEncoder;
pub use self::debug::DebugEncoder;
pub use self::json::JsonEncoder;
pub use self::msgpack::MsgPackEncoder;

/// Writes a `ParsedMessage` in some output format.
pub trait Encoder {
    fn encode(
        &self,
        message: &ParsedMessage,
        out: &mut dyn Write,
    ) -> Result<(), Error>;
}
