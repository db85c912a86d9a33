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

/// Pretty-printed JSON with camelCase keys.
///
/// Absent values are written as explicit `null`s. The output deserialises
/// back into an identical `ParsedMessage`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(
        &self,
        message: &ParsedMessage,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        serde_json::to_writer_pretty(&mut *out, message)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::test_data::*;

    fn encode(message: &ParsedMessage) -> Vec<u8> {
        let mut out = Vec::new();
        JsonEncoder.encode(message, &mut out).unwrap();
        out
    }

    #[test]
    fn json_round_trip() {
        for &data in ALL {
            let message =
                Parser::default().parse_to_outcome(data).result.unwrap();
            let decoded: ParsedMessage =
                serde_json::from_slice(&encode(&message)).unwrap();
            assert_eq!(message, decoded);
        }
    }

    #[test]
    fn json_shape() {
        let message =
            Parser::default().parse_to_outcome(SIMPLE_TEXT).result.unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&encode(&message)).unwrap();

        assert_eq!("Test Subject", value["subject"]);
        assert_eq!("2017-08-17 12:18:33", value["date"]);
        assert_eq!(serde_json::Value::Null, value["bodyHtml"]);
        assert_eq!(serde_json::Value::Null, value["sender"]);
        assert_eq!("from@email.com", value["from"]["email"]);
        assert_eq!(serde_json::Value::Null, value["from"]["name"]);
        assert_eq!("Name", value["to"][1]["name"]);
        assert_eq!("addressList", value["headers"][5]["kind"]);
        assert_eq!("date", value["headers"][3]["kind"]);
        assert_eq!("2017-08-17 12:18:33", value["headers"][3]["timestamp"]);
        assert_eq!(SIMPLE_TEXT.len() as u64, value["sizeBytes"]);
    }
}
