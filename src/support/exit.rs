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

//! Process exit codes used by `parse-email`.
//!
//! These deliberately do not follow `sysexits.h`; scripts driving the tool
//! only distinguish "bad invocation" from "bad message".

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Exit(pub i32);

pub const EX_OK: Exit = Exit(0);
pub const EX_USAGE: Exit = Exit(1);
pub const EX_PARSE_FAILED: Exit = Exit(2);

impl Exit {
    pub fn exit(self) -> ! {
        std::process::exit(self.0)
    }
}
