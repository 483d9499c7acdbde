//-
// Copyright (c) 2025, Davchain contributors
//
// This file is part of Davchain.
//
// Davchain is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Davchain is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Davchain. If not, see <http://www.gnu.org/licenses/>.

//! Provides a façade around compression of response bodies.

use std::io::{self, Write};

use flate2::write::GzEncoder;

/// Extends the `Write` trait to have a `finish()` method.
pub trait FinishWrite: Write {
    /// Perform any finishing operations on this object.
    fn finish(&mut self) -> io::Result<()>;
}

impl<W: Write> FinishWrite for GzEncoder<W> {
    fn finish(&mut self) -> io::Result<()> {
        self.try_finish()
    }
}

/// Content codings a response body may be transformed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Gzip,
}

impl Compression {
    /// Pick the coding to use given a client's `Accept-Encoding` header.
    pub fn negotiate(accept_encoding: &str) -> Option<Self> {
        accept_encoding
            .split(',')
            .map(|coding| coding.split(';'))
            .filter_map(|mut parts| {
                let name = parts.next()?.trim();
                let refused = parts.any(|param| {
                    let param = param.trim().replace(' ', "");
                    param == "q=0" || param == "q=0.0" || param == "q=0.00"
                });
                Some((name, refused))
            })
            .find(|&(name, refused)| {
                !refused && name.eq_ignore_ascii_case("gzip")
            })
            .map(|_| Compression::Gzip)
    }

    /// The value of the `Content-Encoding` header for this coding.
    pub fn token(self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
        }
    }

    /// Wrap `writer` to compress according to this scheme.
    pub fn compressor<'a>(
        self,
        writer: impl Write + 'a,
    ) -> impl FinishWrite + 'a {
        match self {
            Compression::Gzip => {
                GzEncoder::new(writer, flate2::Compression::default())
            }
        }
    }

    /// Compress `data` in one go.
    pub fn compress(self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len() / 2);
        {
            let mut compressor = self.compressor(&mut out);
            compressor.write_all(data)?;
            compressor.finish()?;
        }
        Ok(out)
    }
}
