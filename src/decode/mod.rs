//! Request-body decoding.
//!
//! Reverses any `Content-Encoding` applied to a request body before the
//! journal prints it. Only gzip is understood; every other encoding value
//! (or none) passes the bytes through untouched.

use std::io::Read;

use bytes::Bytes;
use flate2::read::GzDecoder;
use thiserror::Error;

/// Errors produced while decoding a request body.
///
/// `Init` means the gzip header never parsed; `Read` means the header was
/// fine but the compressed stream broke mid-way. Both are recoverable: the
/// request is still answered, the failure only shows up in the journal.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("error init gzip reader, {source}")]
    Init {
        #[source]
        source: std::io::Error,
    },

    #[error("error decode gzip request body, {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },
}

/// Decodes a raw request body according to its `Content-Encoding`.
///
/// The encoding is matched case-sensitively as received: `gzip` triggers
/// decompression, anything else — including `GZIP` or `x-gzip` — is treated
/// as identity and the raw bytes are returned unchanged.
///
/// # Errors
///
/// Returns [`DecodeError`] when the payload claims to be gzip but cannot be
/// inflated.
pub fn decode(raw: &[u8], content_encoding: Option<&str>) -> Result<Bytes, DecodeError> {
    if content_encoding != Some("gzip") {
        return Ok(Bytes::copy_from_slice(raw));
    }

    let mut decoder = GzDecoder::new(raw);
    let mut inflated = Vec::new();
    match decoder.read_to_end(&mut inflated) {
        Ok(_) => Ok(Bytes::from(inflated)),
        // header() stays None until a valid gzip header has been consumed,
        // which separates a bad header from a truncated/corrupt stream.
        Err(source) if decoder.header().is_none() => Err(DecodeError::Init { source }),
        Err(source) => Err(DecodeError::Read { source }),
    }
}
