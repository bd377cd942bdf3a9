// src/decode.rs

//! Turning process output bytes into text.
//!
//! Decoding is strict: a malformed sequence fails the attempt instead of
//! producing replacement characters, so the next fallback gets its chance.
//! Labels are resolved through the WHATWG registry (`encoding_rs`), with a
//! few common spellings such as `utf_8` normalised first.
//!
//! The WHATWG registry maps `latin-1`/`iso-8859-1` to windows-1252. Those
//! labels are handled separately as true ISO-8859-1, so 0x80..=0x9F decode
//! to the C1 controls; ask for `windows-1252` to get the WHATWG mapping.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Every configured encoding was tried and none could decode the bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not decode output; tried encodings: {}", attempted.join(", "))]
pub struct DecodeError {
    /// Labels in the order they were attempted (primary first).
    pub attempted: Vec<String>,
}

/// Decode `bytes` with `primary`, then each of `fallbacks` in order.
///
/// The first encoding that decodes without error wins.
pub fn decode(bytes: &[u8], primary: &str, fallbacks: &[String]) -> Result<String, DecodeError> {
    let labels = std::iter::once(primary).chain(fallbacks.iter().map(String::as_str));
    let mut attempted = Vec::with_capacity(fallbacks.len() + 1);

    for label in labels {
        attempted.push(label.to_string());

        if let Some(text) = try_decode(bytes, label) {
            if attempted.len() > 1 {
                debug!(encoding = label, attempts = attempted.len(), "decoded with fallback encoding");
            }
            return Ok(text);
        }

        trace!(encoding = label, len = bytes.len(), "decoding attempt failed");
    }

    Err(DecodeError { attempted })
}

/// Encode `text` for a child's stdin using `label`.
///
/// Unknown labels fall back to UTF-8. Characters the target encoding cannot
/// represent are written as numeric character references by `encoding_rs`
/// (as `?` for ISO-8859-1).
pub fn encode(text: &str, label: &str) -> Vec<u8> {
    let codec = lookup(label).unwrap_or_else(|| {
        warn!(encoding = label, "unknown encoding label for stdin; using utf-8");
        Codec::Whatwg(UTF_8)
    });

    let (bytes, had_errors) = codec.encode(text);
    if had_errors {
        warn!(encoding = codec.name(), "stdin contains characters the encoding cannot represent");
    }
    bytes
}

/// A resolved encoding label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
    Whatwg(&'static Encoding),
}

impl Codec {
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Latin1 => "iso-8859-1",
            Codec::Whatwg(encoding) => encoding.name(),
        }
    }

    /// Strict decode; `None` on a malformed sequence.
    fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Codec::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes).into_owned()),
            Codec::Whatwg(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(Cow::into_owned),
        }
    }

    fn encode(&self, text: &str) -> (Vec<u8>, bool) {
        match self {
            Codec::Latin1 => {
                let mut had_errors = false;
                let bytes = text
                    .chars()
                    .map(|c| {
                        u8::try_from(u32::from(c)).unwrap_or_else(|_| {
                            had_errors = true;
                            b'?'
                        })
                    })
                    .collect();
                (bytes, had_errors)
            }
            Codec::Whatwg(encoding) => {
                let (bytes, _, had_errors) = encoding.encode(text);
                (bytes.into_owned(), had_errors)
            }
        }
    }
}

const LATIN1_LABELS: &[&str] = &[
    "latin1", "l1", "iso-8859-1", "iso8859-1", "iso-ir-100", "cp819", "8859",
];

/// Resolve an encoding label, accepting a few non-WHATWG spellings.
pub fn lookup(label: &str) -> Option<Codec> {
    let normalized = normalize_label(label);
    if LATIN1_LABELS.contains(&normalized.as_str()) {
        return Some(Codec::Latin1);
    }

    Encoding::for_label(label.trim().as_bytes())
        .or_else(|| Encoding::for_label(normalized.as_bytes()))
        .map(Codec::Whatwg)
}

/// Whether `label` names an encoding we can decode with.
pub fn is_known_label(label: &str) -> bool {
    lookup(label).is_some()
}

fn try_decode(bytes: &[u8], label: &str) -> Option<String> {
    let Some(codec) = lookup(label) else {
        warn!(encoding = label, "unknown encoding label; skipping");
        return None;
    };

    codec.decode(bytes)
}

/// `latin-1` / `latin_1` -> `latin1`, `utf_8` -> `utf-8`.
fn normalize_label(label: &str) -> String {
    let lowered = label.trim().to_ascii_lowercase().replace('_', "-");
    match lowered.strip_prefix("latin-") {
        Some(rest) => format!("latin{rest}"),
        None => lowered,
    }
}
