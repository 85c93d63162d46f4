//! Replay Scanner: recovers JSON objects embedded in an undelimited byte stream
//!
//! A replay is a binary preamble followed by JSON objects written back to back.
//! The scanner walks a cursor over the bytes, tries to decode an object at every
//! `{`, and on failure moves one byte past that `{` and keeps looking. On success
//! it resumes right after the decoded object.
//!
//! `{` is a single byte in UTF-8, so byte offsets and character offsets agree at
//! every candidate position.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::data_model::DecodedObject;

/// A JSON value decoded with no nesting limit. The stack grows on demand while
/// deep input is being decoded.
struct UnboundedValue(Value);

impl<'de> Deserialize<'de> for UnboundedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(serde_stacker::Deserializer::new(deserializer)).map(UnboundedValue)
    }
}

/// Lazily yields every top-level JSON object found in `input`, in file order.
#[derive(Debug, Clone)]
pub struct ReplayScanner<'a> {
    input: &'a [u8],
    cursor: usize,
    rejected: usize,
}

impl<'a> ReplayScanner<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            cursor: 0,
            rejected: 0,
        }
    }

    /// Byte offset the next search starts from.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Number of `{` candidates that failed to decode so far.
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

impl Iterator for ReplayScanner<'_> {
    type Item = DecodedObject;

    fn next(&mut self) -> Option<DecodedObject> {
        loop {
            let rest = self.input.get(self.cursor..)?;
            let start = self.cursor + rest.iter().position(|&b| b == b'{')?;

            match decode_object_at(&self.input[start..]) {
                Some((object, consumed)) => {
                    self.cursor = start + consumed;
                    return Some(object);
                }
                None => {
                    tracing::trace!(offset = start, "rejected object candidate");
                    self.rejected += 1;
                    self.cursor = start + 1;
                }
            }
        }
    }
}

/// Decodes one JSON object at the very start of `input`.
///
/// Returns the object and the number of bytes it spans. Bytes after the closing
/// brace are not looked at. Nesting depth is not limited.
pub fn decode_object_at(input: &[u8]) -> Option<(DecodedObject, usize)> {
    let mut de = serde_json::Deserializer::from_slice(input);
    de.disable_recursion_limit();
    let mut stream = de.into_iter::<UnboundedValue>();
    match stream.next()? {
        Ok(UnboundedValue(Value::Object(object))) => Some((object, stream.byte_offset())),
        _ => None,
    }
}

/// Collects every object in `raw`, in order.
pub fn scan(raw: &[u8]) -> Vec<DecodedObject> {
    let mut scanner = ReplayScanner::new(raw);
    let objects: Vec<_> = scanner.by_ref().collect();
    tracing::debug!(
        bytes = raw.len(),
        objects = objects.len(),
        rejected = scanner.rejected(),
        "replay scan finished"
    );
    objects
}
