//! Classifiers for ambiguous ContentDM responses.

use crate::api::Format;
use crate::parse;

/// Message ContentDM answers with, in place of a missing object.
pub const NOT_FOUND_MESSAGE: &str = "Requested item not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found,
    NotFound,
}

/// Checks a text response for the not-found sentinel.
///
/// XML carries it as a `message` child of the document element, JSON as a
/// top-level `message` field. A body that can't be parsed is not the sentinel.
pub fn lookup(text: &str, format: Format) -> Lookup {
    let message = match format {
        Format::Xml => parse::root_message(text),
        Format::Json => serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|v| v.get("message")?.as_str().map(String::from)),
    };
    match message {
        Some(m) if m == NOT_FOUND_MESSAGE => Lookup::NotFound,
        _ => Lookup::Found,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Text,
    Binary,
}

/// Some compound objects answer a binary request with an XML document and a
/// success status. Anything that decodes as UTF-8 is taken for such a reply.
pub fn payload(bytes: &[u8]) -> Payload {
    match std::str::from_utf8(bytes) {
        Ok(_) => Payload::Text,
        Err(_) => Payload::Binary,
    }
}
