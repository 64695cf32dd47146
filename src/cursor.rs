//! Opaque keyset cursor codec.
//!
//! A cursor is the `(last_updated_at, last_id)` pair marking a
//! traversal position. On the wire it is a URL-safe base64 string so
//! clients round-trip it without depending on its contents. Decoding
//! is lenient by contract: an absent or malformed cursor means "start
//! of the collection" and never fails a request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Serialize, Serializer};

use crate::models::Cursor;

/// Encode a cursor as an opaque URL-safe token.
pub fn encode(cursor: &Cursor) -> String {
    URL_SAFE_NO_PAD.encode(format!(
        "v1:{}:{}",
        cursor.last_updated_at, cursor.last_id
    ))
}

/// Decode an opaque token. Returns `None` for anything that does not
/// parse — the caller degrades to the first page rather than erroring.
pub fn decode(token: &str) -> Option<Cursor> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let mut parts = text.splitn(3, ':');
    if parts.next()? != "v1" {
        return None;
    }
    let last_updated_at: i64 = parts.next()?.parse().ok()?;
    let last_id: i64 = parts.next()?.parse().ok()?;
    Some(Cursor {
        last_updated_at,
        last_id,
    })
}

/// Decode an optional query parameter; both `None` and garbage mean
/// "no cursor".
pub fn decode_opt(token: Option<&str>) -> Option<Cursor> {
    token.and_then(decode)
}

// Cursors serialize as their opaque token, so every JSON surface
// (pages, CLI output) exposes the same round-trippable shape.
impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(self))
    }
}
