//! Time-ordered identifier helpers.
//!
//! All entity ids are UUIDv7 (RFC 9562): the first 48 bits carry a Unix
//! millisecond timestamp, so ids sort in creation order and binary-encoded
//! primary keys cluster by insertion time.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Extract the embedded creation timestamp from a UUIDv7.
///
/// Returns `None` if the UUID is not version 7.
pub fn creation_time(id: &Uuid) -> Option<DateTime<Utc>> {
    let bytes = id.as_bytes();
    if (bytes[6] >> 4) != 7 {
        return None;
    }

    let millis = ((bytes[0] as u64) << 40)
        | ((bytes[1] as u64) << 32)
        | ((bytes[2] as u64) << 24)
        | ((bytes[3] as u64) << 16)
        | ((bytes[4] as u64) << 8)
        | (bytes[5] as u64);

    Utc.timestamp_millis_opt(millis as i64).single()
}
