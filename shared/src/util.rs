/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate an opaque, unguessable id (UUID v4).
///
/// Used for session and order identifiers: holding the id is the only
/// capability needed to read public order status, so ids must not be
/// enumerable.
pub fn opaque_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
