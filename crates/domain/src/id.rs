//! ID generation utilities.

use uuid::Uuid;

/// Generates a new tab identifier.
///
/// UUID v7 includes timestamp information, so tabs created later sort later.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}
