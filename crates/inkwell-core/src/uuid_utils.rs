//! UUIDv7 identifiers.
//!
//! Every row id is generated application-side as a UUIDv7, so ids sort in
//! creation order and can break ties between rows created in the same
//! timestamp tick.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use inkwell_core::uuid_utils::new_v7;
///
/// let id = new_v7();
/// assert_eq!(id.get_version_num(), 7);
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}
