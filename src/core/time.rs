//! Store-managed row metadata: surrogate ids and write timestamps.

use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

/// Surrogate row id. ULIDs sort by creation time.
pub fn new_row_id() -> String {
    Ulid::new().to_string()
}

/// Value written to `created_at`/`updated_at`: unix seconds, `Z` suffixed.
pub fn row_timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{secs}Z")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_timestamp_is_epoch_seconds() {
        let stamp = row_timestamp();
        let secs: u64 = stamp.strip_suffix('Z').unwrap().parse().unwrap();
        assert!(secs > 1_700_000_000);
    }

    #[test]
    fn test_row_ids_are_distinct_ulids() {
        let a = new_row_id();
        let b = new_row_id();
        assert_ne!(a, b);
        assert!(Ulid::from_string(&a).is_ok());
    }
}
