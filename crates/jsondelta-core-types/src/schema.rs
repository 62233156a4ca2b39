//! Canonical schema constants for structured logging
//!
//! These constants keep field names stable between the engine's log
//! statements and the test capture layer that asserts on them.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";

// Level identity
pub const FIELD_LEFT_PATH: &str = "left_path";
pub const FIELD_RIGHT_PATH: &str = "right_path";
pub const FIELD_DRILL: &str = "drill";
pub const FIELD_SCORE: &str = "score";

// Run statistics
pub const FIELD_RECORD_COUNT: &str = "record_count";
pub const FIELD_CACHE_HITS: &str = "cache_hits";
pub const FIELD_CACHE_MISSES: &str = "cache_misses";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_SCORE: &str = "score";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_accessibility() {
        assert!(!FIELD_COMPONENT.is_empty());
        assert!(!FIELD_OP.is_empty());
        assert!(!FIELD_RUN_ID.is_empty());
        assert!(!EVENT_START.is_empty());
        assert!(!EVENT_END.is_empty());
        assert!(!EVENT_END_ERROR.is_empty());
    }

    #[test]
    fn test_event_names_are_distinct() {
        let events = [EVENT_START, EVENT_END, EVENT_END_ERROR, EVENT_SCORE];
        for (i, a) in events.iter().enumerate() {
            for b in events.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
