use std::env::var;

use chrono::Utc;

/// Get the value of ENV var, or a default
///
/// Only when:
/// - It is set
/// - It is not empty
pub fn env_var_or_else<F>(var_name: &str, or_else: F) -> String
where
    F: FnOnce() -> String,
{
    non_empty(var(var_name).ok()).unwrap_or_else(or_else)
}

/// Drop empty values
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Current time as epoch millis
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
