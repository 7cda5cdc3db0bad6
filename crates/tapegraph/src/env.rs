use std::env;

pub(crate) const NAN_GUARD_ENV: &str = "TAPEGRAPH_NAN_GUARD";
pub(crate) const INF_GUARD_ENV: &str = "TAPEGRAPH_INF_GUARD";
pub(crate) const LOG_VALUES_ENV: &str = "TAPEGRAPH_LOG_VALUES";

fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

/// Reads a boolean flag, returning `None` when the variable is unset or blank.
pub(crate) fn flag(name: &str) -> Option<bool> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(parse_bool(&value)),
        _ => None,
    }
}
