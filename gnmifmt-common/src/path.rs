//! Telemetry path composition.

/// Join a notification prefix and an update path into one telemetry path.
///
/// Segments are taken as-is, so key selectors such as
/// `interface[name=Ethernet1/1]` survive untouched. Returns an empty string
/// when both sides are empty; callers treat that as "no path".
pub fn compose(prefix: &str, update_path: &str) -> String {
    match (prefix.is_empty(), update_path.is_empty()) {
        (true, _) => update_path.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, update_path),
    }
}
