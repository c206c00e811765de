//! Millisecond durations as digital clock strings.

/// Formats a millisecond duration as `HH:MM:SS.mmm`.
pub fn digital_format(time_ms: u64) -> String {
    if time_ms == 0 {
        return "00:00:00.000".to_string();
    }
    let total_seconds = time_ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = total_seconds % 3600 / 60;
    let seconds = total_seconds % 60;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        hours,
        minutes,
        seconds,
        time_ms % 1000
    )
}
