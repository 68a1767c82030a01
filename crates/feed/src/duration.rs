/// Formats whole seconds as `H:MM:SS`, or `M:SS` under an hour.
///
/// Zero is special-cased to `00:00`, which is what feed readers display for
/// an unknown length.
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "00:00".to_string();
    }
    let (hours, minutes, seconds) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
