const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human readable byte count: `1536` becomes `"1.5 KB"`.
///
/// Scales to the largest unit (up to GB) that keeps the value below 1024 and
/// rounds to two decimals, dropping trailing zeros.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
