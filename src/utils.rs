//! Utility functions for size formatting.

/// Convert a byte count to a human-readable size
///
/// Uses binary units and one decimal place above bytes.
///
/// # Examples
/// - `humanize_bytes(512)` → "512 B"
/// - `humanize_bytes(1536)` → "1.5 KiB"
/// - `humanize_bytes(60 * 1024 * 1024)` → "60.0 MiB"
pub fn humanize_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }

    format!("{:.1} {}", value, unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(humanize_bytes(0), "0 B");
        assert_eq!(humanize_bytes(1023), "1023 B");
        assert_eq!(humanize_bytes(1536), "1.5 KiB");
        assert_eq!(humanize_bytes(60 * 1024 * 1024), "60.0 MiB");
        assert_eq!(humanize_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
