/// Human name for a syslog priority.
pub fn severity_name(priority: u8) -> &'static str {
    match priority {
        0 => "Emergency",
        1 => "Alert",
        2 => "Critical",
        3 => "Error",
        4 => "Warning",
        5 => "Notice",
        6 => "Info",
        7 => "Debug",
        _ => "Unknown",
    }
}

/// Accent colour used for the badge and message border.
pub fn severity_color(priority: u8) -> &'static str {
    match priority {
        0..=3 => "#ef4444",
        4 => "#f59e0b",
        5 => "#3b82f6",
        6 => "#10b981",
        7 => "#6b7280",
        _ => "#000000",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let names: Vec<&str> = (0..=7).map(severity_name).collect();
        assert_eq!(
            names,
            ["Emergency", "Alert", "Critical", "Error", "Warning", "Notice", "Info", "Debug"]
        );
        assert_eq!(severity_name(8), "Unknown");
        assert_eq!(severity_name(255), "Unknown");
    }

    #[test]
    fn test_colors() {
        assert_eq!(severity_color(0), severity_color(3));
        assert_eq!(severity_color(4), "#f59e0b");
        assert_eq!(severity_color(42), "#000000");
    }
}
