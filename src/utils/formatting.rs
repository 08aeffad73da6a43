pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else if ms < 3_600_000 {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = ms / 3_600_000;
        let mins = (ms % 3_600_000) / 60_000;
        format!("{}h {}m", hours, mins)
    }
}

/// Crate version plus the git hash captured at build time, when available.
pub fn tool_version() -> String {
    match option_env!("GIT_HASH") {
        Some(hash) => format!("{} ({})", env!("CARGO_PKG_VERSION"), hash),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(1_500), "1.5s");
        assert_eq!(format_duration(125_000), "2m 5s");
        assert_eq!(format_duration(3_660_000), "1h 1m");
    }

    #[test]
    fn test_tool_version_starts_with_crate_version() {
        assert!(tool_version().starts_with(env!("CARGO_PKG_VERSION")));
    }
}
