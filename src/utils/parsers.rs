use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::LazyLock;

static MEMORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+[KMGkmg]?$").expect("memory pattern is valid"));

/// Validate a scheduler memory request and normalize its unit suffix.
///
/// Supported formats:
/// - `"100G"` / `"100g"` — gigabytes
/// - `"512M"` / `"512m"` — megabytes
/// - `"2048K"` / `"2048k"` — kilobytes
/// - `"100"` — megabytes (the scheduler's default unit)
///
/// # Examples
///
/// ```
/// use workbench::utils::parsers::parse_memory;
///
/// assert_eq!(parse_memory("50G").unwrap(), "50G");
/// assert_eq!(parse_memory("512m").unwrap(), "512M");
/// assert_eq!(parse_memory("100").unwrap(), "100");
/// assert!(parse_memory("1.5G").is_err());
/// ```
pub fn parse_memory(memory_str: &str) -> Result<String> {
    let memory_str = memory_str.trim();

    if memory_str.is_empty() {
        return Err(anyhow!("Memory cannot be empty"));
    }
    if !MEMORY_RE.is_match(memory_str) {
        return Err(anyhow!(
            "Invalid memory format '{memory_str}'. Expected a whole number with an optional K|M|G suffix, e.g. 50G"
        ));
    }

    Ok(memory_str.to_uppercase())
}

/// Split a comma-separated partition list, dropping empty entries.
///
/// An empty result means "let the scheduler pick", and the partition flag is
/// left out of the request entirely.
///
/// # Examples
///
/// ```
/// use workbench::utils::parsers::parse_partitions;
///
/// assert_eq!(parse_partitions("batch,short_jobs"), vec!["batch", "short_jobs"]);
/// assert_eq!(parse_partitions(" gpu , "), vec!["gpu"]);
/// assert!(parse_partitions("").is_empty());
/// ```
pub fn parse_partitions(partition_str: &str) -> Vec<String> {
    partition_str
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_units() {
        assert_eq!(parse_memory("100G").unwrap(), "100G");
        assert_eq!(parse_memory("100g").unwrap(), "100G");
        assert_eq!(parse_memory("2048K").unwrap(), "2048K");
        assert_eq!(parse_memory(" 64M ").unwrap(), "64M");
    }

    #[test]
    fn test_parse_memory_invalid() {
        assert!(parse_memory("").is_err());
        assert!(parse_memory("   ").is_err());
        assert!(parse_memory("G").is_err());
        assert!(parse_memory("10T").is_err());
        assert!(parse_memory("-5G").is_err());
        assert!(parse_memory("10 G").is_err());
    }

    #[test]
    fn test_parse_partitions_single() {
        assert_eq!(parse_partitions("gpu"), vec!["gpu"]);
    }

    #[test]
    fn test_parse_partitions_keeps_order() {
        assert_eq!(
            parse_partitions("short_jobs,batch,gpu"),
            vec!["short_jobs", "batch", "gpu"]
        );
    }

    #[test]
    fn test_parse_partitions_empty() {
        assert!(parse_partitions("").is_empty());
        assert!(parse_partitions(",,").is_empty());
    }
}
