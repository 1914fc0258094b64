// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Translation of `INFO` output into memcache-style statistics.

use std::collections::BTreeMap;

/// Fields that are always present after normalization, defaulting to `0`.
const DEFAULTS: [&str; 13] = [
    "keyspace_hits",
    "keyspace_misses",
    "evicted_keys",
    "maxmemory",
    "process_id",
    "uptime_in_seconds",
    "lru_clock",
    "redis_version",
    "total_system_memory",
    "connected_clients",
    "total_commands_processed",
    "total_net_input_bytes",
    "total_net_output_bytes",
];

/// Memcache statistic names and the Redis field each one copies.
const DERIVED: [(&str, &str); 14] = [
    ("get_hits", "keyspace_hits"),
    ("get_misses", "keyspace_misses"),
    ("evictions", "evicted_keys"),
    ("pointer_size", "maxmemory"),
    ("pid", "process_id"),
    ("uptime", "uptime_in_seconds"),
    ("time", "lru_clock"),
    ("version", "redis_version"),
    ("bytes_read", "total_net_output_bytes"),
    ("bytes_written", "total_net_input_bytes"),
    ("limit_maxbytes", "total_system_memory"),
    ("curr_connections", "connected_clients"),
    ("total_connections", "total_commands_processed"),
    ("cmd_get", "keyspace_hits"),
];

/// Memcache statistic names Redis has no equivalent for.
const ZEROED: [&str; 4] = ["bytes", "curr_items", "total_items", "cmd_set"];

/// Parses the `field:value` lines of an `INFO` reply, skipping section headers.
pub(crate) fn parse_info(raw: &str) -> BTreeMap<String, String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Fills in missing fields and adds the memcache vocabulary.
pub(crate) fn normalize_info(mut info: BTreeMap<String, String>) -> BTreeMap<String, String> {
    for name in DEFAULTS {
        info.entry(name.to_string()).or_insert_with(|| "0".to_string());
    }
    for (name, source) in DERIVED {
        let value = info.get(source).cloned().unwrap_or_else(|| "0".to_string());
        info.insert(name.to_string(), value);
    }
    for name in ZEROED {
        info.insert(name.to_string(), "0".to_string());
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Server\r\nredis_version:7.2.4\r\nprocess_id:42\r\nuptime_in_seconds:900\r\n\r\n# Stats\r\nkeyspace_hits:10\r\nkeyspace_misses:3\r\ntotal_net_input_bytes:100\r\ntotal_net_output_bytes:200\r\n";

    #[test]
    fn parse_skips_headers_and_blank_lines() {
        let info = parse_info(SAMPLE);
        assert_eq!(info.len(), 7);
        assert_eq!(info.get("redis_version").map(String::as_str), Some("7.2.4"));
        assert!(!info.keys().any(|name| name.starts_with('#')));
    }

    #[test]
    fn normalize_derives_memcache_names() {
        let stats = normalize_info(parse_info(SAMPLE));
        let value = |name: &str| stats.get(name).map(String::as_str);

        assert_eq!(value("get_hits"), Some("10"));
        assert_eq!(value("cmd_get"), Some("10"));
        assert_eq!(value("get_misses"), Some("3"));
        assert_eq!(value("pid"), Some("42"));
        assert_eq!(value("uptime"), Some("900"));
        assert_eq!(value("version"), Some("7.2.4"));
        assert_eq!(value("bytes_read"), Some("200"));
        assert_eq!(value("bytes_written"), Some("100"));
        assert_eq!(value("curr_items"), Some("0"));
    }

    #[test]
    fn normalize_defaults_missing_fields() {
        let stats = normalize_info(BTreeMap::new());
        for name in DEFAULTS.into_iter().chain(ZEROED) {
            assert_eq!(stats.get(name).map(String::as_str), Some("0"), "{name}");
        }
        assert_eq!(stats.get("evictions").map(String::as_str), Some("0"));
        assert_eq!(stats.len(), DEFAULTS.len() + DERIVED.len() + ZEROED.len());
    }
}
