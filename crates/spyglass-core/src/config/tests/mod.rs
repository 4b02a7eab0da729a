use std::collections::HashMap;

use super::*;

fn config_from(vars: &[(&str, &str)]) -> BrowserConfig {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    BrowserConfig::from_lookup(|key| map.get(key).cloned())
}

#[test]
fn test_defaults_with_empty_env() {
    let config = config_from(&[]);
    assert!(config.allow_hosts.is_empty());
    assert_eq!(config.endpoint_url(), "http://127.0.0.1:9222");
    assert!(!config.tier0_forced);
    assert!(!config.diagnostics_forced);
    assert_eq!(config.toolset, Toolset::V1);
}

#[test]
fn test_allow_hosts_parsing_normalizes() {
    let config = config_from(&[("MCP_ALLOW_HOSTS", " Example.COM , .docs.example.com ,, ")]);
    assert_eq!(config.allow_hosts, vec!["example.com", "docs.example.com"]);
}

#[test]
fn test_empty_allowlist_permits_all() {
    let config = config_from(&[]);
    assert!(config.is_host_allowed("anything.example"));
}

#[test]
fn test_host_suffix_matching() {
    let config = config_from(&[("MCP_ALLOW_HOSTS", "example.com")]);
    assert!(config.is_host_allowed("example.com"));
    assert!(config.is_host_allowed("sub.example.com"));
    assert!(config.is_host_allowed("Deep.Sub.Example.Com"));
    assert!(!config.is_host_allowed("evilexample.com"));
    assert!(!config.is_host_allowed("example.org"));
    assert!(!config.is_host_allowed(""));
}

#[test]
fn test_wildcard_allows_everything() {
    let config = config_from(&[("MCP_ALLOW_HOSTS", "*")]);
    assert!(config.allows_all_hosts());
    assert!(config.is_host_allowed("whatever.invalid"));
}

#[test]
fn test_tier_flags() {
    let config = config_from(&[("MCP_TIER0", "1"), ("MCP_DIAGNOSTICS", "true")]);
    assert!(config.tier0_forced);
    assert!(config.diagnostics_forced);

    let config = config_from(&[("MCP_TIER0", "0")]);
    assert!(!config.tier0_forced);
}

#[test]
fn test_toolset_aliases() {
    assert_eq!(config_from(&[("MCP_TOOLSET", "v2")]).toolset, Toolset::V2);
    assert_eq!(config_from(&[("MCP_TOOLSET", "NorthStar")]).toolset, Toolset::V2);
    assert_eq!(config_from(&[("MCP_TOOLSET", "north-star")]).toolset, Toolset::V2);
    assert_eq!(config_from(&[("MCP_TOOLSET", "v1")]).toolset, Toolset::V1);
}

#[test]
fn test_debugger_endpoint_override() {
    let config = config_from(&[
        ("MCP_DEBUGGER_HOST", "10.0.0.5"),
        ("MCP_DEBUGGER_PORT", "9333"),
    ]);
    assert_eq!(config.endpoint_url(), "http://10.0.0.5:9333");
}

#[test]
fn test_bad_port_falls_back_to_default() {
    let config = config_from(&[("MCP_DEBUGGER_PORT", "not-a-port")]);
    assert_eq!(config.debugger_port, 9222);
}
