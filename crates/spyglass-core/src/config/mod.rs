//! Environment-driven configuration for the automation core.

use std::env;

/// Suggestion phrasing family, selected by `MCP_TOOLSET`.
///
/// Only the string form of suggestions embedded in results changes; no
/// behavior does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Toolset {
    /// Classic `tool(arg=...)` phrasing.
    #[default]
    V1,
    /// Batched `run(actions=[...])` phrasing.
    V2,
}

/// Process configuration recognized from the environment.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Host allowlist from `MCP_ALLOW_HOSTS`; `*` permits all hosts.
    pub allow_hosts: Vec<String>,
    /// DevTools discovery host.
    pub debugger_host: String,
    /// DevTools discovery port.
    pub debugger_port: u16,
    /// Force Tier-0 availability (`MCP_TIER0=1`).
    pub tier0_forced: bool,
    /// Force Tier-1 installation attempts (`MCP_DIAGNOSTICS=1`).
    pub diagnostics_forced: bool,
    /// Suggestion phrasing family (`MCP_TOOLSET`).
    pub toolset: Toolset,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            allow_hosts: Vec::new(),
            debugger_host: "127.0.0.1".to_string(),
            debugger_port: 9222,
            tier0_forced: false,
            diagnostics_forced: false,
            toolset: Toolset::V1,
        }
    }
}

impl BrowserConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// The lookup indirection keeps parsing testable without touching
    /// process globals.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let allow_hosts = lookup("MCP_ALLOW_HOSTS")
            .map(|raw| parse_host_list(&raw))
            .unwrap_or_default();

        let debugger_host = lookup("MCP_DEBUGGER_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.debugger_host);

        let debugger_port = lookup("MCP_DEBUGGER_PORT")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(defaults.debugger_port);

        let toolset = match lookup("MCP_TOOLSET").as_deref().map(str::trim) {
            Some(raw) if matches!(raw.to_lowercase().as_str(), "v2" | "northstar" | "north-star") => {
                Toolset::V2
            }
            _ => Toolset::V1,
        };

        Self {
            allow_hosts,
            debugger_host,
            debugger_port,
            tier0_forced: flag_set(lookup("MCP_TIER0")),
            diagnostics_forced: flag_set(lookup("MCP_DIAGNOSTICS")),
            toolset,
        }
    }

    /// DevTools discovery endpoint URL.
    pub fn endpoint_url(&self) -> String {
        format!("http://{}:{}", self.debugger_host, self.debugger_port)
    }

    /// Whether the allowlist permits every host.
    pub fn allows_all_hosts(&self) -> bool {
        self.allow_hosts.iter().any(|h| h == "*")
    }

    /// Check a hostname against the allowlist.
    ///
    /// An empty allowlist permits everything (strict mode rejects that
    /// combination before this check). Entries match exactly or as a
    /// dot-separated suffix: `example.com` also covers `sub.example.com`.
    pub fn is_host_allowed(&self, host: &str) -> bool {
        if self.allow_hosts.is_empty() {
            return true;
        }
        let host = host.trim().to_lowercase();
        if host.is_empty() {
            return false;
        }
        self.allow_hosts.iter().any(|pattern| {
            if pattern == "*" {
                return true;
            }
            host == *pattern || host.ends_with(&format!(".{pattern}"))
        })
    }
}

fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|entry| entry.trim().trim_start_matches('.').to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn flag_set(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests;
