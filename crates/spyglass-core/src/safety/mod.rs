//! The safety layer: URL allowlisting, navigation scheme rules, permission
//! policy, and URL redaction for exported telemetry.
//!
//! All three rules are orthogonal and applied at tool entry points. Policy
//! denials are [`CoreError::Policy`] values and are never retried.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use spyglass_cdp::protocol::browser::{GrantPermissionsParams, SetPermissionParams};

use crate::config::BrowserConfig;
use crate::error::CoreError;
use crate::session::Session;

/// Global safety mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafetyMode {
    /// Empty allowlist permits everything; file: navigation allowed.
    #[default]
    Permissive,
    /// Deny-by-default: an explicit allowlist is required, file: and
    /// mutating/file-touching tools are refused.
    Strict,
}

impl SafetyMode {
    /// Parse a mode name; unknown values fall back to permissive.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "strict" => Self::Strict,
            _ => Self::Permissive,
        }
    }

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::Strict => "strict",
        }
    }
}

/// Process-wide safety policy. Reads are cheap; writes go through the
/// session manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyPolicy {
    /// Current mode.
    pub mode: SafetyMode,
}

/// Strict allowlist check for http(s) fetches.
///
/// # Errors
///
/// Returns [`CoreError::Policy`] when the scheme is not http(s), when
/// strict mode lacks an allowlist, or when the host is not allowed.
pub fn ensure_allowed(url: &str, config: &BrowserConfig, mode: SafetyMode) -> Result<(), CoreError> {
    let parsed = Url::parse(url)
        .map_err(|e| CoreError::Validation(format!("invalid URL {url}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CoreError::Policy("only http/https are supported".into()));
    }

    if mode == SafetyMode::Strict && config.allow_hosts.is_empty() {
        return Err(CoreError::Policy(
            "strict policy requires an explicit MCP_ALLOW_HOSTS allowlist (no default allow-all)"
                .into(),
        ));
    }

    let host = parsed.host_str().unwrap_or_default();
    if !config.is_host_allowed(host) {
        return Err(CoreError::Policy(format!("host {host} is not in allowlist")));
    }

    Ok(())
}

/// Relaxed check for browser navigation: `about:`, `data:`, and `blob:`
/// always pass; `file:` passes only outside strict mode and only with an
/// unrestricted allowlist.
///
/// Relative inputs are resolved against `base` (the current tab URL) first,
/// then the resolved URL is checked.
///
/// # Errors
///
/// Returns [`CoreError::Policy`] for refused schemes or hosts, or
/// [`CoreError::Validation`] for unparseable input.
pub fn ensure_allowed_navigation(
    url: &str,
    base: Option<&str>,
    config: &BrowserConfig,
    mode: SafetyMode,
) -> Result<String, CoreError> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| {
                CoreError::Validation(format!("relative URL {url} without a current page"))
            })?;
            let base = Url::parse(base)
                .map_err(|e| CoreError::Validation(format!("invalid base URL {base}: {e}")))?;
            base.join(url)
                .map_err(|e| CoreError::Validation(format!("cannot resolve {url}: {e}")))?
        }
        Err(e) => return Err(CoreError::Validation(format!("invalid URL {url}: {e}"))),
    };

    match parsed.scheme() {
        "about" | "data" | "blob" => return Ok(parsed.into()),
        "file" => {
            if mode == SafetyMode::Strict {
                return Err(CoreError::Policy("strict policy forbids file:// navigation".into()));
            }
            if !config.allow_hosts.is_empty() && !config.allows_all_hosts() {
                return Err(CoreError::Policy(
                    "file:// scheme requires a permissive allowlist (set MCP_ALLOW_HOSTS=*)".into(),
                ));
            }
            return Ok(parsed.into());
        }
        "http" | "https" => {}
        other => {
            return Err(CoreError::Policy(format!(
                "unsupported scheme: {other} (allowed: http, https, about, data, blob, file)"
            )));
        }
    }

    if mode == SafetyMode::Strict && config.allow_hosts.is_empty() {
        return Err(CoreError::Policy(
            "strict policy requires an explicit MCP_ALLOW_HOSTS allowlist (no default allow-all)"
                .into(),
        ));
    }

    let host = parsed.host_str().unwrap_or_default();
    if !config.is_host_allowed(host) {
        return Err(CoreError::Policy(format!("host {host} is not in allowlist")));
    }

    Ok(parsed.into())
}

/// Strip query and fragment from a URL before it leaves the process in any
/// telemetry view.
#[must_use]
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.into()
        }
        // Unparseable input still must not leak query strings.
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Permission setting for one origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionSetting {
    /// Permission granted without prompting.
    Granted,
    /// Permission denied without prompting.
    Denied,
    /// Browser default: ask the user.
    #[default]
    Prompt,
}

impl PermissionSetting {
    /// Normalize a setting name, accepting the usual aliases.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "allow" | "allowed" | "grant" | "granted" => Self::Granted,
            "deny" | "denied" | "block" | "blocked" => Self::Denied,
            _ => Self::Prompt,
        }
    }

    /// Wire name as Browser.setPermission expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Prompt => "prompt",
        }
    }
}

/// Per-origin permission policy.
///
/// Evaluation order for an origin: defaults (when not prompt), then allow
/// patterns (granted), then deny patterns (denied). Deny always wins.
#[derive(Debug, Clone, Default)]
pub struct PermissionPolicy {
    /// Default setting applied to `default_permissions`.
    pub default: PermissionSetting,
    /// Permissions covered by the default setting.
    pub default_permissions: Vec<String>,
    /// Origin-pattern allow rules.
    pub allow: BTreeMap<String, Vec<String>>,
    /// Origin-pattern deny rules.
    pub deny: BTreeMap<String, Vec<String>>,
}

impl PermissionPolicy {
    /// Whether the policy does anything at all.
    pub fn enabled(&self) -> bool {
        if !self.allow.is_empty() || !self.deny.is_empty() {
            return true;
        }
        self.default != PermissionSetting::Prompt && !self.default_permissions.is_empty()
    }

    /// Compute the effective settings for one origin.
    pub fn settings_for_origin(
        &self,
        origin: &str,
        host: &str,
    ) -> BTreeMap<String, PermissionSetting> {
        let mut settings = BTreeMap::new();

        if self.default != PermissionSetting::Prompt {
            for perm in &self.default_permissions {
                if let Some(p) = norm_perm(perm) {
                    settings.insert(p, self.default);
                }
            }
        }

        for (pattern, perms) in &self.allow {
            if match_origin(origin, host, pattern) {
                for perm in perms {
                    if let Some(p) = norm_perm(perm) {
                        settings.insert(p, PermissionSetting::Granted);
                    }
                }
            }
        }

        for (pattern, perms) in &self.deny {
            if match_origin(origin, host, pattern) {
                for perm in perms {
                    if let Some(p) = norm_perm(perm) {
                        settings.insert(p, PermissionSetting::Denied);
                    }
                }
            }
        }

        settings
    }
}

fn norm_perm(raw: &str) -> Option<String> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() { None } else { Some(value) }
}

fn parse_perm_list(raw: &str) -> Vec<String> {
    raw.split(',').filter_map(norm_perm).collect()
}

fn parse_rule_map(raw: &str) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    for entry in raw.split(';') {
        let Some((origin, perms)) = entry.split_once('=') else {
            continue;
        };
        let origin = origin.trim();
        if origin.is_empty() {
            continue;
        }
        let perms = parse_perm_list(perms);
        if !perms.is_empty() {
            out.insert(origin.to_string(), perms);
        }
    }
    out
}

/// Extract (origin, host) from an http(s) URL, lowercased.
pub fn origin_from_url(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_lowercase();
    let origin = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };
    Some((origin, host))
}

/// Match an origin pattern: `*` matches everything; patterns containing
/// `://` compare exactly against the origin; bare hosts match as a suffix
/// with any leading dot stripped.
fn match_origin(origin: &str, host: &str, pattern: &str) -> bool {
    let pat = pattern.trim().to_lowercase();
    let pat = pat.trim_end_matches('/');
    if pat.is_empty() {
        return false;
    }
    if pat == "*" {
        return true;
    }
    if pat.contains("://") {
        return origin == pat;
    }
    let pat_host = pat.trim_start_matches('.');
    host == pat_host || host.ends_with(&format!(".{pat_host}"))
}

/// Build the permission policy from environment variables.
///
/// A JSON document in `MCP_PERMISSION_POLICY` wins; otherwise the granular
/// `MCP_PERMISSION_ALLOW` / `MCP_PERMISSION_DENY` / `MCP_PERMISSION_DEFAULT`
/// / `MCP_PERMISSION_DEFAULT_PERMS` variables are merged.
pub fn permission_policy_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> PermissionPolicy {
    let json_policy = lookup("MCP_PERMISSION_POLICY")
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
        .and_then(|value| match value {
            Value::Object(data) => Some(data),
            _ => None,
        });

    if let Some(data) = json_policy {
        let default = data
            .get("default")
            .and_then(Value::as_str)
            .map(PermissionSetting::parse)
            .unwrap_or_default();
        let default_permissions = match data.get("default_permissions") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().and_then(norm_perm))
                .collect(),
            Some(Value::String(s)) => parse_perm_list(s),
            _ => Vec::new(),
        };
        let rules = |key: &str| -> BTreeMap<String, Vec<String>> {
            let mut out = BTreeMap::new();
            if let Some(Value::Object(map)) = data.get(key) {
                for (origin, perms) in map {
                    let perms = match perms {
                        Value::Array(items) => items
                            .iter()
                            .filter_map(|v| v.as_str().and_then(norm_perm))
                            .collect(),
                        Value::String(s) => parse_perm_list(s),
                        _ => Vec::new(),
                    };
                    if !perms.is_empty() {
                        out.insert(origin.clone(), perms);
                    }
                }
            }
            out
        };
        return PermissionPolicy {
            default,
            default_permissions,
            allow: rules("allow"),
            deny: rules("deny"),
        };
    }

    PermissionPolicy {
        default: lookup("MCP_PERMISSION_DEFAULT")
            .map(|raw| PermissionSetting::parse(&raw))
            .unwrap_or_default(),
        default_permissions: lookup("MCP_PERMISSION_DEFAULT_PERMS")
            .map(|raw| parse_perm_list(&raw))
            .unwrap_or_default(),
        allow: lookup("MCP_PERMISSION_ALLOW")
            .map(|raw| parse_rule_map(&raw))
            .unwrap_or_default(),
        deny: lookup("MCP_PERMISSION_DENY")
            .map(|raw| parse_rule_map(&raw))
            .unwrap_or_default(),
    }
}

/// Build the permission policy from the process environment.
pub fn permission_policy_from_env() -> PermissionPolicy {
    permission_policy_from_lookup(|key| std::env::var(key).ok())
}

/// One permission application recorded in an [`ApplyReport`].
#[derive(Debug, Clone, Serialize)]
pub struct AppliedPermission {
    /// Permission name.
    pub permission: String,
    /// Setting that was applied.
    pub setting: PermissionSetting,
}

/// Best-effort outcome of [`apply_permission_policy`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    /// Whether at least one permission was applied.
    pub ok: bool,
    /// Origin the settings were applied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Why nothing was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Permissions that were applied.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<AppliedPermission>,
}

impl ApplyReport {
    fn skipped(reason: &str) -> Self {
        Self {
            ok: false,
            origin: None,
            reason: Some(reason.to_string()),
            applied: Vec::new(),
        }
    }
}

/// Dispatch the per-origin permission settings for a navigation.
///
/// Uses `Browser.setPermission` per permission; when the browser rejects
/// the method, falls back to `Browser.grantPermissions` for granted items
/// only. Never raises: failures are reported in the returned struct.
pub async fn apply_permission_policy(
    session: &Session,
    policy: &PermissionPolicy,
    url: &str,
) -> ApplyReport {
    let Some((origin, host)) = origin_from_url(url) else {
        return ApplyReport::skipped("unsupported_origin");
    };
    if !policy.enabled() {
        return ApplyReport::skipped("policy_disabled");
    }

    let settings = policy.settings_for_origin(&origin, &host);
    if settings.is_empty() {
        return ApplyReport::skipped("no_rules");
    }

    let mut applied = Vec::new();
    for (perm, setting) in settings {
        if setting == PermissionSetting::Prompt {
            continue;
        }
        let params = SetPermissionParams::new(perm.as_str(), setting.as_str(), origin.as_str());
        match session
            .send_typed::<_, Value>("Browser.setPermission", Some(params))
            .await
        {
            Ok(_) => {
                debug!(permission = %perm, setting = setting.as_str(), origin = %origin, "Applied permission");
                applied.push(AppliedPermission {
                    permission: perm,
                    setting,
                });
            }
            Err(err) => {
                // Old browsers lack setPermission; grantPermissions can
                // still express the granted subset.
                if setting == PermissionSetting::Granted {
                    let fallback =
                        GrantPermissionsParams::for_origin(vec![perm.clone()], origin.as_str());
                    if session
                        .send_typed::<_, Value>("Browser.grantPermissions", Some(fallback))
                        .await
                        .is_ok()
                    {
                        applied.push(AppliedPermission {
                            permission: perm,
                            setting,
                        });
                        continue;
                    }
                }
                warn!(permission = %perm, error = %err, "Failed to apply permission");
            }
        }
    }

    ApplyReport {
        ok: !applied.is_empty(),
        origin: Some(origin),
        reason: None,
        applied,
    }
}
