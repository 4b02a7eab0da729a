//! Insight derivation: a pure function from a diagnostics snapshot to a
//! compact, scored list of actionable findings.
//!
//! The snapshot may come from the Tier-1 page global or from the Tier-0
//! buffers; both serialize to the same loose JSON shape, so the rules
//! operate on [`Value`]. Output is capped at ten items, ordered by severity
//! then score.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};
use url::Url;

use crate::config::Toolset;

/// Cap on the derived insight list.
const MAX_INSIGHTS: usize = 10;

/// One scored advisory derived from a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    /// "error", "warn", or "info".
    pub severity: String,
    /// Stable machine kind, e.g. "cors", "auth", "cls".
    pub kind: String,
    /// Human-readable finding.
    pub message: String,
    /// What to do about it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Supporting samples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Value>,
    /// Ranking score; never serialized.
    #[serde(skip)]
    score: f64,
}

fn regexes(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("static pattern"))
        .collect()
}

static HYDRATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        "hydration",
        "did not match",
        "text content does not match",
        "expected server html",
    ])
});

static CORS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        "blocked by cors policy",
        "access-control-allow-origin",
        "cors request did not succeed",
        "preflight.*(failed|blocked)",
    ])
});

static CSP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        "content security policy",
        "refused to .* because it violates the following content security policy directive",
        "violat.*csp",
    ])
});

static MIXED_CONTENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        "mixed content",
        "was loaded over https, but requested an insecure",
    ])
});

static COOKIE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        "samesite",
        "this set-cookie was blocked",
        "cookie .* was blocked",
    ])
});

static FRAME_BLOCK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        "x-frame-options",
        "frame-ancestors",
        "refused to display .* in a frame",
    ])
});

static EXTENSION_NOISE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        "cannot redefine property: ethereum",
        "defineproperty.*ethereum",
    ])
});

static EXTENSION_SCHEME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        "chrome-extension://",
        "moz-extension://",
        "safari-extension://",
        "ms-browser-extension://",
        "extension://",
    ])
});

fn is_extension_noise_text(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    EXTENSION_NOISE_PATTERNS.iter().any(|p| p.is_match(text))
        || EXTENSION_SCHEME_PATTERNS.iter().any(|p| p.is_match(text))
}

fn str_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry.get(key).and_then(Value::as_str)
}

/// Remove known extension-origin noise (wallet/content scripts) from a
/// diagnostics snapshot before it is shown to an agent. The raw buffers
/// are never filtered.
#[must_use]
pub fn filter_extension_noise(snapshot: &Value) -> Value {
    let Value::Object(map) = snapshot else {
        return snapshot.clone();
    };
    let mut cleaned = map.clone();

    let console_keep = |entry: &Value| -> bool {
        match entry.get("args") {
            Some(Value::Array(args)) => !args
                .iter()
                .any(|arg| is_extension_noise_text(&value_text(arg))),
            _ => true,
        }
    };
    let error_keep = |entry: &Value| -> bool {
        for key in ["message", "filename", "url"] {
            if str_field(entry, key).is_some_and(is_extension_noise_text) {
                return false;
            }
        }
        true
    };
    let rejection_keep = |entry: &Value| -> bool {
        for key in ["message", "stack"] {
            if str_field(entry, key).is_some_and(is_extension_noise_text) {
                return false;
            }
        }
        true
    };

    let retain = |cleaned: &mut serde_json::Map<String, Value>,
                  key: &str,
                  keep: &dyn Fn(&Value) -> bool| {
        if let Some(Value::Array(entries)) = cleaned.get(key) {
            let kept: Vec<Value> = entries
                .iter()
                .filter(|e| e.is_object() && keep(e))
                .cloned()
                .collect();
            cleaned.insert(key.to_string(), Value::Array(kept));
        }
    };

    retain(&mut cleaned, "console", &console_keep);
    retain(&mut cleaned, "errors", &error_keep);
    retain(&mut cleaned, "unhandledRejections", &rejection_keep);
    Value::Object(cleaned)
}

fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn console_text(entry: &Value) -> String {
    match entry.get("args") {
        Some(Value::Array(args)) => norm_ws(
            &args
                .iter()
                .filter(|a| !a.is_null())
                .map(value_text)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Some(other) => norm_ws(&value_text(other)),
        None => String::new(),
    }
}

fn clip_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Frequency-rank texts and keep the top few as `{count, text}` samples.
fn top_fingerprints(texts: &[String], max_items: usize) -> Vec<Value> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut sample: BTreeMap<String, String> = BTreeMap::new();
    for text in texts {
        let tt = norm_ws(text);
        if tt.is_empty() {
            continue;
        }
        let key = clip_chars(&tt, 300);
        *counts.entry(key.clone()).or_insert(0) += 1;
        sample.insert(key, tt);
    }
    let mut items: Vec<(u64, String)> = counts
        .into_iter()
        .map(|(key, count)| (count, sample.get(&key).cloned().unwrap_or(key)))
        .collect();
    items.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    items
        .into_iter()
        .take(max_items)
        .map(|(count, text)| json!({"count": count, "text": text}))
        .collect()
}

fn pattern_hits(patterns: &[Regex], texts: &[String]) -> Vec<String> {
    texts
        .iter()
        .filter(|t| patterns.iter().any(|p| p.is_match(t)))
        .cloned()
        .collect()
}

fn url_origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{host}", parsed.scheme())),
    }
}

fn as_array<'a>(snapshot: &'a Value, key: &str) -> &'a [Value] {
    snapshot
        .get(key)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

fn as_i64_loose(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

struct InsightSink {
    items: Vec<Insight>,
}

impl InsightSink {
    fn add(
        &mut self,
        severity: &str,
        kind: &str,
        message: String,
        suggestion: Option<String>,
        evidence: Option<Value>,
        score: f64,
    ) {
        self.items.push(Insight {
            severity: severity.to_string(),
            kind: kind.to_string(),
            message,
            suggestion,
            evidence,
            score,
        });
    }
}

/// Convert a raw diagnostics snapshot into a compact list of actionable
/// insights, ordered by severity then score, capped at ten.
#[must_use]
pub fn derive_insights(snapshot: &Value, toolset: Toolset) -> Vec<Insight> {
    let mut sink = InsightSink { items: Vec::new() };

    let console_entries = as_array(snapshot, "console");
    let errors = as_array(snapshot, "errors");
    let rejections = as_array(snapshot, "unhandledRejections");
    let failed_network = as_array(snapshot, "network");
    let har_lite = as_array(snapshot, "harLite");
    let navigation = as_array(snapshot, "navigation");
    let dialogs = as_array(snapshot, "dialogs");
    let dialog_open = snapshot
        .get("dialogOpen")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let net_trace_hint = match toolset {
        Toolset::V2 => r#"run(actions=[{net:{action:"trace", capture:"full", store:true}}])"#,
        Toolset::V1 => r#"run(actions=[{"tool":"net","args":{"action":"trace","capture":"full","store":true}}])"#,
    };

    // Console pattern scanning (CORS/CSP/mixed-content/cookies/xfo).
    let console_warn_error_texts: Vec<String> = console_entries
        .iter()
        .filter(|entry| matches!(str_field(entry, "level"), Some("warn" | "error")))
        .map(console_text)
        .filter(|t| !t.is_empty())
        .collect();

    let cors_hits = pattern_hits(&CORS_PATTERNS, &console_warn_error_texts);
    if !cors_hits.is_empty() {
        sink.add(
            "error",
            "cors",
            format!("CORS blocked (signals: {})", cors_hits.len()),
            Some(format!(
                "Fix CORS headers (Access-Control-Allow-Origin / -Credentials) and preflight; \
                 for deep request/response capture use {net_trace_hint}"
            )),
            Some(json!({"examples": top_fingerprints(&cors_hits, 2)})),
            50.0 + cors_hits.len() as f64,
        );
    }

    let csp_hits = pattern_hits(&CSP_PATTERNS, &console_warn_error_texts);
    if !csp_hits.is_empty() {
        sink.add(
            "error",
            "csp",
            format!("CSP violation detected (signals: {})", csp_hits.len()),
            Some(
                "Inspect the Content-Security-Policy header (script-src/style-src/frame-ancestors) \
                 and fix blocked resource/inline usage."
                    .to_string(),
            ),
            Some(json!({"examples": top_fingerprints(&csp_hits, 2)})),
            45.0 + csp_hits.len() as f64,
        );
    }

    let mixed_hits = pattern_hits(&MIXED_CONTENT_PATTERNS, &console_warn_error_texts);
    if !mixed_hits.is_empty() {
        sink.add(
            "error",
            "mixed_content",
            format!("Mixed Content detected (signals: {})", mixed_hits.len()),
            Some(
                "Ensure all resources/APIs use HTTPS; fix hardcoded http:// links and redirects."
                    .to_string(),
            ),
            Some(json!({"examples": top_fingerprints(&mixed_hits, 2)})),
            40.0 + mixed_hits.len() as f64,
        );
    }

    let cookie_hits = pattern_hits(&COOKIE_PATTERNS, &console_warn_error_texts);
    if !cookie_hits.is_empty() {
        sink.add(
            "warn",
            "cookie_policy",
            format!("Cookie/SameSite warnings detected (signals: {})", cookie_hits.len()),
            Some(
                "Check SameSite / Secure / Domain / Path for auth cookies; verify third-party \
                 cookie assumptions and ITP/Chrome changes."
                    .to_string(),
            ),
            Some(json!({"examples": top_fingerprints(&cookie_hits, 2)})),
            20.0 + cookie_hits.len() as f64,
        );
    }

    let frame_hits = pattern_hits(&FRAME_BLOCK_PATTERNS, &console_warn_error_texts);
    if !frame_hits.is_empty() {
        sink.add(
            "warn",
            "frame_block",
            format!(
                "Frame/embed blocked (X-Frame-Options / frame-ancestors) (signals: {})",
                frame_hits.len()
            ),
            Some(
                "If embedding is intended: adjust X-Frame-Options / CSP frame-ancestors; \
                 otherwise ignore."
                    .to_string(),
            ),
            Some(json!({"examples": top_fingerprints(&frame_hits, 2)})),
            15.0 + frame_hits.len() as f64,
        );
    }

    // Blocking dialogs (alert/confirm/prompt).
    if dialog_open {
        let meta = snapshot
            .get("dialog")
            .filter(|d| d.is_object())
            .cloned()
            .or_else(|| {
                dialogs
                    .iter()
                    .rev()
                    .find(|d| str_field(d, "event") == Some("open"))
                    .cloned()
            })
            .unwrap_or_else(|| json!({}));

        let dtype = str_field(&meta, "type").unwrap_or("dialog").to_string();
        let suggestion = match toolset {
            Toolset::V2 => r#"run(actions=[{dialog:{accept:true}}])  # or accept:false / text:"...""#,
            Toolset::V1 => "dialog(accept=true)  # or accept=false / text='...'",
        };
        sink.add(
            "error",
            "dialog",
            format!("Blocking JS dialog detected: {dtype}"),
            Some(suggestion.to_string()),
            Some(json!({"type": meta.get("type"), "message": meta.get("message")})),
            90.0,
        );
    }

    // JS errors, frequency-ranked so a loop of identical throws reads as one.
    let js_errors: Vec<&Value> = errors
        .iter()
        .filter(|e| str_field(e, "type") == Some("error") && str_field(e, "message").is_some())
        .collect();
    if !js_errors.is_empty() {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut last_by_msg: BTreeMap<String, &Value> = BTreeMap::new();
        for entry in &js_errors {
            let msg = norm_ws(str_field(entry, "message").unwrap_or_default());
            if msg.is_empty() {
                continue;
            }
            *counts.entry(msg.clone()).or_insert(0) += 1;
            last_by_msg.insert(msg, entry);
        }
        if let Some((msg0, c0)) = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        {
            let e0 = last_by_msg
                .get(&msg0)
                .copied()
                .unwrap_or_else(|| js_errors[js_errors.len() - 1]);
            let suffix = if c0 > 1 { format!(" (x{c0})") } else { String::new() };
            sink.add(
                "error",
                "js_error",
                format!("{msg0}{suffix}"),
                Some(
                    "Open the stack trace and fix the root cause; then reload and re-check \
                     diagnostics."
                        .to_string(),
                ),
                Some(json!({
                    "count": c0,
                    "filename": e0.get("filename"),
                    "lineno": e0.get("lineno"),
                    "colno": e0.get("colno"),
                })),
                80.0 + (c0 as f64).min(20.0),
            );
        }
    }

    let resource_errors: Vec<&Value> = errors
        .iter()
        .filter(|e| str_field(e, "type") == Some("resource"))
        .collect();
    if let Some(e0) = resource_errors.last() {
        sink.add(
            "error",
            "resource_load_failed",
            format!("{} failed to load", str_field(e0, "tag").unwrap_or("resource")),
            Some(
                "Check URL, network/CSP/adblock, and whether the asset exists; then inspect \
                 resource timings."
                    .to_string(),
            ),
            Some(json!({"url": e0.get("url")})),
            35.0,
        );
    }

    // Unhandled promise rejections.
    if let Some(e0) = rejections.last() {
        let message = str_field(e0, "message")
            .map_or_else(|| value_text(e0), ToString::to_string);
        let message = if message.is_empty() {
            "Unhandled promise rejection".to_string()
        } else {
            message
        };
        sink.add(
            "error",
            "unhandled_rejection",
            message,
            Some(
                "Find the rejecting promise and add proper error handling; check console stack \
                 trace."
                    .to_string(),
            ),
            None,
            60.0,
        );
    }

    // Failed fetch/xhr, grouped so one flaky endpoint is not fifty findings.
    if !failed_network.is_empty() {
        let mut by_key: BTreeMap<String, Value> = BTreeMap::new();
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut blocked_by_client = 0u64;
        for entry in failed_network {
            let url = norm_ws(str_field(entry, "url").unwrap_or_default());
            let method = norm_ws(str_field(entry, "method").unwrap_or_default());
            let status = entry.get("status").and_then(as_i64_loose);
            let err_text = norm_ws(str_field(entry, "errorText").unwrap_or_default());
            let blocked_reason = norm_ws(str_field(entry, "blockedReason").unwrap_or_default());
            if err_text.to_lowercase().contains("err_blocked_by_client")
                || blocked_reason.eq_ignore_ascii_case("blockedbyclient")
            {
                blocked_by_client += 1;
            }

            let status_part = status.map(|s| s.to_string()).unwrap_or_default();
            let tail = if err_text.is_empty() { &blocked_reason } else { &err_text };
            let key = norm_ws(&format!("{method} {url} {status_part} {tail}"));
            if key.is_empty() {
                continue;
            }
            *counts.entry(key.clone()).or_insert(0) += 1;
            by_key.insert(
                key,
                json!({
                    "url": url,
                    "method": method,
                    "status": status,
                    "errorText": err_text,
                    "blockedReason": blocked_reason,
                }),
            );
        }

        if blocked_by_client > 0 {
            sink.add(
                "warn",
                "blocked_by_client",
                format!(
                    "Requests blocked by client (adblock/extension) (signals: {blocked_by_client})"
                ),
                Some(
                    "Retry in a clean profile or disable adblock/privacy extensions; verify \
                     corporate proxy/filters."
                        .to_string(),
                ),
                None,
                25.0 + blocked_by_client as f64,
            );
        }

        if let Some((key0, c0)) = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        {
            let meta = by_key.get(&key0).cloned().unwrap_or_else(|| json!({}));
            let status0 = meta.get("status").and_then(as_i64_loose);
            let severity = if status0.is_some_and(|s| s >= 500) { "error" } else { "warn" };
            sink.add(
                severity,
                "network_failure",
                format!(
                    "Network requests failing: {} total; top failure x{}: {} {} ({})",
                    failed_network.len(),
                    c0,
                    str_field(&meta, "method").unwrap_or_default(),
                    str_field(&meta, "url").unwrap_or_default(),
                    status0.map_or_else(|| "None".to_string(), |s| s.to_string()),
                ),
                Some(format!(
                    "Check API availability/CORS/auth; for deep trace capture use {net_trace_hint}"
                )),
                Some(json!({"topFailure": meta, "count": c0})),
                (if severity == "error" { 70.0 } else { 30.0 }) + (c0 as f64).min(30.0),
            );
        }
    }

    // HAR-lite: status distribution / auth issues / 5xx clusters.
    if !har_lite.is_empty() {
        let mut auth: Vec<&Value> = Vec::new();
        let mut s5: Vec<&Value> = Vec::new();
        let mut s4: Vec<&Value> = Vec::new();
        let mut origins: Vec<String> = Vec::new();
        for item in har_lite {
            if !item.is_object() {
                continue;
            }
            if let Some(url) = str_field(item, "url")
                && let Some(origin) = url_origin(url)
                && !origins.contains(&origin)
            {
                origins.push(origin);
            }
            match item.get("status").and_then(as_i64_loose) {
                Some(401 | 403) => auth.push(item),
                Some(s) if s >= 500 => s5.push(item),
                Some(s) if s >= 400 => s4.push(item),
                _ => {}
            }
        }
        origins.sort();

        let top_urls = |items: &[&Value], max_items: usize| -> Vec<Value> {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            let mut sample: BTreeMap<String, &Value> = BTreeMap::new();
            for item in items {
                let Some(url) = str_field(item, "url").filter(|u| !u.is_empty()) else {
                    continue;
                };
                *counts.entry(url.to_string()).or_insert(0) += 1;
                sample.insert(url.to_string(), item);
            }
            let mut ranked: Vec<(u64, String)> =
                counts.into_iter().map(|(url, count)| (count, url)).collect();
            ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
            ranked
                .into_iter()
                .take(max_items)
                .map(|(count, url)| {
                    let s = sample.get(&url).copied().unwrap_or(&Value::Null);
                    let mut out = json!({"url": url, "count": count});
                    if let Some(status) = s.get("status").filter(|v| !v.is_null()) {
                        out["status"] = status.clone();
                    }
                    if let Some(rtype) = str_field(s, "type") {
                        out["type"] = json!(rtype);
                    }
                    out
                })
                .collect()
        };

        if !auth.is_empty() {
            sink.add(
                "error",
                "auth",
                format!("Auth failures detected (401/403): {} request(s)", auth.len()),
                Some(
                    "Check cookies/tokens/CSRF and whether third-party cookies are blocked; \
                     verify user segment/region gating."
                        .to_string(),
                ),
                Some(json!({
                    "top": top_urls(&auth, 3),
                    "origins": origins.iter().take(4).collect::<Vec<_>>(),
                })),
                75.0 + auth.len() as f64,
            );
        }

        if !s5.is_empty() {
            sink.add(
                "error",
                "server_5xx",
                format!("Server errors detected (5xx): {} request(s)", s5.len()),
                Some(format!(
                    "Identify the failing endpoint(s) and capture the response via \
                     {net_trace_hint} (redacted by default)."
                )),
                Some(json!({"top": top_urls(&s5, 3)})),
                70.0 + s5.len() as f64,
            );
        } else if !s4.is_empty() && auth.is_empty() {
            // 4xx without auth failures usually means validation/feature gating.
            sink.add(
                "warn",
                "http_4xx",
                format!("HTTP 4xx responses detected: {} request(s)", s4.len()),
                Some(
                    "Inspect request parameters/feature flags; check validation and release \
                     gating. Use net(trace) to capture request bodies when needed."
                        .to_string(),
                ),
                Some(json!({"top": top_urls(&s4, 3)})),
                25.0 + s4.len() as f64,
            );
        }
    }

    // Navigation loops / SPA thrash.
    if navigation.len() >= 6 {
        let urls: Vec<String> = navigation
            .iter()
            .rev()
            .take(50)
            .filter_map(|n| str_field(n, "url"))
            .map(norm_ws)
            .filter(|u| !u.is_empty())
            .collect();
        if !urls.is_empty() {
            let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
            for url in &urls {
                *counts.entry(url).or_insert(0) += 1;
            }
            if let Some((u0, c0)) = counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
                && (c0 >= 4 || (urls.len() >= 10 && c0 >= 3))
            {
                sink.add(
                    "warn",
                    "navigation_loop",
                    format!("Navigation loop/SPA thrash suspected: {c0} nav events to the same URL"),
                    Some(
                        "Check auth redirects, router guards, and whether an API 401 triggers \
                         infinite retries; inspect Network/Console around the loop."
                            .to_string(),
                    ),
                    Some(json!({"url": u0, "events": urls.len()})),
                    15.0 + c0 as f64,
                );
            }
        }
    }

    // Hydration hints.
    let hydration_hit = console_entries.iter().any(|entry| {
        matches!(str_field(entry, "level"), Some("warn" | "error"))
            && HYDRATION_PATTERNS
                .iter()
                .any(|p| p.is_match(&console_text(entry)))
    });
    if hydration_hit {
        sink.add(
            "error",
            "hydration",
            "Detected hydration mismatch signals in console output".to_string(),
            Some(
                "If this is SSR/SPA: compare server HTML vs client render, check conditional \
                 rendering and locale-dependent formatting."
                    .to_string(),
            ),
            None,
            55.0,
        );
    }

    // Performance hints.
    if let Some(vitals) = snapshot.get("vitals").filter(|v| v.is_object()) {
        if let Some(cls) = vitals.get("cls").and_then(Value::as_f64)
            && cls >= 0.1
        {
            sink.add(
                if cls < 0.25 { "warn" } else { "error" },
                "cls",
                format!("High Cumulative Layout Shift (CLS): {cls:.3}"),
                Some(
                    "Reserve layout space for images/fonts, avoid inserting content above \
                     existing content."
                        .to_string(),
                ),
                None,
                10.0 + cls,
            );
        }

        if let Some(lcp) = vitals.get("lcp").filter(|v| v.is_object())
            && let Some(lcp_ms) = lcp.get("startTime").and_then(Value::as_f64)
            && lcp_ms >= 2500.0
        {
            sink.add(
                if lcp_ms < 4000.0 { "warn" } else { "error" },
                "lcp",
                format!("Slow LCP: {}ms", lcp_ms as i64),
                Some(
                    "Optimize the LCP element (often hero image/text): reduce JS, compress \
                     images, preconnect critical origins."
                        .to_string(),
                ),
                Some(json!({"element": lcp.get("element"), "url": lcp.get("url")})),
                10.0 + lcp_ms / 1000.0,
            );
        }

        if let Some(long_tasks) = vitals.get("longTasks").filter(|v| v.is_object())
            && let Some(max_dur) = long_tasks.get("maxDuration").and_then(Value::as_f64)
            && max_dur >= 50.0
        {
            sink.add(
                if max_dur < 200.0 { "warn" } else { "error" },
                "long_tasks",
                format!("Long tasks detected (max {}ms)", max_dur as i64),
                Some(
                    "Break up heavy JS work, defer non-critical scripts, and consider \
                     code-splitting."
                        .to_string(),
                ),
                None,
                5.0 + max_dur / 100.0,
            );
        }
    }

    // Dev error overlay (vite/next/webpack).
    if let Some(overlay) = snapshot.get("devOverlay").filter(|v| v.is_object())
        && overlay.get("type").is_some_and(|t| !t.is_null())
    {
        sink.add(
            "error",
            "dev_overlay",
            format!(
                "Dev error overlay detected ({})",
                overlay.get("type").map(value_text).unwrap_or_default()
            ),
            Some(
                "Fix the runtime/build error shown in the overlay (it usually includes a stack \
                 trace), then reload and re-check diagnostics."
                    .to_string(),
            ),
            Some(json!({"text": overlay.get("text")})),
            85.0,
        );
    }

    // Resource / network performance hints.
    if let Some(summary) = snapshot
        .get("resources")
        .and_then(|r| r.get("summary"))
        .filter(|s| s.is_object())
    {
        if let Some(total) = summary.get("totalTransferSize").and_then(Value::as_f64)
            && total >= 5_000_000.0
        {
            sink.add(
                if total < 10_000_000.0 { "warn" } else { "error" },
                "transfer_size",
                format!("High total transfer size: {:.1}MB", total / 1_000_000.0),
                Some(
                    "Reduce bundle/asset size (compression, code-splitting, remove unused \
                     deps), and optimize images."
                        .to_string(),
                ),
                None,
                5.0 + total / 1_000_000.0,
            );
        }

        if let Some(r0) = summary
            .get("largest")
            .and_then(Value::as_array)
            .and_then(|l| l.first())
            && let Some(size) = r0.get("transferSize").and_then(Value::as_f64)
            && size >= 1_000_000.0
        {
            sink.add(
                if size < 2_000_000.0 { "warn" } else { "error" },
                "largest_resource",
                format!("Large resource: {:.1}MB", size / 1_000_000.0),
                Some(
                    "Compress/split the largest assets (often JS bundles or hero images)."
                        .to_string(),
                ),
                Some(json!({"url": r0.get("url"), "initiatorType": r0.get("initiatorType")})),
                5.0 + size / 1_000_000.0,
            );
        }

        if let Some(r0) = summary
            .get("slowest")
            .and_then(Value::as_array)
            .and_then(|l| l.first())
            && let Some(dur) = r0.get("duration").and_then(Value::as_f64)
            && dur >= 3000.0
        {
            sink.add(
                if dur < 8000.0 { "warn" } else { "error" },
                "slow_resource",
                format!("Slow resource: {}ms", dur as i64),
                Some(
                    "Look for server latency, compression, caching headers, and reduce \
                     critical-path requests."
                        .to_string(),
                ),
                Some(json!({"url": r0.get("url"), "initiatorType": r0.get("initiatorType")})),
                5.0 + dur / 1000.0,
            );
        }
    }

    // Keep output compact: top entries by severity order, then score.
    let severity_rank = |severity: &str| match severity {
        "error" => 0,
        "warn" => 1,
        "info" => 2,
        _ => 3,
    };
    let mut items = sink.items;
    items.sort_by(|a, b| {
        severity_rank(&a.severity)
            .cmp(&severity_rank(&b.severity))
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
    });
    items.truncate(MAX_INSIGHTS);
    items
}
