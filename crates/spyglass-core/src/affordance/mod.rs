//! Stable action refs (`aff:<10-hex>`) and the per-tab affordance store.
//!
//! A ref is a deterministic hash of the action it resolves to, so the same
//! affordance gets the same ref across runs and across DOM reordering.
//! Refs are set by locator/map producers and resolved by `act(ref=...)`
//! style consumers; the store expires with the tab.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha1::{Digest, Sha1};

/// Most specs one tab can hold; oldest are dropped first.
const STORE_CAP: usize = 200;

/// Signature version baked into every ref.
const REF_VERSION: u32 = 1;

/// Prefix of every affordance ref.
pub const REF_PREFIX: &str = "aff:";

/// One cached action: the tool to call and the arguments to call it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Tool name, e.g. "click_element", "focus".
    pub tool: String,
    /// Tool arguments.
    pub args: Value,
    /// Non-semantic metadata (labels, kinds) carried for display.
    pub meta: Value,
}

impl ActionSpec {
    /// Build a spec.
    #[must_use]
    pub fn new(tool: impl Into<String>, args: Value, meta: Value) -> Self {
        Self {
            tool: tool.into(),
            args,
            meta,
        }
    }
}

/// Compute the stable ref for a spec.
///
/// The signature is canonical JSON (sorted keys, compact separators) of
/// `{v, tool, args, meta}`, hashed with SHA-1 and truncated to 10 hex
/// characters. Deterministic across runs and insensitive to item order.
#[must_use]
pub fn stable_ref(spec: &ActionSpec) -> String {
    let sig = json!({
        "v": REF_VERSION,
        "tool": spec.tool,
        "args": spec.args,
        "meta": spec.meta,
    });
    // serde_json maps are BTree-backed, so serialization is key-sorted.
    let blob = sig.to_string();
    let digest = Sha1::digest(blob.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{REF_PREFIX}{}", &hex[..10])
}

/// Per-tab mapping from ref to action spec.
#[derive(Debug, Default)]
pub struct AffordanceStore {
    by_ref: HashMap<String, ActionSpec>,
    order: VecDeque<String>,
    /// Page URL the specs were harvested from.
    pub url: Option<String>,
    /// Telemetry cursor at harvest time.
    pub cursor: Option<u64>,
}

impl AffordanceStore {
    /// Replace or extend the store with freshly harvested specs.
    ///
    /// Returns the refs in input order. The store is bounded; when full,
    /// the oldest inserted refs are evicted.
    pub fn set(&mut self, items: &[ActionSpec], url: Option<String>, cursor: Option<u64>) -> Vec<String> {
        let mut refs = Vec::with_capacity(items.len());
        for spec in items {
            let ref_ = stable_ref(spec);
            if !self.by_ref.contains_key(&ref_) {
                while self.order.len() >= STORE_CAP {
                    if let Some(evicted) = self.order.pop_front() {
                        self.by_ref.remove(&evicted);
                    }
                }
                self.order.push_back(ref_.clone());
            }
            self.by_ref.insert(ref_.clone(), spec.clone());
            refs.push(ref_);
        }
        if url.is_some() {
            self.url = url;
        }
        if cursor.is_some() {
            self.cursor = cursor;
        }
        refs
    }

    /// Resolve a ref back to its action spec.
    pub fn resolve(&self, ref_: &str) -> Option<&ActionSpec> {
        self.by_ref.get(ref_)
    }

    /// Number of cached specs.
    pub fn len(&self) -> usize {
        self.by_ref.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.by_ref.is_empty()
    }
}

#[cfg(test)]
mod tests;
