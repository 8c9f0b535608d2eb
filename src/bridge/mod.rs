//! Editor-side color bridge.
//!
//! Decorations need a hex value for every `@color` name in the document, but
//! the theme lives on the resolver side. The bridge answers from its cache
//! when it can and otherwise fires a one-way request, falling back to CSS
//! named colors until the answer arrives as a `colorInfo` push.

pub mod decorations;
pub mod host;

pub use decorations::{scan, ColorMention, Decoration, MentionKind};
pub use host::{run_host_loop, HostEvent};

use crate::lsp::notifications::{BridgeRequest, ColorInfoParams};
use crate::named_colors::{builtin_color, lookup_named_color};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Delay between the host becoming ready and the first bulk request
pub const STARTUP_DELAY: Duration = Duration::from_millis(1000);
/// Quiet period after an edit before decorations are recomputed
pub const EDIT_DEBOUNCE: Duration = Duration::from_millis(200);
/// Delay between a config change and the bulk request that refills the cache
pub const CONFIG_REQUEST_DELAY: Duration = Duration::from_millis(1000);
/// Delay between a config change and the next render
pub const CONFIG_RENDER_DELAY: Duration = Duration::from_millis(1500);
/// Delay before re-rendering after a pass that had to ask for colors
pub const MISS_REFRESH_DELAY: Duration = Duration::from_millis(1000);

/// Resolved `name -> hex` pairs
#[derive(Debug, Default, Clone)]
pub struct ColorCache {
    entries: HashMap<String, String>,
}

impl ColorCache {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: String, hex: String) {
        self.entries.insert(name, hex);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one decoration pass
#[derive(Debug, Clone, Default)]
pub struct DecorationPass {
    pub decorations: Vec<Decoration>,
    /// Requests this pass sent for names not yet asked about
    pub new_requests: usize,
}

/// Cache plus request coalescing for one editor session
#[derive(Debug)]
pub struct ColorBridge {
    cache: ColorCache,
    /// Names with a request in flight
    pending: HashSet<String>,
    requests: UnboundedSender<BridgeRequest>,
}

impl ColorBridge {
    pub fn new(requests: UnboundedSender<BridgeRequest>) -> Self {
        Self { cache: ColorCache::default(), pending: HashSet::new(), requests }
    }

    pub fn cache(&self) -> &ColorCache {
        &self.cache
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.contains(name)
    }

    /// Best hex value available right now.
    ///
    /// A cache miss asks the resolver once and answers from the built-in and
    /// named color tables in the meantime.
    pub fn resolve_color(&mut self, name: &str) -> Option<String> {
        if name.starts_with('#') {
            return Some(name.to_string());
        }
        if let Some(hex) = self.cache.get(name) {
            return Some(hex.to_string());
        }

        self.request_color(name);

        builtin_color(name).or_else(|| lookup_named_color(name)).map(str::to_string)
    }

    /// Ask for one color unless a request for it is already in flight.
    ///
    /// Returns whether a request was sent.
    pub fn request_color(&mut self, name: &str) -> bool {
        if self.pending.contains(name) {
            return false;
        }
        let request = BridgeRequest::GetColorValue { color_name: name.to_string() };
        if self.requests.send(request).is_err() {
            debug!(color = name, "resolver gone, color request dropped");
            return false;
        }
        self.pending.insert(name.to_string());
        true
    }

    /// Ask for every color in the theme
    pub fn request_all(&mut self) {
        if self.requests.send(BridgeRequest::GetAllColors).is_err() {
            debug!("resolver gone, bulk color request dropped");
        }
    }

    /// Store a pushed color; no outstanding request is needed.
    ///
    /// Pushes with an empty name or value are ignored.
    pub fn on_color_info(&mut self, info: ColorInfoParams) {
        if info.color_name.is_empty() || info.hex_value.is_empty() {
            debug!(color = %info.color_name, "ignoring incomplete color push");
            return;
        }
        self.pending.remove(&info.color_name);
        self.cache.insert(info.color_name, info.hex_value);
    }

    /// Forget everything learned from the previous theme
    pub fn on_config_changed(&mut self) {
        self.cache.clear();
        self.pending.clear();
    }

    /// Compute decorations for `text`, requesting any names not yet known
    pub fn decorate(&mut self, text: &str) -> DecorationPass {
        let mut pass = DecorationPass::default();

        for mention in scan(text) {
            let color = match mention.kind {
                MentionKind::Hex => Some(mention.name.to_string()),
                MentionKind::Theme => {
                    let before = self.pending.len();
                    let color = self.resolve_color(mention.name);
                    if self.pending.len() > before {
                        pass.new_requests += 1;
                    }
                    color
                }
            };
            if let Some(color) = color {
                pass.decorations.push(Decoration::new(text, &mention, color));
            }
        }

        pass
    }
}
