//! The editor-side event loop that keeps decorations current.

use super::{
    ColorBridge, Decoration, CONFIG_RENDER_DELAY, CONFIG_REQUEST_DELAY, EDIT_DEBOUNCE,
    MISS_REFRESH_DELAY, STARTUP_DELAY,
};
use crate::lsp::notifications::ColorInfoParams;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The editor finished activating
    Ready,
    /// Full text of the active document after an edit or a switch
    DocumentChanged(String),
    /// The theme config changed on disk
    ConfigChanged,
}

/// Far enough away to never fire; only used for disabled `select!` arms
fn until(deadline: Option<Instant>) -> Instant {
    deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400))
}

/// Drive `bridge` until `events` closes, sending each render to `renders`.
///
/// Each render carries the full decoration list for the current document.
/// A newer deadline replaces an older one, so bursts of edits or pushes
/// produce one render.
pub async fn run_host_loop(
    mut bridge: ColorBridge,
    mut events: UnboundedReceiver<HostEvent>,
    mut pushes: UnboundedReceiver<ColorInfoParams>,
    renders: UnboundedSender<Vec<Decoration>>,
) -> ColorBridge {
    let mut text = String::new();
    let mut request_all_at: Option<Instant> = None;
    let mut render_at: Option<Instant> = None;
    let mut refresh_at: Option<Instant> = None;

    loop {
        let render_now = tokio::select! {
            biased;

            event = events.recv() => {
                let now = Instant::now();
                match event {
                    None => break,
                    Some(HostEvent::Ready) => {
                        request_all_at = Some(now + STARTUP_DELAY);
                        render_at = Some(now + STARTUP_DELAY);
                    }
                    Some(HostEvent::DocumentChanged(changed)) => {
                        text = changed;
                        render_at = Some(now + EDIT_DEBOUNCE);
                    }
                    Some(HostEvent::ConfigChanged) => {
                        bridge.on_config_changed();
                        request_all_at = Some(now + CONFIG_REQUEST_DELAY);
                        render_at = Some(now + CONFIG_RENDER_DELAY);
                    }
                }
                false
            }
            Some(info) = pushes.recv() => {
                trace!(color = %info.color_name, "color pushed");
                bridge.on_color_info(info);
                render_at = Some(Instant::now() + EDIT_DEBOUNCE);
                false
            }
            _ = sleep_until(until(request_all_at)), if request_all_at.is_some() => {
                request_all_at = None;
                bridge.request_all();
                false
            }
            _ = sleep_until(until(render_at)), if render_at.is_some() => {
                render_at = None;
                true
            }
            _ = sleep_until(until(refresh_at)), if refresh_at.is_some() => {
                refresh_at = None;
                true
            }
        };

        if render_now {
            let pass = bridge.decorate(&text);
            debug!(
                decorations = pass.decorations.len(),
                new_requests = pass.new_requests,
                cached = bridge.cache().len(),
                "decoration pass"
            );
            if pass.new_requests > 0 {
                refresh_at = Some(Instant::now() + MISS_REFRESH_DELAY);
            }
            if renders.send(pass.decorations).is_err() {
                break;
            }
        }
    }

    bridge
}
