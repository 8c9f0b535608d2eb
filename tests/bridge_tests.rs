//! Color bridge and host loop timing
//!
//! Runs on a paused tokio clock, so timers fire as soon as every task is idle
//! and elapsed times are exact.

use std::sync::Arc;
use std::time::Duration;

use europa_lsp::bridge::{run_host_loop, ColorBridge, Decoration, HostEvent};
use europa_lsp::config::{parse_config, ThemeConfig};
use europa_lsp::lsp::notifications::{serve_resolver, BridgeRequest, ColorInfoParams};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

const CONFIG: &str = r#"module.exports = {
  theme: {
    colors: () => ({
      beige: '#0000FF',
      link: { text: '#111111', regular: { text: '#000000' } },
    }),
  },
}"#;

fn theme() -> Arc<ThemeConfig> {
    Arc::new(parse_config(CONFIG).unwrap().theme)
}

fn info(name: &str, hex: &str) -> ColorInfoParams {
    ColorInfoParams { color_name: name.to_string(), hex_value: hex.to_string() }
}

fn colors(decorations: &[Decoration]) -> Vec<&str> {
    decorations.iter().map(|d| d.color.as_str()).collect()
}

/// A host loop whose resolver side is played by the test
struct Harness {
    events: UnboundedSender<HostEvent>,
    pushes: UnboundedSender<ColorInfoParams>,
    requests: UnboundedReceiver<BridgeRequest>,
    renders: UnboundedReceiver<Vec<Decoration>>,
    host: JoinHandle<ColorBridge>,
}

fn spawn_host() -> Harness {
    let (request_tx, requests) = unbounded_channel();
    let (pushes, push_rx) = unbounded_channel();
    let (events, event_rx) = unbounded_channel();
    let (render_tx, renders) = unbounded_channel();
    let host = tokio::spawn(run_host_loop(ColorBridge::new(request_tx), event_rx, push_rx, render_tx));
    Harness { events, pushes, requests, renders, host }
}

#[tokio::test(start_paused = true)]
async fn test_theme_color_resolves_after_round_trip() {
    let (request_tx, request_rx) = unbounded_channel();
    let (push_tx, mut push_rx) = unbounded_channel();
    let mut bridge = ColorBridge::new(request_tx);

    // named-color fallback until the resolver answers
    assert_eq!(bridge.resolve_color("beige").as_deref(), Some("#F5F5DC"));

    tokio::spawn(serve_resolver(theme(), request_rx, push_tx));
    let pushed = push_rx.recv().await.unwrap();
    assert_eq!(pushed, info("beige", "#0000FF"));
    bridge.on_color_info(pushed);

    assert_eq!(bridge.resolve_color("beige").as_deref(), Some("#0000FF"));
}

#[tokio::test(start_paused = true)]
async fn test_nested_names_resolve_only_for_string_leaves() {
    let (request_tx, request_rx) = unbounded_channel();
    let (push_tx, mut push_rx) = unbounded_channel();
    let mut bridge = ColorBridge::new(request_tx);
    tokio::spawn(serve_resolver(theme(), request_rx, push_tx));

    assert_eq!(bridge.resolve_color("link.regular"), None);
    assert_eq!(bridge.resolve_color("link.text"), None);

    let pushed = push_rx.recv().await.unwrap();
    assert_eq!(pushed.color_name, "link.text");
    bridge.on_color_info(pushed);

    assert_eq!(bridge.resolve_color("link.text").as_deref(), Some("#111111"));
    assert_eq!(bridge.resolve_color("link.regular"), None);
}

#[tokio::test(start_paused = true)]
async fn test_bulk_request_fills_cache() {
    let (request_tx, request_rx) = unbounded_channel();
    let (push_tx, mut push_rx) = unbounded_channel();
    let mut bridge = ColorBridge::new(request_tx);
    tokio::spawn(serve_resolver(theme(), request_rx, push_tx));

    bridge.request_all();
    for _ in 0..2 {
        bridge.on_color_info(push_rx.recv().await.unwrap());
    }
    assert_eq!(bridge.cache().get("beige"), Some("#0000FF"));
    assert_eq!(bridge.cache().get("link.text"), Some("#111111"));
    assert_eq!(bridge.cache().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_edits_are_debounced() {
    let mut h = spawn_host();
    let start = Instant::now();

    h.events.send(HostEvent::DocumentChanged("a { color: #fff; }".into())).unwrap();
    sleep(Duration::from_millis(100)).await;
    h.events.send(HostEvent::DocumentChanged("a { color: #000; }".into())).unwrap();

    let render = h.renders.recv().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(300));
    assert_eq!(colors(&render), ["#000"]);

    // hex literals never miss, so nothing follows
    assert!(timeout(Duration::from_secs(5), h.renders.recv()).await.is_err());
    assert!(h.requests.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_miss_schedules_one_refresh() {
    let mut h = spawn_host();
    let start = Instant::now();
    h.events.send(HostEvent::DocumentChanged("@color fg beige;\n@color bg beige;".into())).unwrap();

    let first = h.renders.recv().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(200));
    assert_eq!(colors(&first), ["#F5F5DC", "#F5F5DC"]);
    assert_eq!(
        h.requests.try_recv().unwrap(),
        BridgeRequest::GetColorValue { color_name: "beige".into() }
    );
    assert!(h.requests.try_recv().is_err());

    let refresh = h.renders.recv().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(1200));
    assert_eq!(refresh, first);

    // the name is still pending, so the refresh asked for nothing new
    assert!(timeout(Duration::from_secs(5), h.renders.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_startup_requests_all_colors() {
    let mut h = spawn_host();
    let start = Instant::now();
    h.events.send(HostEvent::DocumentChanged("@color fg beige;".into())).unwrap();
    h.events.send(HostEvent::Ready).unwrap();

    assert_eq!(h.requests.recv().await.unwrap(), BridgeRequest::GetAllColors);
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
    h.pushes.send(info("beige", "#0000FF")).unwrap();

    let mut latest = None;
    while let Ok(Some(render)) = timeout(Duration::from_secs(3), h.renders.recv()).await {
        latest = Some(render);
    }
    assert_eq!(colors(&latest.unwrap()), ["#0000FF"]);
}

#[tokio::test(start_paused = true)]
async fn test_push_without_request_triggers_render() {
    let mut h = spawn_host();
    h.events.send(HostEvent::DocumentChanged("@color fg link.text;".into())).unwrap();

    let first = h.renders.recv().await.unwrap();
    assert!(first.is_empty());

    let pushed_at = Instant::now();
    h.pushes.send(info("link.text", "#111111")).unwrap();
    let render = h.renders.recv().await.unwrap();
    assert_eq!(pushed_at.elapsed(), Duration::from_millis(200));
    assert_eq!(colors(&render), ["#111111"]);
}

#[tokio::test(start_paused = true)]
async fn test_config_change_clears_and_refetches() {
    let mut h = spawn_host();
    h.events.send(HostEvent::DocumentChanged("@color fg beige;".into())).unwrap();
    h.pushes.send(info("beige", "#0000FF")).unwrap();

    let render = h.renders.recv().await.unwrap();
    assert_eq!(colors(&render), ["#0000FF"]);
    assert!(h.requests.try_recv().is_err());

    let changed_at = Instant::now();
    h.events.send(HostEvent::ConfigChanged).unwrap();

    assert_eq!(h.requests.recv().await.unwrap(), BridgeRequest::GetAllColors);
    assert_eq!(changed_at.elapsed(), Duration::from_millis(1000));

    let render = h.renders.recv().await.unwrap();
    assert_eq!(changed_at.elapsed(), Duration::from_millis(1500));
    assert_eq!(colors(&render), ["#F5F5DC"]);

    drop(h.events);
    let bridge = h.host.await.unwrap();
    assert!(bridge.cache().is_empty());
    assert!(bridge.is_pending("beige"));
}
