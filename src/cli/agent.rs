//! LSP and scripting command implementations

use serde_json::json;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::unbounded_channel;

use super::{read_input, resolve_theme, EXIT_ERROR, EXIT_SUCCESS};
use crate::bridge::{
    run_host_loop, ColorBridge, Decoration, HostEvent, MISS_REFRESH_DELAY, STARTUP_DELAY,
};
use crate::config::ThemeConfig;
use crate::lsp::notifications::{all_colors, serve_resolver};
use crate::lsp::text::{line_at, line_prefix};
use crate::lsp::{classify, completions_for, get_hover, word_at};
use tower_lsp::lsp_types::Position;

/// How long the bridge may stay silent before its last render is final
const SETTLE: Duration = STARTUP_DELAY.saturating_add(MISS_REFRESH_DELAY);

fn print_json(value: &serde_json::Value) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Execute the LSP server command
pub fn run_lsp() -> ExitCode {
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create async runtime: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    rt.block_on(crate::lsp::run_server());
    ExitCode::from(EXIT_SUCCESS)
}

/// Print completions at a 1-indexed line
pub fn run_complete(
    file: Option<&Path>,
    stdin: bool,
    config: Option<&Path>,
    line: u32,
    character: u32,
) -> ExitCode {
    let content = match read_input(file, stdin) {
        Ok(content) => content,
        Err(code) => return code,
    };
    let theme = match resolve_theme(config, file) {
        Ok(theme) => theme,
        Err(code) => return code,
    };

    let position = Position::new(line.saturating_sub(1), character);
    let context = classify(line_prefix(&content, position));
    let items = completions_for(context, &theme);
    print_json(&json!({ "context": context, "items": items }))
}

/// Print the hover markdown at a 1-indexed line, or `null`
pub fn run_hover(
    file: Option<&Path>,
    stdin: bool,
    config: Option<&Path>,
    line: u32,
    character: u32,
) -> ExitCode {
    let content = match read_input(file, stdin) {
        Ok(content) => content,
        Err(code) => return code,
    };
    let theme = match resolve_theme(config, file) {
        Ok(theme) => theme,
        Err(code) => return code,
    };

    let line_text = line_at(&content, line.saturating_sub(1));
    let hover = word_at(line_text, character).and_then(|token| {
        get_hover(token, line_text, &theme).map(|markdown| json!({ "token": token, "markdown": markdown }))
    });
    print_json(&hover.unwrap_or(serde_json::Value::Null))
}

/// Print every theme color
pub fn run_colors(config: Option<&Path>) -> ExitCode {
    let theme = match resolve_theme(config, None) {
        Ok(theme) => theme,
        Err(code) => return code,
    };
    print_json(&json!(all_colors(&theme)))
}

/// Print the decorations the bridge settles on for a stylesheet
pub fn run_swatches(file: Option<&Path>, stdin: bool, config: Option<&Path>) -> ExitCode {
    let content = match read_input(file, stdin) {
        Ok(content) => content,
        Err(code) => return code,
    };
    let theme = match resolve_theme(config, file) {
        Ok(theme) => theme,
        Err(code) => return code,
    };

    let rt = match Builder::new_current_thread().enable_time().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create async runtime: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let decorations = rt.block_on(settle_decorations(content, theme));
    print_json(&json!(decorations))
}

/// Run the bridge against an in-process resolver until renders stop
async fn settle_decorations(text: String, theme: ThemeConfig) -> Vec<Decoration> {
    let (request_tx, request_rx) = unbounded_channel();
    let (push_tx, push_rx) = unbounded_channel();
    let (event_tx, event_rx) = unbounded_channel();
    let (render_tx, mut render_rx) = unbounded_channel();

    tokio::spawn(serve_resolver(Arc::new(theme), request_rx, push_tx));
    let host = tokio::spawn(run_host_loop(ColorBridge::new(request_tx), event_rx, push_rx, render_tx));

    let _ = event_tx.send(HostEvent::DocumentChanged(text));
    let _ = event_tx.send(HostEvent::Ready);

    let mut latest = Vec::new();
    while let Ok(Some(render)) = tokio::time::timeout(SETTLE, render_rx.recv()).await {
        latest = render;
    }

    drop(event_tx);
    let _ = host.await;
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[tokio::test(start_paused = true)]
    async fn test_settle_decorations_uses_theme_values() {
        let theme = parse_config(
            "module.exports = { theme: { colors: { beige: '#0000FF', body: { fg: 'pink' } } } }",
        )
        .unwrap()
        .theme;
        let text = "@color fg beige;\n@color bg body.fg;\n@color fill nothing;".to_string();

        let decorations = settle_decorations(text, theme).await;
        let colors: Vec<&str> = decorations.iter().map(|d| d.color.as_str()).collect();
        assert_eq!(colors, ["#0000FF", "pink"]);
    }
}
