//! Color resolution notifications.
//!
//! The editor side keeps a cache of `name -> hex` and fills it through
//! one-way notifications: it sends `europacss/getAllColors` or
//! `europacss/getColorValue`, and the server answers each with zero or more
//! `europacss/colorInfo` pushes. There is no response correlation.

use crate::config::ThemeConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tower_lsp::lsp_types::notification::Notification;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorValueParams {
    pub color_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorInfoParams {
    pub color_name: String,
    /// The configured value; usually hex but may be any CSS color
    pub hex_value: String,
}

pub enum GetAllColors {}

impl Notification for GetAllColors {
    type Params = ();
    const METHOD: &'static str = "europacss/getAllColors";
}

pub enum GetColorValue {}

impl Notification for GetColorValue {
    type Params = ColorValueParams;
    const METHOD: &'static str = "europacss/getColorValue";
}

pub enum ColorInfo {}

impl Notification for ColorInfo {
    type Params = ColorInfoParams;
    const METHOD: &'static str = "europacss/colorInfo";
}

/// A request travelling from the editor side to the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeRequest {
    GetAllColors,
    GetColorValue { color_name: String },
}

/// Every color in the theme, groups expanded in place.
///
/// A color function is invoked here, so a theme reloaded in between two calls
/// is reflected without caching.
pub fn all_colors(theme: &ThemeConfig) -> Vec<ColorInfoParams> {
    let Some(colors) = theme.colors() else {
        return Vec::new();
    };
    colors
        .entries()
        .into_iter()
        .map(|(color_name, value)| ColorInfoParams { color_name, hex_value: value.to_string() })
        .collect()
}

/// The theme value of one color, if `name` names a string color
pub fn color_value(theme: &ThemeConfig, name: &str) -> Option<ColorInfoParams> {
    let colors = theme.colors()?;
    let value = colors.lookup(name)?;
    Some(ColorInfoParams { color_name: name.to_string(), hex_value: value.to_string() })
}

/// The pushes that answer one request
pub fn answer(theme: &ThemeConfig, request: &BridgeRequest) -> Vec<ColorInfoParams> {
    match request {
        BridgeRequest::GetAllColors => all_colors(theme),
        BridgeRequest::GetColorValue { color_name } => {
            color_value(theme, color_name).into_iter().collect()
        }
    }
}

/// Answer requests from an in-process bridge until either channel closes.
pub async fn serve_resolver(
    theme: Arc<ThemeConfig>,
    mut requests: UnboundedReceiver<BridgeRequest>,
    pushes: UnboundedSender<ColorInfoParams>,
) {
    while let Some(request) = requests.recv().await {
        let infos = answer(&theme, &request);
        debug!(?request, answered = infos.len(), "resolved color request");
        for info in infos {
            if pushes.send(info).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tokio::sync::mpsc::unbounded_channel;

    fn theme() -> ThemeConfig {
        parse_config(
            r#"module.exports = {
              theme: {
                colors: () => ({
                  beige: '#0000FF',
                  link: { text: 'pink', regular: { text: '#000' } },
                  white: '#FFFFFF',
                }),
              },
            }"#,
        )
        .unwrap()
        .theme
    }

    #[test]
    fn test_params_are_camel_case() {
        let info = ColorInfoParams { color_name: "beige".into(), hex_value: "#0000FF".into() };
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            serde_json::json!({"colorName": "beige", "hexValue": "#0000FF"})
        );
        let params: ColorValueParams =
            serde_json::from_value(serde_json::json!({"colorName": "link.text"})).unwrap();
        assert_eq!(params.color_name, "link.text");
    }

    #[test]
    fn test_all_colors_in_table_order() {
        let names: Vec<String> = all_colors(&theme()).into_iter().map(|c| c.color_name).collect();
        assert_eq!(names, ["beige", "link.text", "white"]);
    }

    #[test]
    fn test_color_value() {
        let theme = theme();
        assert_eq!(color_value(&theme, "beige").unwrap().hex_value, "#0000FF");
        assert_eq!(color_value(&theme, "link.text").unwrap().hex_value, "pink");
        assert!(color_value(&theme, "link.regular").is_none());
        assert!(color_value(&theme, "missing").is_none());
    }

    #[test]
    fn test_no_colors_answers_nothing() {
        let theme = ThemeConfig::default();
        assert!(answer(&theme, &BridgeRequest::GetAllColors).is_empty());
    }

    #[tokio::test]
    async fn test_serve_resolver_answers_until_closed() {
        let (req_tx, req_rx) = unbounded_channel();
        let (push_tx, mut push_rx) = unbounded_channel();
        req_tx.send(BridgeRequest::GetColorValue { color_name: "beige".into() }).unwrap();
        drop(req_tx);

        serve_resolver(Arc::new(theme()), req_rx, push_tx).await;

        let info = push_rx.recv().await.unwrap();
        assert_eq!(info.hex_value, "#0000FF");
        assert!(push_rx.recv().await.is_none());
    }
}
