use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Anchor of the root node (top-left corner).
    pub root_x: f32,
    pub root_y: f32,
    /// Horizontal distance from a parent's x to its children's x.
    pub offset_x: f32,
    /// Per-level vertical slot spacing is `max(spacing_base - level * spacing_step, spacing_min)`.
    pub spacing_base: f32,
    pub spacing_step: f32,
    pub spacing_min: f32,
    /// Font size at depth `level` is `base_font_size - level`.
    pub base_font_size: f32,
    pub font_family: String,
    pub node_padding: f32,
    pub min_node_width: f32,
    pub min_node_height: f32,
    pub connector_stub: f32,
    pub connector_bend_x: f32,
    pub connector_bend_y: f32,
    pub connector_tension: f32,
    pub lighten_amount: f64,
    /// Ceiling on cascading sweeps over one sibling list before giving up.
    pub max_correction_passes: usize,
    pub fast_text_metrics: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root_x: 300.0,
            root_y: 300.0,
            offset_x: 200.0,
            spacing_base: 70.0,
            spacing_step: 8.0,
            spacing_min: 45.0,
            base_font_size: 18.0,
            font_family: "Arial".to_string(),
            node_padding: 5.0,
            min_node_width: 70.0,
            min_node_height: 40.0,
            connector_stub: 10.0,
            connector_bend_x: 4.0,
            connector_bend_y: 5.0,
            connector_tension: 0.2,
            lighten_amount: 0.15,
            max_correction_passes: 32,
            fast_text_metrics: false,
        }
    }
}

impl LayoutConfig {
    pub fn level_spacing(&self, level: usize) -> f32 {
        (self.spacing_base - level as f32 * self.spacing_step).max(self.spacing_min)
    }

    pub fn font_size_for_level(&self, level: usize) -> f32 {
        self.base_font_size - level as f32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
    /// Draw subtree and children bounding rectangles on top of the map.
    pub debug_overlay: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
            debug_overlay: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::modern();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    root_x: Option<f32>,
    root_y: Option<f32>,
    offset_x: Option<f32>,
    spacing_base: Option<f32>,
    spacing_step: Option<f32>,
    spacing_min: Option<f32>,
    base_font_size: Option<f32>,
    font_family: Option<String>,
    node_padding: Option<f32>,
    min_node_width: Option<f32>,
    min_node_height: Option<f32>,
    connector_stub: Option<f32>,
    connector_bend_x: Option<f32>,
    connector_bend_y: Option<f32>,
    connector_tension: Option<f32>,
    lighten_amount: Option<f64>,
    max_correction_passes: Option<usize>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    default_node_fill: Option<String>,
    text_color: Option<String>,
    background: Option<String>,
    corner_radius: Option<f32>,
    connector_width: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    background: Option<String>,
    debug_overlay: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    palette: Option<Vec<String>>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    load_config_with_theme(path, None)
}

/// Like [`load_config`], with `theme` replacing the file's preset. The rest of
/// the file (palette, theme variables) still applies on top of that preset.
pub fn load_config_with_theme(path: Option<&Path>, theme: Option<&str>) -> anyhow::Result<Config> {
    let contents = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => "{}".to_string(),
    };
    parse_config_with_theme(&contents, theme)
}

/// Parses JSON5 config text (comments and trailing commas allowed) over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    parse_config_with_theme(contents, None)
}

pub fn parse_config_with_theme(contents: &str, theme: Option<&str>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = theme.or(parsed.theme.as_deref()) {
        config.theme = Theme::from_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme '{theme_name}'"))?;
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.layout.font_family = v.clone();
            config.theme.font_family = v;
        }
        if let Some(v) = vars.default_node_fill {
            config.theme.default_node_fill = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
        if let Some(v) = vars.corner_radius {
            config.theme.corner_radius = v;
        }
        if let Some(v) = vars.connector_width {
            config.theme.connector_width = v;
        }
    }

    if let Some(palette) = parsed.palette {
        config.theme.palette = palette;
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.root_x {
            target.root_x = v;
        }
        if let Some(v) = layout.root_y {
            target.root_y = v;
        }
        if let Some(v) = layout.offset_x {
            target.offset_x = v;
        }
        if let Some(v) = layout.spacing_base {
            target.spacing_base = v;
        }
        if let Some(v) = layout.spacing_step {
            target.spacing_step = v;
        }
        if let Some(v) = layout.spacing_min {
            target.spacing_min = v;
        }
        if let Some(v) = layout.base_font_size {
            target.base_font_size = v;
        }
        if let Some(v) = layout.font_family {
            target.font_family = v;
        }
        if let Some(v) = layout.node_padding {
            target.node_padding = v;
        }
        if let Some(v) = layout.min_node_width {
            target.min_node_width = v;
        }
        if let Some(v) = layout.min_node_height {
            target.min_node_height = v;
        }
        if let Some(v) = layout.connector_stub {
            target.connector_stub = v;
        }
        if let Some(v) = layout.connector_bend_x {
            target.connector_bend_x = v;
        }
        if let Some(v) = layout.connector_bend_y {
            target.connector_bend_y = v;
        }
        if let Some(v) = layout.connector_tension {
            target.connector_tension = v;
        }
        if let Some(v) = layout.lighten_amount {
            target.lighten_amount = v;
        }
        if let Some(v) = layout.max_correction_passes {
            target.max_correction_passes = v.max(1);
        }
        if let Some(v) = layout.fast_text_metrics {
            target.fast_text_metrics = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
        if let Some(v) = render.debug_overlay {
            config.render.debug_overlay = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_spacing_has_floor() {
        let config = LayoutConfig::default();
        assert_eq!(config.level_spacing(1), 62.0);
        assert_eq!(config.level_spacing(2), 54.0);
        assert_eq!(config.level_spacing(3), 46.0);
        assert_eq!(config.level_spacing(4), 45.0);
        assert_eq!(config.level_spacing(10), 45.0);
    }

    #[test]
    fn font_size_shrinks_with_depth() {
        let config = LayoutConfig::default();
        assert_eq!(config.font_size_for_level(1), 17.0);
        assert_eq!(config.font_size_for_level(3), 15.0);
    }

    #[test]
    fn parses_json5_overrides() {
        let config = parse_config(
            r##"{
                // classic look, wider fan
                theme: "classic",
                palette: ["#111111", "#222222"],
                layout: { offsetX: 240, maxCorrectionPasses: 0, fastTextMetrics: true },
                render: { debugOverlay: true, },
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.palette, vec!["#111111", "#222222"]);
        assert_eq!(config.theme.font_family, "Arial");
        assert_eq!(config.layout.offset_x, 240.0);
        assert_eq!(config.layout.max_correction_passes, 1);
        assert!(config.layout.fast_text_metrics);
        assert!(config.render.debug_overlay);
        assert_eq!(config.layout.spacing_base, 70.0);
    }

    #[test]
    fn preset_override_keeps_file_palette_and_variables() {
        let config = parse_config_with_theme(
            r##"{
                theme: "modern",
                palette: ["#101010", "#202020"],
                themeVariables: { fontFamily: "Inter" },
            }"##,
            Some("classic"),
        )
        .unwrap();
        assert_eq!(config.theme.palette, vec!["#101010", "#202020"]);
        assert_eq!(config.theme.font_family, "Inter");
        assert_eq!(config.layout.font_family, "Inter");
        assert_eq!(config.theme.default_node_fill, Theme::classic().default_node_fill);
    }

    #[test]
    fn preset_override_without_file_is_the_preset() {
        let config = load_config_with_theme(None, Some("classic")).unwrap();
        assert_eq!(config.theme.palette, Theme::classic().palette);
        assert_eq!(config.render.background, Theme::classic().background);
        assert!(load_config_with_theme(None, Some("neon")).is_err());
    }

    #[test]
    fn rejects_unknown_theme() {
        assert!(parse_config(r#"{ "theme": "neon" }"#).is_err());
    }

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.min_node_width, 70.0);
        assert_eq!(config.render.width, 1200.0);
    }
}
