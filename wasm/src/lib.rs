use mindmap_layout::config::Config;
use mindmap_layout::layout::LayoutEngine;
use mindmap_layout::layout_dump::layout_dump_json;
use mindmap_layout::render::render_svg;
use mindmap_layout::theme::Theme;
use mindmap_layout::tree::load_tree;
use mindmap_layout::LayoutResult;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MindmapOptions {
    theme: Option<String>,
    palette: Option<Vec<String>>,
    font_family: Option<String>,
    /// Browsers have no system font database; the width table is the default.
    fast_text: Option<bool>,
    debug: Option<bool>,
}

fn build_config(options: MindmapOptions) -> Result<Config, String> {
    let mut config = Config::default();
    if let Some(name) = options.theme.as_deref() {
        config.theme = Theme::from_name(name).ok_or_else(|| format!("unknown theme '{name}'"))?;
        config.render.background = config.theme.background.clone();
    }
    if let Some(palette) = options.palette {
        config.theme.palette = palette;
    }
    if let Some(font_family) = options.font_family {
        config.layout.font_family = font_family;
    }
    config.layout.fast_text_metrics = options.fast_text.unwrap_or(true);
    config.render.debug_overlay = options.debug.unwrap_or(false);
    Ok(config)
}

fn parse_options(options_json: Option<String>) -> Result<MindmapOptions, String> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| error.to_string()),
        None => Ok(MindmapOptions::default()),
    }
}

fn run_layout(tree_json: &str, config: &Config) -> Result<LayoutResult, String> {
    let tree = load_tree(tree_json).map_err(|error| error.to_string())?;
    LayoutEngine::from_config(config)
        .layout(tree)
        .map_err(|error| error.to_string())
}

fn layout_json(tree_json: &str, options_json: Option<String>) -> Result<String, String> {
    let config = build_config(parse_options(options_json)?)?;
    let result = run_layout(tree_json, &config)?;
    layout_dump_json(&result).map_err(|error| error.to_string())
}

fn svg(tree_json: &str, options_json: Option<String>) -> Result<String, String> {
    let config = build_config(parse_options(options_json)?)?;
    let result = run_layout(tree_json, &config)?;
    Ok(render_svg(&result, &config.theme, &config.layout, &config.render))
}

#[wasm_bindgen]
pub fn layout_mindmap_json(tree_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    layout_json(tree_json, options_json).map_err(|error| JsValue::from_str(&error))
}

#[wasm_bindgen]
pub fn render_mindmap_svg(tree_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    svg(tree_json, options_json).map_err(|error| JsValue::from_str(&error))
}
