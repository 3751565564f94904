use serde::{Deserialize, Serialize};

const MODERN_PALETTE: [&str; 12] = [
    "#2f3b52", "#e0573f", "#3f8fe0", "#3fb47a", "#b0589c", "#e0a23f", "#5b6bd6", "#2aa3a3",
    "#c4513d", "#7a9a2e", "#8a5ad6", "#d65a86",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    /// Index 0 colours the root, index `k` colours the k-th branch under it.
    pub palette: Vec<String>,
    pub default_node_fill: String,
    pub text_color: String,
    pub background: String,
    pub corner_radius: f32,
    pub connector_width: f32,
    pub debug_subtree_color: String,
    pub debug_children_color: String,
}

impl Theme {
    /// The three-colour palette the original mind map shipped with.
    pub fn classic() -> Self {
        Self {
            font_family: "Arial".to_string(),
            palette: vec!["red".to_string(), "blue".to_string(), "green".to_string()],
            default_node_fill: "#000229".to_string(),
            text_color: "white".to_string(),
            background: "#FFFFFF".to_string(),
            corner_radius: 6.0,
            connector_width: 2.0,
            debug_subtree_color: "#ff00aa".to_string(),
            debug_children_color: "#00aaff".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            palette: MODERN_PALETTE.iter().map(|c| c.to_string()).collect(),
            ..Self::classic()
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "classic" | "default" => Some(Self::classic()),
            "modern" => Some(Self::modern()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::modern()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rgb01 {
    r: f64,
    g: f64,
    b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Hsl {
    h_deg: f64,
    s: f64,
    l: f64,
}

/// Raises the HSL lightness of `color` by `amount` (0..1) and returns hex.
/// `None` when the colour cannot be parsed.
pub fn lighten(color: &str, amount: f64) -> Option<String> {
    let rgb = parse_color(color)?;
    let mut hsl = rgb01_to_hsl(rgb);
    hsl.l = (hsl.l + amount).clamp(0.0, 1.0);
    Some(rgb01_to_hex(hsl_to_rgb01(hsl)))
}

fn parse_color(input: &str) -> Option<Rgb01> {
    let s = input.trim().to_ascii_lowercase();
    if s.starts_with('#') {
        return parse_hex_rgb01(&s);
    }
    if let Some(body) = s.strip_prefix("hsl(").and_then(|rest| rest.strip_suffix(')')) {
        let parts: Vec<&str> = body.split(',').map(|p| p.trim()).collect();
        if parts.len() != 3 {
            return None;
        }
        let h = parts[0].trim_end_matches("deg").parse::<f64>().ok()?;
        let s = parts[1].trim_end_matches('%').parse::<f64>().ok()? / 100.0;
        let l = parts[2].trim_end_matches('%').parse::<f64>().ok()? / 100.0;
        return Some(hsl_to_rgb01(Hsl { h_deg: h, s, l }));
    }
    named_color(&s).and_then(parse_hex_rgb01)
}

fn named_color(name: &str) -> Option<&'static str> {
    let hex = match name {
        "black" => "#000000",
        "white" => "#ffffff",
        "red" => "#ff0000",
        "green" => "#008000",
        "lime" => "#00ff00",
        "blue" => "#0000ff",
        "yellow" => "#ffff00",
        "orange" => "#ffa500",
        "purple" => "#800080",
        "navy" => "#000080",
        "teal" => "#008080",
        "gray" | "grey" => "#808080",
        "silver" => "#c0c0c0",
        "maroon" => "#800000",
        "olive" => "#808000",
        "aqua" | "cyan" => "#00ffff",
        "fuchsia" | "magenta" => "#ff00ff",
        "pink" => "#ffc0cb",
        "brown" => "#a52a2a",
        _ => return None,
    };
    Some(hex)
}

fn parse_hex_rgb01(s: &str) -> Option<Rgb01> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let (r, g, b) = match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            (r, g, b)
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            (r, g, b)
        }
        _ => return None,
    };
    Some(Rgb01 {
        r: r as f64 / 255.0,
        g: g as f64 / 255.0,
        b: b as f64 / 255.0,
    })
}

fn rgb01_to_hex(rgb: Rgb01) -> String {
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(rgb.r),
        channel(rgb.g),
        channel(rgb.b)
    )
}

fn rgb01_to_hsl(rgb: Rgb01) -> Hsl {
    let max = rgb.r.max(rgb.g).max(rgb.b);
    let min = rgb.r.min(rgb.g).min(rgb.b);
    let l = (max + min) / 2.0;
    if max == min {
        return Hsl { h_deg: 0.0, s: 0.0, l };
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == rgb.r {
        (rgb.g - rgb.b) / d + if rgb.g < rgb.b { 6.0 } else { 0.0 }
    } else if max == rgb.g {
        (rgb.b - rgb.r) / d + 2.0
    } else {
        (rgb.r - rgb.g) / d + 4.0
    };
    Hsl {
        h_deg: h * 60.0,
        s,
        l,
    }
}

fn hsl_to_rgb01(hsl: Hsl) -> Rgb01 {
    let h = (hsl.h_deg / 360.0).rem_euclid(1.0);
    let s = hsl.s.clamp(0.0, 1.0);
    let l = hsl.l.clamp(0.0, 1.0);
    if s == 0.0 {
        return Rgb01 { r: l, g: l, b: l };
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Rgb01 {
        r: hue_to_rgb(p, q, h + 1.0 / 3.0),
        g: hue_to_rgb(p, q, h),
        b: hue_to_rgb(p, q, h - 1.0 / 3.0),
    }
}
