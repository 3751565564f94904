#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod text_metrics;
pub mod theme;
pub mod tree;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config, load_config_with_theme};
pub use layout::{LayoutEngine, LayoutError, LayoutResult, compute_layout};
pub use theme::Theme;
pub use tree::{TreeError, TreeNode, load_tree};
