//! `[render]` section configuration: knobs consumed by the tag handlers.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[render]` section in crossmark.toml.
///
/// # Example
/// ```toml
/// [render]
/// image_base = "/assets/images"
/// highlight_author = "A. Author"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// URL prefix for figure image sources.
    #[serde(default = "defaults::render::image_base")]
    #[educe(Default = defaults::render::image_base())]
    pub image_base: String,

    /// Author name to bold in publication entries.
    #[serde(default)]
    pub highlight_author: Option<String>,

    /// Default YouTube embed width.
    #[serde(default = "defaults::render::youtube_width")]
    #[educe(Default = defaults::render::youtube_width())]
    pub youtube_width: u32,

    /// Default YouTube embed height.
    #[serde(default = "defaults::render::youtube_height")]
    #[educe(Default = defaults::render::youtube_height())]
    pub youtube_height: u32,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_render_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.render.image_base, "/assets/images");
        assert_eq!(config.render.highlight_author, None);
        assert_eq!(config.render.youtube_width, 720);
        assert_eq!(config.render.youtube_height, 405);
    }

    #[test]
    fn test_render_config_overrides() {
        let config = r#"
            [render]
            image_base = "/img"
            highlight_author = "D. Author"
            youtube_width = 640
            youtube_height = 360
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();
        assert_eq!(config.render.image_base, "/img");
        assert_eq!(config.render.highlight_author.as_deref(), Some("D. Author"));
        assert_eq!(config.render.youtube_width, 640);
        assert_eq!(config.render.youtube_height, 360);
    }
}
