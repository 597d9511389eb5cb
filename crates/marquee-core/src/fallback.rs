//! Fallback Presenter boundary
//!
//! When no variant yields a working stream the page degrades to a
//! full-viewport third-party embed built deterministically from the
//! content identity. No further control surface is offered.

use crate::{ContentId, Result};
use url::Url;

/// Builds embed URLs and the degraded full-viewport page
#[derive(Debug, Clone)]
pub struct FallbackPresenter {
    base: Url,
}

impl FallbackPresenter {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Deterministic embed URL: `{base}/embed/{id}` for movies,
    /// `{base}/embed/{id}/{season}/{episode}` for episodes
    pub fn embed_url(&self, content: &ContentId) -> Result<Url> {
        let path = match content.episode {
            Some(se) => format!("embed/{}/{}/{}", content.id, se.season, se.episode),
            None => format!("embed/{}", content.id),
        };
        Ok(self.base.join(&path)?)
    }

    /// Full-viewport embed page, the terminal degraded experience
    pub fn render_page(&self, content: &ContentId, title: Option<&str>) -> Result<String> {
        let url = self.embed_url(content)?;
        let title = title.unwrap_or("Player");
        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
html, body {{ margin:0; height:100%; background:#000; overflow:hidden; }}
iframe {{ width:100%; height:100%; border:0; }}
</style>
</head>
<body>
<iframe src="{url}" allowfullscreen allow="autoplay; fullscreen"></iframe>
</body>
</html>
"#
        ))
    }
}
