//! Standalone player page renderer
//!
//! Emits the HTML shell the session manager runs in: a video element,
//! title overlay, center play toggle, variant and audio-track selectors,
//! and fullscreen control, with the adaptive engine loaded from a CDN
//! and a native source fallback when the engine is unsupported. The
//! audio selector is pre-populated from the probed master-playlist
//! renditions.

use marquee_core::{AudioRendition, ContentId, VariantRegistry};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the player page for a resolved content item
pub fn render(
    content: &ContentId,
    title: Option<&str>,
    poster: Option<&str>,
    registry: &VariantRegistry,
    audio: &[AudioRendition],
) -> String {
    let title = escape(title.unwrap_or("Player"));
    let poster_attr = poster
        .map(|p| format!(" poster=\"{}\"", escape(p)))
        .unwrap_or_default();

    let options: String = registry
        .variants()
        .iter()
        .map(|v| {
            let selected = if v.index == registry.active_index() {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value=\"{}\"{}>{}</option>",
                escape(&v.url),
                selected,
                escape(&v.label())
            )
        })
        .collect();

    let audio_select = if audio.is_empty() {
        String::new()
    } else {
        let audio_options: String = audio
            .iter()
            .enumerate()
            .map(|(i, rendition)| {
                format!(
                    "<option value=\"{}\">{}</option>",
                    i,
                    escape(&rendition.label())
                )
            })
            .collect();
        format!(
            "<label>Audio:</label>\n    <select id=\"audioSelect\">{}</select>",
            audio_options
        )
    };

    let active_url = escape(&registry.active().url);
    let storage_key = escape(&content.storage_key());

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
html, body {{ margin:0; height:100%; background:#000; font-family:'Roboto',sans-serif; overflow:hidden; }}
#player {{ width:100%; height:100%; position:relative; }}
video {{ width:100%; height:100%; object-fit:contain; background:#000; }}
#overlay {{ position:absolute; top:20px; left:20px; color:#fff; font-size:20px; font-weight:bold; text-shadow:2px 2px 5px #000; }}
#controls {{ position:absolute; bottom:0; left:0; right:0; display:flex; justify-content:space-between; align-items:center; padding:10px; background:rgba(0,0,0,0.5); opacity:0; transition:opacity 0.3s; }}
#player.controls-visible #controls {{ opacity:1; }}
select {{ background:#222; color:#fff; border:none; padding:5px; border-radius:5px; }}
.btn {{ background:none; border:none; color:white; cursor:pointer; font-size:18px; margin:0 5px; }}
#centerPlay {{ position:absolute; top:50%; left:50%; transform:translate(-50%,-50%); font-size:64px; color:rgba(255,255,255,0.8); display:flex; align-items:center; justify-content:center; cursor:pointer; }}
#player.pseudo-fullscreen {{ position:fixed; inset:0; z-index:9999; }}
</style>
<script src="https://cdn.jsdelivr.net/npm/hls.js@latest"></script>
</head>
<body>
<div id="player" class="controls-visible" data-storage-key="{storage_key}">
  <video id="video"{poster_attr} playsinline></video>
  <div id="overlay">{title}</div>
  <button id="centerPlay">&#9199;</button>
  <div id="controls">
    <label>Stream:</label>
    <select id="variantSelect">{options}</select>
    {audio_select}
    <button class="btn" id="fullscreen">&#x26F6;</button>
  </div>
</div>
<script>
const video = document.getElementById("video")
const variantSelect = document.getElementById("variantSelect")
let hls = null

function load(url) {{
  if (hls) {{ hls.destroy(); hls = null }}
  if (Hls.isSupported()) {{
    hls = new Hls()
    hls.loadSource(url)
    hls.attachMedia(video)
  }} else if (video.canPlayType('application/vnd.apple.mpegurl')) {{
    video.src = url
  }}
}}

load("{active_url}")

variantSelect.addEventListener("change", () => {{
  const wasPlaying = !video.paused
  load(variantSelect.value)
  if (wasPlaying) video.play().catch(() => {{}})
}})

const audioSelect = document.getElementById("audioSelect")
if (audioSelect) {{
  audioSelect.addEventListener("change", () => {{
    if (hls) hls.audioTrack = parseInt(audioSelect.value, 10)
  }})
}}

document.getElementById("centerPlay").addEventListener("click", () => {{
  if (video.paused) video.play().catch(() => {{}})
  else video.pause()
}})

document.getElementById("fullscreen").addEventListener("click", () => {{
  const player = document.getElementById("player")
  if (player.requestFullscreen) {{
    player.requestFullscreen().catch(() => player.classList.add("pseudo-fullscreen"))
  }} else {{
    player.classList.add("pseudo-fullscreen")
  }}
}})
</script>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::SourceDescriptor;
    use std::collections::HashMap;
    use url::Url;

    fn registry() -> VariantRegistry {
        let batch = vec![
            SourceDescriptor {
                url: "https://a/en.m3u8".into(),
                language: Some("English".into()),
                headers: HashMap::new(),
                source_tag: "a".into(),
            },
            SourceDescriptor {
                url: "https://a/hi.m3u8".into(),
                language: Some("Hindi".into()),
                headers: HashMap::new(),
                source_tag: "a".into(),
            },
        ];
        VariantRegistry::build(&[batch], None).unwrap()
    }

    fn renditions() -> Vec<AudioRendition> {
        vec![
            AudioRendition {
                name: "English".into(),
                language: Some("en".into()),
                uri: Url::parse("https://a/audio/en/index.m3u8").unwrap(),
            },
            AudioRendition {
                name: "Español".into(),
                language: Some("es".into()),
                uri: Url::parse("https://a/audio/es/index.m3u8").unwrap(),
            },
        ]
    }

    #[test]
    fn page_lists_variants_and_marks_active() {
        let html = render(
            &ContentId::movie("603"),
            Some("The Matrix"),
            Some("https://img/poster.jpg"),
            &registry(),
            &[],
        );
        assert!(html.contains("<title>The Matrix</title>"));
        assert!(html.contains("poster=\"https://img/poster.jpg\""));
        assert!(html.contains("<option value=\"https://a/en.m3u8\" selected>English</option>"));
        assert!(html.contains("<option value=\"https://a/hi.m3u8\">Hindi</option>"));
        assert!(html.contains("load(\"https://a/en.m3u8\")"));
        assert!(html.contains("data-storage-key=\"movie:603\""));
        // No renditions probed: no audio menu
        assert!(!html.contains("audioSelect\">"));
    }

    #[test]
    fn audio_menu_lists_probed_renditions() {
        let html = render(
            &ContentId::movie("603"),
            Some("The Matrix"),
            None,
            &registry(),
            &renditions(),
        );
        assert!(html.contains("<option value=\"0\">English (en)</option>"));
        assert!(html.contains("<option value=\"1\">Español (es)</option>"));
        assert!(html.contains("id=\"audioSelect\""));
    }

    #[test]
    fn titles_are_escaped() {
        let html = render(
            &ContentId::movie("1"),
            Some("Fast & <Furious>"),
            None,
            &registry(),
            &[],
        );
        assert!(html.contains("Fast &amp; &lt;Furious&gt;"));
        assert!(!html.contains("poster="));
    }
}
