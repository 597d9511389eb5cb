//! Master-playlist probe
//!
//! Fetches a variant's master M3U8 and extracts the alternate audio
//! renditions (`#EXT-X-MEDIA:TYPE=AUDIO`) and variant streams, the same
//! inventory the playback engine will later report. Used by the CLI and
//! by the page renderer to pre-populate the audio menu.

use crate::{Error, QualityLevel, Result};
use m3u8_rs::{AlternativeMediaType, MasterPlaylist};
use reqwest::Client;
use tracing::debug;
use url::Url;

/// One alternate audio rendition declared by a master playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRendition {
    /// NAME attribute, falling back to "Audio N"
    pub name: String,
    /// LANGUAGE attribute
    pub language: Option<String>,
    /// URI resolved against the master playlist URL
    pub uri: Url,
}

impl AudioRendition {
    /// Menu-style label: name plus language when present
    pub fn label(&self) -> String {
        match &self.language {
            Some(lang) if !lang.is_empty() => format!("{} ({})", self.name, lang),
            _ => self.name.clone(),
        }
    }
}

/// Everything the probe learns from one master playlist
#[derive(Debug, Clone, Default)]
pub struct MasterProbe {
    pub audio: Vec<AudioRendition>,
    pub levels: Vec<QualityLevel>,
}

/// Parse a master playlist body.
///
/// Audio entries without a URI are dropped, matching player behavior:
/// they cannot be loaded independently. Relative URIs resolve against
/// `base_url`.
pub fn parse_master(content: &str, base_url: &Url) -> Result<MasterProbe> {
    let parsed: MasterPlaylist = m3u8_rs::parse_master_playlist_res(content.as_bytes())
        .map_err(|e| Error::PlaylistParse(format!("{:?}", e)))?;

    let mut audio = Vec::new();
    for alternative in &parsed.alternatives {
        if alternative.media_type != AlternativeMediaType::Audio {
            continue;
        }
        let Some(uri) = &alternative.uri else {
            continue;
        };
        let uri = base_url
            .join(uri)
            .map_err(|e| Error::PlaylistParse(format!("bad audio URI {uri}: {e}")))?;
        let name = if alternative.name.is_empty() {
            format!("Audio {}", audio.len() + 1)
        } else {
            alternative.name.clone()
        };
        audio.push(AudioRendition {
            name,
            language: alternative.language.clone(),
            uri,
        });
    }

    let mut levels: Vec<QualityLevel> = parsed
        .variants
        .iter()
        .map(|variant| QualityLevel {
            index: 0,
            height: variant.resolution.map(|r| r.height as u32),
            bitrate: variant.bandwidth,
        })
        .collect();
    levels.sort_by_key(|l| l.bitrate);
    for (idx, level) in levels.iter_mut().enumerate() {
        level.index = idx;
    }

    debug!(
        audio = audio.len(),
        levels = levels.len(),
        "Master playlist probed"
    );
    Ok(MasterProbe { audio, levels })
}

/// Fetch and parse a master playlist
pub async fn probe_master(client: &Client, url: &Url) -> Result<MasterProbe> {
    let body = client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_master(&body, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U\n\
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"English\",LANGUAGE=\"en\",DEFAULT=YES,URI=\"audio/en/index.m3u8\"\n\
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"Español\",LANGUAGE=\"es\",URI=\"audio/es/index.m3u8\"\n\
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"Commentary\",LANGUAGE=\"en\"\n\
#EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1280x720,AUDIO=\"aud\"\n\
720/index.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080,AUDIO=\"aud\"\n\
1080/index.m3u8\n";

    #[test]
    fn extracts_audio_renditions_with_resolved_uris() {
        let base = Url::parse("https://cdn.example.com/v/abc/master.m3u8").unwrap();
        let probe = parse_master(MASTER, &base).unwrap();

        // The URI-less commentary entry is dropped
        assert_eq!(probe.audio.len(), 2);
        assert_eq!(probe.audio[0].name, "English");
        assert_eq!(probe.audio[0].language.as_deref(), Some("en"));
        assert_eq!(
            probe.audio[0].uri.as_str(),
            "https://cdn.example.com/v/abc/audio/en/index.m3u8"
        );
        assert_eq!(probe.audio[1].label(), "Español (es)");
    }

    #[test]
    fn levels_sorted_by_bitrate_and_reindexed() {
        let base = Url::parse("https://cdn.example.com/master.m3u8").unwrap();
        let probe = parse_master(MASTER, &base).unwrap();

        assert_eq!(probe.levels.len(), 2);
        assert_eq!(probe.levels[0].height, Some(720));
        assert_eq!(probe.levels[0].index, 0);
        assert_eq!(probe.levels[1].height, Some(1080));
        assert_eq!(probe.levels[1].label(), "1080p");
    }

    #[test]
    fn rejects_garbage() {
        let base = Url::parse("https://cdn.example.com/master.m3u8").unwrap();
        assert!(matches!(
            parse_master("not a playlist", &base),
            Err(Error::PlaylistParse(_))
        ));
    }
}
