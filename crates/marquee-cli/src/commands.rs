//! CLI command implementations

use crate::page;
use anyhow::Context;
use console::style;
use marquee_core::{
    probe_master, resolve_all, ContentId, FallbackPresenter, SourceResolver,
    UpstreamApiResolver, VariantRegistry, BROWSER_USER_AGENT,
};
use std::sync::Arc;
use tracing::warn;
use url::Url;

fn resolvers(api_base: &str) -> anyhow::Result<Vec<Arc<dyn SourceResolver>>> {
    Ok(vec![Arc::new(UpstreamApiResolver::new("uembed", api_base)?)])
}

/// Resolve a content id and print the ranked variant list
pub async fn resolve(content: ContentId, api_base: &str, format: &str) -> anyhow::Result<()> {
    let resolvers = resolvers(api_base)?;
    let aggregated = resolve_all(&resolvers, &content).await;
    let registry = VariantRegistry::build(&aggregated.batches, None)
        .with_context(|| format!("no playable variants for {content}"))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(registry.variants())?);
        return Ok(());
    }

    if let Some(title) = &aggregated.title {
        println!("{}", style(title).bold());
    }
    println!("Variants for {} ({} found):", content, registry.len());
    for variant in registry.variants() {
        let marker = if variant.index == registry.active_index() {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        let language = if variant.language.is_empty() {
            "unknown".to_string()
        } else {
            variant.language.clone()
        };
        println!(
            "{} {}. [{}] {} - {}",
            marker,
            variant.index + 1,
            variant.source_tag,
            language,
            variant.url
        );
    }
    Ok(())
}

/// Fetch a master playlist and print its audio renditions and levels
pub async fn probe(url: &str, format: &str) -> anyhow::Result<()> {
    let url = Url::parse(url).context("invalid master playlist URL")?;
    let client = reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .build()?;
    let probed = probe_master(&client, &url).await?;

    if format == "json" {
        let audio: Vec<_> = probed
            .audio
            .iter()
            .map(|a| {
                serde_json::json!({
                    "name": a.name,
                    "language": a.language,
                    "uri": a.uri.as_str(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "audio": audio,
                "levels": probed.levels,
            }))?
        );
        return Ok(());
    }

    println!("Audio renditions ({}):", probed.audio.len());
    for rendition in &probed.audio {
        println!("  {} -> {}", rendition.label(), rendition.uri);
    }
    println!("Quality levels ({}):", probed.levels.len());
    for level in &probed.levels {
        println!("  {}. {} ({} bps)", level.index + 1, level.label(), level.bitrate);
    }
    Ok(())
}

/// Resolve a content id and render the standalone player page
pub async fn page(content: ContentId, api_base: &str) -> anyhow::Result<()> {
    let resolvers = resolvers(api_base)?;
    let aggregated = resolve_all(&resolvers, &content).await;

    let registry = match VariantRegistry::build(&aggregated.batches, None) {
        Ok(registry) => registry,
        Err(marquee_core::Error::NoVariantsAvailable) => {
            // Degrade to the full-viewport third-party embed
            let presenter = FallbackPresenter::new(Url::parse("https://www.2embed.cc")?);
            println!("{}", presenter.render_page(&content, aggregated.title.as_deref())?);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Best-effort: probe the active variant so the page's audio menu is
    // pre-populated; a failed probe just omits the menu
    let audio = match Url::parse(&registry.active().url) {
        Ok(master) => {
            let client = reqwest::Client::builder()
                .user_agent(BROWSER_USER_AGENT)
                .build()?;
            match probe_master(&client, &master).await {
                Ok(probed) => probed.audio,
                Err(e) => {
                    warn!(url = %master, error = %e, "Master playlist probe failed");
                    Vec::new()
                }
            }
        }
        Err(e) => {
            warn!(url = %registry.active().url, error = %e, "Active variant URL is not absolute");
            Vec::new()
        }
    };

    let html = page::render(
        &content,
        aggregated.title.as_deref(),
        aggregated.poster.as_deref(),
        &registry,
        &audio,
    );
    println!("{html}");
    Ok(())
}

/// Print the deterministic fallback embed URL
pub fn fallback(content: ContentId, embed_base: &str) -> anyhow::Result<()> {
    let base = Url::parse(embed_base).context("invalid embed base URL")?;
    let presenter = FallbackPresenter::new(base);
    println!("{}", presenter.embed_url(&content)?);
    Ok(())
}
