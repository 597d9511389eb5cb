//! Source Resolver boundary
//!
//! Maps a content identifier to candidate stream descriptors. Resolvers
//! are queried concurrently; one failing or empty resolver never blocks
//! aggregation of the others. Batches are re-ordered back into resolver
//! priority order before they reach the variant registry.

use crate::{ContentId, Error, ResolvedContent, Result, SourceDescriptor};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Browser-like user agent; some stream hosts refuse default clients
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// One upstream metadata provider
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Short label stamped onto every descriptor this resolver produces
    fn tag(&self) -> &str;

    async fn resolve(&self, content: &ContentId) -> Result<ResolvedContent>;
}

/// Joined output of all resolvers, batches in resolver priority order
#[derive(Debug, Default)]
pub struct AggregatedSources {
    pub title: Option<String>,
    pub poster: Option<String>,
    pub batches: Vec<Vec<SourceDescriptor>>,
}

impl AggregatedSources {
    /// Total descriptors across all batches
    pub fn source_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

/// Query every resolver concurrently and join the results.
///
/// Title and poster come from the highest-priority resolver that reported
/// them. A resolver error yields an empty batch in its slot.
pub async fn resolve_all(
    resolvers: &[Arc<dyn SourceResolver>],
    content: &ContentId,
) -> AggregatedSources {
    let mut tasks = tokio::task::JoinSet::new();
    for (priority, resolver) in resolvers.iter().enumerate() {
        let resolver = Arc::clone(resolver);
        let content = content.clone();
        tasks.spawn(async move {
            let tag = resolver.tag().to_string();
            (priority, tag, resolver.resolve(&content).await)
        });
    }

    let mut slots: Vec<Option<ResolvedContent>> = (0..resolvers.len()).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let Ok((priority, tag, result)) = joined else {
            continue;
        };
        match result {
            Ok(resolved) => {
                debug!(tag, sources = resolved.sources.len(), "Resolver returned");
                slots[priority] = Some(resolved);
            }
            Err(e) => {
                warn!(tag, error = %e, "Resolver failed");
            }
        }
    }

    let mut aggregated = AggregatedSources::default();
    for slot in slots {
        let Some(resolved) = slot else {
            aggregated.batches.push(Vec::new());
            continue;
        };
        if aggregated.title.is_none() {
            aggregated.title = resolved.title;
        }
        if aggregated.poster.is_none() {
            aggregated.poster = resolved.poster;
        }
        aggregated.batches.push(resolved.sources);
    }

    info!(
        content = %content,
        sources = aggregated.source_count(),
        "Source resolution complete"
    );
    aggregated
}

#[derive(Debug, Deserialize)]
struct ApiVideo {
    #[serde(default)]
    file: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

/// Resolver against an upstream embed API returning
/// `[{ file, title, thumbnail, ... }]` for a catalog id
pub struct UpstreamApiResolver {
    tag: String,
    base_url: String,
    client: reqwest::Client,
}

impl UpstreamApiResolver {
    pub fn new(tag: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self {
            tag: tag.into(),
            base_url: base_url.into(),
            client,
        })
    }

    fn endpoint(&self, content: &ContentId) -> String {
        let base = format!(
            "{}/api/videos/tmdb?id={}",
            self.base_url.trim_end_matches('/'),
            content.id
        );
        match content.episode {
            Some(se) => format!("{}&s={}&e={}", base, se.season, se.episode),
            None => base,
        }
    }
}

#[async_trait]
impl SourceResolver for UpstreamApiResolver {
    fn tag(&self) -> &str {
        &self.tag
    }

    async fn resolve(&self, content: &ContentId) -> Result<ResolvedContent> {
        let endpoint = self.endpoint(content);
        debug!(tag = %self.tag, endpoint, "Querying upstream API");

        let videos: Vec<ApiVideo> = self
            .client
            .get(&endpoint)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::ResolverFailed {
                tag: self.tag.clone(),
                message: e.to_string(),
            })?
            .json()
            .await
            .map_err(|e| Error::ResolverFailed {
                tag: self.tag.clone(),
                message: format!("invalid payload: {e}"),
            })?;

        let mut resolved = ResolvedContent::default();
        for video in videos {
            if video.file.is_empty() {
                continue;
            }
            if resolved.title.is_none() {
                resolved.title = video.title;
            }
            if resolved.poster.is_none() {
                resolved.poster = video.thumbnail;
            }
            resolved.sources.push(SourceDescriptor {
                url: video.file,
                language: video.language,
                headers: Default::default(),
                source_tag: self.tag.clone(),
            });
        }
        Ok(resolved)
    }
}
