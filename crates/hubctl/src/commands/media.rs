use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde_json::json;
use serde_json::Map;
use tracing::debug;
use tracing::warn;

use super::CommandResult;
use super::Controller;
use crate::convert;
use crate::error::Result;
use crate::hub::Service;
use crate::hub::Transport;
use crate::resolve::Resolved;
use crate::resolve::Target;
use crate::serve::MediaServer;

/// How long a served file waits for the player to fetch it.
pub const MEDIA_GRACE: Duration = Duration::from_secs(10);

const MEDIA_CONTENT_TYPE: &str = "music";

/// `source` as a URL the player can fetch directly.
fn remote_url(source: &str) -> Option<Url> {
    Url::parse(source)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Last path segment of a URL, or the whole URL.
fn url_media_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string())
}

impl<T: Transport> Controller<T> {
    /// Set the volume to `percent` (0-100).
    pub async fn set_volume(&self, target: &Target, percent: u8) -> Result<CommandResult> {
        let level = convert::volume_level(percent)?;
        let resolved = self.prepare(target, Service::VolumeSet).await?;

        let mut fields = Map::new();
        fields.insert("volume_level".to_string(), json!(level));
        self.call(&resolved, Service::VolumeSet, fields).await?;
        Ok(CommandResult::new(resolved, format!("volume set to {percent}%")))
    }

    /// Play a URL or a local file.
    ///
    /// Local files are served over HTTP until the player has fetched them or
    /// [`MEDIA_GRACE`] passes. The server is always stopped before returning.
    pub async fn play_media(&self, target: &Target, source: &str) -> Result<CommandResult> {
        let resolved = self.prepare(target, Service::PlayMedia).await?;

        if let Some(url) = remote_url(source) {
            let name = url_media_name(&url);
            self.play(&resolved, url.as_str()).await?;
            return Ok(CommandResult::new(resolved, format!("playing {name}")));
        }

        let server = MediaServer::start(&self.serve.ip, self.serve.port, Path::new(source)).await?;
        let name = server.media_name();
        debug!("Serving {} as {}", source, server.url());

        match self.play(&resolved, server.url()).await {
            Ok(()) => {
                server.finish(MEDIA_GRACE).await?;
                Ok(CommandResult::new(resolved, format!("playing {name}")))
            }
            Err(err) => {
                if let Err(stop_err) = server.finish(Duration::ZERO).await {
                    warn!("Failed to stop media server: {}", stop_err);
                }
                Err(err)
            }
        }
    }

    async fn play(&self, resolved: &Resolved, media_url: &str) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("media_content_id".to_string(), json!(media_url));
        fields.insert("media_content_type".to_string(), json!(MEDIA_CONTENT_TYPE));
        self.call(resolved, Service::PlayMedia, fields).await
    }
}
