//! A short-lived HTTP server exposing one local file to the hub.
//!
//! Media players fetch what they play by URL, so a local file has to be
//! served from this machine for as long as it takes the player to pick it
//! up.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::net::UdpSocket;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::error::Error;
use crate::error::Result;

struct ServeState {
    path: PathBuf,
    hits: AtomicUsize,
    fetched: Notify,
}

pub struct MediaServer {
    url: String,
    path: PathBuf,
    state: Arc<ServeState>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl MediaServer {
    /// Serve `path` on `ip:port`.
    ///
    /// An empty `ip` means the address this machine uses for outbound
    /// traffic. Port 0 picks a free port.
    pub async fn start(ip: &str, port: u16, path: &Path) -> Result<Self> {
        let media_err = |error| Error::Media {
            path: path.to_path_buf(),
            error,
        };
        let metadata = tokio::fs::metadata(path).await.map_err(media_err)?;
        if !metadata.is_file() {
            return Err(media_err(std::io::Error::other("not a regular file")));
        }

        let ip: IpAddr = if ip.is_empty() {
            local_ip()
        } else {
            ip.parse()
                .map_err(|_| Error::invalid("serve address", format!("{ip:?} is not an IP address")))?
        };
        let listener = TcpListener::bind(SocketAddr::new(ip, port))
            .await
            .map_err(Error::Serve)?;
        let addr = listener.local_addr().map_err(Error::Serve)?;

        let serve_name = path_hash(path);
        let url = format!("http://{}/{}", addr, serve_name);
        let state = Arc::new(ServeState {
            path: path.to_path_buf(),
            hits: AtomicUsize::new(0),
            fetched: Notify::new(),
        });

        let app = Router::new()
            .route(&format!("/{serve_name}"), get(media))
            .route("/ready", get(|| async { "ready" }))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let (shutdown, shutdown_rx) = oneshot::channel();
        info!("Serving {} at {}", path.display(), url);
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                    debug!("Media server shutting down gracefully");
                })
                .await
        });

        Ok(Self {
            url,
            path: path.to_path_buf(),
            state,
            shutdown,
            task,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The file name being served, for display.
    pub fn media_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// How many times the file has been requested.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Wait for the file to be requested (at most `grace`), then stop the
    /// server once in-flight transfers are done.
    pub async fn finish(self, grace: Duration) -> Result<()> {
        if self.hits() == 0 {
            debug!("Waiting up to {:?} for {} to be fetched", grace, self.url);
            if tokio::time::timeout(grace, self.state.fetched.notified())
                .await
                .is_err()
            {
                warn!("{} was not requested within {:?}", self.url, grace);
            }
        }

        self.shutdown.send(()).ok();
        self.task
            .await
            .map_err(|err| Error::Serve(std::io::Error::other(err)))?
            .map_err(Error::Serve)?;
        info!(
            "Media server stopped after {} request(s)",
            self.state.hits.load(Ordering::SeqCst)
        );
        Ok(())
    }
}

async fn media(State(state): State<Arc<ServeState>>, request: Request) -> Response {
    debug!("File requested: {} -> {}", request.uri(), state.path.display());
    let response = match ServeFile::new(&state.path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    };
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.fetched.notify_one();
    response
}

fn path_hash(path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// The local address used to reach other hosts.
///
/// Connecting a UDP socket sends nothing; it only selects a route.
fn local_ip() -> IpAddr {
    let detected = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip());
    match detected {
        Ok(ip) => ip,
        Err(err) => {
            warn!("Could not detect local IP, using loopback: {}", err);
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn media_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("song.mp3");
        fs::write(&path, b"ID3 not really an mp3").unwrap();
        path
    }

    #[tokio::test]
    async fn test_serves_file_until_fetched() {
        let dir = TempDir::new().unwrap();
        let path = media_file(&dir);
        let server = MediaServer::start("127.0.0.1", 0, &path).await.unwrap();
        assert_eq!(server.media_name(), "song.mp3");
        assert!(server.url().starts_with("http://127.0.0.1:"));

        let ready_url = server.url().rsplit_once('/').unwrap().0.to_string() + "/ready";
        assert_eq!(reqwest::get(&ready_url).await.unwrap().text().await.unwrap(), "ready");

        let body = reqwest::get(server.url()).await.unwrap().bytes().await.unwrap();
        assert_eq!(&body[..], b"ID3 not really an mp3");
        assert_eq!(server.hits(), 1);

        server.finish(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test]
    async fn test_finish_without_fetch_times_out() {
        let dir = TempDir::new().unwrap();
        let path = media_file(&dir);
        let server = MediaServer::start("127.0.0.1", 0, &path).await.unwrap();
        server.finish(Duration::from_millis(50)).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = MediaServer::start("127.0.0.1", 0, &dir.path().join("missing.mp3"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Media { .. }));
    }

    #[test]
    fn test_path_hash_is_stable() {
        let a = path_hash(Path::new("/srv/music/a.mp3"));
        assert_eq!(a, path_hash(Path::new("/srv/music/a.mp3")));
        assert_ne!(a, path_hash(Path::new("/srv/music/b.mp3")));
        assert_eq!(a.len(), 16);
    }
}
