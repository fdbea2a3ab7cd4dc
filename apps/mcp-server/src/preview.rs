//! Local preview server
//!
//! Generated pages are written to a directory and served from it over
//! HTTP on the loopback interface. The listener is an owned resource: it is
//! started on first use, replaced when a different port is requested and
//! shut down when the owner shuts it down or drops it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{debug, error, info, warn};

use crate::errors::ServerError;

/// How long a replaced listener gets to finish in-flight requests
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A page written by [`PreviewServer::publish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewPage {
    pub url: String,
    pub path: PathBuf,
    pub port: u16,
}

struct ActiveListener {
    /// Port the caller asked for (0 means "any")
    requested_port: u16,
    /// Port actually bound
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

/// Serves a directory of generated pages
pub struct PreviewServer {
    root: PathBuf,
    active: Option<ActiveListener>,
}

impl std::fmt::Debug for PreviewServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewServer")
            .field("root", &self.root)
            .field("port", &self.port())
            .finish()
    }
}

impl PreviewServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            active: None,
        }
    }

    /// Port of the running listener, if any
    pub fn port(&self) -> Option<u16> {
        self.active.as_ref().map(|a| a.port)
    }

    /// Static file router for `root`
    pub fn router(root: &Path) -> Router {
        Router::new().fallback_service(ServeDir::new(root))
    }

    /// Write `html` to `<root>/<filename>.html` and make sure it is being
    /// served on `port`.
    pub async fn publish(
        &mut self,
        html: &str,
        filename: &str,
        port: u16,
    ) -> Result<PreviewPage, ServerError> {
        let stem = page_stem(filename)?;

        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(format!("{}.html", stem));
        tokio::fs::write(&path, html).await?;
        debug!(path = %path.display(), bytes = html.len(), "Preview page written");

        let port = self.ensure_listening(port).await?;

        Ok(PreviewPage {
            url: format!("http://localhost:{}/{}.html", port, stem),
            path,
            port,
        })
    }

    async fn ensure_listening(&mut self, port: u16) -> Result<u16, ServerError> {
        if let Some(active) = &self.active {
            let same = active.requested_port == port || active.port == port;
            if same && !active.task.is_finished() {
                return Ok(active.port);
            }
        }

        self.shutdown().await;

        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| ServerError::PreviewError(format!("could not bind port {}: {}", port, e)))?;
        let bound = listener.local_addr()?.port();

        let (tx, rx) = oneshot::channel::<()>();
        let app = Self::router(&self.root);
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await;
            if let Err(e) = result {
                error!(error = %e, "Preview server stopped with an error");
            }
        });

        info!(port = bound, root = %self.root.display(), "Preview server listening");

        self.active = Some(ActiveListener {
            requested_port: port,
            port: bound,
            shutdown: Some(tx),
            task,
        });
        Ok(bound)
    }

    /// Stop the listener, if one is running
    pub async fn shutdown(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        if let Some(tx) = active.shutdown.take() {
            let _ = tx.send(());
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut active.task)
            .await
            .is_err()
        {
            warn!(port = active.port, "Preview server did not drain in time, aborting");
            active.task.abort();
        }
        info!(port = active.port, "Preview server stopped");
    }
}

impl Drop for PreviewServer {
    fn drop(&mut self) {
        if let Some(mut active) = self.active.take() {
            if let Some(tx) = active.shutdown.take() {
                let _ = tx.send(());
            }
        }
    }
}

/// Accept a bare file stem. A trailing `.html` is tolerated and dropped.
fn page_stem(filename: &str) -> Result<&str, ServerError> {
    let stem = filename.trim();
    let stem = stem.strip_suffix(".html").unwrap_or(stem);

    let invalid = stem.is_empty()
        || stem.starts_with('.')
        || stem.contains(['/', '\\', '\0'])
        || stem.contains("..");
    if invalid {
        return Err(ServerError::InvalidArgument(format!(
            "filename must be a plain file name without path components, got '{}'",
            filename
        )));
    }
    Ok(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn test_page_stem() {
        assert_eq!(page_stem("preview").unwrap(), "preview");
        assert_eq!(page_stem("dashboard.html").unwrap(), "dashboard");
        assert_eq!(page_stem(" weather-v2 ").unwrap(), "weather-v2");

        for bad in ["", "../etc/passwd", "a/b", "a\\b", ".hidden", "..", ".html"] {
            assert!(
                matches!(page_stem(bad), Err(ServerError::InvalidArgument(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_router_serves_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "<h1>hi</h1>").unwrap();

        let response = PreviewServer::router(dir.path())
            .oneshot(Request::get("/page.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<h1>hi</h1>");

        let missing = PreviewServer::router(dir.path())
            .oneshot(Request::get("/nope.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_publish_writes_and_serves() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = PreviewServer::new(dir.path().join("previews"));

        let page = server.publish("<p>one</p>", "demo", 0).await.unwrap();
        assert_eq!(page.path, dir.path().join("previews").join("demo.html"));
        assert_eq!(page.url, format!("http://localhost:{}/demo.html", page.port));
        assert_eq!(std::fs::read_to_string(&page.path).unwrap(), "<p>one</p>");

        let body = reqwest::get(format!("http://127.0.0.1:{}/demo.html", page.port))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "<p>one</p>");

        server.shutdown().await;
        assert_eq!(server.port(), None);
    }

    #[tokio::test]
    async fn test_same_port_reuses_listener() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = PreviewServer::new(dir.path());

        let first = server.publish("a", "a", 0).await.unwrap();
        let second = server.publish("b", "b", 0).await.unwrap();
        assert_eq!(first.port, second.port);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_port_change_replaces_listener() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = PreviewServer::new(dir.path());

        let first = server.publish("a", "a", 0).await.unwrap();

        // Find a free port, then ask for it explicitly
        let spare = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let wanted = spare.local_addr().unwrap().port();
        drop(spare);

        let second = server.publish("b", "b", wanted).await.unwrap();
        assert_eq!(second.port, wanted);
        assert_eq!(server.port(), Some(wanted));
        assert!(tokio::net::TcpStream::connect(("127.0.0.1", first.port))
            .await
            .is_err());

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_rejected_filename_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = PreviewServer::new(dir.path().join("previews"));

        let err = server.publish("x", "../escape", 0).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidArgument(_)));
        assert!(!dir.path().join("previews").exists());
        assert_eq!(server.port(), None);
    }
}
