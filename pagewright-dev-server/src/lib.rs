use anyhow::Result;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
};
use pagewright_core::FileContent;
use percent_encoding::percent_decode_str;
use std::{collections::BTreeMap, net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::trace::TraceLayer;

/// Configuration for the development server
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Auto-open browser
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            open: false,
        }
    }
}

/// Serves a rendered file set from memory.
pub struct DevServer {
    config: DevServerConfig,
    state: Arc<AppState>,
}

struct AppState {
    /// Site-relative path without a leading `/` -> content
    files: BTreeMap<String, FileContent>,
}

impl DevServer {
    pub fn new<I>(config: DevServerConfig, files: I) -> Self
    where
        I: IntoIterator<Item = (PathBuf, FileContent)>,
    {
        let files = files
            .into_iter()
            .map(|(path, content)| {
                let path = path.to_string_lossy();
                (path.trim_start_matches('/').to_string(), content)
            })
            .collect();

        Self {
            config,
            state: Arc::new(AppState { files }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .fallback(serve_file)
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the process is stopped
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, files = self.state.files.len(), "Serving rendered site");
        println!("Serving at http://{addr}");

        if self.config.open {
            if let Err(e) = open::that(format!("http://{addr}")) {
                tracing::warn!(error = %e, "Failed to open browser");
            }
        }

        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html") => "text/html",
        Some("css") => "text/css",
        _ => "application/octet-stream",
    }
}

async fn serve_file(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let decoded = percent_decode_str(uri.path()).decode_utf8_lossy();
    let path = decoded.trim_start_matches('/');

    match state.files.get(path) {
        Some(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type(path))],
            content.as_bytes().to_vec(),
        )
            .into_response(),
        None => {
            tracing::warn!(path = %path, "No rendered file for request");
            (StatusCode::NOT_FOUND, Html(listing(&state.files))).into_response()
        }
    }
}

fn listing(files: &BTreeMap<String, FileContent>) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html><body>\n<h1>Not found</h1>\n<ul>\n");
    for (path, content) in files {
        let href = html_escape::encode_double_quoted_attribute(path);
        let text = html_escape::encode_text(path);
        html.push_str(&format!(
            "<li><a href=\"/{href}\">{text}</a> ({} bytes)</li>\n",
            content.len()
        ));
    }
    html.push_str("</ul>\n</body></html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn server() -> DevServer {
        DevServer::new(
            DevServerConfig::default(),
            [
                (
                    PathBuf::from("/docs/my page.html"),
                    FileContent::Text("<p>hi</p>".into()),
                ),
                (
                    PathBuf::from("/docs/style.css"),
                    FileContent::Bytes(b"body {}".to_vec()),
                ),
                (
                    PathBuf::from("images/logo.png"),
                    FileContent::Bytes(vec![1, 2, 3]),
                ),
            ],
        )
    }

    async fn get(uri: &str) -> (StatusCode, String, String) {
        let response = server()
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8_lossy(&body).to_string())
    }

    #[tokio::test]
    async fn serves_html_with_decoded_path() {
        let (status, content_type, body) = get("/docs/my%20page.html?x=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/html");
        assert_eq!(body, "<p>hi</p>");
    }

    #[tokio::test]
    async fn serves_css_and_binary() {
        let (status, content_type, _) = get("/docs/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/css");

        let (status, content_type, _) = get("/images/logo.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn unknown_path_lists_files() {
        let (status, _, body) = get("/nope.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<ul>"));
        assert!(body.contains("<a href=\"/docs/my page.html\">docs/my page.html</a> (9 bytes)"));
        assert!(body.contains("images/logo.png</a> (3 bytes)"));
    }
}
