//! One-shot loopback server that receives the OAuth redirect.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::{Result, SmartmarkError};

const SUCCESS_PAGE: &str = "<!doctype html><html><body>\
<h2>Signed in to smartmark</h2><p>You can close this window and return to the terminal.</p>\
</body></html>";

const FAILURE_PAGE: &str = "<!doctype html><html><body>\
<h2>Sign-in failed</h2><p>Return to the terminal for details.</p>\
</body></html>";

const MISSING_PAGE: &str = "<!doctype html><html><body>\
<h2>Waiting for sign-in</h2><p>This address only accepts the sign-in redirect.</p>\
</body></html>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Denied(String),
    /// Request to the redirect target carrying neither a code nor an error.
    Ignored,
}

/// Query string of the redirect: `?code=...` or `?error=...&error_description=...`.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    pub fn into_outcome(self) -> CallbackOutcome {
        match (self.code, self.error, self.error_description) {
            (Some(code), None, _) if !code.is_empty() => CallbackOutcome::Code(code),
            (_, _, Some(description)) => CallbackOutcome::Denied(description),
            (_, Some(error), None) => CallbackOutcome::Denied(error),
            _ => CallbackOutcome::Ignored,
        }
    }
}

/// Taken by the first request that settles the sign-in.
type OutcomeSlot = Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>;

async fn receive_callback(
    State(slot): State<OutcomeSlot>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<&'static str>) {
    let outcome = params.into_outcome();
    let page = match outcome {
        CallbackOutcome::Code(_) => (StatusCode::OK, Html(SUCCESS_PAGE)),
        CallbackOutcome::Denied(_) => (StatusCode::OK, Html(FAILURE_PAGE)),
        CallbackOutcome::Ignored => return (StatusCode::BAD_REQUEST, Html(MISSING_PAGE)),
    };

    let sender = slot.lock().ok().and_then(|mut guard| guard.take());
    match sender {
        Some(tx) => {
            let _ = tx.send(outcome);
        }
        None => debug!("Ignoring repeated OAuth callback"),
    }
    page
}

pub struct CallbackListener {
    listener: TcpListener,
}

impl CallbackListener {
    /// Bind to the host and port of `redirect_to`.
    pub async fn bind(redirect_to: &str) -> Result<Self> {
        let url = Url::parse(redirect_to)?;
        let host = url
            .host_str()
            .ok_or_else(|| SmartmarkError::Auth(format!("redirect target has no host: {}", redirect_to)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| SmartmarkError::Auth(format!("redirect target has no port: {}", redirect_to)))?;

        let listener = TcpListener::bind((host, port)).await?;
        debug!("OAuth callback listening on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve the redirect target until a request carries an authorization
    /// code or an error. Connections are served concurrently; a stalled or
    /// broken connection never settles the sign-in.
    pub async fn wait_for_code(self, timeout: Duration) -> Result<String> {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let slot: OutcomeSlot = Arc::new(Mutex::new(Some(outcome_tx)));
        let app = Router::new().route("/", get(receive_callback)).with_state(slot);

        // Shutdown stops accepting and lets the final response finish.
        tokio::spawn(async move {
            let server = axum::serve(self.listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                warn!("OAuth callback server error: {}", e);
            }
        });

        let outcome = tokio::time::timeout(timeout, outcome_rx).await;
        let _ = shutdown_tx.send(());

        match outcome {
            Ok(Ok(CallbackOutcome::Code(code))) => {
                info!("Received OAuth authorization code");
                Ok(code)
            }
            Ok(Ok(CallbackOutcome::Denied(reason))) => {
                Err(SmartmarkError::Auth(format!("sign-in was denied: {}", reason)))
            }
            Ok(Ok(CallbackOutcome::Ignored)) | Ok(Err(_)) => Err(SmartmarkError::Auth(
                "callback server stopped before sign-in completed".into(),
            )),
            Err(_) => Err(SmartmarkError::Auth(
                "timed out waiting for the browser sign-in".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn params(code: Option<&str>, error: Option<&str>, description: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(String::from),
            error: error.map(String::from),
            error_description: description.map(String::from),
        }
    }

    async fn request(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_code_outcome() {
        assert_eq!(
            params(Some("abc123"), None, None).into_outcome(),
            CallbackOutcome::Code("abc123".into())
        );
    }

    #[test]
    fn test_error_description_outcome() {
        assert_eq!(
            params(None, Some("access_denied"), Some("User cancelled")).into_outcome(),
            CallbackOutcome::Denied("User cancelled".into())
        );
        assert_eq!(
            params(None, Some("server_error"), None).into_outcome(),
            CallbackOutcome::Denied("server_error".into())
        );
    }

    #[test]
    fn test_empty_query_is_ignored() {
        assert_eq!(params(None, None, None).into_outcome(), CallbackOutcome::Ignored);
        assert_eq!(params(Some(""), None, None).into_outcome(), CallbackOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_listener_returns_code_after_unrelated_requests() {
        let listener = CallbackListener::bind("http://127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let waiter = tokio::spawn(listener.wait_for_code(Duration::from_secs(5)));

        assert!(request(addr, "/favicon.ico").await.starts_with("HTTP/1.1 404"));
        assert!(request(addr, "/").await.starts_with("HTTP/1.1 400"));
        let page = request(addr, "/?code=the-code").await;
        assert!(page.starts_with("HTTP/1.1 200"));
        assert!(page.contains("Signed in to smartmark"));

        assert_eq!(waiter.await.unwrap().unwrap(), "the-code");
    }

    #[tokio::test]
    async fn test_idle_connection_does_not_block_redirect() {
        let listener = CallbackListener::bind("http://127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let waiter = tokio::spawn(listener.wait_for_code(Duration::from_secs(2)));

        let _idle = TcpStream::connect(addr).await.unwrap();
        request(addr, "/?code=the-code").await;

        assert_eq!(waiter.await.unwrap().unwrap(), "the-code");
    }

    #[tokio::test]
    async fn test_reset_connection_does_not_abort_sign_in() {
        let listener = CallbackListener::bind("http://127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let waiter = tokio::spawn(listener.wait_for_code(Duration::from_secs(2)));

        let broken = TcpStream::connect(addr).await.unwrap();
        #[allow(deprecated)]
        broken.set_linger(Some(Duration::ZERO)).unwrap();
        drop(broken);
        request(addr, "/?code=the-code").await;

        assert_eq!(waiter.await.unwrap().unwrap(), "the-code");
    }

    #[tokio::test]
    async fn test_denied_sign_in_is_an_auth_error() {
        let listener = CallbackListener::bind("http://127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let waiter = tokio::spawn(listener.wait_for_code(Duration::from_secs(2)));

        let page = request(addr, "/?error=access_denied&error_description=User+cancelled").await;
        assert!(page.contains("Sign-in failed"));
        match waiter.await.unwrap() {
            Err(SmartmarkError::Auth(message)) => assert!(message.contains("User cancelled")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_listener_times_out() {
        let listener = CallbackListener::bind("http://127.0.0.1:0").await.unwrap();
        let result = listener.wait_for_code(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(SmartmarkError::Auth(_))));
    }
}
