//! HTTP face of the collector.
//!
//! `GET` answers the health payload, `POST` runs the upsert. Bodies
//! arrive form-encoded or as JSON, selected by Content-Type. The
//! listener polls with a timeout so a shutdown flag is always noticed,
//! even if the unblock call gets lost.

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Duration;

use survey_protocol::HealthResponse;
use survey_protocol::Submission;
use survey_protocol::SubmitResponse;
use tiny_http::Header;
use tiny_http::Method;
use tiny_http::Request;
use tiny_http::Response;
use tiny_http::Server;
use tiny_http::StatusCode;

use crate::service::CollectorService;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },
}

/// A collector endpoint serving on a background thread.
pub struct CollectorServer {
    local_addr: SocketAddr,
    server: Arc<Server>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CollectorServer {
    /// Bind `addr` and start serving. Pass port 0 to let the OS pick.
    pub fn spawn(addr: SocketAddr, service: CollectorService) -> Result<Self, ServeError> {
        let server = Server::http(addr).map_err(|e| ServeError::Bind {
            addr,
            reason: e.to_string(),
        })?;
        let local_addr = server.server_addr().to_ip().ok_or_else(|| ServeError::Bind {
            addr,
            reason: "listener reported no IP address".to_string(),
        })?;

        let server = Arc::new(server);
        let stop = Arc::new(AtomicBool::new(false));
        let thread = std::thread::spawn({
            let server = Arc::clone(&server);
            let stop = Arc::clone(&stop);
            move || serve_loop(&server, &service, &stop)
        });

        tracing::info!("collector listening on http://{local_addr}/");
        Ok(Self {
            local_addr,
            server,
            stop,
            thread: Some(thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting requests and join the serving thread.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.server.unblock();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for CollectorServer {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn serve_loop(server: &Server, service: &CollectorService, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => handle_request(service, request),
            Ok(None) => {}
            Err(err) => {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                tracing::warn!("listener error: {err}");
            }
        }
    }
}

fn handle_request(service: &CollectorService, mut request: Request) {
    let response = build_response(service, &mut request);
    if let Err(err) = request.respond(response) {
        tracing::debug!("client went away before the response: {err}");
    }
}

fn build_response(service: &CollectorService, request: &mut Request) -> Response<Cursor<Vec<u8>>> {
    match request.method() {
        Method::Get => json_response(200, &HealthResponse::ready()),
        Method::Post => {
            let json_body = is_json(request);
            let mut body = String::new();
            if let Err(err) = request.as_reader().read_to_string(&mut body) {
                tracing::warn!("failed to read request body: {err}");
                return json_response(
                    400,
                    &SubmitResponse::Error {
                        error: "unreadable request body".to_string(),
                    },
                );
            }

            let submission = if json_body {
                match serde_json::from_str::<Submission>(&body) {
                    Ok(submission) => submission,
                    Err(err) => {
                        return json_response(
                            400,
                            &SubmitResponse::Error {
                                error: format!("malformed JSON submission: {err}"),
                            },
                        );
                    }
                }
            } else {
                Submission::from_form_body(&body)
            };

            json_response(200, &service.handle(&submission))
        }
        _ => json_response(
            405,
            &SubmitResponse::Error {
                error: "method not allowed".to_string(),
            },
        ),
    }
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv("Content-Type"))
        .is_some_and(|header| {
            header
                .value
                .as_str()
                .to_ascii_lowercase()
                .contains("application/json")
        })
}

fn json_response<T: serde::Serialize>(status: u16, payload: &T) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::to_string(payload).unwrap_or_else(|err| {
        tracing::error!("response serialization failed: {err}");
        r#"{"result":"error","error":"response serialization failed"}"#.to_string()
    });
    let mut response = Response::from_string(body).with_status_code(StatusCode(status));
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    response
}
