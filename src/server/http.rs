//! HTTP server implementation
//!
//! hyper http1 with TokioIo; one tokio task per connection, no shared
//! mutable state between requests. All routing is the declarative match
//! in `handle_request`; decision logic lives in the habit service.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::db::MongoClient;
use crate::routes;
use crate::types::HabitusError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
///
/// Holds configuration and the store handle only; all durable state
/// lives in MongoDB.
pub struct AppState {
    pub args: Args,
    pub mongo: Option<MongoClient>,
}

impl AppState {
    /// Create application state
    pub fn new(args: Args, mongo: Option<MongoClient>) -> Self {
        Self { args, mongo }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), HabitusError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "habitus listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - insecure JWT secret fallback in effect");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            to_boxed(routes::health_check(Arc::clone(&state)))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => to_boxed(routes::version_info()),

        // CORS preflight
        (Method::OPTIONS, _) => to_boxed(preflight_response()),

        // ====================================================================
        // Users
        // ====================================================================
        (Method::POST, "/signup") => to_boxed(routes::handle_signup(req, state).await),
        (Method::POST, "/login") => to_boxed(routes::handle_login(req, state).await),
        (Method::GET, "/user") => to_boxed(routes::handle_user_detail(req, state).await),
        (Method::POST, "/user") => {
            to_boxed(routes::handle_update_user_details(req, state).await)
        }

        // ====================================================================
        // Habits
        // ====================================================================
        (Method::GET, "/habits") => to_boxed(routes::handle_list_habits(req, state).await),
        (Method::POST, "/habit") => to_boxed(routes::handle_create_habit(req, state).await),

        (Method::GET, p) if p.starts_with("/habit/") => match habit_id_segment(p) {
            Some(id) => {
                let id = id.to_string();
                to_boxed(routes::handle_get_habit(req, state, &id).await)
            }
            None => to_boxed(not_found_response(p)),
        },

        (Method::POST, p) if p.starts_with("/habit/") => match habit_id_segment(p) {
            Some(id) => {
                let id = id.to_string();
                to_boxed(routes::handle_update_habit(req, state, &id).await)
            }
            None => to_boxed(not_found_response(p)),
        },

        (Method::DELETE, p) if p.starts_with("/habit/") => match habit_id_segment(p) {
            Some(id) => {
                let id = id.to_string();
                to_boxed(routes::handle_delete_habit(req, state, &id).await)
            }
            None => to_boxed(not_found_response(p)),
        },

        _ => to_boxed(not_found_response(&path)),
    };

    Ok(response)
}

/// Extract the habit id path parameter. The segment must be non-empty
/// and must not contain further slashes.
fn habit_id_segment(path: &str) -> Option<&str> {
    let id = path.strip_prefix("/habit/")?;
    if id.is_empty() || id.contains('/') {
        None
    } else {
        Some(id)
    }
}

fn to_boxed(resp: Response<Full<Bytes>>) -> Response<BoxBody> {
    resp.map(|body| body.map_err(|never| match never {}).boxed())
}

fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(format!(
            r#"{{"error": "Route not found: {}"}}"#,
            path
        ))))
        .unwrap()
}

fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_habit_id_segment() {
        assert_eq!(habit_id_segment("/habit/abc123"), Some("abc123"));
        assert_eq!(habit_id_segment("/habit/"), None);
        assert_eq!(habit_id_segment("/habit/a/b"), None);
        assert_eq!(habit_id_segment("/habits"), None);
    }
}
