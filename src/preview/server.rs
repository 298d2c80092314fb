//! Local HTTP server for the live preview.
//!
//! Routes:
//! - `/`, `/index.html` - preview page
//! - `/preview.svg` - raw SVG of the last good conversion
//! - `/__pspreview/revision` - current revision, polled by the page
//! - anything else - 404

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use crossbeam::channel::Sender;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use super::session::PreviewSession;
use crate::embed::preview::REVISION_PATH;
use crate::utils::mime;
use crate::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Worker threads answering requests.
const REQUEST_THREADS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Page,
    Svg,
    Revision,
    NotFound,
}

impl Route {
    /// Resolve a request URL, ignoring query string and fragment.
    pub fn resolve(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        match path {
            "/" | "/index.html" => Self::Page,
            "/preview.svg" => Self::Svg,
            REVISION_PATH => Self::Revision,
            _ => Self::NotFound,
        }
    }
}

/// Response content, independent of the transport.
#[derive(Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(404, mime::PLAIN, "404 Not Found")
    }
}

/// Build the reply for `route` from the session's current state.
pub fn reply(route: Route, session: &PreviewSession) -> Reply {
    match route {
        Route::Page => Reply::new(200, mime::HTML, session.page()),
        Route::Svg => match session.svg() {
            Some(svg) => Reply::new(200, mime::SVG, svg.into_bytes()),
            None => Reply::not_found(),
        },
        Route::Revision => Reply::new(200, mime::PLAIN, session.revision().to_string()),
        Route::NotFound => Reply::not_found(),
    }
}

/// Bound server ready to accept requests.
pub struct PreviewServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl PreviewServer {
    /// Bind with port retry and register for Ctrl+C shutdown.
    pub fn bind(interface: IpAddr, port: u16, shutdown_tx: Sender<()>) -> Result<Self> {
        let (server, addr) = bind_with_retry(interface, port)?;
        let server = Arc::new(server);
        crate::core::register_server(Arc::clone(&server), shutdown_tx);
        Ok(Self { server, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Browser URL of the preview page.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr())
    }

    /// Serve until the server is unblocked.
    pub fn run(self, session: Arc<PreviewSession>) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_THREADS)
            .build()?;

        for request in self.server.incoming_requests() {
            let session = Arc::clone(&session);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &session) {
                    log!("preview"; "request error: {e}");
                }
            });
        }
        Ok(())
    }
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("preview"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

fn handle_request(request: Request, session: &PreviewSession) -> Result<()> {
    if crate::core::is_shutdown() {
        return send(request, Reply::new(503, mime::PLAIN, "503 Service Unavailable"));
    }

    let route = Route::resolve(request.url());
    debug!("preview"; "{} {} -> {:?}", request.method(), request.url(), route);
    send(request, reply(route, session))
}

fn send(request: Request, reply: Reply) -> Result<()> {
    let status = StatusCode(reply.status);
    let content_type = make_header("Content-Type", reply.content_type)?;
    let no_store = make_header("Cache-Control", "no-store")?;

    if request.method() == &Method::Head {
        let response = Response::empty(status)
            .with_header(content_type)
            .with_header(no_store);
        request.respond(response)?;
    } else {
        let response = Response::from_data(reply.body)
            .with_status_code(status)
            .with_header(content_type)
            .with_header(no_store);
        request.respond(response)?;
    }
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header {key}: {value}"))
}
