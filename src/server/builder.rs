// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use crate::server::listener::bind_tcp;
use anyhow::{Context, Result};
use hyper::{server::conn::Http, Body, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::Service;

/// Builder pattern so the binary (or a test) can inject the handler.
pub struct ServerBuilder<H> {
    addr: SocketAddr,
    handler: Option<H>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, handler: None }
    }

    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bind the TCP socket without accepting yet. Port 0 picks a free port,
    /// see [`BoundServer::local_addr`].
    pub async fn bind(self) -> Result<BoundServer<H>> {
        let handler = self
            .handler
            .context("handler must be set via with_handler()")?;

        let listener = bind_tcp(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("HTTP server listening on {}", local_addr);

        Ok(BoundServer {
            listener,
            local_addr,
            handler,
        })
    }
}

pub struct BoundServer<H> {
    listener: TcpListener,
    local_addr: SocketAddr,
    handler: H,
}

impl<H> BoundServer<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `signal` resolves, one Tokio task per
    /// connection. Connections already accepted are left to finish.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => {
                    tracing::info!("HTTP server on {} stopped accepting", self.local_addr);
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            // Usually fd exhaustion under load; back off instead of spinning.
                            tracing::warn!(%err, "accept failed");
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            continue;
                        }
                    };
                    let svc = self.handler.clone();

                    tokio::spawn(async move {
                        let http = Http::new();
                        if let Err(err) = http.serve_connection(stream, svc).await {
                            tracing::warn!(%peer, %err, "connection error");
                        }
                    });
                }
            }
        }
    }
}
