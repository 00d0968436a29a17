//! Connection acceptance and the per-connection read/write tasks
//!
//! The acceptor takes a permit from a fixed-capacity semaphore before every
//! `accept`, so excess connections wait in the OS backlog instead of getting
//! unbounded handler tasks. Each accepted connection runs two tasks: a
//! reader that dispatches inbound lines and a writer that drains the
//! session's outbound channel back onto the socket.

use crate::session::{handle_line, Services, Session};
use log::{error, info, warn};
use shared::WELCOME_LINE;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Duration;

pub struct Acceptor {
    listener: TcpListener,
    services: Services,
    capacity: Arc<Semaphore>,
}

impl std::fmt::Debug for Acceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acceptor")
            .field("listener", &self.listener)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl Acceptor {
    /// Binds the listening socket. Bind failure is the one startup error
    /// that takes the process down.
    pub async fn bind(addr: &str, services: Services, max_sessions: usize) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            services,
            capacity: Arc::new(Semaphore::new(max_sessions)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections indefinitely, one session per connection, at
    /// most `max_sessions` at a time. Accept errors cost one retry pause,
    /// never the server.
    pub async fn run(self) -> io::Result<()> {
        loop {
            let permit = match Arc::clone(&self.capacity).acquire_owned().await {
                Ok(permit) => permit,
                // The semaphore is never closed; treat it as shutdown anyway.
                Err(_) => return Ok(()),
            };
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
            };
            info!("Client connected from {}", addr);

            let services = self.services.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, &services).await {
                    warn!("Connection from {} ended with error: {}", addr, e);
                }
                info!("Client {} disconnected", addr);
                drop(permit);
            });
        }
    }
}

/// Runs one client session until end-of-stream or a transport error, then
/// applies the disconnect policy: leave the waiting queue, and drop the
/// directory binding only if it still points at this session.
async fn handle_connection(stream: TcpStream, services: &Services) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let session = Arc::new(Session::new(outbound_tx));

    let writer_task = tokio::spawn(async move {
        while let Some(line) = outbound_rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
        }
    });

    session.send(WELCOME_LINE);

    let mut lines = BufReader::new(reader).lines();
    let result = loop {
        match lines.next_line().await {
            Ok(Some(line)) => handle_line(&session, services, &line).await,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    if let Some(username) = session.username().await {
        services.auth.logout_session(&username, session.id()).await;
    }
    services.matchmaker.remove(&session).await;

    writer_task.abort();
    result
}
