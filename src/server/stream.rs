//! Stream (TCP) listener
//!
//! Accepts connections and hands each session to its own worker task, drawn
//! from a bounded pool. The accept loop races the shutdown signal, so a
//! pending accept is released the moment shutdown is initiated instead of
//! surfacing as an unexpected error.

use crate::dispatch::Dispatcher;
use crate::shutdown::ShutdownHandle;
use anyhow::{Context as _, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Connection-oriented transport listener
pub struct StreamListener {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownHandle,
    workers: Arc<Semaphore>,
}

impl StreamListener {
    /// Bind the listening socket
    ///
    /// A bind failure takes down this transport only; the caller decides
    /// whether the process keeps running on the remaining transports.
    pub async fn bind(
        addr: &str,
        dispatcher: Arc<Dispatcher>,
        shutdown: ShutdownHandle,
        max_workers: usize,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind stream listener on {}", addr))?;
        info!("Stream listener on {}", listener.local_addr()?);

        Ok(StreamListener {
            listener,
            dispatcher,
            shutdown,
            workers: Arc::new(Semaphore::new(max_workers)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept sessions until shutdown is initiated
    ///
    /// Worker permits are acquired before accepting, so a full pool applies
    /// backpressure by letting connections queue in the listen backlog.
    pub async fn run(self) {
        loop {
            let permit = tokio::select! {
                permit = self.workers.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = self.shutdown.cancelled() => break,
            };

            let (socket, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        if self.shutdown.is_triggered() {
                            break;
                        }
                        warn!("Accept failed: {}", e);
                        continue;
                    }
                },
                _ = self.shutdown.cancelled() => break,
            };

            info!("New stream session from {}", peer);

            let dispatcher = self.dispatcher.clone();
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let _guard = shutdown.task_guard();

                let mut session = Session::new(socket);
                if let Err(e) = session.handle(dispatcher, shutdown).await {
                    warn!("Session error from {}: {}", peer, e);
                }

                info!("Session closed: {}", peer);
            });
        }

        info!("Stream listener stopped");
    }
}

/// One accepted connection
///
/// Lives from accept until an `exit` command, EOF, an I/O failure, or
/// shutdown.
struct Session {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    line: String,
}

impl Session {
    fn new(socket: TcpStream) -> Self {
        let (read_half, write_half) = socket.into_split();
        Session {
            reader: BufReader::new(read_half),
            writer: write_half,
            line: String::new(),
        }
    }

    /// Read lines, dispatch them, write responses
    async fn handle(&mut self, dispatcher: Arc<Dispatcher>, shutdown: ShutdownHandle) -> Result<()> {
        loop {
            self.line.clear();
            let n = tokio::select! {
                read = self.reader.read_line(&mut self.line) => read?,
                _ = shutdown.cancelled() => return Ok(()),
            };
            if n == 0 {
                // peer closed the connection
                return Ok(());
            }

            let line = self.line.trim_end_matches(['\r', '\n']);
            debug!("Session received: {}", line);

            let response = dispatcher.dispatch(line);
            self.writer.write_all(response.as_bytes()).await?;
            self.writer.write_all(b"\n").await?;
            self.writer.flush().await?;

            // `exit` terminates its own session right after the response;
            // other sessions observe the signal at their next read
            if shutdown.is_triggered() {
                return Ok(());
            }
        }
    }
}
