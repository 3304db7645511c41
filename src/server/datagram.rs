//! Datagram (UDP) listener
//!
//! One shared socket. The receive loop copies each packet's payload and
//! origin before handing it to a worker task, because the receive buffer is
//! reused for the next packet. Replies go out behind a single send lock so
//! concurrent workers cannot interleave at the socket boundary.

use crate::dispatch::Dispatcher;
use crate::shutdown::ShutdownHandle;
use anyhow::{Context as _, Result};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

/// Largest payload a single datagram can carry
const MAX_DATAGRAM: usize = 65_535;

/// Connectionless transport listener
pub struct DatagramListener {
    socket: Arc<UdpSocket>,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownHandle,
    workers: Arc<Semaphore>,
    send_lock: Arc<Mutex<()>>,
}

impl DatagramListener {
    /// Bind the shared socket
    ///
    /// As with the stream listener, a bind failure takes down this
    /// transport only.
    pub async fn bind(
        addr: &str,
        dispatcher: Arc<Dispatcher>,
        shutdown: ShutdownHandle,
        max_workers: usize,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("failed to bind datagram listener on {}", addr))?;
        info!("Datagram listener on {}", socket.local_addr()?);

        Ok(DatagramListener {
            socket: Arc::new(socket),
            dispatcher,
            shutdown,
            workers: Arc::new(Semaphore::new(max_workers)),
            send_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive packets until shutdown is initiated
    ///
    /// One packet is one request; each is dispatched on its own worker task
    /// and answered with at most one reply datagram.
    pub async fn run(self) {
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            let permit = tokio::select! {
                permit = self.workers.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = self.shutdown.cancelled() => break,
            };

            let (len, origin) = tokio::select! {
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok(pair) => pair,
                    Err(e) => {
                        if self.shutdown.is_triggered() {
                            break;
                        }
                        warn!("Receive failed: {}", e);
                        continue;
                    }
                },
                _ = self.shutdown.cancelled() => break,
            };

            // Defensive copy: the buffer is overwritten by the next receive
            let payload = Bytes::copy_from_slice(&buf[..len]);
            debug!("Datagram of {} bytes from {}", len, origin);

            let socket = self.socket.clone();
            let dispatcher = self.dispatcher.clone();
            let shutdown = self.shutdown.clone();
            let send_lock = self.send_lock.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let _guard = shutdown.task_guard();

                let text = String::from_utf8_lossy(&payload);
                let line = text.trim_end_matches(['\r', '\n']);
                let response = dispatcher.dispatch(line);

                // Once shutdown is initiated no reply leaves the socket,
                // including the acknowledgment of `exit` itself
                if shutdown.is_triggered() {
                    return;
                }
                let _held = send_lock.lock().await;
                if let Err(e) = socket.send_to(response.as_bytes(), origin).await {
                    warn!("Reply to {} failed: {}", origin, e);
                }
            });
        }

        info!("Datagram listener stopped");
    }
}
