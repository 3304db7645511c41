//! Remote service endpoint
//!
//! Accepts connections like the stream listener, but each received frame is
//! a typed operation rather than a wire line. The operations bind the same
//! command implementations the dispatcher uses, so all three transports
//! share one verb surface.

use super::{RemoteRequest, RemoteResponse};
use crate::commands::{
    Command, CommandContext, DelCommand, GetCommand, GetLenCommand, PutCommand, StoreCommand,
    TestCommand,
};
use crate::shutdown::ShutdownHandle;
use crate::store::KvStore;
use anyhow::{Context as _, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Remote invocation service
pub struct RemoteService {
    listener: TcpListener,
    context: CommandContext,
    shutdown: ShutdownHandle,
    workers: Arc<Semaphore>,
}

impl RemoteService {
    /// Bind the service endpoint
    pub async fn bind(
        addr: &str,
        store: Arc<KvStore>,
        shutdown: ShutdownHandle,
        max_workers: usize,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind remote service on {}", addr))?;
        info!("Remote service on {}", listener.local_addr()?);

        Ok(RemoteService {
            listener,
            context: CommandContext::new(store, shutdown.clone()),
            shutdown,
            workers: Arc::new(Semaphore::new(max_workers)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept callers until shutdown is initiated
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

            info!("Remote caller connected: {}", peer);

            let context = self.context.clone();
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let _guard = shutdown.task_guard();

                if let Err(e) = handle_calls(socket, context, shutdown).await {
                    warn!("Remote caller error from {}: {}", peer, e);
                }

                info!("Remote caller disconnected: {}", peer);
            });
        }

        info!("Remote service stopped");
    }
}

/// Serve one caller's operations until it disconnects
async fn handle_calls(
    socket: TcpStream,
    context: CommandContext,
    shutdown: ShutdownHandle,
) -> Result<()> {
    let (read_half, write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut writer = write_half;
    let mut line = String::new();

    loop {
        line.clear();
        let n = tokio::select! {
            read = reader.read_line(&mut line) => read?,
            _ = shutdown.cancelled() => return Ok(()),
        };
        if n == 0 {
            return Ok(());
        }

        let frame = line.trim_end_matches(['\r', '\n']);
        if frame.is_empty() {
            continue;
        }

        let request: RemoteRequest = match serde_json::from_str(frame) {
            Ok(request) => request,
            Err(e) => {
                // A caller speaking the wrong protocol gets cut off
                warn!("Malformed remote frame: {}", e);
                return Ok(());
            }
        };
        debug!("Remote call: {:?}", request);

        let response = RemoteResponse {
            result: execute(&context, request),
        };
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }
}

/// Execute one operation against the shared store
///
/// Every operation except `test2` and `shutdown` is the same implementation
/// the line-grammar transports dispatch to.
fn execute(context: &CommandContext, request: RemoteRequest) -> String {
    match request {
        RemoteRequest::Put { key, value } => {
            PutCommand.execute(context, &[key.as_str(), value.as_str()])
        }
        RemoteRequest::Get { key } => GetCommand.execute(context, &[key.as_str()]),
        RemoteRequest::Del { key } => DelCommand.execute(context, &[key.as_str()]),
        RemoteRequest::Store => StoreCommand.execute(context, &[]),
        RemoteRequest::Test => TestCommand.execute(context, &[]),
        RemoteRequest::GetLen => GetLenCommand.execute(context, &[]),
        RemoteRequest::Test2 => test2_response(&context.store),
        RemoteRequest::Shutdown => {
            // No cooperative drain: the process ends before any reply is sent
            info!("Remote shutdown requested, terminating the process");
            std::process::exit(0);
        }
    }
}

/// Size-and-prefix diagnostic, exposed only on the remote surface
fn test2_response(store: &KvStore) -> String {
    let mut message = format!("TEST2 COMPLETED: Size of store: {}; First keys:", store.len());
    for key in store.first_keys(10) {
        message.push(' ');
        message.push_str(&key);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::remote::{RemoteClient, RemoteError};
    use crate::shutdown::ShutdownCoordinator;

    async fn start_service() -> (SocketAddr, Arc<KvStore>, ShutdownHandle) {
        let store = Arc::new(KvStore::new());
        let coordinator = ShutdownCoordinator::new();
        let shutdown = coordinator.handle();

        let service = RemoteService::bind("127.0.0.1:0", store.clone(), shutdown.clone(), 4)
            .await
            .unwrap();
        let addr = service.local_addr().unwrap();
        tokio::spawn(service.run());

        (addr, store, shutdown)
    }

    #[tokio::test]
    async fn test_end_to_end_sequence() {
        let (addr, _store, _shutdown) = start_service().await;
        let mut client = RemoteClient::connect(&addr.to_string()).await.unwrap();

        assert_eq!(client.put("a", "1").await.unwrap(), "OK");
        assert_eq!(client.put("b", "2").await.unwrap(), "OK");
        assert_eq!(client.get("a").await.unwrap(), "1");
        assert_eq!(client.del("a").await.unwrap(), "OK");
        assert_eq!(client.get("a").await.unwrap(), "NOT FOUND");
        assert_eq!(client.get_len().await.unwrap(), "LENGTH:5");
        assert_eq!(client.store().await.unwrap(), "b=2; ");
    }

    #[tokio::test]
    async fn test_test_and_test2_diagnostics() {
        let (addr, _store, _shutdown) = start_service().await;
        let mut client = RemoteClient::connect(&addr.to_string()).await.unwrap();

        assert_eq!(
            client.test().await.unwrap(),
            "TEST COMPLETED: Store contents length: 65020"
        );

        let diagnostic = client.test2().await.unwrap();
        assert!(diagnostic.starts_with("TEST2 COMPLETED: Size of store: 700; First keys:"));
        assert!(diagnostic.contains("key"));
    }

    #[tokio::test]
    async fn test_store_is_shared_with_the_dispatcher() {
        let (addr, store, shutdown) = start_service().await;
        let dispatcher = Dispatcher::new(store, shutdown);
        let mut client = RemoteClient::connect(&addr.to_string()).await.unwrap();

        assert_eq!(dispatcher.dispatch("put x 9"), "OK");
        assert_eq!(client.get("x").await.unwrap(), "9");

        assert_eq!(client.put("y", "7").await.unwrap(), "OK");
        assert_eq!(dispatcher.dispatch("get y"), "7");
    }

    #[tokio::test]
    async fn test_vanished_endpoint_is_a_remote_error() {
        // a listener that drops every caller immediately
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let mut client = RemoteClient::connect(&addr.to_string()).await.unwrap();
        let outcome = client.get("anything").await;
        assert!(matches!(
            outcome,
            Err(RemoteError::Disconnected) | Err(RemoteError::Io(_))
        ));
    }
}
