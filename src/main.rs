use std::sync::Arc;
use tracing::{error, info};
use trikv::{
    DatagramListener, Dispatcher, KvStore, RemoteService, ServerConfig, ShutdownCoordinator,
    StreamListener,
};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("TriKV starting...");

    let config = ServerConfig::load();
    let store = Arc::new(KvStore::new());
    let coordinator = ShutdownCoordinator::new();
    let shutdown = coordinator.handle();

    let dispatcher = Arc::new(Dispatcher::new(store.clone(), shutdown.clone()));

    // Stream transport
    let stream_task = {
        let dispatcher = dispatcher.clone();
        let shutdown = shutdown.clone();
        let addr = config.stream_addr.clone();
        let max_workers = config.max_workers;
        tokio::spawn(async move {
            match StreamListener::bind(&addr, dispatcher, shutdown, max_workers).await {
                Ok(listener) => listener.run().await,
                Err(e) => error!("Stream transport down: {:#}", e),
            }
        })
    };

    // Datagram transport
    let datagram_task = {
        let dispatcher = dispatcher.clone();
        let shutdown = shutdown.clone();
        let addr = config.datagram_addr.clone();
        let max_workers = config.max_workers;
        tokio::spawn(async move {
            match DatagramListener::bind(&addr, dispatcher, shutdown, max_workers).await {
                Ok(listener) => listener.run().await,
                Err(e) => error!("Datagram transport down: {:#}", e),
            }
        })
    };

    // Remote invocation transport
    let remote_task = {
        let store = store.clone();
        let shutdown = shutdown.clone();
        let addr = config.remote_addr.clone();
        let max_workers = config.max_workers;
        tokio::spawn(async move {
            match RemoteService::bind(&addr, store, shutdown, max_workers).await {
                Ok(service) => service.run().await,
                Err(e) => error!("Remote transport down: {:#}", e),
            }
        })
    };

    // Run until ctrl-c or an in-band `exit`
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-c received");
            shutdown.initiate();
        }
        _ = shutdown.cancelled() => {}
    }

    info!("Draining in-flight work...");
    let _ = tokio::join!(stream_task, datagram_task, remote_task);

    // Every handle must be gone before the drain can complete
    drop(dispatcher);
    drop(shutdown);

    if coordinator.drain(config.drain_timeout()).await {
        info!("Shutdown complete");
    } else {
        error!("Exiting with worker tasks still in flight");
    }
}
