//! Typed client for the remote service
//!
//! One method per remote operation. Store-level outcomes come back as
//! result strings; anything that goes wrong at the transport layer surfaces
//! as [`RemoteError`].

use super::{RemoteError, RemoteRequest, RemoteResponse};
use std::io::ErrorKind;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

pub struct RemoteClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    line: String,
}

impl RemoteClient {
    /// Connect to a remote service endpoint
    pub async fn connect(addr: &str) -> Result<Self, RemoteError> {
        let socket = TcpStream::connect(addr).await?;
        let (read_half, write_half) = socket.into_split();
        Ok(RemoteClient {
            reader: BufReader::new(read_half),
            writer: write_half,
            line: String::new(),
        })
    }

    pub async fn put(&mut self, key: &str, value: &str) -> Result<String, RemoteError> {
        self.call(RemoteRequest::Put {
            key: key.to_string(),
            value: value.to_string(),
        })
        .await
    }

    pub async fn get(&mut self, key: &str) -> Result<String, RemoteError> {
        self.call(RemoteRequest::Get {
            key: key.to_string(),
        })
        .await
    }

    pub async fn del(&mut self, key: &str) -> Result<String, RemoteError> {
        self.call(RemoteRequest::Del {
            key: key.to_string(),
        })
        .await
    }

    pub async fn store(&mut self) -> Result<String, RemoteError> {
        self.call(RemoteRequest::Store).await
    }

    pub async fn test(&mut self) -> Result<String, RemoteError> {
        self.call(RemoteRequest::Test).await
    }

    pub async fn get_len(&mut self) -> Result<String, RemoteError> {
        self.call(RemoteRequest::GetLen).await
    }

    pub async fn test2(&mut self) -> Result<String, RemoteError> {
        self.call(RemoteRequest::Test2).await
    }

    /// Ask the server to terminate its process
    ///
    /// The server exits without answering, so the connection dying here is
    /// the expected outcome rather than a failure.
    pub async fn shutdown(&mut self) -> Result<(), RemoteError> {
        match self.call(RemoteRequest::Shutdown).await {
            Ok(_) | Err(RemoteError::Disconnected) => Ok(()),
            Err(RemoteError::Io(e))
                if matches!(
                    e.kind(),
                    ErrorKind::ConnectionReset | ErrorKind::BrokenPipe | ErrorKind::UnexpectedEof
                ) =>
            {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Send one request frame and wait for its result
    async fn call(&mut self, request: RemoteRequest) -> Result<String, RemoteError> {
        let mut frame = serde_json::to_string(&request)?;
        frame.push('\n');
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.flush().await?;

        self.line.clear();
        let n = self.reader.read_line(&mut self.line).await?;
        if n == 0 {
            return Err(RemoteError::Disconnected);
        }

        let response: RemoteResponse =
            serde_json::from_str(self.line.trim_end_matches(['\r', '\n']))?;
        Ok(response.result)
    }
}
