use super::dispatch::{self, Reply};
use super::protocol::FramingError;
use crate::application::engine::LedgerEngine;
use crate::error::Result;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, ToSocketAddrs};

/// Longest request line accepted, not counting its `\n` or `\r\n` terminator.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts connections and serves each one on its own task.
pub struct Server {
    listener: TcpListener,
    engine: Arc<LedgerEngine>,
}

impl Server {
    pub async fn bind<A: ToSocketAddrs>(addr: A, engine: Arc<LedgerEngine>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, engine })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves connections forever.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves connections until `shutdown` completes. Connections already being
    /// served keep running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(addr = %self.local_addr()?, "ledger server listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "connection accepted");
                        let engine = Arc::clone(&self.engine);
                        tokio::spawn(async move {
                            if let Err(e) = serve_connection(stream, &engine).await {
                                tracing::debug!(%peer, error = %e, "connection failed");
                            }
                            tracing::debug!(%peer, "connection closed");
                        });
                    }
                    Err(e) => {
                        // Usually descriptor exhaustion; existing connections are unaffected.
                        tracing::warn!(error = %e, "failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        }
    }
}

enum Frame {
    Line(String),
    Rejected(FramingError),
    Closed,
}

async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    // Room for the longest line plus "\r\n"; anything past that is oversized.
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES as u64 + 2)
        .read_until(b'\n', buf)
        .await?;
    if read == 0 {
        return Ok(Frame::Closed);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    if buf.len() > MAX_LINE_BYTES {
        return Ok(Frame::Rejected(FramingError::Malformed));
    }

    match std::str::from_utf8(buf) {
        Ok(line) => Ok(Frame::Line(line.to_string())),
        Err(_) => Ok(Frame::Rejected(FramingError::Malformed)),
    }
}

/// Runs the request/response loop for one client.
///
/// Each line is answered before the next one is read. The loop ends when the
/// client closes the stream, on an I/O error, or after answering a line that is
/// not a well-formed request.
pub async fn serve_connection<S>(stream: S, engine: &LedgerEngine) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        let reply = match read_frame(&mut reader, &mut buf).await? {
            Frame::Closed => return Ok(()),
            Frame::Line(line) => dispatch::handle_line(engine, &line).await,
            Frame::Rejected(e) => dispatch::reject(e),
        };

        let Reply {
            response,
            keep_open,
        } = reply;
        writer.write_all(response.to_line().as_bytes()).await?;
        writer.flush().await?;

        if !keep_open {
            writer.shutdown().await?;
            return Ok(());
        }
    }
}
