//! Newline-delimited JSON signaling over TCP, Unix sockets or the terminal.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use bounce_core::Signal;

use crate::error::{PeerError, Result};
use crate::signaling::signaling_transport::SignalingTransport;

type LineReader = Lines<BufReader<Box<dyn AsyncRead + Unpin + Send>>>;
type LineWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Which side opens the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
    Listen,
    Dial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Unix { path: PathBuf },
    /// Messages are printed on stdout and read from stdin, for copying
    /// between two terminals by hand.
    Stdio,
}

pub struct LineSignaling {
    endpoint: Endpoint,
    mode: ConnectMode,
    reader: Option<LineReader>,
    writer: Option<LineWriter>,
    bound_path: Option<PathBuf>,
}

impl LineSignaling {
    pub fn new(endpoint: Endpoint, mode: ConnectMode) -> Self {
        Self {
            endpoint,
            mode,
            reader: None,
            writer: None,
            bound_path: None,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn attach(
        &mut self,
        reader: impl AsyncRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) {
        let reader: Box<dyn AsyncRead + Unpin + Send> = Box::new(reader);
        self.reader = Some(BufReader::new(reader).lines());
        self.writer = Some(Box::new(writer));
    }

    async fn connect_tcp(&mut self, host: String, port: u16) -> Result<()> {
        let stream = match self.mode {
            ConnectMode::Listen => {
                let listener = TcpListener::bind((host.as_str(), port)).await?;
                info!("Waiting for signaling peer on {}:{}", host, port);
                let (stream, addr) = listener.accept().await?;
                info!("Signaling peer connected from {}", addr);
                stream
            }
            ConnectMode::Dial => {
                let stream = TcpStream::connect((host.as_str(), port)).await?;
                info!("Connected to signaling peer at {}:{}", host, port);
                stream
            }
        };
        let (read, write) = stream.into_split();
        self.attach(read, write);
        Ok(())
    }

    #[cfg(unix)]
    async fn connect_unix(&mut self, path: PathBuf) -> Result<()> {
        use tokio::net::{UnixListener, UnixStream};

        let stream = match self.mode {
            ConnectMode::Listen => {
                if path.exists() {
                    tokio::fs::remove_file(&path).await?;
                }
                let listener = UnixListener::bind(&path)?;
                self.bound_path = Some(path.clone());
                info!("Waiting for signaling peer on {}", path.display());
                let (stream, _) = listener.accept().await?;
                stream
            }
            ConnectMode::Dial => UnixStream::connect(&path).await?,
        };
        info!("Signaling connected over {}", path.display());
        let (read, write) = stream.into_split();
        self.attach(read, write);
        Ok(())
    }

    #[cfg(not(unix))]
    async fn connect_unix(&mut self, _path: PathBuf) -> Result<()> {
        Err(PeerError::Signaling(
            "unix sockets are not available on this platform".into(),
        ))
    }
}

#[async_trait]
impl SignalingTransport for LineSignaling {
    async fn connect(&mut self) -> Result<()> {
        match self.endpoint.clone() {
            Endpoint::Tcp { host, port } => self.connect_tcp(host, port).await,
            Endpoint::Unix { path } => self.connect_unix(path).await,
            Endpoint::Stdio => {
                info!("Copy each line printed below to the other peer, and paste its lines here");
                self.attach(tokio::io::stdin(), tokio::io::stdout());
                Ok(())
            }
        }
    }

    async fn send(&mut self, signal: &Signal) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| PeerError::Signaling("not connected".into()))?;

        let mut line = signal.to_json()?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        debug!("> {}", line.trim_end());
        Ok(())
    }

    async fn receive(&mut self) -> Result<Signal> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| PeerError::Signaling("not connected".into()))?;

        loop {
            let Some(line) = reader.next_line().await? else {
                return Err(PeerError::Signaling("remote closed the connection".into()));
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            debug!("< {}", line);
            return Ok(Signal::from_json(line)?);
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.writer.is_some() {
            if let Err(e) = self.send(&Signal::Bye).await {
                debug!("Could not say bye: {}", e);
            }
        }
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.shutdown().await;
        }
        self.reader = None;

        if let Some(path) = self.bound_path.take() {
            let _ = tokio::fs::remove_file(path).await;
        }
        Ok(())
    }
}
