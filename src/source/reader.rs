use crate::config::types::SourceConfig;
use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line exceeds {max} bytes")]
    LineTooLong { max: usize },

    #[error("line is not valid UTF-8")]
    NotUtf8,

    #[error("{program} exited with {status}")]
    Exited { program: PathBuf, status: String },
}

impl SourceError {
    /// Recoverable errors skip one line; anything else ends the stream.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SourceError::LineTooLong { .. } | SourceError::NotUtf8)
    }
}

/// A live stream of structured log lines.
///
/// `next_line` must be cancel-safe: the driver races it against its tick and
/// the shutdown token, and a dropped read must not lose buffered data.
#[async_trait]
pub trait LogSource: Send {
    /// Next raw line, or `None` at end of stream.
    async fn next_line(&mut self) -> Result<Option<String>, SourceError>;

    /// Release the underlying capability. Called once, during drain.
    async fn close(&mut self) -> Result<(), SourceError>;
}

/// One framed line. Over-long and non-UTF-8 lines are consumed and reported
/// as frames rather than decoder errors, which would end the stream.
#[derive(Debug)]
enum Frame {
    Line(String),
    Oversized,
    NotUtf8,
}

struct JournalLineCodec {
    inner: LinesCodec,
}

impl JournalLineCodec {
    fn frame(
        result: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<Frame>, LinesCodecError> {
        match result {
            Ok(line) => Ok(line.map(Frame::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Frame::Oversized)),
            Err(LinesCodecError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                Ok(Some(Frame::NotUtf8))
            }
            Err(e) => Err(e),
        }
    }
}

impl Decoder for JournalLineCodec {
    type Item = Frame;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        Self::frame(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        Self::frame(self.inner.decode_eof(buf))
    }
}

/// Newline-framed reader over any byte stream (stdin, a file, a pipe).
pub struct LineSource<R> {
    lines: FramedRead<R, JournalLineCodec>,
    max_line_bytes: usize,
}

impl<R: AsyncRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R, max_line_bytes: usize) -> Self {
        let codec = JournalLineCodec {
            inner: LinesCodec::new_with_max_length(max_line_bytes),
        };
        Self {
            lines: FramedRead::new(reader, codec),
            max_line_bytes,
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> LogSource for LineSource<R> {
    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        match self.lines.next().await {
            Some(Ok(Frame::Line(line))) => Ok(Some(line)),
            Some(Ok(Frame::Oversized)) => Err(SourceError::LineTooLong {
                max: self.max_line_bytes,
            }),
            Some(Ok(Frame::NotUtf8)) => Err(SourceError::NotUtf8),
            Some(Err(LinesCodecError::Io(e))) => Err(SourceError::Io(e)),
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => Err(SourceError::LineTooLong {
                max: self.max_line_bytes,
            }),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Follows the systemd journal through a `journalctl` child process.
pub struct JournalSource {
    program: PathBuf,
    child: Child,
    lines: LineSource<tokio::process::ChildStdout>,
}

impl JournalSource {
    /// Spawn `journalctl -f -p <min_priority> -o json --no-pager [extra_args]`.
    pub fn spawn(
        journalctl: &Path,
        extra_args: &[String],
        min_priority: u8,
        max_line_bytes: usize,
    ) -> Result<Self, SourceError> {
        let priority = min_priority.to_string();
        let mut command = Command::new(journalctl);
        command
            .args(["-f", "-p", priority.as_str(), "-o", "json", "--no-pager"])
            .args(extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| SourceError::Spawn {
            program: journalctl.to_path_buf(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "journalctl stdout was not captured",
            ))
        })?;

        info!(
            program = %journalctl.display(),
            pid = child.id().unwrap_or_default(),
            min_priority,
            "Following journal"
        );

        Ok(Self {
            program: journalctl.to_path_buf(),
            child,
            lines: LineSource::new(stdout, max_line_bytes),
        })
    }
}

#[async_trait]
impl LogSource for JournalSource {
    /// `journalctl -f` never ends on its own, so end of stream is reported as
    /// the child having exited.
    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        if let Some(line) = self.lines.next_line().await? {
            return Ok(Some(line));
        }

        let status = self.child.wait().await?;
        Err(SourceError::Exited {
            program: self.program.clone(),
            status: status.to_string(),
        })
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        if let Some(status) = self.child.try_wait()? {
            debug!(%status, "journalctl already exited");
            return Ok(());
        }
        self.child.kill().await?;
        debug!("journalctl stopped");
        Ok(())
    }
}

/// Acquire the configured log source. Failure here is a startup failure.
pub async fn open_source(
    config: &SourceConfig,
    min_priority: u8,
    max_line_bytes: usize,
) -> Result<Box<dyn LogSource>, SourceError> {
    match config {
        SourceConfig::Journal {
            journalctl,
            extra_args,
        } => Ok(Box::new(JournalSource::spawn(
            journalctl,
            extra_args,
            min_priority,
            max_line_bytes,
        )?)),
        SourceConfig::Stdin => {
            info!("Reading journal records from stdin");
            Ok(Box::new(LineSource::new(tokio::io::stdin(), max_line_bytes)))
        }
        SourceConfig::File { path } => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                warn!(path = %path.display(), error = %e, "Cannot open source file");
                SourceError::Io(e)
            })?;
            info!(path = %path.display(), "Replaying journal records from file");
            Ok(Box::new(LineSource::new(file, max_line_bytes)))
        }
    }
}
