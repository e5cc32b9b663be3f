use crate::console::{Console, Style};
use futures_lite::io::{AsyncBufReadExt, AsyncRead, BufReader};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Which of the server's output streams a pump relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    fn prefix(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "",
            OutputStream::Stderr => "[ERROR] ",
        }
    }

    fn style(&self) -> Style {
        match self {
            OutputStream::Stdout => Style::Output,
            OutputStream::Stderr => Style::Error,
        }
    }
}

/// Relay `reader` to the console line by line until end of stream.
///
/// Bytes that are not valid UTF-8 are replaced rather than dropping the
/// line. The task resolves to the number of lines relayed.
pub fn spawn_output_pump<R>(
    reader: R,
    console: Arc<dyn Console>,
    stream: OutputStream,
) -> JoinHandle<u64>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buffer = Vec::new();
        let mut relayed = 0;

        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buffer);
                    let line = line.trim_end_matches(['\n', '\r']);
                    console.write_line(&format!("{}{}", stream.prefix(), line), stream.style());
                    relayed += 1;
                }
                Err(e) => {
                    tracing::debug!(?stream, error = %e, "Output pipe read failed");
                    break;
                }
            }
        }

        tracing::debug!(?stream, lines = relayed, "Output pump finished");
        relayed
    })
}
