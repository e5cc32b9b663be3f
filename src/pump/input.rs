use crate::error::{Error, Result};
use crate::pump::sentinel::{InputCommand, STOP_COMMAND, StopDetector};
use futures_lite::io::{AsyncWrite, AsyncWriteExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncBufReadExt;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

const INPUT_BUFFER: usize = 64;

/// Lines typed by the operator.
///
/// One reader task owns the terminal for the life of the program and feeds
/// a channel; each server generation borrows the receiving end through its
/// stdin pump. Clones share the same channel.
#[derive(Debug, Clone)]
pub struct OperatorInput {
    lines: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl OperatorInput {
    /// Read lines from the process stdin.
    ///
    /// The read itself cannot be cancelled; it ends when stdin closes or
    /// when every `OperatorInput` clone has been dropped and another line
    /// arrives.
    pub fn stdin() -> Self {
        let (tx, input) = Self::channel();
        tokio::spawn(async move {
            let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("Operator input closed");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read operator input");
                        break;
                    }
                }
            }
        });
        input
    }

    /// Input fed by the returned sender instead of a terminal.
    pub fn channel() -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(INPUT_BUFFER);
        (
            tx,
            Self {
                lines: Arc::new(Mutex::new(rx)),
            },
        )
    }

    /// Drop lines typed while no server was listening.
    ///
    /// Returns how many were discarded. Does nothing while a stdin pump
    /// holds the input.
    pub fn discard_pending(&self) -> usize {
        let Ok(mut lines) = self.lines.try_lock() else {
            return 0;
        };
        let mut discarded = 0;
        while lines.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}

/// Why a stdin pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEnd {
    /// The server exited and the supervisor released the pump
    Shutdown,
    /// A stop sentinel was forwarded
    Stop,
    /// A reboot sentinel was forwarded
    Restart,
    /// No more operator input will arrive
    InputClosed,
}

/// Forward operator input to the server's stdin until `shutdown` fires.
///
/// Each line is classified first: sentinels send `stop` to the server and
/// end the pump, and the stop sentinel also clears `continue_flag`. A write
/// failure ends the pump with `Error::Stream`; it never affects the other
/// pumps.
pub fn spawn_input_pump<W>(
    mut writer: W,
    input: OperatorInput,
    continue_flag: Arc<AtomicBool>,
    mut shutdown: oneshot::Receiver<()>,
) -> JoinHandle<Result<InputEnd>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = tokio::select! {
            biased;
            _ = &mut shutdown => return Ok(InputEnd::Shutdown),
            lines = Arc::clone(&input.lines).lock_owned() => lines,
        };

        loop {
            let line = tokio::select! {
                biased;
                _ = &mut shutdown => return Ok(InputEnd::Shutdown),
                line = lines.recv() => match line {
                    Some(line) => line,
                    None => return Ok(InputEnd::InputClosed),
                },
            };

            match StopDetector::classify(&line) {
                InputCommand::Forward(line) => send_line(&mut writer, &line).await?,
                InputCommand::StopSentinel => {
                    tracing::info!("Stop requested by operator");
                    continue_flag.store(false, Ordering::SeqCst);
                    send_line(&mut writer, STOP_COMMAND).await?;
                    return Ok(InputEnd::Stop);
                }
                InputCommand::RestartSentinel => {
                    tracing::info!("Restart requested by operator");
                    send_line(&mut writer, STOP_COMMAND).await?;
                    return Ok(InputEnd::Restart);
                }
            }
        }
    })
}

async fn send_line<W>(writer: &mut W, line: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(format!("{}\n", line).as_bytes())
        .await
        .map_err(|e| Error::Stream(format!("Failed to write to server stdin: {}", e)))?;
    writer
        .flush()
        .await
        .map_err(|e| Error::Stream(format!("Failed to flush server stdin: {}", e)))
}
