use tokio::sync::mpsc;

/// Sending half of a test interrupt source.
pub type InterruptSender = mpsc::UnboundedSender<()>;

/// Operator interrupts (Ctrl+C) delivered to the supervisor.
///
/// Once the source is gone, [`Interrupts::recv`] never resolves.
#[derive(Debug)]
pub struct Interrupts {
    rx: mpsc::UnboundedReceiver<()>,
}

impl Interrupts {
    /// Interrupts raised by Ctrl+C on the controlling terminal.
    ///
    /// Must be called from within a tokio runtime.
    pub fn ctrl_c() -> Self {
        let (tx, interrupts) = Self::channel();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Interrupt received");
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        interrupts
    }

    /// Interrupts raised through the returned sender.
    pub fn channel() -> (InterruptSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// No interrupts at all.
    pub fn never() -> Self {
        Self::channel().1
    }

    /// Wait for the next interrupt.
    pub async fn recv(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// Take one interrupt that is already pending, without waiting.
    pub fn try_recv(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Forget interrupts that arrived while nobody was waiting.
    pub fn clear(&mut self) -> usize {
        let mut cleared = 0;
        while self.rx.try_recv().is_ok() {
            cleared += 1;
        }
        cleared
    }
}
