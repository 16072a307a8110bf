//! Interrupt handling for a recording run

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// What an interrupt asks the recording loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// First Ctrl+C: stop and keep the note
    Stop,
    /// Second Ctrl+C or SIGTERM: discard the note
    Cancel,
}

impl Interrupt {
    /// Interrupt for the n-th SIGINT (1-based)
    pub fn for_sigint(count: usize) -> Self {
        if count <= 1 {
            Self::Stop
        } else {
            Self::Cancel
        }
    }
}

/// Receives interrupts from SIGINT and SIGTERM
pub struct InterruptSignal {
    receiver: mpsc::Receiver<Interrupt>,
}

impl InterruptSignal {
    /// Start listening for SIGINT and SIGTERM
    pub fn listen() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(4);

        let tx_int = tx.clone();
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            let mut count = 0;
            while sigint.recv().await.is_some() {
                count += 1;
                if tx_int.send(Interrupt::for_sigint(count)).await.is_err() {
                    break;
                }
            }
        });

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            if sigterm.recv().await.is_some() {
                let _ = tx.send(Interrupt::Cancel).await;
            }
        });

        Ok(Self { receiver: rx })
    }

    /// Wait for the next interrupt
    pub async fn recv(&mut self) -> Option<Interrupt> {
        self.receiver.recv().await
    }
}
