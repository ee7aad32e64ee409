//! Raw byte transports.
//!
//! Each protocol module owns its raw resource (SSH shell channel, TCP
//! socket, serial port) inside a spawned I/O task and bridges it to a pair
//! of mpsc byte channels. The rest of the engine sees one uniform
//! [`TransportHandle`] regardless of protocol.

pub mod config;
mod serial;
mod ssh;
mod telnet;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

pub use config::{
    AuthMethod, ConnectConfig, HostKeyVerification, SerialSettings, TransportKind,
};

use crate::error::{Result, TransportError};

/// Capacity of the bridge channels between the I/O task and the engine.
const CHANNEL_CAPACITY: usize = 256;

/// Uniform handle over an established raw byte channel.
///
/// Writes go to the I/O task via `to_device`; everything the device emits
/// arrives on `from_device` in read-sized chunks. Dropping the shutdown
/// sender (or the handle itself) terminates the I/O task.
pub struct TransportHandle {
    kind: TransportKind,
    to_device: mpsc::Sender<Vec<u8>>,
    from_device: mpsc::Receiver<Vec<u8>>,
    shutdown: Option<oneshot::Sender<()>>,
    alive: Arc<AtomicBool>,
}

impl TransportHandle {
    pub(crate) fn new(
        kind: TransportKind,
        to_device: mpsc::Sender<Vec<u8>>,
        from_device: mpsc::Receiver<Vec<u8>>,
        shutdown: oneshot::Sender<()>,
        alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            kind,
            to_device,
            from_device,
            shutdown: Some(shutdown),
            alive,
        }
    }

    /// Establish a transport per the configuration.
    pub async fn connect(config: &ConnectConfig) -> Result<Self> {
        match config.kind {
            TransportKind::Ssh => ssh::connect(config).await,
            TransportKind::Telnet => telnet::connect(config).await,
            TransportKind::Serial => serial::connect(config).await,
            TransportKind::Loopback => Err(TransportError::Io(std::io::Error::other(
                "loopback transports are constructed with TransportHandle::loopback",
            ))
            .into()),
        }
    }

    /// In-process transport plus its device-side peer.
    ///
    /// The peer plays the role of the remote device: bytes written through
    /// the handle arrive on `peer.rx`, and anything sent on `peer.tx`
    /// becomes channel input. Used by the integration tests and offline
    /// simulation.
    pub fn loopback() -> (Self, LoopbackPeer) {
        let (to_device, peer_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (peer_tx, from_device) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown, _shutdown_rx) = oneshot::channel();
        let alive = Arc::new(AtomicBool::new(true));

        let handle = Self::new(
            TransportKind::Loopback,
            to_device,
            from_device,
            shutdown,
            alive.clone(),
        );
        let peer = LoopbackPeer {
            tx: peer_tx,
            rx: peer_rx,
            alive,
        };
        (handle, peer)
    }

    /// Transport protocol of this handle.
    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Whether the I/O task still holds a live raw channel.
    pub fn is_open(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Write raw bytes to the device.
    pub async fn send(&self, data: &[u8]) -> Result<()> {
        self.to_device
            .send(data.to_vec())
            .await
            .map_err(|_| TransportError::ConnectionLost)?;
        Ok(())
    }

    /// Drain one chunk of available input without waiting.
    ///
    /// `Ok(None)` means nothing is buffered right now; a closed bridge
    /// surfaces as `ConnectionLost`.
    pub fn try_recv(&mut self) -> Result<Option<Vec<u8>>> {
        match self.from_device.try_recv() {
            Ok(chunk) => Ok(Some(chunk)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.alive.store(false, Ordering::Release);
                Err(TransportError::ConnectionLost.into())
            }
        }
    }

    /// Wait for the next chunk of input. `None` once the channel closes.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        let chunk = self.from_device.recv().await;
        if chunk.is_none() {
            self.alive.store(false, Ordering::Release);
        }
        chunk
    }

    /// Tear the transport down.
    ///
    /// Best-effort: the shutdown signal asks the I/O task to close the
    /// raw resource gracefully (SSH disconnect, socket shutdown); if the
    /// task is already gone that is fine. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            if shutdown.send(()).is_err() {
                debug!("{} I/O task already terminated before close", self.kind);
            }
        }
        self.from_device.close();
        self.alive.store(false, Ordering::Release);
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Device-side endpoint of a loopback transport.
pub struct LoopbackPeer {
    /// Sends bytes that the session will read as device output.
    pub tx: mpsc::Sender<Vec<u8>>,
    /// Receives bytes the session wrote to the device.
    pub rx: mpsc::Receiver<Vec<u8>>,
    alive: Arc<AtomicBool>,
}

impl LoopbackPeer {
    /// Simulate the device dropping the connection.
    pub fn hang_up(self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Collect everything the session has written so far, decoded lossily.
    pub fn drain_written(&mut self) -> String {
        let mut out = String::new();
        while let Ok(chunk) = self.rx.try_recv() {
            out.push_str(&String::from_utf8_lossy(&chunk));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loopback_round_trip() {
        let (mut handle, mut peer) = TransportHandle::loopback();
        assert!(handle.is_open());
        assert_eq!(handle.kind(), TransportKind::Loopback);

        handle.send(b"show version\n").await.unwrap();
        assert_eq!(peer.drain_written(), "show version\n");

        peer.tx.send(b"Router#".to_vec()).await.unwrap();
        assert_eq!(handle.try_recv().unwrap(), Some(b"Router#".to_vec()));
        assert_eq!(handle.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (mut handle, _peer) = TransportHandle::loopback();
        handle.close();
        handle.close();
        assert!(!handle.is_open());
    }
}
