//! Telnet transport over a plain TCP socket.
//!
//! No option negotiation is performed; network devices that expose Telnet
//! consoles accept a raw byte stream. Login happens inline on the channel
//! after the socket opens, driven by the session layer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::BytesMut;
use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use super::config::ConnectConfig;
use super::{CHANNEL_CAPACITY, TransportHandle};
use crate::error::{Result, TransportError};

const READ_BUFFER: usize = 8192;

pub(super) async fn connect(config: &ConnectConfig) -> Result<TransportHandle> {
    let target = config.target();
    let stream = tokio::time::timeout(
        config.timing.timeout,
        TcpStream::connect((config.host.as_str(), config.port)),
    )
    .await
    .map_err(|_| TransportError::ConnectTimeout {
        target: target.clone(),
        timeout: config.timing.timeout,
    })?
    .map_err(TransportError::Io)?;

    stream.set_nodelay(true).map_err(TransportError::Io)?;
    debug!("{target} telnet socket open");

    let (to_device, mut to_device_rx) = mpsc::channel::<Vec<u8>>(CHANNEL_CAPACITY);
    let (from_device_tx, from_device) = mpsc::channel::<Vec<u8>>(CHANNEL_CAPACITY);
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let alive = Arc::new(AtomicBool::new(true));
    let task_alive = alive.clone();

    tokio::spawn(async move {
        let mut stream = stream;
        let mut buf = BytesMut::with_capacity(READ_BUFFER);
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    let _ = stream.shutdown().await;
                    break;
                }
                data = to_device_rx.recv() => {
                    match data {
                        Some(data) => {
                            if let Err(e) = stream.write_all(&data).await {
                                debug!("{target} telnet write failed: {e}");
                                break;
                            }
                        }
                        None => break,
                    }
                }
                read = stream.read_buf(&mut buf) => {
                    match read {
                        Ok(0) => {
                            debug!("{target} telnet peer closed");
                            break;
                        }
                        Ok(_) => {
                            let chunk = buf.split().to_vec();
                            if from_device_tx.send(chunk).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!("{target} telnet read failed: {e}");
                            break;
                        }
                    }
                }
            }
        }
        task_alive.store(false, Ordering::Release);
        debug!("{target} telnet I/O task ended");
    });

    Ok(TransportHandle::new(
        super::TransportKind::Telnet,
        to_device,
        from_device,
        shutdown_tx,
        alive,
    ))
}
