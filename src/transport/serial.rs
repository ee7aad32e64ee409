//! Serial console transport via tokio-serial.
//!
//! Opens the local port with the configured line settings. Like Telnet,
//! any login prompt arrives inline on the byte stream and is handled by
//! the session layer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::BytesMut;
use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio_serial::SerialPortBuilderExt;

use super::config::ConnectConfig;
use super::{CHANNEL_CAPACITY, TransportHandle};
use crate::error::{Result, TransportError};

const READ_BUFFER: usize = 4096;

pub(super) async fn connect(config: &ConnectConfig) -> Result<TransportHandle> {
    let settings = config.serial.as_ref().ok_or_else(|| {
        TransportError::Serial(tokio_serial::Error::new(
            tokio_serial::ErrorKind::InvalidInput,
            "serial transport requires serial settings",
        ))
    })?;

    let mut port = tokio_serial::new(&settings.port, settings.baud_rate)
        .data_bits(settings.data_bits)
        .parity(settings.parity)
        .stop_bits(settings.stop_bits)
        .flow_control(settings.flow_control)
        .open_native_async()
        .map_err(TransportError::Serial)?;

    let target = settings.port.clone();
    debug!("{target} serial port open at {} baud", settings.baud_rate);

    let (to_device, mut to_device_rx) = mpsc::channel::<Vec<u8>>(CHANNEL_CAPACITY);
    let (from_device_tx, from_device) = mpsc::channel::<Vec<u8>>(CHANNEL_CAPACITY);
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let alive = Arc::new(AtomicBool::new(true));
    let task_alive = alive.clone();

    tokio::spawn(async move {
        let mut buf = BytesMut::with_capacity(READ_BUFFER);
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    let _ = port.shutdown().await;
                    break;
                }
                data = to_device_rx.recv() => {
                    match data {
                        Some(data) => {
                            if let Err(e) = port.write_all(&data).await {
                                debug!("{target} serial write failed: {e}");
                                break;
                            }
                        }
                        None => break,
                    }
                }
                read = port.read_buf(&mut buf) => {
                    match read {
                        Ok(0) => {
                            debug!("{target} serial port closed");
                            break;
                        }
                        Ok(_) => {
                            let chunk = buf.split().to_vec();
                            if from_device_tx.send(chunk).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!("{target} serial read failed: {e}");
                            break;
                        }
                    }
                }
            }
        }
        task_alive.store(false, Ordering::Release);
        debug!("{target} serial I/O task ended");
    });

    Ok(TransportHandle::new(
        super::TransportKind::Serial,
        to_device,
        from_device,
        shutdown_tx,
        alive,
    ))
}
