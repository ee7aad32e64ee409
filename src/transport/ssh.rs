//! SSH transport built on russh.
//!
//! Opens an authenticated client, requests a PTY-backed shell channel with
//! the configured terminal geometry, then hands both off to an I/O task
//! that bridges the shell to the engine's byte channels.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg, Disconnect};
use tokio::sync::{mpsc, oneshot};

use super::config::{AuthMethod, ConnectConfig, HostKeyVerification};
use super::{CHANNEL_CAPACITY, TransportHandle};
use crate::error::{Result, TransportError};

pub(super) async fn connect(config: &ConnectConfig) -> Result<TransportHandle> {
    let ssh_config = Arc::new(client::Config {
        inactivity_timeout: Some(config.timing.blocking_timeout),
        keepalive_interval: config.timing.keepalive_interval,
        ..Default::default()
    });

    let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));
    let handler = VerifyingHandler {
        host: config.host.clone(),
        port: config.port,
        verification: config.host_key_verification.clone(),
        known_hosts_path: config.known_hosts_path.clone(),
        host_key_error: host_key_error.clone(),
    };

    let target = config.target();
    let mut session = tokio::time::timeout(
        config.timing.timeout,
        client::connect(ssh_config, (config.host.as_str(), config.port), handler),
    )
    .await
    .map_err(|_| TransportError::ConnectTimeout {
        target: target.clone(),
        timeout: config.timing.timeout,
    })?
    .map_err(|e| {
        // Prefer the detailed host-key error captured by the handler over
        // the generic russh::Error::UnknownKey.
        if let Some(hk_err) = host_key_error.lock().unwrap().take() {
            hk_err
        } else {
            TransportError::Ssh(e)
        }
    })?;

    // From here on, any setup failure must release the client before the
    // error propagates - no partial handle escapes to the caller.
    if let Err(e) = authenticate(&mut session, config).await {
        release(&session).await;
        return Err(e.into());
    }

    let channel = match open_shell(&session, config).await {
        Ok(channel) => channel,
        Err(e) => {
            release(&session).await;
            return Err(e.into());
        }
    };
    debug!("{target} shell channel ready");

    Ok(spawn_io_task(target, session, channel))
}

async fn authenticate(
    session: &mut Handle<VerifyingHandler>,
    config: &ConnectConfig,
) -> std::result::Result<(), TransportError> {
    let success = match &config.auth {
        AuthMethod::None => session
            .authenticate_none(&config.username)
            .await?
            .success(),
        AuthMethod::Password(password) => session
            .authenticate_password(&config.username, password)
            .await?
            .success(),
        AuthMethod::PrivateKey { path, passphrase } => {
            let key = load_secret_key(path, passphrase.as_deref())
                .map_err(|e| TransportError::Key(e.to_string()))?;
            let hash_alg = session.best_supported_rsa_hash().await?.flatten();
            session
                .authenticate_publickey(
                    &config.username,
                    PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                )
                .await?
                .success()
        }
    };

    if !success {
        return Err(TransportError::AuthFailed {
            user: config.username.clone(),
            target: config.target(),
        });
    }
    Ok(())
}

async fn open_shell(
    session: &Handle<VerifyingHandler>,
    config: &ConnectConfig,
) -> std::result::Result<Channel<Msg>, TransportError> {
    let channel = session.channel_open_session().await?;
    channel
        .request_pty(
            false,
            "xterm",
            config.terminal_width,
            config.terminal_height,
            0,
            0,
            &[],
        )
        .await?;
    channel.request_shell(false).await?;
    Ok(channel)
}

async fn release(session: &Handle<VerifyingHandler>) {
    if let Err(e) = session
        .disconnect(Disconnect::ByApplication, "", "en")
        .await
    {
        debug!("error releasing ssh client after failed setup: {e}");
    }
}

fn spawn_io_task(
    target: String,
    session: Handle<VerifyingHandler>,
    mut channel: Channel<Msg>,
) -> TransportHandle {
    let (to_device, mut to_device_rx) = mpsc::channel::<Vec<u8>>(CHANNEL_CAPACITY);
    let (from_device_tx, from_device) = mpsc::channel::<Vec<u8>>(CHANNEL_CAPACITY);
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let alive = Arc::new(AtomicBool::new(true));
    let task_alive = alive.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    let _ = channel.eof().await;
                    let _ = session
                        .disconnect(Disconnect::ByApplication, "", "en")
                        .await;
                    break;
                }
                data = to_device_rx.recv() => {
                    match data {
                        Some(data) => {
                            if let Err(e) = channel.data(&data[..]).await {
                                debug!("{target} shell write failed: {e:?}");
                                break;
                            }
                        }
                        None => break,
                    }
                }
                msg = channel.wait() => {
                    match msg {
                        Some(ChannelMsg::Data { ref data }) => {
                            if from_device_tx.send(data.to_vec()).await.is_err() {
                                break;
                            }
                        }
                        Some(ChannelMsg::ExitStatus { exit_status }) => {
                            debug!("{target} shell exited with status {exit_status}");
                            let _ = channel.eof().await;
                            break;
                        }
                        Some(ChannelMsg::Eof) | None => {
                            debug!("{target} shell closed");
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
        task_alive.store(false, Ordering::Release);
        debug!("{target} ssh I/O task ended");
    });

    TransportHandle::new(
        super::TransportKind::Ssh,
        to_device,
        from_device,
        shutdown_tx,
        alive,
    )
}

/// russh client handler enforcing the host key verification policy.
struct VerifyingHandler {
    host: String,
    port: u16,
    verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host-key error for connect() to surface instead of the
    /// generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl VerifyingHandler {
    /// Check the host key against known_hosts.
    ///
    /// `Ok(true)` when matched, `Ok(false)` when the host is unknown,
    /// `Err(HostKeyChanged)` when the recorded key differs.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };
        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) {
        *self.host_key_error.lock().unwrap() = Some(error);
    }
}

impl client::Handler for VerifyingHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("failed to save host key for {}:{}: {}", self.host, self.port, e);
                    }
                    Ok(true)
                }
                Err(e) => {
                    self.reject(e);
                    Ok(false)
                }
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    self.reject(TransportError::HostKeyUnknown {
                        host: self.host.clone(),
                        port: self.port,
                    });
                    Ok(false)
                }
                Err(e) => {
                    self.reject(e);
                    Ok(false)
                }
            },
        }
    }
}
