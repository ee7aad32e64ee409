//! Session behavior against a scripted in-process device.
//!
//! A loopback transport plays the remote device: a spawned task reads
//! the lines the session writes and answers with canned byte chunks,
//! exercising prompt discovery, command execution, mode control, and
//! teardown without a network.

use std::time::Duration;

use scrapline::error::{ChannelError, DriverError, Error};
use scrapline::transport::{
    AuthMethod, ConnectConfig, HostKeyVerification, LoopbackPeer, TransportHandle, TransportKind,
};
use scrapline::{Connection, DeviceMode, DialectRegistry, TimingProfile};

fn fast_timing() -> TimingProfile {
    TimingProfile::default()
        .with_loop_delay(Duration::from_millis(2))
        .with_max_loops(30)
}

fn loopback_config(secret: Option<&str>) -> ConnectConfig {
    ConnectConfig {
        kind: TransportKind::Loopback,
        host: "device".to_string(),
        port: 0,
        username: "admin".to_string(),
        auth: AuthMethod::None,
        secret: secret.map(str::to_string),
        timing: fast_timing(),
        terminal_width: 511,
        terminal_height: 24,
        host_key_verification: HostKeyVerification::Disabled,
        known_hosts_path: None,
        serial: None,
    }
}

fn attach(dialect: &str, secret: Option<&str>) -> (Connection, LoopbackPeer) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (transport, peer) = TransportHandle::loopback();
    let dialect = DialectRegistry::lookup(dialect).unwrap();
    let session = Connection::attach(transport, dialect, loopback_config(secret));
    (session, peer)
}

/// Drive the device side: for each full line the session writes, the
/// responder decides what bytes come back. A blank line is the prompt
/// probe.
fn spawn_device<F>(mut peer: LoopbackPeer, mut respond: F)
where
    F: FnMut(&str) -> Vec<Vec<u8>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut pending = String::new();
        while let Some(chunk) = peer.rx.recv().await {
            pending.push_str(&String::from_utf8_lossy(&chunk));
            while let Some(pos) = pending.find('\n') {
                let line = pending[..pos].trim().to_string();
                pending.drain(..=pos);
                for reply in respond(&line) {
                    if peer.tx.send(reply).await.is_err() {
                        return;
                    }
                }
            }
        }
    });
}

#[tokio::test]
async fn find_prompt_discovers_router_prompt() {
    let (mut session, peer) = attach("generic", None);
    spawn_device(peer, |line| {
        if line.is_empty() {
            vec![b"\r\nRouter#".to_vec()]
        } else {
            vec![]
        }
    });

    let prompt = session.find_prompt().await.unwrap();
    assert_eq!(prompt, "Router#");
    assert_eq!(session.base_prompt(), "Router#");
    assert_eq!(session.mode(), DeviceMode::Enable);
    session.disconnect().await;
}

#[tokio::test]
async fn find_prompt_survives_blank_reads_before_the_prompt() {
    let (transport, peer) = TransportHandle::loopback();
    let mut config = loopback_config(None);
    config.timing = fast_timing().with_max_loops(200);
    let mut session = Connection::attach(
        transport,
        DialectRegistry::lookup("generic").unwrap(),
        config,
    );

    // The device answers the first ten probes with bare newlines and
    // only then shows its prompt; blank reads must not exhaust the
    // discovery budget.
    let mut probes = 0u32;
    spawn_device(peer, move |line| {
        if line.is_empty() {
            probes += 1;
            if probes <= 10 {
                vec![b"\r\n".to_vec()]
            } else {
                vec![b"\r\nRouter#".to_vec()]
            }
        } else {
            vec![]
        }
    });

    let prompt = session.find_prompt().await.unwrap();
    assert_eq!(prompt, "Router#");
    assert_eq!(session.mode(), DeviceMode::Enable);
    session.disconnect().await;
}

#[tokio::test]
async fn find_prompt_fails_on_silent_device() {
    let (mut session, _peer) = attach("generic", None);

    let err = session.find_prompt().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Channel(ChannelError::PromptNotFound)
    ));
    session.disconnect().await;
}

#[tokio::test]
async fn send_command_sanitizes_output_split_across_reads() {
    let (mut session, peer) = attach("ericsson_ipos", None);
    spawn_device(peer, |line| match line {
        "" => vec![b"\r\nRouter#".to_vec()],
        "show version" => vec![
            // echo, body, and prompt arrive as three separate reads
            b"show version\r\n".to_vec(),
            b"Ericsson IPOS version 20.10\r\n".to_vec(),
            b"Router#".to_vec(),
        ],
        _ => vec![b"Router#".to_vec()],
    });

    let response = session.send_command("show version").await.unwrap();
    assert_eq!(response.result, "Ericsson IPOS version 20.10");
    assert_eq!(response.prompt, "Router#");
    assert!(response.is_success());
    assert!(response.raw_result.contains("show version"));
    session.disconnect().await;
}

#[tokio::test]
async fn send_command_times_out_when_pattern_never_appears() {
    let (mut session, peer) = attach("generic", None);
    spawn_device(peer, |line| match line {
        "" => vec![b"\r\nRouter#".to_vec()],
        // output trickles in but the prompt never returns
        _ => vec![b"--More-- endless output\r\n".to_vec()],
    });

    let err = session.send_command("show tech-support").await.unwrap_err();
    match err {
        Error::Channel(ChannelError::PatternTimeout { loops, .. }) => {
            assert_eq!(loops, 30);
        }
        other => panic!("expected PatternTimeout, got {other}"),
    }
    // The session itself survives a per-command timeout.
    assert!(session.is_open());
    let prompt = session.find_prompt().await.unwrap();
    assert_eq!(prompt, "Router#");
    session.disconnect().await;
}

#[tokio::test]
async fn failure_markers_produce_failed_responses() {
    let (mut session, peer) = attach("ericsson_ipos", None);
    spawn_device(peer, |line| match line {
        "" => vec![b"\r\nRouter#".to_vec()],
        "show bogus" => vec![
            b"show bogus\r\n% Invalid input at '^' marker\r\nRouter#".to_vec(),
        ],
        _ => vec![b"Router#".to_vec()],
    });

    let response = session.send_command("show bogus").await.unwrap();
    assert!(!response.is_success());
    assert!(response.failure_message.unwrap().contains("% Invalid input"));
    session.disconnect().await;
}

#[tokio::test]
async fn enable_failure_mentions_the_secret() {
    let (mut session, peer) = attach("generic", Some("wrong-secret"));
    // The device asks for a password but never grants enable mode.
    spawn_device(peer, |line| match line {
        "" => vec![b"\r\nRouter>".to_vec()],
        "enable" => vec![b"Password: ".to_vec()],
        _ => vec![b"\r\nRouter>".to_vec()],
    });

    let err = session.enable().await.unwrap_err();
    match err {
        Error::Driver(DriverError::EnableFailed { message }) => {
            assert!(message.contains("secret"));
        }
        other => panic!("expected EnableFailed, got {other}"),
    }
    assert_eq!(session.mode(), DeviceMode::User);
    session.disconnect().await;
}

#[tokio::test]
async fn enable_succeeds_with_correct_secret() {
    let (mut session, peer) = attach("generic", Some("letmein"));
    let mut enabled = false;
    spawn_device(peer, move |line| match line {
        "" => {
            if enabled {
                vec![b"\r\nRouter#".to_vec()]
            } else {
                vec![b"\r\nRouter>".to_vec()]
            }
        }
        "enable" => vec![b"Password: ".to_vec()],
        "letmein" => {
            enabled = true;
            vec![b"\r\nRouter#".to_vec()]
        }
        _ => vec![b"\r\nRouter#".to_vec()],
    });

    session.enable().await.unwrap();
    assert_eq!(session.mode(), DeviceMode::Enable);
    session.disconnect().await;
}

#[tokio::test]
async fn send_config_set_round_trips_config_mode() {
    let (mut session, peer) = attach("generic", None);
    let mut in_config = false;
    spawn_device(peer, move |line| match line {
        "" => {
            if in_config {
                vec![b"\r\nRouter(config)#".to_vec()]
            } else {
                vec![b"\r\nRouter#".to_vec()]
            }
        }
        "configure terminal" => {
            in_config = true;
            vec![b"configure terminal\r\nRouter(config)#".to_vec()]
        }
        "end" => {
            in_config = false;
            vec![b"end\r\nRouter#".to_vec()]
        }
        other => vec![format!("{other}\r\nRouter(config)#").into_bytes()],
    });

    let output = session
        .send_config_set(&["hostname edge-1", "no logging console"])
        .await
        .unwrap();
    assert!(output.contains("Router(config)#"));
    assert_eq!(session.mode(), DeviceMode::Enable);
    session.disconnect().await;
}

#[tokio::test]
async fn empty_config_set_is_rejected() {
    let (mut session, _peer) = attach("generic", None);

    let err = session.send_config_set(&[]).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Driver(DriverError::InvalidArgument { .. })
    ));
    session.disconnect().await;
}

#[tokio::test]
async fn normalize_commands_off_writes_bytes_verbatim() {
    let (mut session, mut peer) = attach("generic", None);

    session.set_normalize_commands(false);
    let output = session.send_command_timing("show clock").await.unwrap();
    assert_eq!(output, "");
    assert_eq!(peer.drain_written(), "show clock");

    session.set_normalize_commands(true);
    let _ = session.send_command_timing("show clock").await.unwrap();
    assert_eq!(peer.drain_written(), "show clock\n");

    session.disconnect().await;
}

#[tokio::test]
async fn disconnect_is_idempotent_and_clears_the_channel() {
    let (mut session, _peer) = attach("generic", None);
    assert!(session.is_open());

    session.disconnect().await;
    assert!(!session.is_open());
    assert!(!session.is_alive());
    assert_eq!(session.base_prompt(), "");

    // A second disconnect is a no-op, not an error.
    session.disconnect().await;
    assert!(!session.is_open());

    // Commands after teardown report the session as not connected.
    let err = session.send_command("show version").await.unwrap_err();
    assert!(matches!(err, Error::Driver(DriverError::NotConnected)));
}
