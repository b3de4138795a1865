//! Remote-control listener (control thread)
//!
//! Receives OSC over UDP and forwards validated control messages into the
//! block processor's queue. The socket follows the store: it is closed while
//! remote control is disabled and rebound when the port changes.

use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use groove_core::{ControlError, ControlMessage, ControlValue, ParameterAddress, ParameterStore};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RemoteConfig;
use crate::osc::{self, OscArg, OscMessage};
use crate::queue::ControlSender;

/// Wait between checks while remote control is disabled
const IDLE_WAIT: Duration = Duration::from_millis(100);
/// Wait before retrying a failed bind
const RETRY_WAIT: Duration = Duration::from_secs(1);
const MAX_DATAGRAM: usize = 65_536;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Failed to spawn listener thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Listener thread panicked")]
    Panicked,
}

/// Counters for one listener run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub datagrams: u64,
    pub accepted: u64,
    pub malformed: u64,
    pub dropped: u64,
}

pub struct RemoteControlListener {
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<ListenerStats>>,
}

impl RemoteControlListener {
    pub fn spawn(store: Arc<ParameterStore>, sender: ControlSender, config: RemoteConfig) -> Result<Self, RemoteError> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let thread = thread::Builder::new()
            .name("groove-remote".into())
            .spawn(move || run(store, sender, config, shutdown_rx))?;

        info!("Remote control listener started");
        Ok(Self {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the thread and collect its counters
    pub fn stop(mut self) -> Result<ListenerStats, RemoteError> {
        self.shutdown_and_join()
    }

    fn shutdown_and_join(&mut self) -> Result<ListenerStats, RemoteError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.try_send(());
        }
        let Some(thread) = self.thread.take() else {
            return Ok(ListenerStats::default());
        };
        let stats = thread.join().map_err(|_| RemoteError::Panicked)?;
        info!(?stats, "Remote control listener stopped");
        Ok(stats)
    }
}

impl Drop for RemoteControlListener {
    fn drop(&mut self) {
        let _ = self.shutdown_and_join();
    }
}

/// True once the owner asked us to stop (or went away)
fn wait_for_shutdown(shutdown: &Receiver<()>, timeout: Duration) -> bool {
    !matches!(shutdown.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
}

fn bind(config: &RemoteConfig, port: u16) -> std::io::Result<UdpSocket> {
    let socket = UdpSocket::bind((config.bind_address.as_str(), port))?;
    socket.set_read_timeout(Some(Duration::from_millis(config.poll_interval_ms.max(1))))?;
    Ok(socket)
}

fn run(store: Arc<ParameterStore>, mut sender: ControlSender, config: RemoteConfig, shutdown: Receiver<()>) -> ListenerStats {
    let mut stats = ListenerStats::default();
    let mut socket: Option<(UdpSocket, u16)> = None;
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        match shutdown.try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(()) | Err(TryRecvError::Disconnected) => break,
        }

        if !store.remote_enabled() {
            if socket.take().is_some() {
                info!("Remote control disabled, socket closed");
            }
            if wait_for_shutdown(&shutdown, IDLE_WAIT) {
                break;
            }
            continue;
        }

        let port = store.remote_port();
        if socket.as_ref().map(|(_, bound)| *bound) != Some(port) {
            socket = None;
            match bind(&config, port) {
                Ok(s) => {
                    info!(address = %config.bind_address, port, "Remote control listening");
                    socket = Some((s, port));
                }
                Err(err) => {
                    warn!(%err, port, "Remote control bind failed, retrying");
                    if wait_for_shutdown(&shutdown, RETRY_WAIT) {
                        break;
                    }
                    continue;
                }
            }
        }

        let Some((sock, _)) = socket.as_ref() else { continue };
        match sock.recv_from(&mut buf) {
            Ok((len, from)) => {
                debug!(%from, len, "Remote datagram");
                handle_datagram(&buf[..len], &mut sender, &mut stats);
            }
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(err) => {
                warn!(%err, "Remote control receive failed, rebinding");
                socket = None;
            }
        }
    }

    stats
}

/// Decode one datagram and queue every valid message it carries
pub(crate) fn handle_datagram(bytes: &[u8], sender: &mut ControlSender, stats: &mut ListenerStats) {
    stats.datagrams += 1;

    let messages = match osc::decode_packet(bytes) {
        Ok(messages) => messages,
        Err(err) => {
            debug!(%err, "Malformed OSC packet");
            stats.malformed += 1;
            return;
        }
    };

    for message in &messages {
        let control = match control_message_from_osc(message) {
            Ok(control) => control,
            Err(err) => {
                debug!(%err, "Rejected remote message");
                stats.malformed += 1;
                continue;
            }
        };
        match sender.enqueue(control) {
            Ok(()) => stats.accepted += 1,
            Err(err) => {
                warn!(%err, "Control queue full");
                stats.dropped += 1;
            }
        }
    }
}

/// Map an OSC message onto a validated control message. Only the first
/// argument is used.
pub fn control_message_from_osc(message: &OscMessage) -> Result<ControlMessage, ControlError> {
    let address: ParameterAddress = message.address.parse()?;
    let value = match message.args.first() {
        Some(OscArg::Int(v)) => ControlValue::Int(*v),
        Some(OscArg::Float(v)) => ControlValue::Real(*v),
        Some(OscArg::Double(v)) => ControlValue::Real(*v as f32),
        Some(OscArg::Long(v)) => ControlValue::Int((*v).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32),
        Some(OscArg::Bool(v)) => ControlValue::Bool(*v),
        Some(OscArg::Str(_)) | Some(OscArg::Nil) | None => {
            return Err(ControlError::MissingValue(address.path()));
        }
    };
    ControlMessage::checked(address, value)
}
