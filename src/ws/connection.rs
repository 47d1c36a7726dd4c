//! WebSocket connection to the backend.
//!
//! [`Session::open`] dials the backend, marks the engine connected, and
//! spawns the session loop. From then on the loop is the only place the
//! [`DialogEngine`] runs: it interleaves inbound
//! frames with user actions sent through a [`SessionHandle`], so every state
//! change is applied one at a time.

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::Instrument;

use super::endpoint::Endpoint;
use super::messages::{decode_event, encode_command};
use crate::config::ClientConfig;
use crate::domain::{ImageRef, OutboundCommand, SessionId, SessionSnapshot, SessionUpdate, UpdateBus};
use crate::error::ClientError;
use crate::session::{DialogEngine, UserAction};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Message from a [`SessionHandle`] to the session loop.
#[derive(Debug)]
enum Control {
    Action {
        action: UserAction,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Close,
}

/// Cloneable handle for issuing actions and observing the session.
///
/// Handles stop working once the loop ends; actions then fail with
/// [`ClientError::ConnectionClosed`]. Observation keeps working and shows
/// the last state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    control: mpsc::Sender<Control>,
    bus: UpdateBus,
}

impl SessionHandle {
    /// Sends an action to the loop and waits until it has been applied and
    /// its command, if any, written to the socket.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] if the coordinator refused the
    /// action, [`ClientError::WebSocket`] if the command could not be
    /// written (the local state change stays applied and the session
    /// disconnects), or [`ClientError::ConnectionClosed`] if the loop has
    /// ended.
    pub async fn perform(&self, action: UserAction) -> Result<(), ClientError> {
        let (reply, outcome) = oneshot::channel();
        self.control
            .send(Control::Action { action, reply })
            .await
            .map_err(|_| ClientError::ConnectionClosed)?;
        outcome.await.map_err(|_| ClientError::ConnectionClosed)?
    }

    /// Asks a question about the selected image.
    ///
    /// # Errors
    ///
    /// See [`SessionHandle::perform`].
    pub async fn ask(&self, question: impl Into<String>) -> Result<(), ClientError> {
        self.perform(UserAction::Ask(question.into())).await
    }

    /// Requests cancellation of the active stream.
    ///
    /// # Errors
    ///
    /// See [`SessionHandle::perform`].
    pub async fn abort(&self) -> Result<(), ClientError> {
        self.perform(UserAction::Abort).await
    }

    /// Clears the conversation.
    ///
    /// # Errors
    ///
    /// See [`SessionHandle::perform`].
    pub async fn reset(&self) -> Result<(), ClientError> {
        self.perform(UserAction::Reset).await
    }

    /// Send button: aborts while streaming, otherwise asks the draft.
    ///
    /// # Errors
    ///
    /// See [`SessionHandle::perform`].
    pub async fn submit(&self) -> Result<(), ClientError> {
        self.perform(UserAction::Submit).await
    }

    /// Selects the image for the next dialog.
    ///
    /// # Errors
    ///
    /// See [`SessionHandle::perform`].
    pub async fn select_image(&self, image: impl Into<ImageRef>) -> Result<(), ClientError> {
        self.perform(UserAction::SelectImage(image.into())).await
    }

    /// Drops the selected image.
    ///
    /// # Errors
    ///
    /// See [`SessionHandle::perform`].
    pub async fn clear_image(&self) -> Result<(), ClientError> {
        self.perform(UserAction::ClearImage).await
    }

    /// Replaces the pending input text.
    ///
    /// # Errors
    ///
    /// See [`SessionHandle::perform`].
    pub async fn set_draft(&self, text: impl Into<String>) -> Result<(), ClientError> {
        self.perform(UserAction::SetDraft(text.into())).await
    }

    /// Asks the loop to close the socket. Returns immediately.
    pub async fn close(&self) {
        let _ = self.control.send(Control::Close).await;
    }

    /// Subscribes to future updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.bus.subscribe()
    }

    /// Watches the latest snapshot.
    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.bus.watch()
    }

    /// Returns a copy of the latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.bus.snapshot()
    }

    /// Whether the channel to the backend is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.bus.snapshot().connected
    }
}

/// One connection to the backend and the loop that drives it.
#[derive(Debug)]
pub struct Session {
    handle: SessionHandle,
    task: JoinHandle<DialogEngine>,
    endpoint: Endpoint,
    action_capacity: usize,
}

impl Session {
    /// Connects to the configured endpoint with a fresh engine.
    ///
    /// The session is already marked connected when this returns.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::WebSocket`] if the handshake fails.
    pub async fn open(config: &ClientConfig) -> Result<Self, ClientError> {
        let engine = DialogEngine::new(UpdateBus::new(config.update_bus_capacity));
        Self::connect(engine, config.endpoint.clone(), config.action_queue_capacity).await
    }

    async fn connect(
        mut engine: DialogEngine,
        endpoint: Endpoint,
        action_capacity: usize,
    ) -> Result<Self, ClientError> {
        let (mut socket, _response) = tokio_tungstenite::connect_async(endpoint.as_str()).await?;
        let session_id = SessionId::new();
        tracing::info!(%endpoint, %session_id, "connected to backend");

        let span = tracing::info_span!("session", %session_id);
        let reset = span.in_scope(|| engine.connected(session_id));
        if let Some(command) = reset
            && let Err(err) = send_command(&mut socket, &command).await
        {
            tracing::warn!(%err, "failed to send initial reset");
            engine.disconnected();
            return Err(err);
        }

        let (control_tx, control_rx) = mpsc::channel(action_capacity);
        let handle = SessionHandle {
            control: control_tx,
            bus: engine.bus().clone(),
        };
        let task = tokio::spawn(run_connection(socket, engine, control_rx).instrument(span));

        Ok(Self {
            handle,
            task,
            endpoint,
            action_capacity,
        })
    }

    /// Returns a new handle to this session.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// The endpoint this session is connected to.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Closes the socket and returns the engine with its final state.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectionClosed`] if the loop panicked.
    pub async fn close(self) -> Result<DialogEngine, ClientError> {
        self.handle.close().await;
        self.task.await.map_err(|err| {
            tracing::error!(%err, "session loop failed");
            ClientError::ConnectionClosed
        })
    }

    /// Closes this connection (if still open) and opens a new one, keeping
    /// the engine and its observers. The new connection performs the
    /// implicit reset. Handles obtained before reconnecting stop working.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::WebSocket`] if the handshake or the initial
    /// reset fails, or [`ClientError::ConnectionClosed`] if the old loop
    /// panicked.
    pub async fn reconnect(self) -> Result<Self, ClientError> {
        let endpoint = self.endpoint.clone();
        let action_capacity = self.action_capacity;
        let engine = self.close().await?;
        Self::connect(engine, endpoint, action_capacity).await
    }
}

async fn run_connection(
    socket: WsStream,
    mut engine: DialogEngine,
    mut control_rx: mpsc::Receiver<Control>,
) -> DialogEngine {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Frame from the backend
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match decode_event(text.as_str()) {
                        Ok(event) => engine.handle_event(event),
                        Err(err) => tracing::warn!(%err, "dropping undecodable frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::warn!(%err, "websocket read failed");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            // Action from a handle
            control = control_rx.recv() => {
                match control {
                    Some(Control::Action { action, reply }) => {
                        let outcome = perform_and_send(&mut engine, &mut ws_tx, action).await;
                        let write_failed = match &outcome {
                            Err(err @ ClientError::WebSocket(_)) => {
                                tracing::warn!(%err, "websocket write failed");
                                true
                            }
                            _ => false,
                        };
                        let _ = reply.send(outcome);
                        if write_failed {
                            break;
                        }
                    }
                    Some(Control::Close) | None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    engine.disconnected();
    tracing::debug!("session loop finished");
    engine
}

/// Applies `action` and writes its command, if any.
async fn perform_and_send<S>(
    engine: &mut DialogEngine,
    sink: &mut S,
    action: UserAction,
) -> Result<(), ClientError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let Some(command) = engine.perform(action)? else {
        return Ok(());
    };
    send_command(sink, &command).await
}

async fn send_command<S>(sink: &mut S, command: &OutboundCommand) -> Result<(), ClientError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let frame = encode_command(command)?;
    tracing::debug!(command = command.name(), "sending command");
    sink.send(Message::text(frame)).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use futures_util::sink;

    use super::*;
    use crate::error::ActionRejected;

    fn connected_engine() -> DialogEngine {
        let mut engine = DialogEngine::new(UpdateBus::new(16));
        let _ = engine.connected(SessionId::new());
        engine
    }

    #[tokio::test]
    async fn written_command_is_reported_ok() {
        let mut engine = connected_engine();
        let mut sink = sink::drain::<Message>()
            .sink_map_err(|never| -> tungstenite::Error { match never {} });

        let selected = perform_and_send(&mut engine, &mut sink, UserAction::SelectImage("img".into()))
            .await;
        assert!(selected.is_ok());
        let asked = perform_and_send(&mut engine, &mut sink, UserAction::Ask("q".to_string()))
            .await;
        assert!(asked.is_ok());
        assert!(engine.state().dialog().has_pending());
    }

    #[tokio::test]
    async fn failed_write_is_reported_to_the_caller() {
        let mut engine = connected_engine();
        let mut sink = Box::pin(sink::unfold((), |(), _frame: Message| async {
            Err::<(), _>(tungstenite::Error::ConnectionClosed)
        }));

        let selected = perform_and_send(&mut engine, &mut sink, UserAction::SelectImage("img".into()))
            .await;
        assert!(selected.is_ok());

        let asked = perform_and_send(&mut engine, &mut sink, UserAction::Ask("q".to_string()))
            .await;
        assert!(matches!(asked, Err(ClientError::WebSocket(_))));
    }

    #[tokio::test]
    async fn rejected_action_writes_nothing() {
        let mut engine = connected_engine();
        let mut sink = Box::pin(sink::unfold((), |(), _frame: Message| async {
            Err::<(), _>(tungstenite::Error::ConnectionClosed)
        }));

        let asked = perform_and_send(&mut engine, &mut sink, UserAction::Ask(String::new()))
            .await;
        assert!(matches!(
            asked,
            Err(ClientError::Rejected(ActionRejected::EmptyQuestion))
        ));
    }
}
