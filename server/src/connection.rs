use actix::fut::WrapFuture;
use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio::sync::mpsc::Receiver;
use tokio::sync::oneshot;

use estimation_system::{serde_json, ClientMessage, ConnectionId, RejectReason, ServerMessage};

use crate::connection_tx_storage::ConnectionTx;
use crate::server::ServerTx;

const OUTBOUND_BUFFER: usize = 32;

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        tx: ConnectionTx,
    },
    Disconnect {
        from: ConnectionId,
    },
    ClientMessage {
        from: ConnectionId,
        message: ClientMessage,
    },
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { connection_id: ConnectionId },
    ServerMessage(ServerMessage),
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

enum ConnectionState {
    /// Waiting for the server to assign an id. Messages are held until then.
    Idle(Vec<ClientMessage>),
    Connected(ConnectionId),
}

struct ConnectionActor {
    state: ConnectionState,
    srv_tx: ServerTx,
    stopped_tx: Option<oneshot::Sender<()>>,
}

impl ConnectionActor {
    fn new(srv_tx: ServerTx) -> Self {
        Self {
            state: ConnectionState::Idle(Vec::new()),
            srv_tx,
            stopped_tx: None,
        }
    }

    /// Hands a command to the server, pausing this actor until the server
    /// queue accepts it so commands keep their order.
    fn forward(&self, command: ConnectionCommand, ctx: &mut ws::WebsocketContext<Self>) {
        let srv_tx = self.srv_tx.clone();
        ctx.wait(
            async move {
                if let Err(err) = srv_tx.send(command).await {
                    log::warn!("Server is not running: {}", err);
                }
            }
            .into_actor(self),
        );
    }

    fn dispatch(&mut self, message: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match &mut self.state {
            ConnectionState::Idle(pending) => pending.push(message),
            ConnectionState::Connected(from) => {
                let from = *from;
                self.forward(ConnectionCommand::ClientMessage { from, message }, ctx);
            }
        }
    }

    fn write(&self, message: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(err) => log::warn!("Failed to encode {:?}: {}", message, err),
        }
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(OUTBOUND_BUFFER);
        let (stopped_tx, stopped_rx) = oneshot::channel();
        self.stopped_tx = Some(stopped_tx);

        self.forward(ConnectionCommand::Connect { tx }, ctx);

        let addr = ctx.address().recipient();
        let srv_tx = self.srv_tx.clone();

        actix_web::rt::spawn(async move {
            log::debug!("connection green thread - started");
            relay(rx, stopped_rx, srv_tx, |event| {
                addr.do_send(ConnectionActorMessage(event))
            })
            .await;
            log::debug!("connection green thread - terminated");
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let Some(stopped_tx) = self.stopped_tx.take() {
            let _ = stopped_tx.send(());
        }

        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => {
                    log::debug!("Ingress {:?}", message);
                    self.dispatch(message, ctx);
                }
                Err(err) => {
                    log::warn!("Discarding undecodable frame: {}", err);
                    self.write(&ServerMessage::rejected(None, RejectReason::Malformed), ctx);
                }
            },
            Ok(ws::Message::Binary(bin)) => {
                log::warn!("Discarding binary frame of {} bytes", bin.len());
                self.write(&ServerMessage::rejected(None, RejectReason::Malformed), ctx);
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(err) => {
                log::warn!("Websocket protocol error: {}", err);
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        match msg.0 {
            ConnectionEvent::Connected { connection_id } => {
                let previous =
                    std::mem::replace(&mut self.state, ConnectionState::Connected(connection_id));
                if let ConnectionState::Idle(pending) = previous {
                    for message in pending {
                        self.dispatch(message, ctx);
                    }
                }
            }
            ConnectionEvent::ServerMessage(message) => {
                log::debug!("Egress {:?}", message);
                self.write(&message, ctx);
            }
        }
    }
}

/// Delivers server events to the actor until it stops, then tells the server
/// the connection is gone. The id may still be in flight when the actor stops
/// early, so it is awaited before disconnecting.
async fn relay<F>(
    mut rx: Receiver<ConnectionEvent>,
    mut stopped_rx: oneshot::Receiver<()>,
    srv_tx: ServerTx,
    mut deliver: F,
) where
    F: FnMut(ConnectionEvent),
{
    let mut connection_id = None;
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    if let ConnectionEvent::Connected { connection_id: id } = &event {
                        connection_id = Some(*id);
                    }
                    deliver(event);
                }
                None => return,
            },
            _ = &mut stopped_rx => break,
        }
    }

    let from = match connection_id {
        Some(id) => id,
        None => loop {
            match rx.recv().await {
                Some(ConnectionEvent::Connected { connection_id }) => break connection_id,
                Some(_) => continue,
                None => return,
            }
        },
    };
    if let Err(err) = srv_tx.send(ConnectionCommand::Disconnect { from }).await {
        log::warn!("Server is not running: {}", err);
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
) -> Result<HttpResponse, Error> {
    ws::start(ConnectionActor::new(srv_tx.get_ref().clone()), &req, stream)
}
