use crate::error::ConnError;
use crate::store::{StoreEndpoint, StoreSide, StoreTransport, TransportFactory};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub(super) enum ConnectionMessage {
    /// Connect to `endpoint`, reusing the current transport when it targets the same endpoint.
    Connect(StoreEndpoint, RpcReplyPort<Result<(), ConnError>>),

    /// Current transport, present only while connected.
    Transport(RpcReplyPort<Option<Arc<dyn StoreTransport>>>),

    /// A caller saw a transport error; re-check and drop the connected flag if it fails.
    /// Replies with the connected state after the check.
    ReportFailure(RpcReplyPort<bool>),
}

pub(super) struct ConnectionState {
    side: StoreSide,
    factory: Arc<dyn TransportFactory>,
    transport: Option<Arc<dyn StoreTransport>>,
    connected: bool,
}

pub(super) struct ConnectionActor;

#[ractor::async_trait]
impl Actor for ConnectionActor {
    type Msg = ConnectionMessage;
    type State = ConnectionState;
    type Arguments = (StoreSide, Arc<dyn TransportFactory>);

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        (side, factory): Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        debug!(%side, "ConnectionActor started");
        Ok(ConnectionState {
            side,
            factory,
            transport: None,
            connected: false,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            ConnectionMessage::Connect(endpoint, reply) => {
                let result = self.handle_connect(state, endpoint).await;
                let _ = reply.send(result);
            }

            ConnectionMessage::Transport(reply) => {
                let transport = if state.connected {
                    state.transport.clone()
                } else {
                    None
                };
                let _ = reply.send(transport);
            }

            ConnectionMessage::ReportFailure(reply) => {
                self.handle_report_failure(state).await;
                let _ = reply.send(state.connected);
            }
        }
        Ok(())
    }
}

impl ConnectionActor {
    async fn handle_connect(
        &self,
        state: &mut ConnectionState,
        endpoint: StoreEndpoint,
    ) -> Result<(), ConnError> {
        let side = state.side;

        let reusable = state
            .transport
            .as_ref()
            .filter(|t| t.endpoint() == &endpoint)
            .cloned();

        let transport = match reusable {
            Some(existing) => existing,
            None => {
                info!(%side, url = %endpoint.base_url, "Establishing store connection");
                match state.factory.build(&endpoint) {
                    Ok(built) => built,
                    Err(e) => {
                        warn!(%side, error = %e, "Building store transport failed");
                        state.connected = false;
                        return Err(ConnError::unavailable(side, &e));
                    }
                }
            }
        };

        match transport.list_databases().await {
            Ok(dbs) => {
                if !state.connected {
                    info!(%side, databases = dbs.len(), "Store connection established");
                }
                state.transport = Some(transport);
                state.connected = true;
                Ok(())
            }
            Err(e) => {
                warn!(%side, error = %e, "Store liveness check failed");
                state.transport = Some(transport);
                state.connected = false;
                Err(ConnError::unavailable(side, &e))
            }
        }
    }

    async fn handle_report_failure(&self, state: &mut ConnectionState) {
        let Some(transport) = state.transport.as_ref() else {
            state.connected = false;
            return;
        };
        if !state.connected {
            return;
        }

        if let Err(e) = transport.list_databases().await {
            warn!(side = %state.side, error = %e, "Store connection lost");
            state.connected = false;
        }
    }
}
