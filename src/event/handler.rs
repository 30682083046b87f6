use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

use crate::playback::PlaybackService;
use crate::shared::RoomError;
use crate::websockets::{ConnectionHandle, ConnectionHub};

/// Context every handler receives: the originating connection and the hub
#[derive(Clone)]
pub struct ConnectionContext {
    pub connection: ConnectionHandle,
    pub hub: Arc<ConnectionHub>,
}

impl ConnectionContext {
    pub fn member_id(&self) -> &str {
        self.connection.member_id()
    }

    /// Room the connection is joined to, or `NotAMember`
    pub async fn current_room(&self) -> Result<String, RoomError> {
        self.hub
            .room_of(self.connection.id())
            .await
            .ok_or_else(|| RoomError::not_a_member(self.member_id(), None))
    }
}

/// Context a handler can declare beyond the connection itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Connection,
    RoomStore,
    PropagatesErrors,
}

pub type Payload = serde_json::Value;

type ConnectionFn = Arc<dyn Fn(ConnectionContext, Payload) -> BoxFuture<'static, ()> + Send + Sync>;
type FallibleConnectionFn =
    Arc<dyn Fn(ConnectionContext, Payload) -> BoxFuture<'static, Result<(), RoomError>> + Send + Sync>;
type StoreFn =
    Arc<dyn Fn(ConnectionContext, Arc<PlaybackService>, Payload) -> BoxFuture<'static, ()> + Send + Sync>;
type FallibleStoreFn = Arc<
    dyn Fn(ConnectionContext, Arc<PlaybackService>, Payload) -> BoxFuture<'static, Result<(), RoomError>>
        + Send
        + Sync,
>;

/// A bare handler function tagged with the context it declares.
///
/// The dispatcher supplies exactly that context: the room store only to the
/// store variants, and error-to-client conversion only for the fallible ones.
#[derive(Clone)]
pub enum Handler {
    Connection(ConnectionFn),
    FallibleConnection(FallibleConnectionFn),
    Store(StoreFn),
    FallibleStore(FallibleStoreFn),
}

impl Handler {
    /// Connection and payload only
    pub fn connection<F, Fut>(f: F) -> Self
    where
        F: Fn(ConnectionContext, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Handler::Connection(Arc::new(move |ctx, payload| Box::pin(f(ctx, payload))))
    }

    /// Connection and payload; failures go back to the sender as an error event
    pub fn fallible_connection<F, Fut>(f: F) -> Self
    where
        F: Fn(ConnectionContext, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), RoomError>> + Send + 'static,
    {
        Handler::FallibleConnection(Arc::new(move |ctx, payload| Box::pin(f(ctx, payload))))
    }

    /// Connection, room store (with its playback workflows) and payload
    pub fn store<F, Fut>(f: F) -> Self
    where
        F: Fn(ConnectionContext, Arc<PlaybackService>, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Handler::Store(Arc::new(move |ctx, playback, payload| Box::pin(f(ctx, playback, payload))))
    }

    /// Connection, room store (with its playback workflows) and payload; failures go back to the sender
    pub fn fallible_store<F, Fut>(f: F) -> Self
    where
        F: Fn(ConnectionContext, Arc<PlaybackService>, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), RoomError>> + Send + 'static,
    {
        Handler::FallibleStore(Arc::new(move |ctx, playback, payload| Box::pin(f(ctx, playback, payload))))
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Handler::Connection(_) => &[Capability::Connection],
            Handler::FallibleConnection(_) => &[Capability::Connection, Capability::PropagatesErrors],
            Handler::Store(_) => &[Capability::Connection, Capability::RoomStore],
            Handler::FallibleStore(_) => &[
                Capability::Connection,
                Capability::RoomStore,
                Capability::PropagatesErrors,
            ],
        }
    }

    pub fn propagates_errors(&self) -> bool {
        self.capabilities().contains(&Capability::PropagatesErrors)
    }

    /// Runs the handler with the context it declared.
    /// Infallible handlers always report success.
    pub(super) async fn invoke(
        &self,
        ctx: ConnectionContext,
        playback: &Arc<PlaybackService>,
        payload: Payload,
    ) -> Result<(), RoomError> {
        match self {
            Handler::Connection(f) => {
                f(ctx, payload).await;
                Ok(())
            }
            Handler::FallibleConnection(f) => f(ctx, payload).await,
            Handler::Store(f) => {
                f(ctx, Arc::clone(playback), payload).await;
                Ok(())
            }
            Handler::FallibleStore(f) => f(ctx, Arc::clone(playback), payload).await,
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Handler").field(&self.capabilities()).finish()
    }
}
