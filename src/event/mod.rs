// Inbound event routing
//
// Binds event tags to handlers and supplies each handler the context it declares.

// Public API - what other modules can use
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use handler::{Capability, ConnectionContext, Handler, Payload};

// Internal modules
mod dispatcher;
mod handler;
