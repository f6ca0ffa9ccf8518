use drivegate_graph::ClientFactory;

/// Shared application state.
pub struct AppState {
    /// Handlers create a client (and with it a fresh authenticating
    /// transport) per request.
    pub clients: ClientFactory,
}

impl AppState {
    pub fn new(clients: ClientFactory) -> Self {
        Self { clients }
    }
}
