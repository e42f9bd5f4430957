use std::net::SocketAddr;
use std::sync::Arc;

use warp::Filter;

use crate::session_management::session_manager::SessionManager;

use super::routes;

/// Web server exposing the agent's control surface.
pub struct WebServer {
    manager: Arc<SessionManager>,
}

impl WebServer {
    /// Create a new WebServer instance
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    /// Start the web server on the given port
    pub async fn start(&self, port: u16) {
        let routes = routes::dashboard_route()
            .or(routes::host_info_route(self.manager.clone()))
            .or(routes::status_route(self.manager.clone()))
            .or(routes::start_route(self.manager.clone()))
            .or(routes::stop_route(self.manager.clone()));

        // Start server (warp 0.4)
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        warp::serve(routes).run(addr).await;
    }
}
