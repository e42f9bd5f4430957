use serde::{Deserialize, Serialize};

/// API error payload
#[derive(Serialize)]
pub struct ApiError {
    pub message: String,
}

/// Query parameters for `GET /start`.
#[derive(Deserialize)]
pub struct StartQuery {
    /// Description of the adapter to capture on.
    pub a: String,
}
