use serde::{Deserialize, Serialize};

/// Claims carried by the bearer token the external identity provider issues.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8,
    pub exp: usize,
}
