//! Shared application state for all routes.

use crate::client::CareClient;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub client: CareClient,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(client: CareClient, config: AppConfig) -> Self {
        AppState { client, config }
    }
}
