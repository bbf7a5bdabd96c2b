//! Shared state handed to every handler.

use std::sync::Arc;

use crate::application::services::{AuthService, LinkService, LinkSettings};
use crate::domain::repositories::LinkRepository;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Wires the services around an already constructed repository.
    pub fn new(repository: Arc<dyn LinkRepository>, settings: LinkSettings, jwt_secret: &str) -> Self {
        let auth_service = AuthService::new(jwt_secret, settings.anonymous_owner_id.clone());

        Self {
            link_service: Arc::new(LinkService::new(repository, settings)),
            auth_service: Arc::new(auth_service),
        }
    }
}
