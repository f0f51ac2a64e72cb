use service::Services;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub cookie_name: String,
}

impl AppState {
    pub fn new(services: Services, cookie_name: impl Into<String>) -> Self {
        Self { services, cookie_name: cookie_name.into() }
    }
}
