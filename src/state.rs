use crate::config::Config;
use crate::services::backend::service::AuthBackend;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn AuthBackend>,
    pub config: Arc<Config>,
}

#[cfg(test)]
impl AppState {
    pub fn for_tests(
        backend: Arc<crate::services::backend::mock_backend::MockBackend>,
        config: Config,
    ) -> Self {
        AppState {
            backend,
            config: Arc::new(config),
        }
    }
}
