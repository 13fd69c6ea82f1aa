//! Service container for dependency injection
//!
//! Wires the API client and renderer from settings.

use std::sync::Arc;

use crate::application::Renderer;
use crate::config::Settings;
use crate::infrastructure::http::HttpClient;
use crate::infrastructure::traits::ApiClient;
use crate::infrastructure::InfraResult;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Remote statistics API
    pub api: Arc<dyn ApiClient>,

    /// Tabular output writer
    pub renderer: Renderer,
}

impl ServiceContainer {
    /// Create a new service container with the HTTP client.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let api = HttpClient::new(&settings)?;
        Self::with_deps(settings, Arc::new(api))
    }

    /// Create a service container with a custom API client (for testing).
    pub fn with_deps(settings: Settings, api: Arc<dyn ApiClient>) -> InfraResult<Self> {
        let renderer = Renderer::new(settings.delimiter_byte()?);
        Ok(Self {
            settings: Arc::new(settings),
            api,
            renderer,
        })
    }
}
