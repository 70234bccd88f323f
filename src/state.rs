//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::native::PdfBackend;
use crate::service::RenderService;

/// Shared application state
pub struct AppState<B: PdfBackend> {
    inner: Arc<AppStateInner<B>>,
}

struct AppStateInner<B: PdfBackend> {
    config: Config,
    service: RenderService<B>,
}

impl<B: PdfBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: PdfBackend> AppState<B> {
    /// Create the state around an already bound backend
    pub fn new(config: Config, backend: Arc<B>) -> Self {
        let service = RenderService::new(backend, config.render.max_pixels);
        Self {
            inner: Arc::new(AppStateInner { config, service }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the render service
    pub fn service(&self) -> &RenderService<B> {
        &self.inner.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::geometry::CropRect;
    use crate::native::memory::MemoryBackend;
    use crate::raster::RenderRequest;

    #[tokio::test]
    async fn test_state_shares_config_and_service() {
        let mut config = Config::default();
        config.render.max_pixels = 100;
        let backend = MemoryBackend::new().with_document("/docs/a.pdf", 1);
        let state = AppState::new(config, Arc::new(backend));

        let clone = state.clone();
        assert_eq!(clone.config().render.max_pixels, 100);

        // The configured limit reaches the render path
        let service = clone.service();
        let handle = service.open_document("/docs/a.pdf".to_string()).await.unwrap();
        state.service().open_page(handle, 0).await.unwrap();

        let request = RenderRequest::new(CropRect::new(0, 0, 20, 20));
        let err = state.service().render(handle, 0, request).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadArguments);
    }
}
