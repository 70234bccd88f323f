//! Async facade over a registry
//!
//! Every operation that can touch the native library runs on the blocking
//! pool. There are no timeouts or retries here: a call either completes or
//! fails with a classified error.

use std::sync::Arc;

use crate::error::{RasterError, Result};
use crate::native::PdfBackend;
use crate::raster::{self, encode_png, RenderRequest, RenderResult};
use crate::registry::{PageSize, Registry, RegistryStats};

/// A render encoded as PNG
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

pub struct RenderService<B: PdfBackend> {
    registry: Arc<Registry<B>>,
    max_pixels: u64,
}

impl<B: PdfBackend> Clone for RenderService<B> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            max_pixels: self.max_pixels,
        }
    }
}

impl<B: PdfBackend> RenderService<B> {
    pub fn new(backend: Arc<B>, max_pixels: u64) -> Self {
        Self {
            registry: Arc::new(Registry::new(backend)),
            max_pixels,
        }
    }

    pub fn registry(&self) -> &Registry<B> {
        &self.registry
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Close everything, used on shutdown
    pub async fn close_all(&self) -> Result<usize> {
        self.blocking(|registry| Ok(registry.close_all())).await
    }

    pub async fn open_document(&self, path: String) -> Result<i64> {
        self.blocking(move |registry| registry.open_document(&path)).await
    }

    pub async fn close_document(&self, handle: i64) -> Result<i64> {
        self.blocking(move |registry| registry.close_document(handle)).await
    }

    pub async fn open_page(&self, handle: i64, page: i64) -> Result<i64> {
        self.blocking(move |registry| registry.open_page(handle, page)).await
    }

    pub async fn close_page(&self, handle: i64, page: i64) -> Result<i64> {
        self.blocking(move |registry| registry.close_page(handle, page)).await
    }

    pub async fn page_count(&self, handle: i64) -> Result<usize> {
        self.registry.page_count(handle)
    }

    pub async fn page_size(&self, handle: i64, page: i64) -> Result<PageSize> {
        self.registry.page_size(handle, page)
    }

    pub async fn render(
        &self,
        handle: i64,
        page: i64,
        request: RenderRequest,
    ) -> Result<RenderResult> {
        let max_pixels = self.max_pixels;
        self.blocking(move |registry| raster::render(registry, handle, page, &request, max_pixels))
            .await
    }

    /// Render and encode in one blocking task
    pub async fn render_png(
        &self,
        handle: i64,
        page: i64,
        request: RenderRequest,
    ) -> Result<EncodedPage> {
        let max_pixels = self.max_pixels;
        self.blocking(move |registry| {
            let result = raster::render(registry, handle, page, &request, max_pixels)?;
            encode(&result)
        })
        .await
    }

    /// Page count of a file without keeping it open
    pub async fn page_count_of(&self, path: String) -> Result<usize> {
        self.blocking(move |registry| {
            one_shot(registry, &path, |handle| registry.page_count(handle))
        })
        .await
    }

    /// Size of one page of a file without keeping it open
    pub async fn page_size_of(&self, path: String, page: i64) -> Result<PageSize> {
        self.blocking(move |registry| {
            one_shot(registry, &path, |handle| {
                registry.open_page(handle, page)?;
                registry.page_size(handle, page)
            })
        })
        .await
    }

    /// Render a crop of a file without keeping it open
    pub async fn render_file(
        &self,
        path: String,
        page: i64,
        request: RenderRequest,
    ) -> Result<RenderResult> {
        let max_pixels = self.max_pixels;
        self.blocking(move |registry| {
            one_shot(registry, &path, |handle| {
                registry.open_page(handle, page)?;
                raster::render(registry, handle, page, &request, max_pixels)
            })
        })
        .await
    }

    pub async fn render_file_png(
        &self,
        path: String,
        page: i64,
        request: RenderRequest,
    ) -> Result<EncodedPage> {
        let result = self.render_file(path, page, request).await?;
        tokio::task::spawn_blocking(move || encode(&result))
            .await
            .map_err(|e| RasterError::Task(format!("Task join error: {}", e)))?
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Registry<B>) -> Result<T> + Send + 'static,
    {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || f(&registry))
            .await
            .map_err(|e| RasterError::Task(format!("Task join error: {}", e)))?
    }
}

fn encode(result: &RenderResult) -> Result<EncodedPage> {
    Ok(EncodedPage {
        width: result.width,
        height: result.height,
        png: encode_png(result)?,
    })
}

/// Open `path`, run `op`, and close again whatever `op` returned
fn one_shot<B, T>(
    registry: &Registry<B>,
    path: &str,
    op: impl FnOnce(i64) -> Result<T>,
) -> Result<T>
where
    B: PdfBackend,
{
    let handle = registry.open_document(path)?;
    let result = op(handle);
    registry.close_document(handle)?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::geometry::CropRect;
    use crate::native::memory::MemoryBackend;

    const LIMIT: u64 = 8192 * 8192;

    fn service() -> (RenderService<MemoryBackend>, Arc<crate::native::memory::Counters>) {
        let backend = MemoryBackend::new().with_document("/docs/three.pdf", 3);
        let counters = backend.counters();
        (RenderService::new(Arc::new(backend), LIMIT), counters)
    }

    #[tokio::test]
    async fn test_end_to_end_lifecycle() {
        let (service, counters) = service();

        let handle = service
            .open_document("/docs/three.pdf".to_string())
            .await
            .unwrap();
        assert_eq!(service.page_count(handle).await.unwrap(), 3);
        assert_eq!(service.open_page(handle, 0).await.unwrap(), 0);

        let request = RenderRequest::new(CropRect::new(0, 0, 200, 300)).with_scale(2.0);
        let result = service.render(handle, 0, request).await.unwrap();
        assert_eq!((result.width, result.height), (400, 600));
        assert_eq!(result.pixels.len(), 400 * 600 * 4);

        assert_eq!(service.close_page(handle, 0).await.unwrap(), 0);
        assert_eq!(service.close_document(handle).await.unwrap(), handle);

        let err = service.page_count(handle).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotOpen);
        assert!(counters.balanced());
    }

    #[tokio::test]
    async fn test_render_png() {
        let (service, _) = service();
        let handle = service
            .open_document("/docs/three.pdf".to_string())
            .await
            .unwrap();
        service.open_page(handle, 1).await.unwrap();

        let request = RenderRequest::new(CropRect::new(0, 0, 10, 20));
        let encoded = service.render_png(handle, 1, request).await.unwrap();
        assert_eq!((encoded.width, encoded.height), (10, 20));
        assert_eq!(&encoded.png[1..4], b"PNG");
    }

    #[tokio::test]
    async fn test_one_shot_variants_close_after_themselves() {
        let (service, counters) = service();
        let path = "/docs/three.pdf".to_string();

        assert_eq!(service.page_count_of(path.clone()).await.unwrap(), 3);

        let size = service.page_size_of(path.clone(), 2).await.unwrap();
        assert_eq!(
            size,
            PageSize {
                width: 612,
                height: 792
            }
        );

        let request = RenderRequest::new(CropRect::new(0, 0, 30, 30)).with_scale(0.5);
        let result = service.render_file(path.clone(), 0, request).await.unwrap();
        assert_eq!((result.width, result.height), (15, 15));

        assert_eq!(service.stats(), RegistryStats::default());
        assert!(counters.balanced());
    }

    #[tokio::test]
    async fn test_one_shot_closes_on_failure() {
        let (service, counters) = service();

        let err = service
            .page_size_of("/docs/three.pdf".to_string(), 7)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PageOpenError);

        let err = service
            .page_count_of("/docs/nowhere.pdf".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OpenError);

        assert_eq!(service.stats(), RegistryStats::default());
        assert!(counters.balanced());
    }

    #[tokio::test]
    async fn test_close_all() {
        let (service, counters) = service();
        for _ in 0..3 {
            let handle = service
                .open_document("/docs/three.pdf".to_string())
                .await
                .unwrap();
            service.open_page(handle, 0).await.unwrap();
        }

        assert_eq!(service.close_all().await.unwrap(), 3);
        assert!(counters.balanced());
    }
}
