use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

/// Query parameter appended by the cache-busting loader
pub const CACHE_BUST_PARAM: &str = "nocache";

/// Source of module bytes. In the page this is `window.fetch`, in tests a map.
#[async_trait(?Send)]
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// `path` with `nocache=<nonce>` appended, respecting an existing query string
pub fn cache_busted_url(path: &str, nonce: u32) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", path, separator, CACHE_BUST_PARAM, nonce)
}

/// Random nonce from the platform RNG (`crypto.getRandomValues` in the browser)
pub fn random_nonce() -> Result<u32> {
    let mut bytes = [0u8; 4];
    getrandom::getrandom(&mut bytes).map_err(|err| anyhow!("no random source : {}", err))?;
    Ok(u32::from_le_bytes(bytes))
}

/// Fetches module bytes, optionally defeating the HTTP cache.
///
/// No retries: a failed fetch comes back as an error for the caller to report.
pub struct ModuleLoader<F> {
    fetcher: F,
    cache_bust: bool,
}

impl<F: Fetch> ModuleLoader<F> {
    pub fn new(fetcher: F) -> Self {
        ModuleLoader {
            fetcher,
            cache_bust: false,
        }
    }

    pub fn cache_busting(mut self, enabled: bool) -> Self {
        self.cache_bust = enabled;
        self
    }

    pub fn url_for(&self, path: &str) -> Result<String> {
        if self.cache_bust {
            Ok(cache_busted_url(path, random_nonce()?))
        } else {
            Ok(path.to_string())
        }
    }

    pub async fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url_for(path)?;
        let bytes = self
            .fetcher
            .fetch(&url)
            .await
            .with_context(|| format!("Failed to fetch module from : {}", url))?;
        log::debug!("fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

// ==================== Browser ====================
#[cfg(target_arch = "wasm32")]
pub use self::web::{instantiate, BrowserFetch};

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{Fetch, ModuleLoader};
    use crate::browser;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use js_sys::{Object, Reflect, WebAssembly};
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    pub struct BrowserFetch;

    #[async_trait(?Send)]
    impl Fetch for BrowserFetch {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            browser::fetch_bytes(url).await
        }
    }

    /// `WebAssembly.instantiate(bytes, imports)`, unwrapped to the instance
    pub async fn instantiate(bytes: &[u8], imports: &Object) -> Result<WebAssembly::Instance> {
        let result = JsFuture::from(WebAssembly::instantiate_buffer(bytes, imports))
            .await
            .map_err(|err| anyhow!("Could not instantiate module : {:#?}", err))?;
        Reflect::get(&result, &JsValue::from_str("instance"))
            .map_err(|err| anyhow!("No instance in instantiate result : {:#?}", err))?
            .dyn_into::<WebAssembly::Instance>()
            .map_err(|element| anyhow!("Error converting {:#?} to WebAssembly.Instance", element))
    }

    impl ModuleLoader<BrowserFetch> {
        /// Fetch then instantiate against `imports`
        pub async fn load(&self, path: &str, imports: &Object) -> Result<WebAssembly::Instance> {
            let bytes = self.load_bytes(path).await?;
            instantiate(&bytes, imports).await
        }
    }
}
