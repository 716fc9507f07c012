use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use probe_core_types::{ElementHandle, PageId};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::metrics;
use crate::registry::ElementRegistry;

/// Owns the browser process (or remote connection) and its event handler task.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    config: CdpConfig,
}

impl ChromiumSession {
    /// Launch a local Chromium, or attach when `websocket_url` is configured.
    pub async fn launch(config: CdpConfig) -> Result<Self, AdapterError> {
        let (browser, handler) = match &config.websocket_url {
            Some(url) => {
                info!(%url, "attaching to remote chromium");
                Browser::connect(url.clone()).await.map_err(|err| {
                    AdapterError::new(AdapterErrorKind::LaunchFailed)
                        .with_hint(format!("connect {url}: {err}"))
                })?
            }
            None => {
                let browser_config = browser_config(&config)?;
                info!(
                    executable = %config.executable.display(),
                    headless = config.headless,
                    "launching chromium"
                );
                Browser::launch(browser_config).await.map_err(|err| {
                    AdapterError::new(AdapterErrorKind::LaunchFailed).with_hint(err.to_string())
                })?
            }
        };

        Ok(Self {
            browser,
            handler: spawn_handler(handler),
            config,
        })
    }

    /// Attach to an already running browser's DevTools websocket.
    pub async fn connect(ws_url: impl Into<String>) -> Result<Self, AdapterError> {
        Self::launch(CdpConfig {
            websocket_url: Some(ws_url.into()),
            ..CdpConfig::default()
        })
        .await
    }

    /// Open a new tab and wait for the initial navigation to finish.
    pub async fn open_page(&self, url: &str) -> Result<ChromiumPage, AdapterError> {
        let nav_timeout = Duration::from_millis(self.config.navigation_timeout_ms);
        let open = async {
            let page = self.browser.new_page(url).await.map_err(map_cdp_error)?;
            page.wait_for_navigation().await.map_err(map_cdp_error)?;
            Ok::<_, AdapterError>(page)
        };
        let page = tokio::time::timeout(nav_timeout, open)
            .await
            .map_err(|_| {
                AdapterError::new(AdapterErrorKind::NavTimeout)
                    .with_hint(format!("{url} did not load within {}ms", nav_timeout.as_millis()))
            })??;
        info!(%url, "page ready");
        Ok(ChromiumPage::new(page))
    }

    pub async fn close(mut self) -> Result<(), AdapterError> {
        let result = self.browser.close().await.map(|_| ()).map_err(map_cdp_error);
        self.handler.abort();
        result
    }
}

fn browser_config(cfg: &CdpConfig) -> Result<BrowserConfig, AdapterError> {
    if !cfg.executable.as_os_str().is_empty() && !cfg.executable.exists() {
        return Err(AdapterError::new(AdapterErrorKind::LaunchFailed).with_hint(format!(
            "chrome executable not found at {} (set A11Y_PROBE_CHROME)",
            cfg.executable.display()
        )));
    }

    let viewport = Viewport {
        width: cfg.window_width,
        height: cfg.window_height,
        device_scale_factor: None,
        emulating_mobile: false,
        is_landscape: cfg.window_width >= cfg.window_height,
        has_touch: false,
    };

    let mut builder = BrowserConfig::builder()
        .request_timeout(Duration::from_millis(cfg.request_timeout_ms))
        .window_size(cfg.window_width, cfg.window_height)
        .viewport(viewport);

    if !cfg.headless {
        builder = builder.with_head();
    }
    if cfg.no_sandbox {
        builder = builder.no_sandbox();
    }
    if !cfg.executable.as_os_str().is_empty() {
        builder = builder.chrome_executable(cfg.executable.clone());
    }
    if let Some(dir) = &cfg.user_data_dir {
        builder = builder.user_data_dir(dir.clone());
    }

    builder = builder.args(vec![
        "--disable-background-networking",
        "--disable-default-apps",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--disable-sync",
        "--no-first-run",
        "--no-default-browser-check",
        "--mute-audio",
    ]);

    builder.build().map_err(|err| {
        AdapterError::new(AdapterErrorKind::Internal).with_hint(format!("browser config error: {err}"))
    })
}

fn spawn_handler(mut handler: chromiumoxide::handler::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(result) = handler.next().await {
            if let Err(err) = result {
                warn!(%err, "chromium handler error");
            }
        }
    })
}

/// One browsing context plus the registry of elements resolved on it.
pub struct ChromiumPage {
    id: PageId,
    page: Page,
    elements: ElementRegistry<Element>,
}

impl ChromiumPage {
    pub fn new(page: Page) -> Self {
        Self {
            id: PageId::new(),
            page,
            elements: ElementRegistry::new(),
        }
    }

    pub fn id(&self) -> &PageId {
        &self.id
    }

    pub fn raw(&self) -> &Page {
        &self.page
    }

    pub async fn url(&self) -> Result<Option<String>, AdapterError> {
        self.page.url().await.map_err(map_cdp_error)
    }

    /// First match of `selector`, scoped to `scope` when given.
    pub async fn query(
        &self,
        scope: Option<&ElementHandle>,
        selector: &str,
    ) -> Result<Option<ElementHandle>, AdapterError> {
        let mut found = match scope {
            Some(handle) => {
                let parent = self.element(handle)?;
                instrumented("DOM.querySelectorAll", parent.find_elements(selector)).await?
            }
            None => instrumented("DOM.querySelectorAll", self.page.find_elements(selector)).await?,
        };
        if found.is_empty() {
            debug!(selector, "query matched nothing");
            return Ok(None);
        }
        let first = found.swap_remove(0);
        Ok(Some(self.elements.insert(first)))
    }

    /// Calls `function_declaration` with the node bound to `this`.
    ///
    /// The declaration's return value is serialized in the page with
    /// `JSON.stringify` and parsed back here, so plain objects survive the
    /// round-trip without a remote object reference.
    pub async fn evaluate(
        &self,
        handle: &ElementHandle,
        function_declaration: &str,
    ) -> Result<Value, AdapterError> {
        let element = self.element(handle)?;
        let wrapped = format!(
            "function() {{ const __r = ({function_declaration}).apply(this, arguments); return JSON.stringify(__r === undefined ? null : __r); }}"
        );
        let returns = instrumented("Runtime.callFunctionOn", element.call_js_fn(wrapped, false)).await?;
        if let Some(details) = returns.exception_details {
            return Err(AdapterError::new(AdapterErrorKind::ScriptFailed).with_hint(details.text));
        }
        match returns.result.value {
            Some(Value::String(raw)) => serde_json::from_str(&raw).map_err(|err| {
                AdapterError::new(AdapterErrorKind::ScriptFailed)
                    .with_hint(format!("non-JSON script result: {err}"))
            }),
            Some(other) => Ok(other),
            None => Ok(Value::Null),
        }
    }

    pub async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, AdapterError> {
        let value = self
            .evaluate(
                handle,
                "function() { const r = this.getBoundingClientRect(); return r.width > 0 && r.height > 0 && this.offsetParent !== null; }",
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub async fn click(&self, handle: &ElementHandle) -> Result<(), AdapterError> {
        let element = self.element(handle)?;
        instrumented("Element.click", element.click()).await.map(|_| ())
    }

    pub async fn focus(&self, handle: &ElementHandle) -> Result<(), AdapterError> {
        let element = self.element(handle)?;
        instrumented("Element.focus", element.focus()).await.map(|_| ())
    }

    pub async fn hover(&self, handle: &ElementHandle) -> Result<(), AdapterError> {
        let element = self.element(handle)?;
        instrumented("Element.hover", element.hover()).await.map(|_| ())
    }

    pub async fn press_key(&self, handle: &ElementHandle, key: &str) -> Result<(), AdapterError> {
        let element = self.element(handle)?;
        instrumented("Element.pressKey", element.press_key(key))
            .await
            .map(|_| ())
    }

    /// Forget one handle. Using it afterwards fails as target-not-found.
    pub fn release(&self, handle: &ElementHandle) {
        self.elements.remove(handle);
    }

    fn element(&self, handle: &ElementHandle) -> Result<Arc<Element>, AdapterError> {
        self.elements.get(handle).ok_or_else(|| {
            AdapterError::new(AdapterErrorKind::TargetNotFound)
                .with_hint(format!("unknown element handle {handle}"))
        })
    }
}

async fn instrumented<T, F>(method: &str, fut: F) -> Result<T, AdapterError>
where
    F: Future<Output = Result<T, CdpError>>,
{
    let started = Instant::now();
    let result = fut.await.map_err(|err| {
        debug!(method, %err, "cdp command failed");
        map_cdp_error(err)
    });
    metrics::observe(method, result.as_ref().map(|_| ()), started.elapsed());
    result
}

/// Transport and launch failures take the whole page down with them.
/// Everything else Chrome reports while acting on a node stays scoped to
/// that node.
fn map_cdp_error(err: CdpError) -> AdapterError {
    let kind = match &err {
        CdpError::LaunchExit(..) | CdpError::LaunchTimeout(..) | CdpError::LaunchIo(..) => {
            AdapterErrorKind::LaunchFailed
        }
        CdpError::Ws(..)
        | CdpError::Io(..)
        | CdpError::NoResponse
        | CdpError::ChannelSendError(..)
        | CdpError::Serde(..)
        | CdpError::DecodeError(..) => AdapterErrorKind::CdpIo,
        CdpError::Timeout => AdapterErrorKind::NavTimeout,
        CdpError::NotFound | CdpError::FrameNotFound(..) => AdapterErrorKind::TargetNotFound,
        CdpError::JavascriptException(..) => AdapterErrorKind::ScriptFailed,
        _ => AdapterErrorKind::ActionFailed,
    };
    AdapterError::new(kind).with_hint(err.to_string())
}
