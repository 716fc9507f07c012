use std::time::Duration;

use async_trait::async_trait;
use cdp_adapter::ChromiumPage;
use probe_core_types::ElementHandle;
use serde_json::Value;

use crate::errors::ProbeError;

/// Browser capabilities the engine relies on.
///
/// Implementations must leave the page untouched from `query`, `is_visible`
/// and `evaluate`; only the four dispatch methods may have side effects.
/// Handles returned by `query` stay valid until passed to `release`.
#[async_trait]
pub trait PagePort: Send + Sync {
    /// First element matching `selector`, searched inside `scope` when given.
    async fn query(
        &self,
        scope: Option<&ElementHandle>,
        selector: &str,
    ) -> Result<Option<ElementHandle>, ProbeError>;

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, ProbeError>;

    /// Calls a read-only JS function declaration with the node as `this`.
    async fn evaluate(
        &self,
        handle: &ElementHandle,
        function_declaration: &str,
    ) -> Result<Value, ProbeError>;

    async fn click(&self, handle: &ElementHandle) -> Result<(), ProbeError>;
    async fn focus(&self, handle: &ElementHandle) -> Result<(), ProbeError>;
    async fn hover(&self, handle: &ElementHandle) -> Result<(), ProbeError>;
    async fn press_key(&self, handle: &ElementHandle, key: &str) -> Result<(), ProbeError>;

    /// Gives a handle back once the probe that resolved it is done.
    async fn release(&self, _handle: &ElementHandle) {}

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl PagePort for ChromiumPage {
    async fn query(
        &self,
        scope: Option<&ElementHandle>,
        selector: &str,
    ) -> Result<Option<ElementHandle>, ProbeError> {
        Ok(ChromiumPage::query(self, scope, selector).await?)
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, ProbeError> {
        Ok(ChromiumPage::is_visible(self, handle).await?)
    }

    async fn evaluate(
        &self,
        handle: &ElementHandle,
        function_declaration: &str,
    ) -> Result<Value, ProbeError> {
        Ok(ChromiumPage::evaluate(self, handle, function_declaration).await?)
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), ProbeError> {
        Ok(ChromiumPage::click(self, handle).await?)
    }

    async fn focus(&self, handle: &ElementHandle) -> Result<(), ProbeError> {
        Ok(ChromiumPage::focus(self, handle).await?)
    }

    async fn hover(&self, handle: &ElementHandle) -> Result<(), ProbeError> {
        Ok(ChromiumPage::hover(self, handle).await?)
    }

    async fn press_key(&self, handle: &ElementHandle, key: &str) -> Result<(), ProbeError> {
        Ok(ChromiumPage::press_key(self, handle, key).await?)
    }

    async fn release(&self, handle: &ElementHandle) {
        ChromiumPage::release(self, handle);
    }
}
