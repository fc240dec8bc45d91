//! UI driver port - the capability surface of a browser automation backend.

use async_trait::async_trait;

use crate::domain::errors::DriverResult;
use crate::domain::models::{ContextHandle, ElementHandle, Locator};

/// Trait for browser automation backends.
///
/// All operations act on the currently active navigation context. Element
/// handles are only meaningful inside the context they were found in.
///
/// Implementations use interior mutability; the engine shares a single
/// driver behind an `Arc` and never calls it concurrently.
#[async_trait]
pub trait UiDriver: Send + Sync {
    /// Backend name used in logs.
    fn name(&self) -> &'static str;

    /// Navigate the active context to `url`.
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// URL of the active context (used to detect sign-in redirects).
    async fn current_url(&self) -> DriverResult<String>;

    /// Reload the active context.
    async fn refresh(&self) -> DriverResult<()>;

    /// Find the first element matching `locator`; `Ok(None)` when there is none.
    async fn find(&self, locator: &Locator) -> DriverResult<Option<ElementHandle>>;

    /// Find every element matching `locator` (possibly none).
    async fn find_all(&self, locator: &Locator) -> DriverResult<Vec<ElementHandle>>;

    /// Visible text of an element.
    async fn text(&self, element: &ElementHandle) -> DriverResult<String>;

    /// Attribute or property value of an element (`href`, `value`, ...).
    async fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>>;

    async fn is_displayed(&self, element: &ElementHandle) -> DriverResult<bool>;

    async fn is_enabled(&self, element: &ElementHandle) -> DriverResult<bool>;

    async fn click(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Clear an editable element.
    async fn clear(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Type text into an element.
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> DriverResult<()>;

    /// Move focus away from an element so pending edits are committed.
    async fn blur(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Handle of the active context.
    async fn current_context(&self) -> DriverResult<ContextHandle>;

    /// Open `url` in a new isolated context and make it active.
    async fn open_context(&self, url: &str) -> DriverResult<ContextHandle>;

    /// Make `context` the active context.
    async fn switch_context(&self, context: &ContextHandle) -> DriverResult<()>;

    /// Close the active context. Another context must be switched to afterwards.
    async fn close_context(&self) -> DriverResult<()>;

    /// End the browser session.
    async fn quit(&self) -> DriverResult<()>;
}
