/// W3C WebDriver HTTP client implementation
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument, trace, warn};

use super::types::{
    element_arg, Capabilities, ElementRef, Envelope, ErrorValue, ExecuteRequest, FindRequest,
    NewSessionRequest, NewSessionResponse, NewWindow, Status,
};
use crate::domain::errors::{DriverError, DriverResult};
use crate::domain::models::{ContextHandle, ElementHandle, Locator};
use crate::domain::ports::UiDriver;

/// One WebDriver session against a geckodriver/chromedriver server.
///
/// Element handles and context handles are the server's own identifiers, so
/// the client itself holds no state beyond the session id.
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    /// Reusable HTTP client with connection pooling
    http_client: ReqwestClient,

    /// Driver server root, e.g. `http://127.0.0.1:4444`
    base_url: String,

    session_id: String,
}

impl WebDriverClient {
    /// HTTP client used for every request to the driver server.
    pub fn http_client(request_timeout: Duration) -> DriverResult<ReqwestClient> {
        ReqwestClient::builder()
            .timeout(request_timeout)
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| DriverError::Protocol(format!("failed to build HTTP client: {e}")))
    }

    /// Query `/status` on the driver server.
    pub async fn status(http_client: &ReqwestClient, base_url: &str) -> DriverResult<Status> {
        let response = http_client
            .get(format!("{}/status", base_url.trim_end_matches('/')))
            .send()
            .await
            .map_err(map_transport)?;
        read_value(response).await
    }

    /// Start a new browser session.
    #[instrument(skip(capabilities, request_timeout))]
    pub async fn new_session(
        base_url: &str,
        capabilities: Value,
        request_timeout: Duration,
    ) -> DriverResult<Self> {
        let http_client = Self::http_client(request_timeout)?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let request = NewSessionRequest {
            capabilities: Capabilities {
                always_match: capabilities,
            },
        };
        let response = http_client
            .post(format!("{base_url}/session"))
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;
        let session: NewSessionResponse = read_value(response).await?;

        debug!(session_id = %session.session_id, "WebDriver session created");
        Ok(Self {
            http_client,
            base_url,
            session_id: session.session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a session command and decode its `value`.
    async fn command<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> DriverResult<T> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        trace!(%method, %url, "WebDriver command");

        let mut request = self.http_client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        } else if method == Method::POST {
            request = request.json(&json!({}));
        }

        let response = request.send().await.map_err(map_transport)?;
        read_value(response).await
    }

    async fn element_command<T: DeserializeOwned>(
        &self,
        method: Method,
        element: &ElementHandle,
        suffix: &str,
        body: Option<Value>,
    ) -> DriverResult<T> {
        let path = format!("/element/{}{}", element.id(), suffix);
        self.command(method, &path, body).await
    }
}

/// Decode a response: `value` on success, a classified error otherwise.
async fn read_value<T: DeserializeOwned>(response: reqwest::Response) -> DriverResult<T> {
    let status = response.status();
    let body = response.text().await.map_err(map_transport)?;

    if !status.is_success() {
        return Err(map_error(status, &body));
    }

    serde_json::from_str::<Envelope<T>>(&body)
        .map(|envelope| envelope.value)
        .map_err(|e| DriverError::Protocol(format!("unexpected response ({e}): {body}")))
}

/// Map a failed WebDriver response onto [`DriverError`].
pub fn map_error(status: StatusCode, body: &str) -> DriverError {
    let Ok(Envelope { value }) = serde_json::from_str::<Envelope<ErrorValue>>(body) else {
        return DriverError::Protocol(format!("HTTP {status}: {body}"));
    };
    let ErrorValue { error, message } = value;

    match error.as_str() {
        "no such element" => DriverError::NoSuchElement(message),
        "stale element reference" | "detached shadow root" => DriverError::Stale(message),
        "element not interactable" | "element click intercepted" | "invalid element state" => {
            DriverError::NotInteractable(message)
        }
        "timeout" | "script timeout" => DriverError::Timeout(message),
        "invalid session id" => DriverError::SessionLost(message),
        _ if message.contains("not reachable") || message.contains("disconnected") => {
            DriverError::SessionLost(message)
        }
        _ => DriverError::Protocol(format!("{error}: {message}")),
    }
}

fn map_transport(err: reqwest::Error) -> DriverError {
    if err.is_timeout() {
        DriverError::Timeout(err.to_string())
    } else if err.is_decode() {
        DriverError::Protocol(err.to_string())
    } else {
        DriverError::Unreachable(err.to_string())
    }
}

#[async_trait]
impl UiDriver for WebDriverClient {
    fn name(&self) -> &'static str {
        "webdriver"
    }

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.command(Method::GET, "/url", None).await
    }

    async fn refresh(&self) -> DriverResult<()> {
        self.command(Method::POST, "/refresh", None).await
    }

    async fn find(&self, locator: &Locator) -> DriverResult<Option<ElementHandle>> {
        let body = serde_json::to_value(FindRequest::css(locator.selector()))
            .map_err(|e| DriverError::Protocol(e.to_string()))?;
        match self
            .command::<ElementRef>(Method::POST, "/element", Some(body))
            .await
        {
            Ok(element) => Ok(Some(ElementHandle::new(element.id))),
            Err(DriverError::NoSuchElement(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn find_all(&self, locator: &Locator) -> DriverResult<Vec<ElementHandle>> {
        let body = serde_json::to_value(FindRequest::css(locator.selector()))
            .map_err(|e| DriverError::Protocol(e.to_string()))?;
        let elements: Vec<ElementRef> = self.command(Method::POST, "/elements", Some(body)).await?;
        Ok(elements
            .into_iter()
            .map(|element| ElementHandle::new(element.id))
            .collect())
    }

    async fn text(&self, element: &ElementHandle) -> DriverResult<String> {
        self.element_command(Method::GET, element, "/text", None)
            .await
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        let value: Value = self
            .element_command(Method::GET, element, &format!("/property/{name}"), None)
            .await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn is_displayed(&self, element: &ElementHandle) -> DriverResult<bool> {
        self.element_command(Method::GET, element, "/displayed", None)
            .await
    }

    async fn is_enabled(&self, element: &ElementHandle) -> DriverResult<bool> {
        self.element_command(Method::GET, element, "/enabled", None)
            .await
    }

    async fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        self.element_command(Method::POST, element, "/click", None)
            .await
    }

    async fn clear(&self, element: &ElementHandle) -> DriverResult<()> {
        self.element_command(Method::POST, element, "/clear", None)
            .await
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> DriverResult<()> {
        self.element_command(Method::POST, element, "/value", Some(json!({ "text": text })))
            .await
    }

    async fn blur(&self, element: &ElementHandle) -> DriverResult<()> {
        let request = ExecuteRequest {
            script: "arguments[0].blur();",
            args: vec![element_arg(element.id())],
        };
        let body =
            serde_json::to_value(request).map_err(|e| DriverError::Protocol(e.to_string()))?;
        let _: Value = self.command(Method::POST, "/execute/sync", Some(body)).await?;
        Ok(())
    }

    async fn current_context(&self) -> DriverResult<ContextHandle> {
        let handle: String = self.command(Method::GET, "/window", None).await?;
        Ok(ContextHandle::new(handle))
    }

    async fn open_context(&self, url: &str) -> DriverResult<ContextHandle> {
        let window: NewWindow = self
            .command(Method::POST, "/window/new", Some(json!({ "type": "tab" })))
            .await?;
        let context = ContextHandle::new(window.handle);
        self.switch_context(&context).await?;
        if let Err(err) = self.navigate(url).await {
            if !err.is_fatal() {
                if let Err(close_err) = self.close_context().await {
                    warn!(context = %context, error = %close_err, "closing failed item context failed");
                }
            }
            return Err(err);
        }
        Ok(context)
    }

    async fn switch_context(&self, context: &ContextHandle) -> DriverResult<()> {
        self.command(Method::POST, "/window", Some(json!({ "handle": context.id() })))
            .await
    }

    async fn close_context(&self) -> DriverResult<()> {
        let _: Value = self.command(Method::DELETE, "/window", None).await?;
        Ok(())
    }

    async fn quit(&self) -> DriverResult<()> {
        let response = self
            .http_client
            .delete(format!("{}/session/{}", self.base_url, self.session_id))
            .send()
            .await
            .map_err(map_transport)?;
        let _: Value = read_value(response).await?;
        debug!(session_id = %self.session_id, "WebDriver session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_error_codes() {
        let body = |code: &str| format!(r#"{{"value":{{"error":"{code}","message":"m"}}}}"#);

        assert!(matches!(
            map_error(StatusCode::NOT_FOUND, &body("no such element")),
            DriverError::NoSuchElement(_)
        ));
        assert!(matches!(
            map_error(StatusCode::NOT_FOUND, &body("stale element reference")),
            DriverError::Stale(_)
        ));
        assert!(map_error(StatusCode::NOT_FOUND, &body("invalid session id")).is_fatal());
        assert!(matches!(
            map_error(StatusCode::BAD_REQUEST, &body("element not interactable")),
            DriverError::NotInteractable(_)
        ));
        assert!(matches!(
            map_error(StatusCode::NOT_FOUND, &body("no such window")),
            DriverError::Protocol(_)
        ));
    }

    #[test]
    fn test_map_error_unparsable_body() {
        let err = map_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(err, DriverError::Protocol(msg) if msg.contains("502")));
    }

    #[test]
    fn test_unreachable_chrome_is_session_lost() {
        let body = r#"{"value":{"error":"unknown error","message":"chrome not reachable"}}"#;
        assert!(map_error(StatusCode::INTERNAL_SERVER_ERROR, body).is_fatal());
    }
}
