//! [`Document`] backed by a live WebDriver session (chromedriver).

use gridharvest_core::ScrollStep;
use serde_json::Value;
use thirtyfour::error::WebDriverErrorInner;
use thirtyfour::prelude::*;
use tracing::{debug, info};

use super::{Document, ItemNode};
use crate::error::DomError;

/// How to start the browser session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub server_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub window_size: (u32, u32),
}

pub struct WebDriverDocument {
    driver: WebDriver,
}

#[derive(Debug, Clone)]
pub struct WebNode(WebElement);

fn session_error(err: &WebDriverError) -> DomError {
    match &**err {
        WebDriverErrorInner::StaleElementReference(_) => DomError::Stale,
        _ => DomError::Session(err.to_string()),
    }
}

impl WebDriverDocument {
    /// Starts a Chrome session against the configured WebDriver server.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Session`] if the capabilities are rejected or the
    /// server cannot be reached.
    pub async fn open(options: &SessionOptions) -> Result<Self, DomError> {
        let mut caps = DesiredCapabilities::chrome();
        if options.headless {
            caps.set_headless().map_err(|e| session_error(&e))?;
        }
        let (width, height) = options.window_size;
        for arg in [
            format!("--user-agent={}", options.user_agent),
            format!("--window-size={width},{height}"),
            "--disable-blink-features=AutomationControlled".to_owned(),
        ] {
            caps.add_arg(&arg).map_err(|e| session_error(&e))?;
        }

        let driver = WebDriver::new(options.server_url.as_str(), caps)
            .await
            .map_err(|e| session_error(&e))?;
        info!(
            server = %options.server_url,
            headless = options.headless,
            "browser session started"
        );
        Ok(Self { driver })
    }

    /// Navigates to `url` and waits for the initial load to finish.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Session`] when navigation fails.
    pub async fn goto(&self, url: &str) -> Result<(), DomError> {
        debug!(url, "navigating");
        self.driver.goto(url).await.map_err(|e| session_error(&e))
    }

    /// Ends the browser session.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Session`] when the server rejects the quit.
    pub async fn quit(self) -> Result<(), DomError> {
        self.driver.quit().await.map_err(|e| session_error(&e))
    }

    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value, DomError> {
        let ret = self
            .driver
            .execute(script, args)
            .await
            .map_err(|e| session_error(&e))?;
        Ok(ret.json().clone())
    }
}

impl Document for WebDriverDocument {
    type Node = WebNode;

    async fn find_all(&self, selector: &str) -> Result<Vec<WebNode>, DomError> {
        let elements = self
            .driver
            .find_all(By::Css(selector))
            .await
            .map_err(|e| session_error(&e))?;
        Ok(elements.into_iter().map(WebNode).collect())
    }

    async fn click(&self, node: &WebNode) -> Result<(), DomError> {
        let handle = node.0.to_json().map_err(|e| session_error(&e))?;
        self.run_script("arguments[0].click();", vec![handle])
            .await
            .map(|_| ())
    }

    async fn scroll_by(&self, step: ScrollStep) -> Result<(), DomError> {
        let (script, arg) = match step {
            ScrollStep::Pixels { amount } => ("window.scrollBy(0, arguments[0]);", Value::from(amount)),
            ScrollStep::ViewportFraction { fraction } => (
                "window.scrollBy(0, window.innerHeight * arguments[0]);",
                Value::from(fraction),
            ),
        };
        self.run_script(script, vec![arg]).await.map(|_| ())
    }

    async fn scroll_into_view(&self, node: &WebNode) -> Result<(), DomError> {
        let handle = node.0.to_json().map_err(|e| session_error(&e))?;
        self.run_script(
            "arguments[0].scrollIntoView({block: 'center'});",
            vec![handle],
        )
        .await
        .map(|_| ())
    }

    async fn scroll_height(&self) -> Result<u64, DomError> {
        let value = self
            .run_script("return document.body.scrollHeight;", Vec::new())
            .await?;
        value
            .as_u64()
            .ok_or_else(|| DomError::Session(format!("unexpected scrollHeight value: {value}")))
    }

    async fn page_source(&self) -> Result<String, DomError> {
        self.driver.source().await.map_err(|e| session_error(&e))
    }
}

impl ItemNode for WebNode {
    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, DomError> {
        let elements = self
            .0
            .find_all(By::Css(selector))
            .await
            .map_err(|e| session_error(&e))?;
        Ok(elements.into_iter().map(WebNode).collect())
    }

    async fn text(&self) -> Result<String, DomError> {
        let raw = self.0.text().await.map_err(|e| session_error(&e))?;
        Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, DomError> {
        self.0.attr(name).await.map_err(|e| session_error(&e))
    }

    async fn is_displayed(&self) -> Result<bool, DomError> {
        self.0.is_displayed().await.map_err(|e| session_error(&e))
    }

    async fn outer_html(&self) -> Result<String, DomError> {
        self.0.outer_html().await.map_err(|e| session_error(&e))
    }
}

#[cfg(test)]
mod tests {
    use thirtyfour::error::WebDriverErrorInfo;

    use super::*;

    #[test]
    fn stale_reference_maps_to_stale() {
        let err = WebDriverError::StaleElementReference(WebDriverErrorInfo::new(
            "node detached by re-render".to_owned(),
        ));
        assert!(matches!(session_error(&err), DomError::Stale));
    }

    #[test]
    fn stale_wording_in_other_errors_is_a_session_error() {
        let err = WebDriverError::ParseError("stale element in payload".to_owned());
        assert!(matches!(session_error(&err), DomError::Session(_)));
    }
}
