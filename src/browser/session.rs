use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::error::AgentError;
use crate::browser::driver::{ElementHandle, PageDriver};

pub const DEFAULT_SERVER_SCRIPT: &str = "node/browser_server.js";

/// Request sent to browser_server.js over stdin (one JSON line).
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Navigate {
        url: String,
    },
    Wait {
        duration_ms: u64,
    },
    FindAll {
        selector: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        parent: Option<ElementHandle>,
    },
    Attribute {
        handle: ElementHandle,
        name: String,
    },
    Text {
        handle: ElementHandle,
    },
    Visible {
        handle: ElementHandle,
    },
    Clear {
        handle: ElementHandle,
    },
    Type {
        handle: ElementHandle,
        text: String,
    },
    Select {
        handle: ElementHandle,
        text: String,
    },
    Click {
        handle: ElementHandle,
    },
    Quit,
}

impl BrowserRequest {
    pub fn navigate(url: &str) -> Self {
        BrowserRequest::Navigate {
            url: url.to_string(),
        }
    }

    pub fn wait(duration_ms: u64) -> Self {
        BrowserRequest::Wait { duration_ms }
    }

    pub fn find_all(selector: &str, parent: Option<&ElementHandle>) -> Self {
        BrowserRequest::FindAll {
            selector: selector.to_string(),
            parent: parent.cloned(),
        }
    }

    pub fn attribute(handle: &ElementHandle, name: &str) -> Self {
        BrowserRequest::Attribute {
            handle: handle.clone(),
            name: name.to_string(),
        }
    }

    pub fn text(handle: &ElementHandle) -> Self {
        BrowserRequest::Text {
            handle: handle.clone(),
        }
    }

    pub fn visible(handle: &ElementHandle) -> Self {
        BrowserRequest::Visible {
            handle: handle.clone(),
        }
    }

    pub fn clear(handle: &ElementHandle) -> Self {
        BrowserRequest::Clear {
            handle: handle.clone(),
        }
    }

    pub fn type_text(handle: &ElementHandle, text: &str) -> Self {
        BrowserRequest::Type {
            handle: handle.clone(),
            text: text.to_string(),
        }
    }

    pub fn select(handle: &ElementHandle, text: &str) -> Self {
        BrowserRequest::Select {
            handle: handle.clone(),
            text: text.to_string(),
        }
    }

    pub fn click(handle: &ElementHandle) -> Self {
        BrowserRequest::Click {
            handle: handle.clone(),
        }
    }

    /// Command name as the server sees it, for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::Wait { .. } => "wait",
            BrowserRequest::FindAll { .. } => "find_all",
            BrowserRequest::Attribute { .. } => "attribute",
            BrowserRequest::Text { .. } => "text",
            BrowserRequest::Visible { .. } => "visible",
            BrowserRequest::Clear { .. } => "clear",
            BrowserRequest::Type { .. } => "type",
            BrowserRequest::Select { .. } => "select",
            BrowserRequest::Click { .. } => "click",
            BrowserRequest::Quit => "quit",
        }
    }
}

/// Response received from browser_server.js over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub handles: Option<Vec<ElementHandle>>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
}

/// Launch options for the Node.js browser server.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub script: String,
    pub headless: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            script: DEFAULT_SERVER_SCRIPT.to_string(),
            headless: false,
        }
    }
}

/// A persistent browser session backed by browser_server.js.
///
/// Launches a long-lived Node.js process that keeps a Chromium page open.
/// Commands are sent as NDJSON over stdin, responses read from stdout.
/// Element handles are registry ids held by the server and dropped when
/// it navigates.
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    closed: bool,
}

impl BrowserSession {
    /// Launch a new browser session by spawning browser_server.js.
    pub fn launch(options: &SessionOptions) -> Result<Self, AgentError> {
        let mut command = Command::new("node");
        command.arg(&options.script);
        if options.headless {
            command.arg("--headless");
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| AgentError::SubprocessSpawn {
                script: options.script.clone(),
                source: e,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            AgentError::SessionIO("Failed to capture stdin of browser_server.js".into())
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            AgentError::SessionIO("Failed to capture stdout of browser_server.js".into())
        })?;

        let mut reader = BufReader::new(stdout);

        // Wait for the ready signal
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| AgentError::SessionIO(format!("Failed to read ready signal: {}", e)))?;

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| AgentError::JsonParse {
                context: "browser_server.js ready signal".into(),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(AgentError::SessionProtocol {
                command: "launch".into(),
                error: "Did not receive ready signal from browser_server.js".into(),
            });
        }

        debug!(script = %options.script, headless = options.headless, "browser session ready");

        Ok(BrowserSession {
            child,
            stdin,
            reader,
            closed: false,
        })
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, AgentError> {
        let json = serde_json::to_string(request).map_err(|e| AgentError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json).map_err(|e| {
            AgentError::SessionIO(format!("Failed to write to browser_server.js stdin: {}", e))
        })?;

        self.stdin.flush().map_err(|e| {
            AgentError::SessionIO(format!("Failed to flush browser_server.js stdin: {}", e))
        })?;

        let mut line = String::new();
        self.reader.read_line(&mut line).map_err(|e| {
            AgentError::SessionIO(format!("Failed to read from browser_server.js stdout: {}", e))
        })?;

        if line.trim().is_empty() {
            return Err(AgentError::SessionIO(
                "Empty response from browser_server.js (process may have died)".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| AgentError::JsonParse {
            context: "browser_server.js response".into(),
            source: e,
        })
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, AgentError> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(AgentError::SessionProtocol {
                command: request.name().into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    /// Quit the browser session.
    pub fn quit(&mut self) -> Result<(), AgentError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // Best-effort quit, the process may already be gone
        if let Err(e) = self.send(&BrowserRequest::Quit) {
            debug!("quit request not acknowledged: {}", e);
        }
        let _ = self.child.wait();
        Ok(())
    }
}

impl PageDriver for BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), AgentError> {
        self.send_ok(&BrowserRequest::navigate(url))
            .map_err(|e| AgentError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })
            .map(|_| ())
    }

    fn settle(&mut self, ms: u64) -> Result<(), AgentError> {
        self.send_ok(&BrowserRequest::wait(ms))?;
        Ok(())
    }

    fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>, AgentError> {
        let response = self.send_ok(&BrowserRequest::find_all(selector, None))?;
        Ok(response.handles.unwrap_or_default())
    }

    fn find_within(
        &mut self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, AgentError> {
        let response = self.send_ok(&BrowserRequest::find_all(selector, Some(parent)))?;
        Ok(response.handles.unwrap_or_default())
    }

    fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, AgentError> {
        let response = self.send_ok(&BrowserRequest::attribute(element, name))?;
        Ok(response.value)
    }

    fn text(&mut self, element: &ElementHandle) -> Result<String, AgentError> {
        let response = self.send_ok(&BrowserRequest::text(element))?;
        Ok(response.text.unwrap_or_default())
    }

    fn is_visible(&mut self, element: &ElementHandle) -> Result<bool, AgentError> {
        let response = self.send_ok(&BrowserRequest::visible(element))?;
        Ok(response.visible.unwrap_or(false))
    }

    fn clear(&mut self, element: &ElementHandle) -> Result<(), AgentError> {
        self.send_ok(&BrowserRequest::clear(element))?;
        Ok(())
    }

    fn type_text(&mut self, element: &ElementHandle, text: &str) -> Result<(), AgentError> {
        self.send_ok(&BrowserRequest::type_text(element, text))?;
        Ok(())
    }

    fn select_by_visible_text(
        &mut self,
        element: &ElementHandle,
        text: &str,
    ) -> Result<(), AgentError> {
        self.send_ok(&BrowserRequest::select(element, text))?;
        Ok(())
    }

    fn click(&mut self, element: &ElementHandle) -> Result<(), AgentError> {
        self.send_ok(&BrowserRequest::click(element))?;
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.quit() {
            warn!("browser session cleanup failed: {}", e);
        }
    }
}
