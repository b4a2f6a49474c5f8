//! Playwright browser automation
//!
//! A [`PlaywrightSession`] owns one `node` child process running a small bridge
//! script. The bridge launches a browser, opens one context and one page, then
//! executes commands read as JSON lines from stdin and answers each with one
//! JSON line on stdout. The session is therefore a single isolated browser
//! context, owned by one test for its lifetime.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hrm_common::{Browser, Project, UiConfig};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::driver::{BrowserDriver, Locator, WaitState};
use crate::error::{E2eError, E2eResult};

/// Extra time granted to the bridge beyond a command's own timeout
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// Time allowed for the browser to launch
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(60);

const BRIDGE_SCRIPT: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

const send = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {
  const browserType = playwright[process.env.HRM_PW_BROWSER || 'chromium'];
  const browser = await browserType.launch({ headless: process.env.HRM_PW_HEADLESS !== '0' });
  const device = process.env.HRM_PW_DEVICE ? playwright.devices[process.env.HRM_PW_DEVICE] : null;
  const contextOptions = device
    ? { ...device }
    : { viewport: { width: Number(process.env.HRM_PW_WIDTH), height: Number(process.env.HRM_PW_HEIGHT) } };
  const context = await browser.newContext(contextOptions);
  const page = await context.newPage();
  page.setDefaultTimeout(Number(process.env.HRM_PW_ACTION_TIMEOUT));

  const locate = (cmd) => {
    let loc = page.locator(cmd.selector);
    if (cmd.has_text !== undefined) loc = loc.filter({ hasText: cmd.has_text });
    if (cmd.nth !== undefined) loc = loc.nth(cmd.nth);
    return loc;
  };

  const handlers = {
    goto: async (c) => { await page.goto(c.url); return null; },
    wait_for: async (c) => { await locate(c).waitFor({ state: c.state, timeout: c.timeout_ms }); return null; },
    click: async (c) => { await locate(c).click(); return null; },
    fill: async (c) => { await locate(c).fill(c.value); return null; },
    text_content: async (c) => {
      const loc = locate(c);
      if ((await loc.count()) === 0) return null;
      return await loc.first().textContent();
    },
    attribute: async (c) => {
      const loc = locate(c);
      if ((await loc.count()) === 0) return null;
      return await loc.first().getAttribute(c.name);
    },
    screenshot: async (c) => { await page.screenshot({ path: c.path, fullPage: true }); return null; },
  };

  send({ ready: true });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    const cmd = JSON.parse(line);
    if (cmd.op === 'close') {
      send({ id: cmd.id, ok: true, value: null });
      break;
    }
    try {
      const handler = handlers[cmd.op];
      if (!handler) throw new Error('unknown op ' + cmd.op);
      send({ id: cmd.id, ok: true, value: await handler(cmd) });
    } catch (error) {
      const kind = error.name === 'TimeoutError' ? 'timeout' : 'error';
      send({ id: cmd.id, ok: false, error: { kind, message: error.message } });
    }
  }
  await browser.close();
})().catch((error) => {
  console.error(JSON.stringify({ ready: false, error: error.message }));
  process.exit(1);
});
"#;

/// Configuration for one Playwright session
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,

    /// Playwright device descriptor; overrides the viewport when set
    pub device: Option<String>,

    pub viewport_width: u32,
    pub viewport_height: u32,
    pub headless: bool,

    /// Default timeout for clicks, fills and navigation
    pub action_timeout: Duration,

    /// Executable used to run the bridge
    pub node_binary: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            device: None,
            viewport_width: 1280,
            viewport_height: 720,
            headless: true,
            action_timeout: Duration::from_secs(30),
            node_binary: PathBuf::from("node"),
        }
    }
}

impl PlaywrightConfig {
    /// Session settings for one project of the UI configuration
    pub fn for_project(ui: &UiConfig, project: &Project) -> Self {
        Self {
            browser: project.browser,
            device: project.device.clone(),
            viewport_width: ui.viewport.width,
            viewport_height: ui.viewport.height,
            headless: ui.headless,
            action_timeout: ui.action_timeout(),
            ..Default::default()
        }
    }
}

/// Command sent to the bridge
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum BridgeCommand {
    Goto {
        url: String,
    },
    WaitFor {
        #[serde(flatten)]
        locator: Locator,
        state: WaitState,
        timeout_ms: u64,
    },
    Click {
        #[serde(flatten)]
        locator: Locator,
    },
    Fill {
        #[serde(flatten)]
        locator: Locator,
        value: String,
    },
    TextContent {
        #[serde(flatten)]
        locator: Locator,
    },
    Attribute {
        #[serde(flatten)]
        locator: Locator,
        name: String,
    },
    Screenshot {
        path: PathBuf,
    },
    Close,
}

impl BridgeCommand {
    fn label(&self) -> String {
        match self {
            BridgeCommand::Goto { url } => format!("goto:{}", url),
            BridgeCommand::WaitFor { locator, state, .. } => format!("wait:{}:{:?}", locator, state),
            BridgeCommand::Click { locator } => format!("click:{}", locator),
            BridgeCommand::Fill { locator, .. } => format!("fill:{}", locator),
            BridgeCommand::TextContent { locator } => format!("text:{}", locator),
            BridgeCommand::Attribute { locator, name } => format!("attribute:{}:{}", locator, name),
            BridgeCommand::Screenshot { path } => format!("screenshot:{}", path.display()),
            BridgeCommand::Close => "close".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a BridgeCommand,
}

#[derive(Debug, Deserialize)]
struct Reply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<ReplyError>,
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    kind: String,
    message: String,
}

impl Reply {
    fn into_result(self, label: &str) -> E2eResult<serde_json::Value> {
        if self.ok {
            return Ok(self.value);
        }
        let error = self.error.unwrap_or(ReplyError {
            kind: "error".to_string(),
            message: "bridge reported failure without details".to_string(),
        });
        if error.kind == "timeout" {
            Err(E2eError::Timeout(format!("{} ({})", label, error.message)))
        } else {
            Err(E2eError::Playwright(format!("{}: {}", label, error.message)))
        }
    }
}

struct BridgeIo {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    closed: bool,
}

/// One browser, one context, one page, driven through the bridge
pub struct PlaywrightSession {
    config: PlaywrightConfig,
    io: Mutex<BridgeIo>,
    next_id: AtomicU64,
    _script_dir: tempfile::TempDir,
}

impl PlaywrightSession {
    /// Launch a browser for this session
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config.node_binary).await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        info!(
            "Launching {} ({})",
            config.browser.as_str(),
            config.device.as_deref().unwrap_or("desktop")
        );

        let mut cmd = Command::new(&config.node_binary);
        cmd.arg(&script_path)
            .env("HRM_PW_BROWSER", config.browser.as_str())
            .env("HRM_PW_HEADLESS", if config.headless { "1" } else { "0" })
            .env("HRM_PW_WIDTH", config.viewport_width.to_string())
            .env("HRM_PW_HEIGHT", config.viewport_height.to_string())
            .env("HRM_PW_ACTION_TIMEOUT", config.action_timeout.as_millis().to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(device) = &config.device {
            cmd.env("HRM_PW_DEVICE", device);
        }

        let mut child = cmd.spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdout unavailable".to_string()))?;

        let mut io = BridgeIo {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            closed: false,
        };

        match tokio::time::timeout(LAUNCH_TIMEOUT, Self::await_ready(&mut io)).await {
            Ok(result) => result?,
            Err(_) => return Err(E2eError::Timeout("browser launch".to_string())),
        }

        Ok(Self {
            config,
            io: Mutex::new(io),
            next_id: AtomicU64::new(1),
            _script_dir: script_dir,
        })
    }

    /// Check if Playwright is installed
    async fn check_playwright_installed(node: &Path) -> E2eResult<()> {
        let status = Command::new(node)
            .args(["-e", "require.resolve('playwright')"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    async fn await_ready(io: &mut BridgeIo) -> E2eResult<()> {
        while let Some(line) = io.stdout.next_line().await? {
            match serde_json::from_str::<serde_json::Value>(&line) {
                Ok(msg) if msg.get("ready").and_then(|v| v.as_bool()) == Some(true) => {
                    debug!("Playwright bridge ready");
                    return Ok(());
                }
                _ => debug!("bridge: {}", line),
            }
        }
        Err(E2eError::Playwright("bridge exited before the browser was ready".to_string()))
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    /// Send one command and wait for its reply
    async fn call(&self, command: BridgeCommand, timeout: Duration) -> E2eResult<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let label = command.label();
        let mut line = serde_json::to_string(&Envelope { id, command: &command })?;
        line.push('\n');

        let mut io = self.io.lock().await;
        if io.closed {
            return Err(E2eError::Playwright(format!("{}: session already closed", label)));
        }

        debug!("Executing step: {}", label);
        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.flush().await?;

        let reply = tokio::time::timeout(timeout + REPLY_GRACE, Self::read_reply(&mut io, id)).await;
        match reply {
            Ok(reply) => reply?.into_result(&label),
            Err(_) => Err(E2eError::Timeout(format!("{} (bridge unresponsive)", label))),
        }
    }

    async fn read_reply(io: &mut BridgeIo, id: u64) -> E2eResult<Reply> {
        while let Some(line) = io.stdout.next_line().await? {
            match serde_json::from_str::<Reply>(&line) {
                Ok(reply) if reply.id == id => return Ok(reply),
                Ok(reply) => warn!("Discarding stale bridge reply {}", reply.id),
                Err(_) => debug!("bridge: {}", line),
            }
        }
        io.closed = true;
        Err(E2eError::Playwright("bridge exited unexpectedly".to_string()))
    }

    fn action_timeout(&self) -> Duration {
        self.config.action_timeout
    }
}

#[async_trait]
impl BrowserDriver for PlaywrightSession {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.call(BridgeCommand::Goto { url: url.to_string() }, self.action_timeout())
            .await
            .map(drop)
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        let command = BridgeCommand::WaitFor {
            locator: locator.clone(),
            state,
            timeout_ms: timeout.as_millis() as u64,
        };
        self.call(command, timeout).await.map(drop)
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.call(BridgeCommand::Click { locator: locator.clone() }, self.action_timeout())
            .await
            .map(drop)
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        let command = BridgeCommand::Fill {
            locator: locator.clone(),
            value: value.to_string(),
        };
        self.call(command, self.action_timeout()).await.map(drop)
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let value = self
            .call(BridgeCommand::TextContent { locator: locator.clone() }, self.action_timeout())
            .await?;
        Ok(value.as_str().map(String::from))
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let command = BridgeCommand::Attribute {
            locator: locator.clone(),
            name: name.to_string(),
        };
        let value = self.call(command, self.action_timeout()).await?;
        Ok(value.as_str().map(String::from))
    }

    async fn screenshot(&self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let command = BridgeCommand::Screenshot {
            path: path.to_path_buf(),
        };
        self.call(command, self.action_timeout()).await.map(drop)
    }

    async fn close(&self) -> E2eResult<()> {
        let result = self.call(BridgeCommand::Close, Duration::from_secs(10)).await;

        let mut io = self.io.lock().await;
        io.closed = true;
        match tokio::time::timeout(Duration::from_secs(10), io.child.wait()).await {
            Ok(Ok(status)) => debug!("Playwright bridge exited with {}", status),
            _ => {
                warn!("Playwright bridge did not exit, killing it");
                let _ = io.child.kill().await;
            }
        }
        result.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let command = BridgeCommand::WaitFor {
            locator: Locator::new("a.item").filter_has_text("Admin"),
            state: WaitState::Visible,
            timeout_ms: 30_000,
        };
        let json = serde_json::to_value(Envelope { id: 7, command: &command }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "op": "wait_for",
                "selector": "a.item",
                "has_text": "Admin",
                "state": "visible",
                "timeout_ms": 30000
            })
        );

        let json = serde_json::to_value(Envelope { id: 8, command: &BridgeCommand::Close }).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 8, "op": "close" }));
    }

    #[test]
    fn test_timeout_reply_maps_to_timeout() {
        let reply: Reply = serde_json::from_str(
            r#"{"id":1,"ok":false,"error":{"kind":"timeout","message":"Timeout 30000ms exceeded."}}"#,
        )
        .unwrap();
        assert!(matches!(reply.into_result("wait:x"), Err(E2eError::Timeout(_))));

        let reply: Reply =
            serde_json::from_str(r#"{"id":2,"ok":false,"error":{"kind":"error","message":"strict mode violation"}}"#)
                .unwrap();
        assert!(matches!(reply.into_result("click:x"), Err(E2eError::Playwright(_))));
    }

    #[test]
    fn test_success_reply_carries_value() {
        let reply: Reply = serde_json::from_str(r#"{"id":3,"ok":true,"value":"Dashboard"}"#).unwrap();
        assert_eq!(reply.into_result("text:x").unwrap(), serde_json::json!("Dashboard"));
    }

    #[test]
    fn test_config_for_mobile_project() {
        let ui = UiConfig::default();
        let project = Project::new("Mobile Safari", Browser::Webkit, Some("iPhone 12"));
        let config = PlaywrightConfig::for_project(&ui, &project);
        assert_eq!(config.browser, Browser::Webkit);
        assert_eq!(config.device.as_deref(), Some("iPhone 12"));
        assert_eq!(config.action_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_missing_node_is_reported() {
        let config = PlaywrightConfig {
            node_binary: PathBuf::from("/nonexistent/node"),
            ..Default::default()
        };
        let err = PlaywrightSession::launch(config).await.err().unwrap();
        assert!(matches!(err, E2eError::PlaywrightNotFound), "{err}");
    }

    /// Stands in for `node`: passes the install check, then answers bridge
    /// commands with canned replies.
    #[cfg(unix)]
    const FAKE_NODE: &str = r##"#!/bin/sh
if [ "$1" = "-e" ]; then exit 0; fi
echo "bridge starting"
echo '{"ready":true}'
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/^{"id":\([0-9]*\).*/\1/p')
  case "$line" in
    *'"op":"close"'*)
      echo "{\"id\":$id,\"ok\":true,\"value\":null}"
      exit 0 ;;
    *'"op":"wait_for"'*'"selector":"#never"'*)
      echo "{\"id\":$id,\"ok\":false,\"error\":{\"kind\":\"timeout\",\"message\":\"Timeout exceeded.\"}}" ;;
    *'"op":"text_content"'*)
      echo "console noise"
      echo '{"id":0,"ok":true,"value":"stale"}'
      echo "{\"id\":$id,\"ok\":true,\"value\":\"hello\"}" ;;
    *)
      echo "{\"id\":$id,\"ok\":true,\"value\":null}" ;;
  esac
done
"##;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_protocol_against_scripted_bridge() {
        use crate::pages::{LoginPage, Page, PageContext};
        use std::os::unix::fs::PermissionsExt;
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("node");
        std::fs::write(&node, FAKE_NODE).unwrap();
        std::fs::set_permissions(&node, std::fs::Permissions::from_mode(0o755)).unwrap();

        let short = Duration::from_millis(200);
        let config = PlaywrightConfig {
            action_timeout: short,
            node_binary: node,
            ..Default::default()
        };
        let session = Arc::new(PlaywrightSession::launch(config).await.unwrap());
        let driver: Arc<dyn BrowserDriver> = session.clone();
        let page = LoginPage::new(PageContext::new(driver, &UiConfig::default()).with_timeouts(short, short));

        let never = Locator::new("#never");
        assert!(!page.is_element_displayed(&never, Some(short)).await.unwrap());
        let err = page.wait_for_element_visible(&never, None).await.unwrap_err();
        assert!(matches!(err, E2eError::Timeout(_)), "{err}");
        page.wait_for_element_visible(&page.login_header, None).await.unwrap();

        let text = session.text_content(&Locator::new("#greeting")).await.unwrap();
        assert_eq!(text.as_deref(), Some("hello"));

        session.close().await.unwrap();
        match session.click(&page.login_btn).await {
            Err(E2eError::Playwright(message)) => assert!(message.ends_with("session already closed"), "{message}"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
