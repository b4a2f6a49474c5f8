//! In-memory [`BrowserDriver`] for page-object unit tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{BrowserDriver, Locator, WaitState};
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeElement {
    pub visible: bool,
    pub text: Option<String>,
    pub class: Option<String>,
}

impl FakeElement {
    pub fn visible() -> Self {
        Self {
            visible: true,
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }
}

#[derive(Default)]
struct FakeState {
    elements: HashMap<Locator, FakeElement>,
    on_click: HashMap<Locator, Vec<(Locator, FakeElement)>>,
    on_goto: HashMap<String, Vec<(Locator, FakeElement)>>,
    actions: Vec<String>,
    closed: bool,
}

#[derive(Default)]
pub(crate) struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, locator: &Locator, element: FakeElement) {
        self.state.lock().unwrap().elements.insert(locator.clone(), element);
    }

    /// Make `target` appear once `trigger` is clicked
    pub fn reveal_on_click(&self, trigger: &Locator, target: &Locator, element: FakeElement) {
        self.state
            .lock()
            .unwrap()
            .on_click
            .entry(trigger.clone())
            .or_default()
            .push((target.clone(), element));
    }

    /// Make `target` appear once `url` is loaded
    pub fn reveal_on_goto(&self, url: &str, target: &Locator, element: FakeElement) {
        self.state
            .lock()
            .unwrap()
            .on_goto
            .entry(url.to_string())
            .or_default()
            .push((target.clone(), element));
    }

    pub fn actions(&self) -> Vec<String> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn record(&self, action: String) {
        self.state.lock().unwrap().actions.push(action);
    }

    fn reaches(&self, locator: &Locator, state: WaitState) -> bool {
        let guard = self.state.lock().unwrap();
        let element = guard.elements.get(locator);
        match state {
            WaitState::Visible => element.map(|e| e.visible).unwrap_or(false),
            WaitState::Hidden => !element.map(|e| e.visible).unwrap_or(false),
            WaitState::Attached => element.is_some(),
            WaitState::Detached => element.is_none(),
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.record(format!("goto:{}", url));
        let mut guard = self.state.lock().unwrap();
        if let Some(reveals) = guard.on_goto.get(url).cloned() {
            guard.elements.extend(reveals);
        }
        Ok(())
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        if self.reaches(locator, state) {
            return Ok(());
        }
        tokio::time::sleep(timeout).await;
        if self.reaches(locator, state) {
            Ok(())
        } else {
            Err(E2eError::Timeout(format!("{} to be {:?}", locator, state)))
        }
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.record(format!("click:{}", locator));
        let mut guard = self.state.lock().unwrap();
        if !guard.elements.contains_key(locator) {
            return Err(E2eError::Playwright(format!("no element matches {}", locator)));
        }
        if let Some(reveals) = guard.on_click.get(locator).cloned() {
            guard.elements.extend(reveals);
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.record(format!("fill:{}={}", locator, value));
        Ok(())
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let guard = self.state.lock().unwrap();
        Ok(guard.elements.get(locator).and_then(|e| e.text.clone()))
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let guard = self.state.lock().unwrap();
        Ok(match name {
            "class" => guard.elements.get(locator).and_then(|e| e.class.clone()),
            _ => None,
        })
    }

    async fn screenshot(&self, path: &Path) -> E2eResult<()> {
        self.record(format!("screenshot:{}", path.display()));
        Ok(())
    }

    async fn close(&self) -> E2eResult<()> {
        self.record("close".to_string());
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}
