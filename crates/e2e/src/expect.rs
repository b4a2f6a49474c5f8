//! Polling assertions against the browser
//!
//! Every assertion re-reads the page until it holds or the timeout elapses, so
//! tests never race client-side rendering.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::driver::{BrowserDriver, Locator};
use crate::error::{E2eError, E2eResult};

/// Interval between polls of a UI assertion
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `condition` until it returns true or `timeout` elapses
///
/// The condition is always evaluated at least once. Errors from the condition
/// propagate immediately.
pub async fn wait_for_condition<F, Fut>(mut condition: F, timeout: Duration, interval: Duration) -> E2eResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<bool>>,
{
    let start = Instant::now();
    loop {
        if condition().await? {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(E2eError::Timeout(format!(
                "condition not met within {}ms",
                timeout.as_millis()
            )));
        }
        tokio::time::sleep(interval).await;
    }
}

/// Collapse runs of whitespace and trim, the way rendered text compares
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assert the element's text equals `expected`
pub async fn to_have_text(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    expected: &str,
    timeout: Duration,
) -> E2eResult<()> {
    let expected = normalize_whitespace(expected);
    let wanted = expected.as_str();
    assert_text(driver, locator, timeout, &format!("text {:?}", wanted), move |actual| {
        normalize_whitespace(actual) == wanted
    })
    .await
}

/// Assert the element's text contains `expected`
pub async fn to_contain_text(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    expected: &str,
    timeout: Duration,
) -> E2eResult<()> {
    let expected = normalize_whitespace(expected);
    let wanted = expected.as_str();
    assert_text(driver, locator, timeout, &format!("text containing {:?}", wanted), move |actual| {
        normalize_whitespace(actual).contains(wanted)
    })
    .await
}

/// Assert the element's class list contains `class`
pub async fn to_contain_class(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    class: &str,
    timeout: Duration,
) -> E2eResult<()> {
    let result = wait_for_condition(
        move || async move {
            let classes = driver.attribute(locator, "class").await?;
            Ok(classes.map(|c| has_class(&c, class)).unwrap_or(false))
        },
        timeout,
        POLL_INTERVAL,
    )
    .await;

    match result {
        Err(e) if e.is_timeout() => {
            let actual = driver.attribute(locator, "class").await?;
            Err(E2eError::AssertionFailed(format!(
                "{}: expected class {:?}, found {:?}",
                locator, class, actual
            )))
        }
        other => other,
    }
}

fn has_class(class_attr: &str, class: &str) -> bool {
    class_attr.split_whitespace().any(|c| c == class)
}

async fn assert_text<P>(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    timeout: Duration,
    description: &str,
    predicate: P,
) -> E2eResult<()>
where
    P: Fn(&str) -> bool + Copy,
{
    debug!("Expecting {} on {}", description, locator);
    let result = wait_for_condition(
        move || async move {
            let text = driver.text_content(locator).await?;
            Ok(text.map(|t| predicate(t.as_str())).unwrap_or(false))
        },
        timeout,
        POLL_INTERVAL,
    )
    .await;

    match result {
        Err(e) if e.is_timeout() => {
            let actual = driver.text_content(locator).await?;
            Err(E2eError::AssertionFailed(format!(
                "{}: expected {}, found {:?}",
                locator, description, actual
            )))
        }
        other => other,
    }
}
