use std::{ffi::OsStr, path::PathBuf, sync::Arc};

use headless_chrome::{Browser, LaunchOptions, Tab};

pub fn puppeteer(
    headless: bool,
    proxy: Option<&str>,
    path: Option<PathBuf>,
) -> anyhow::Result<Browser> {
    Browser::new(LaunchOptions {
        args: vec![OsStr::new("--disable-blink-features=AutomationControlled")],
        headless,
        proxy_server: proxy,
        path,
        ..LaunchOptions::default()
    })
}

#[allow(clippy::significant_drop_tightening)]
pub fn first_tab(browser: &Browser) -> anyhow::Result<Arc<Tab>> {
    let tab = browser.new_tab()?;

    {
        let tabs_guard = browser
            .get_tabs()
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        for remain in &*tabs_guard {
            if !Arc::ptr_eq(&tab, remain) {
                remain.close(true)?;
            }
        }
    }

    Ok(tab)
}

pub fn navigate_to(tab: &Tab, url: &str) -> anyhow::Result<()> {
    tab.navigate_to(url)?.wait_until_navigated()?;
    Ok(())
}

/// Clicks the element and types `text` as key presses, so the page's own
/// input handlers (autocomplete and the like) fire.
pub fn type_into(tab: &Tab, selector: &str, text: &str) -> anyhow::Result<()> {
    tab.wait_for_element(selector)?.type_into(text)?;
    Ok(())
}

pub fn click(tab: &Tab, selector: &str) -> anyhow::Result<()> {
    tab.wait_for_element(selector)?.click()?;
    Ok(())
}

/// Overwrites the `value` of a form field and fires `input` and `change`.
pub fn set_value(tab: &Tab, selector: &str, value: &str) -> anyhow::Result<()> {
    tab.wait_for_element(selector)?;

    let selector = serde_json::to_string(selector)?;
    let value = serde_json::to_string(value)?;
    let script = format!(
        "(() => {{ const el = document.querySelector({selector}); \
         el.value = {value}; \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); }})()"
    );
    tab.evaluate(&script, false)?;
    Ok(())
}

pub fn scroll_to_bottom(tab: &Tab) -> anyhow::Result<()> {
    tab.evaluate("window.scrollTo(0, document.body.scrollHeight)", false)?;
    Ok(())
}
