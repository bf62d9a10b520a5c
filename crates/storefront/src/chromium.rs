//! Chrome over CDP.
//!
//! Element work is done by evaluating small scripts built from
//! [`Locator::to_query`], so every call re-resolves the locator against the
//! live document. Clicks are dispatched from a zero-delay timer: an alert
//! opened by the click must not block the evaluation that triggered it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, DialogType as CdpDialogType,
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;

use crate::config::BrowserOptions;
use crate::dialog::{dialog_channel, Dialog, DialogAction, DialogSender, DialogSubscription, DialogType};
use crate::driver::{
    BrowserDriver, ClickOptions, ElementProbe, LoadState, MouseEvent, NavigationResponse,
};
use crate::error::{E2eError, E2eResult};
use crate::locator::{BoundingBox, Locator};

type Subscribers = Arc<Mutex<Vec<DialogSender>>>;

/// One Chrome page driven over CDP
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: tokio::sync::Mutex<CdpBrowser>,
    page: CdpPage,
    subscribers: Subscribers,
    closed: AtomicBool,
    handler: tokio::task::JoinHandle<()>,
    dialogs: tokio::task::JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch Chrome and open a blank page
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be launched or the page cannot be
    /// created
    pub async fn launch(options: &BrowserOptions) -> E2eResult<Self> {
        let mut builder = CdpConfig::builder().window_size(options.viewport_width, options.viewport_height);
        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = options.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder
            .build()
            .map_err(|message| E2eError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| E2eError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(E2eError::driver)?;
        let subscribers: Subscribers = Arc::default();
        let dialogs = spawn_dialog_forwarder(&page, Arc::clone(&subscribers)).await?;
        tracing::info!(headless = options.headless, "chromium launched");

        Ok(Self {
            browser: tokio::sync::Mutex::new(browser),
            page,
            subscribers,
            closed: AtomicBool::new(false),
            handler,
            dialogs,
        })
    }

    /// Close the page and the browser
    ///
    /// # Errors
    ///
    /// Returns error if the browser does not shut down cleanly
    pub async fn close(&self) -> E2eResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.dialogs.abort();
        if let Err(err) = self.page.clone().close().await {
            tracing::warn!(error = %err, "page close failed");
        }
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(E2eError::driver)?;
        self.handler.abort();
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, body: &str) -> E2eResult<T> {
        let script = format!("JSON.stringify((() => {{ {body} }})())");
        let json: String = self
            .page
            .evaluate(script)
            .await
            .map_err(E2eError::driver)?
            .into_value()
            .map_err(E2eError::driver)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Run `action` against the element; the script returns `null` on
    /// success or an error message.
    async fn act(&self, locator: &Locator, action: &str) -> E2eResult<()> {
        let body = format!(
            "const el = {}; if (!el) return 'not attached'; {action} return null;",
            locator.to_query()
        );
        match self.eval::<Option<String>>(&body).await? {
            None => Ok(()),
            Some(message) => Err(E2eError::driver(format!("{locator}: {message}"))),
        }
    }

    async fn dispatch_mouse(&self, kind: DispatchMouseEventType, x: f64, y: f64) -> E2eResult<()> {
        let mut builder = DispatchMouseEventParams::builder().r#type(kind.clone()).x(x).y(y);
        if kind != DispatchMouseEventType::MouseMoved {
            builder = builder.button(MouseButton::Left).click_count(1);
        }
        let params = builder.build().map_err(E2eError::driver)?;
        self.page.execute(params).await.map_err(E2eError::driver)?;
        Ok(())
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType, key: &str) -> E2eResult<()> {
        let mut builder = DispatchKeyEventParams::builder().r#type(kind.clone()).key(key);
        if kind == DispatchKeyEventType::KeyDown {
            if let Some(text) = key_text(key) {
                builder = builder.text(text);
            }
        }
        let params = builder.build().map_err(E2eError::driver)?;
        self.page.execute(params).await.map_err(E2eError::driver)?;
        Ok(())
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.dialogs.abort();
    }
}

async fn spawn_dialog_forwarder(
    page: &CdpPage,
    subscribers: Subscribers,
) -> E2eResult<tokio::task::JoinHandle<()>> {
    let mut events = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(E2eError::driver)?;
    let responder = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let mut dialog = Dialog::new(dialog_type(&event.r#type), event.message.clone());
            if let Some(ref default) = event.default_prompt {
                dialog = dialog.with_default_value(default.clone());
            }
            tracing::debug!(message = dialog.message(), kind = %dialog.dialog_type(), "dialog opened");
            if deliver(&subscribers, &dialog) {
                continue;
            }
            tracing::debug!(message = dialog.message(), "no dialog subscriber, dismissing");
            if let Err(err) = responder.execute(HandleJavaScriptDialogParams::new(false)).await {
                tracing::warn!(error = %err, "dialog auto-dismiss failed");
            }
        }
    }))
}

/// Send to every live subscriber; false when there is none
fn deliver(subscribers: &Subscribers, dialog: &Dialog) -> bool {
    let mut subscribers = subscribers.lock().unwrap_or_else(PoisonError::into_inner);
    subscribers.retain(|tx| !tx.is_closed());
    for tx in subscribers.iter() {
        let _ = tx.send(dialog.clone());
    }
    !subscribers.is_empty()
}

const fn dialog_type(kind: &CdpDialogType) -> DialogType {
    match kind {
        CdpDialogType::Alert => DialogType::Alert,
        CdpDialogType::Confirm => DialogType::Confirm,
        CdpDialogType::Prompt => DialogType::Prompt,
        CdpDialogType::Beforeunload => DialogType::BeforeUnload,
    }
}

/// Text a key press inserts, if any
fn key_text(key: &str) -> Option<&str> {
    match key {
        "Enter" => Some("\r"),
        "Tab" => Some("\t"),
        k if k.chars().count() == 1 => Some(k),
        _ => None,
    }
}

fn probe_script(locator: &Locator) -> String {
    format!(
        "const el = {}; \
         if (!el) return {{ attached: false, visible: false, enabled: false, editable: false }}; \
         const style = getComputedStyle(el); const rect = el.getBoundingClientRect(); \
         const visible = rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none'; \
         const enabled = !el.disabled; \
         const editable = enabled && !el.readOnly && (el.isContentEditable || ['INPUT', 'TEXTAREA', 'SELECT'].includes(el.tagName)); \
         return {{ attached: true, visible, enabled, editable }};",
        locator.to_query()
    )
}

fn click_action(options: ClickOptions) -> &'static str {
    if options.click_count >= 2 {
        "el.scrollIntoView({ block: 'center' }); \
         setTimeout(() => { el.click(); el.click(); el.dispatchEvent(new MouseEvent('dblclick', { bubbles: true })); }, 0);"
    } else {
        "el.scrollIntoView({ block: 'center' }); setTimeout(() => el.click(), 0);"
    }
}

fn fill_action(value: &str, force: bool) -> E2eResult<String> {
    let value = serde_json::to_string(value)?;
    let guard = if force {
        ""
    } else {
        "if (el.disabled || el.readOnly) return 'not editable'; "
    };
    Ok(format!(
        "{guard}el.focus(); \
         const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
         const setter = Object.getOwnPropertyDescriptor(proto, 'value').set; \
         setter.call(el, {value}); \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }}));"
    ))
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(
        &self,
        url: &str,
        wait_until: LoadState,
        timeout: Duration,
    ) -> E2eResult<NavigationResponse> {
        let navigation = async {
            self.page.goto(url).await?;
            if wait_until == LoadState::NetworkIdle {
                self.page.wait_for_navigation().await?;
            }
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| E2eError::Navigation {
                url: url.to_string(),
                message: format!("{wait_until} not reached within {}ms", timeout.as_millis()),
            })?
            .map_err(|e| E2eError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status: Option<u16> = self
            .eval(
                "const nav = performance.getEntriesByType('navigation')[0]; \
                 return nav && nav.responseStatus ? nav.responseStatus : null;",
            )
            .await?;
        Ok(NavigationResponse {
            url: self.current_url().await?,
            status,
        })
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(E2eError::driver)?
            .unwrap_or_default())
    }

    async fn reload(&self, wait_until: LoadState) -> E2eResult<()> {
        self.page.reload().await.map_err(E2eError::driver)?;
        if wait_until == LoadState::NetworkIdle {
            self.page.wait_for_navigation().await.map_err(E2eError::driver)?;
        }
        Ok(())
    }

    async fn probe(&self, locator: &Locator) -> E2eResult<ElementProbe> {
        self.eval(&probe_script(locator)).await
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        self.eval(&format!("return {};", locator.to_count_query())).await
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        self.eval(&format!(
            "const el = {}; return el ? el.textContent : null;",
            locator.to_query()
        ))
        .await
    }

    async fn inner_text(&self, locator: &Locator) -> E2eResult<Option<String>> {
        self.eval(&format!(
            "const el = {}; return el ? (el.innerText ?? el.textContent) : null;",
            locator.to_query()
        ))
        .await
    }

    async fn input_value(&self, locator: &Locator) -> E2eResult<String> {
        let value: Option<String> = self
            .eval(&format!(
                "const el = {}; return el && 'value' in el ? String(el.value) : null;",
                locator.to_query()
            ))
            .await?;
        value.ok_or_else(|| E2eError::driver(format!("{locator} is not an input")))
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let name = serde_json::to_string(name)?;
        self.eval(&format!(
            "const el = {}; return el ? el.getAttribute({name}) : null;",
            locator.to_query()
        ))
        .await
    }

    async fn bounding_box(&self, locator: &Locator) -> E2eResult<Option<BoundingBox>> {
        self.eval(&format!(
            "const el = {}; if (!el) return null; const r = el.getBoundingClientRect(); \
             if (r.width === 0 && r.height === 0) return null; \
             return {{ x: r.x, y: r.y, width: r.width, height: r.height }};",
            locator.to_query()
        ))
        .await
    }

    async fn click(&self, locator: &Locator, options: ClickOptions) -> E2eResult<()> {
        self.act(locator, click_action(options)).await
    }

    async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        let rect = self
            .bounding_box(locator)
            .await?
            .ok_or_else(|| E2eError::BoundingBox {
                locator: locator.to_string(),
            })?;
        let center = rect.center();
        self.dispatch_mouse(DispatchMouseEventType::MouseMoved, center.x, center.y)
            .await
    }

    async fn fill(&self, locator: &Locator, value: &str, force: bool) -> E2eResult<()> {
        self.act(locator, &fill_action(value, force)?).await
    }

    async fn clear(&self, locator: &Locator) -> E2eResult<()> {
        self.act(locator, &fill_action("", true)?).await
    }

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.act(locator, "el.focus();").await?;
        self.dispatch_key(DispatchKeyEventType::KeyDown, key).await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, key).await
    }

    async fn set_checked(&self, locator: &Locator, checked: bool) -> E2eResult<()> {
        self.act(
            locator,
            &format!(
                "if (el.type !== 'checkbox' && el.type !== 'radio') return 'not a checkbox'; \
                 if (el.checked !== {checked}) el.click();"
            ),
        )
        .await
    }

    async fn scroll_into_view(&self, locator: &Locator) -> E2eResult<()> {
        self.act(locator, "el.scrollIntoView({ block: 'center', inline: 'center' });")
            .await
    }

    async fn mouse(&self, event: MouseEvent) -> E2eResult<()> {
        match event {
            MouseEvent::Move(p) => self.dispatch_mouse(DispatchMouseEventType::MouseMoved, p.x, p.y).await,
            MouseEvent::Down(p) => self.dispatch_mouse(DispatchMouseEventType::MousePressed, p.x, p.y).await,
            MouseEvent::Up(p) => self.dispatch_mouse(DispatchMouseEventType::MouseReleased, p.x, p.y).await,
        }
    }

    async fn subscribe_dialogs(&self) -> E2eResult<DialogSubscription> {
        let (tx, rx) = dialog_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Ok(rx)
    }

    async fn respond_to_dialog(&self, action: &DialogAction) -> E2eResult<()> {
        let mut params = HandleJavaScriptDialogParams::new(action.accepts());
        params.prompt_text = action.prompt_text().map(str::to_string);
        self.page.execute(params).await.map_err(|e| E2eError::Dialog {
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn screenshot(&self, full_page: bool) -> E2eResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .capture_beyond_viewport(full_page)
            .build();
        let shot = self
            .page
            .execute(params)
            .await
            .map_err(|e| E2eError::Screenshot {
                message: e.to_string(),
            })?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(|e| E2eError::Screenshot {
                message: e.to_string(),
            })
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
