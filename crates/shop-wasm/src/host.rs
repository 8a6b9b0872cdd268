//! # Browser Widget Host
//!
//! `WidgetHost` backed by the real page: script injection, DOM lookups,
//! `setTimeout` and the `Primer` global the vendor script installs.

use async_trait::async_trait;
use futures::channel::oneshot;
use js_sys::{Function, Object, Promise, Reflect};
use shop_core::{CheckoutError, CheckoutResult, ClientToken, PaymentOutcome, WidgetHost};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlScriptElement, Window};

/// Global installed by the checkout script
const WIDGET_GLOBAL: &str = "Primer";

type OutcomeSender = Rc<RefCell<Option<oneshot::Sender<PaymentOutcome>>>>;

/// Handle to the page the widget runs in
pub struct BrowserHost {
    window: Window,
    document: Document,
    outcome_tx: OutcomeSender,
    outcome_rx: RefCell<Option<oneshot::Receiver<PaymentOutcome>>>,
}

impl BrowserHost {
    pub fn new() -> CheckoutResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| CheckoutError::Internal("no global window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| CheckoutError::Internal("window has no document".to_string()))?;

        let (tx, rx) = oneshot::channel();
        Ok(Self {
            window,
            document,
            outcome_tx: Rc::new(RefCell::new(Some(tx))),
            outcome_rx: RefCell::new(Some(rx)),
        })
    }

    fn widget_global(&self) -> Option<JsValue> {
        Reflect::get(&self.window, &JsValue::from_str(WIDGET_GLOBAL))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null())
    }
}

#[async_trait(?Send)]
impl WidgetHost for BrowserHost {
    fn widget_loaded(&self) -> bool {
        self.widget_global().is_some()
    }

    async fn load_script(&self, url: &str) -> CheckoutResult<()> {
        let script: HtmlScriptElement = self
            .document
            .create_element("script")
            .map_err(|e| CheckoutError::ScriptLoad(js_error_message(&e)))?
            .dyn_into()
            .map_err(|_| CheckoutError::ScriptLoad("not a script element".to_string()))?;
        script.set_src(url);
        script.set_async(true);

        let (tx, rx) = oneshot::channel::<Result<(), String>>();
        let tx = Rc::new(RefCell::new(Some(tx)));

        let on_load = {
            let tx = tx.clone();
            Closure::once_into_js(move || {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(Ok(()));
                }
            })
        };
        let on_error = {
            let url = url.to_string();
            Closure::once_into_js(move || {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(Err(format!("could not load {}", url)));
                }
            })
        };
        script.set_onload(Some(on_load.unchecked_ref()));
        script.set_onerror(Some(on_error.unchecked_ref()));

        let head = self
            .document
            .head()
            .ok_or_else(|| CheckoutError::ScriptLoad("document has no <head>".to_string()))?;
        head.append_child(&script)
            .map_err(|e| CheckoutError::ScriptLoad(js_error_message(&e)))?;

        match rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(msg)) => Err(CheckoutError::ScriptLoad(msg)),
            Err(_) => Err(CheckoutError::ScriptLoad("script load abandoned".to_string())),
        }
    }

    fn container_exists(&self, selector: &str) -> bool {
        self.document
            .query_selector(selector)
            .ok()
            .flatten()
            .is_some()
    }

    async fn sleep(&self, duration: Duration) {
        let window = self.window.clone();
        let ms = duration.as_millis().min(i32::MAX as u128) as i32;
        let promise = Promise::new(&mut |resolve, _reject| {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        });
        let _ = JsFuture::from(promise).await;
    }

    async fn show_checkout(&self, token: &ClientToken, container: &str) -> CheckoutResult<()> {
        let primer = self.widget_global().ok_or_else(|| {
            CheckoutError::WidgetInit(format!("{} global not available", WIDGET_GLOBAL))
        })?;
        let show: Function = Reflect::get(&primer, &JsValue::from_str("showUniversalCheckout"))
            .ok()
            .and_then(|f| f.dyn_into().ok())
            .ok_or_else(|| {
                CheckoutError::WidgetInit("showUniversalCheckout is not a function".to_string())
            })?;

        let options = Object::new();
        set_property(&options, "container", &JsValue::from_str(container))?;
        set_property(
            &options,
            "onCheckoutComplete",
            &on_checkout_complete(self.outcome_tx.clone()),
        )?;
        set_property(
            &options,
            "onCheckoutFail",
            &on_checkout_fail(self.outcome_tx.clone()),
        )?;

        let result = show
            .call2(&primer, &JsValue::from_str(token.as_str()), &options)
            .map_err(|e| CheckoutError::WidgetInit(js_error_message(&e)))?;

        // Newer SDK builds return a promise that rejects on init failure
        if let Some(promise) = result.dyn_ref::<Promise>() {
            JsFuture::from(promise.clone())
                .await
                .map_err(|e| CheckoutError::WidgetInit(js_error_message(&e)))?;
        }

        Ok(())
    }

    async fn next_outcome(&self) -> PaymentOutcome {
        let rx = self.outcome_rx.borrow_mut().take();
        match rx {
            Some(rx) => rx.await.unwrap_or_else(|_| closed_without_result()),
            None => closed_without_result(),
        }
    }
}

fn on_checkout_complete(tx: OutcomeSender) -> JsValue {
    Closure::<dyn FnMut(JsValue)>::new(move |data: JsValue| {
        let payment = property_to_json(&data, "payment");
        deliver(&tx, PaymentOutcome::Completed { payment });
    })
    .into_js_value()
}

fn on_checkout_fail(tx: OutcomeSender) -> JsValue {
    Closure::<dyn FnMut(JsValue, JsValue, JsValue)>::new(
        move |error: JsValue, data: JsValue, handler: JsValue| {
            let payment = Some(property_to_json(&data, "payment")).filter(|p| !p.is_null());
            deliver(
                &tx,
                PaymentOutcome::Failed {
                    error: js_to_json(&error),
                    payment,
                },
            );

            // Let the widget render its own message when it offers to
            let show_error = Reflect::get(&handler, &JsValue::from_str("showErrorMessage"))
                .ok()
                .and_then(|f| f.dyn_into::<Function>().ok());
            if let Some(show_error) = show_error {
                let _ = show_error.call0(&handler);
            }
        },
    )
    .into_js_value()
}

/// First callback wins
fn deliver(tx: &OutcomeSender, outcome: PaymentOutcome) {
    if let Some(tx) = tx.borrow_mut().take() {
        let _ = tx.send(outcome);
    }
}

fn closed_without_result() -> PaymentOutcome {
    PaymentOutcome::Failed {
        error: serde_json::Value::String("checkout closed without a result".to_string()),
        payment: None,
    }
}

fn set_property(target: &Object, key: &str, value: &JsValue) -> CheckoutResult<()> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| CheckoutError::WidgetInit(js_error_message(&e)))
}

fn property_to_json(target: &JsValue, key: &str) -> serde_json::Value {
    Reflect::get(target, &JsValue::from_str(key))
        .map(|v| js_to_json(&v))
        .unwrap_or(serde_json::Value::Null)
}

/// Best-effort conversion of a callback argument
pub(crate) fn js_to_json(value: &JsValue) -> serde_json::Value {
    if value.is_undefined() || value.is_null() {
        return serde_json::Value::Null;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return serde_json::json!({
            "name": String::from(err.name()),
            "message": String::from(err.message()),
        });
    }
    serde_wasm_bindgen::from_value(value.clone())
        .unwrap_or_else(|_| serde_json::Value::String(js_error_message(value)))
}

pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}
