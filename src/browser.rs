use crate::config::html;
use crate::viewport::{Measurements, Size};
use anyhow::{anyhow, Result};
use js_sys::Uint8Array;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosure};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    CanvasRenderingContext2d,
    Document,
    Event,
    EventTarget,
    HtmlCanvasElement,
    HtmlElement,
    Response,
    Window,
};

pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn canvas(id: &str) -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{}'", id))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn context(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    canvas
        .get_context(html::CONTEXT_2D)
        // Result<Option<Object>, JsValue>
        // - JsValue error mapped to anyhow
        // - None mapped to an error of its own
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

/// Optional page element, `None` when the page doesn't have it
pub fn element(id: &str) -> Result<Option<HtmlElement>> {
    Ok(document()?
        .get_element_by_id(id)
        .and_then(|element| element.dyn_into::<HtmlElement>().ok()))
}

/// `document.readyState == "complete"`, the `load` event has already fired
pub fn is_loaded() -> Result<bool> {
    Ok(document()?.ready_state() == "complete")
}

/// Milliseconds, same clock as the requestAnimationFrame timestamp
pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn closure_once(f: impl FnOnce() + 'static) -> Closure<dyn FnMut()> {
    Closure::once(f)
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f) as Box<dyn FnMut(f64)>)
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

/// Run `f` once after `seconds`, there is no way to cancel it
pub fn set_timeout(seconds: f64, f: impl FnOnce() + 'static) -> Result<i32> {
    let callback = closure_once(f);
    let handle = window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            (seconds * 1000.0).round() as i32,
        )
        .map_err(|err| anyhow!("Cannot set timeout {:#?}", err))?;
    // keep the callback alive until the timer fires
    callback.forget();
    Ok(handle)
}

/// Listener that lives as long as the page
pub fn add_listener(
    target: &EventTarget,
    event: &str,
    f: impl FnMut(Event) + 'static,
) -> Result<()> {
    let callback = closure_wrap(Box::new(f) as Box<dyn FnMut(Event)>);
    target
        .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot listen for '{}' : {:#?}", event, err))?;
    callback.forget();
    Ok(())
}

/// Window, document element and body sizes, whichever the browser fills in
pub fn measurements() -> Result<Measurements> {
    let window = window()?;
    let document = document()?;
    let inner = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).map(|v| v as i32);
    Ok(Measurements {
        window: Some(Size {
            width: inner(window.inner_width()).unwrap_or(0),
            height: inner(window.inner_height()).unwrap_or(0),
        }),
        document: document.document_element().map(|element| Size {
            width: element.client_width(),
            height: element.client_height(),
        }),
        body: document.body().map(|body| Size {
            width: body.client_width(),
            height: body.client_height(),
        }),
    })
}

pub async fn fetch_bytes(resource: &str) -> Result<Vec<u8>> {
    let resp_value = fetch_with_str(resource).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!(
            "fetching {} failed with status {}",
            resource,
            resp.status()
        ));
    }
    let buffer = resp
        .array_buffer()
        .map_err(|err| anyhow!("Could not get bytes from response [{:#?}]", err))?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|err| anyhow!("error reading body [{:#?}]", err))?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}
