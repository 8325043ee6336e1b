use crate::browser;
use crate::canvas::{bind::canvas_table, CanvasBridge, Surface};
use crate::config::Config;
use crate::console;
use crate::env::Environment;
use crate::exports::{self, ExportCall, FrameMode};
use crate::lifecycle::{Controller, Host, Instance, State};
use crate::loader::{BrowserFetch, ModuleLoader};
use crate::marshal::{clamp_range, Marshaller, MemoryAccess};
use crate::math;
use crate::viewport::Size;
use anyhow::{anyhow, bail, Context, Result};
use js_sys::{Function, Object, Reflect, Uint8Array, WebAssembly};
use once_cell::unsync::OnceCell;
// wasm is single threaded, Rc<RefCell<_>> over Arc<Mutex<_>> everywhere
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement};

pub type SharedController = Rc<RefCell<Controller<WasmInstance, BrowserHost>>>;
pub type SharedLoopClosure = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

// ==================== Surface ====================
/// `Surface` over a real 2d context
pub struct Canvas2d {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl Canvas2d {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let context = browser::context(&canvas)?;
        Ok(Canvas2d { canvas, context })
    }
}

// Arguments go through untouched. A few context methods throw on bad input
// (negative radius), that's the canvas rejecting the call, not our failure.
impl Surface for Canvas2d {
    fn size(&self) -> Size {
        Size {
            width: self.canvas.width() as i32,
            height: self.canvas.height() as i32,
        }
    }

    fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.context.clear_rect(x, y, w, h);
    }

    fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.context.fill_rect(x, y, w, h);
    }

    fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.context.stroke_rect(x, y, w, h);
    }

    fn begin_path(&self) {
        self.context.begin_path();
    }

    fn close_path(&self) {
        self.context.close_path();
    }

    fn fill(&self) {
        self.context.fill();
    }

    fn stroke(&self) {
        self.context.stroke();
    }

    fn move_to(&self, x: f64, y: f64) {
        self.context.move_to(x, y);
    }

    fn line_to(&self, x: f64, y: f64) {
        self.context.line_to(x, y);
    }

    fn bezier_curve_to(&self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.context.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y);
    }

    fn quadratic_curve_to(&self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.context.quadratic_curve_to(cpx, cpy, x, y);
    }

    fn arc(&self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        if let Err(err) = self
            .context
            .arc_with_anticlockwise(x, y, radius, start, end, anticlockwise)
        {
            log::debug!("arc rejected by canvas : {:#?}", err);
        }
    }

    fn ellipse(
        &self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    ) {
        if let Err(err) = self.context.ellipse_with_anticlockwise(
            x,
            y,
            radius_x,
            radius_y,
            rotation,
            start,
            end,
            anticlockwise,
        ) {
            log::debug!("ellipse rejected by canvas : {:#?}", err);
        }
    }

    fn rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.context.rect(x, y, w, h);
    }

    fn set_fill_style(&self, style: &str) {
        self.context.set_fill_style_str(style);
    }

    fn set_stroke_style(&self, style: &str) {
        self.context.set_stroke_style_str(style);
    }

    fn set_line_width(&self, width: f64) {
        self.context.set_line_width(width);
    }

    fn set_transform(&self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        if let Err(err) = self.context.set_transform(a, b, c, d, e, f) {
            log::debug!("transform rejected by canvas : {:#?}", err);
        }
    }
}

// ==================== Memory ====================
/// The module's exported memory, bound once right after instantiation.
///
/// NOTE: never hold on to a `Uint8Array` view; growing the memory detaches
/// the old `ArrayBuffer`, so every access builds a fresh view
#[derive(Clone, Default)]
pub struct LinearMemory {
    memory: Rc<OnceCell<WebAssembly::Memory>>,
}

impl LinearMemory {
    pub fn bind(&self, memory: WebAssembly::Memory) -> Result<()> {
        self.memory
            .set(memory)
            .map_err(|_| anyhow!("module memory is already bound"))
    }

    fn view(&self) -> Option<Uint8Array> {
        self.memory
            .get()
            .map(|memory| Uint8Array::new(&memory.buffer()))
    }
}

impl MemoryAccess for LinearMemory {
    fn read(&self, ptr: u32, len: u32) -> Vec<u8> {
        let view = match self.view() {
            Some(view) => view,
            None => return Vec::new(),
        };
        match clamp_range(view.length() as usize, ptr, len) {
            Some(range) => view.subarray(range.start as u32, range.end as u32).to_vec(),
            None => Vec::new(),
        }
    }

    fn write(&self, ptr: u32, bytes: &[u8]) -> Result<()> {
        let view = self
            .view()
            .ok_or_else(|| anyhow!("module memory is not bound yet"))?;
        let end = ptr
            .checked_add(bytes.len() as u32)
            .filter(|end| *end <= view.length());
        let end = match end {
            Some(end) => end,
            None => bail!("write of {} bytes at {:#x} is out of bounds", bytes.len(), ptr),
        };
        view.subarray(ptr, end).copy_from(bytes);
        Ok(())
    }

    fn byte_length(&self) -> usize {
        self.view().map(|view| view.length() as usize).unwrap_or(0)
    }
}

// ==================== Instance ====================
/// The instantiated module and the exports it was found to have
pub struct WasmInstance {
    exports: Object,
    mode: FrameMode,
}

impl WasmInstance {
    pub fn new(instance: &WebAssembly::Instance) -> Self {
        let exports = instance.exports();
        let mode = FrameMode::detect(|name| function(&exports, name).is_ok());
        log::debug!("frame mode {:?}", mode);
        WasmInstance { exports, mode }
    }

    pub fn memory(&self) -> Result<WebAssembly::Memory> {
        Reflect::get(&self.exports, &JsValue::from_str(exports::MEMORY))
            .map_err(|err| anyhow!("Error reading memory export : {:#?}", err))?
            .dyn_into::<WebAssembly::Memory>()
            .map_err(|_| anyhow!("module does not export its memory"))
    }

    fn call(&self, call: ExportCall) -> Result<()> {
        let export = function(&self.exports, call.name)?;
        let result = match call.arg {
            Some(arg) => export.call1(&JsValue::NULL, &JsValue::from_f64(arg)),
            None => export.call0(&JsValue::NULL),
        };
        result.map_err(|err| anyhow!("`{}` threw : {:#?}", call.name, err))?;
        Ok(())
    }
}

fn function(exports: &Object, name: &str) -> Result<Function> {
    Reflect::get(exports, &JsValue::from_str(name))
        .map_err(|err| anyhow!("Error reading export `{}` : {:#?}", name, err))?
        .dyn_into::<Function>()
        .map_err(|_| anyhow!("module has no `{}` export", name))
}

impl Instance for WasmInstance {
    fn init(&mut self) -> Result<()> {
        self.call(ExportCall {
            name: exports::INIT,
            arg: None,
        })
    }

    fn frame(&mut self, dt: f64) -> Result<()> {
        for call in self.mode.frame_calls(dt) {
            self.call(call)?;
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        self.call(self.mode.redraw_call())
    }

    fn resize(&mut self, size: Size) -> Result<()> {
        let export = match function(&self.exports, exports::RESIZE) {
            Ok(export) => export,
            Err(_) => return Ok(()),
        };
        export
            .call2(
                &JsValue::NULL,
                &JsValue::from(size.width),
                &JsValue::from(size.height),
            )
            .map_err(|err| anyhow!("`resize` threw : {:#?}", err))?;
        Ok(())
    }

    fn timeout(&mut self, elapsed: f64) -> Result<()> {
        self.call(ExportCall {
            name: exports::TIMEOUT,
            arg: Some(elapsed),
        })
    }
}

// ==================== Host ====================
pub struct BrowserHost {
    canvas: HtmlCanvasElement,
    frame: SharedLoopClosure,
}

impl BrowserHost {
    /// `frame` is filled in with the rAF closure once the controller exists
    pub fn new(canvas: HtmlCanvasElement, frame: SharedLoopClosure) -> Self {
        BrowserHost { canvas, frame }
    }
}

impl Host for BrowserHost {
    fn request_frame(&mut self) -> Result<()> {
        let frame = self.frame.borrow();
        browser::request_animation_frame(
            frame
                .as_ref()
                .ok_or_else(|| anyhow!("FrameLoop: Loop is None"))?,
        )?;
        Ok(())
    }

    fn resize_surface(&mut self, size: Size) -> Result<()> {
        self.canvas.set_width(size.width.max(0) as u32);
        self.canvas.set_height(size.height.max(0) as u32);
        Ok(())
    }
}

// ==================== Page ====================
/// Everything the page keeps alive between events
struct Page {
    config: Config,
    controller: SharedController,
    bridge: Rc<CanvasBridge<Canvas2d>>,
    marshaller: Rc<Marshaller<LinearMemory>>,
}

/// Handle returned to the page script
#[wasm_bindgen]
pub struct CanvasHost {
    controller: SharedController,
}

pub(crate) fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}

#[wasm_bindgen]
impl CanvasHost {
    pub fn start(&self) -> Result<(), JsValue> {
        let now = browser::now().map_err(to_js)?;
        self.controller.borrow_mut().start(now).map_err(to_js)?;
        Ok(())
    }

    pub fn stop(&self) -> Result<(), JsValue> {
        self.controller.borrow_mut().stop().map_err(to_js)?;
        Ok(())
    }

    /// Returns whether the loop is running afterwards
    pub fn toggle(&self) -> Result<bool, JsValue> {
        let now = browser::now().map_err(to_js)?;
        let state = self.controller.borrow_mut().toggle(now).map_err(to_js)?;
        Ok(state.is_running())
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.controller.borrow().is_running()
    }

    pub fn state(&self) -> String {
        self.controller.borrow().state().name().to_string()
    }
}

/// Wire the page up and load the module once the page has loaded
pub fn start(config: Config) -> Result<CanvasHost> {
    let canvas = browser::canvas(&config.canvas_id)?;
    let frame: SharedLoopClosure = Rc::new(RefCell::new(None));
    let host = BrowserHost::new(canvas.clone(), frame.clone());
    let controller: SharedController = Rc::new(RefCell::new(Controller::new(host)));

    // the loop closure only holds a Weak, the controller owns the closure
    let weak = Rc::downgrade(&controller);
    *frame.borrow_mut() = Some(browser::create_raf_closure(move |now: f64| {
        if let Some(controller) = weak.upgrade() {
            if let Err(err) = controller.borrow_mut().on_frame(now) {
                log::error!("frame failed : {:#}", err);
            }
        }
    }));

    let page = Rc::new(Page {
        config,
        controller: controller.clone(),
        bridge: Rc::new(CanvasBridge::new(Canvas2d::new(canvas)?)),
        marshaller: Rc::new(Marshaller::new(LinearMemory::default())),
    });

    listen_resize(&page)?;
    listen_buttons(&page)?;

    if browser::is_loaded()? {
        on_load(page)?;
    } else {
        let window = browser::window()?;
        let mut pending = Some(page);
        browser::add_listener(&window, "load", move |_| {
            if let Some(page) = pending.take() {
                if let Err(err) = on_load(page) {
                    log::error!("could not load module : {:#}", err);
                }
            }
        })?;
    }

    Ok(CanvasHost { controller })
}

fn listen_resize(page: &Rc<Page>) -> Result<()> {
    let controller = page.controller.clone();
    let window = browser::window()?;
    browser::add_listener(&window, "resize", move |_| {
        if let Err(err) = resize(&controller) {
            log::error!("resize failed : {:#}", err);
        }
    })
}

fn resize(controller: &SharedController) -> Result<()> {
    let size = browser::measurements()?.resolve();
    controller.borrow_mut().on_resize(size)
}

fn listen_buttons(page: &Rc<Page>) -> Result<()> {
    if let Some(button) = browser::element(&page.config.pause_button_id)? {
        let controller = page.controller.clone();
        let label = button.clone();
        browser::add_listener(&button, "click", move |_| {
            let toggled = browser::now().and_then(|now| controller.borrow_mut().toggle(now));
            match toggled {
                Ok(state) => set_pause_label(&label, state),
                Err(err) => log::error!("toggle failed : {:#}", err),
            }
        })?;
    }
    if let Some(button) = browser::element(&page.config.stop_button_id)? {
        let controller = page.controller.clone();
        let pause_label = browser::element(&page.config.pause_button_id)?;
        browser::add_listener(&button, "click", move |_| {
            match controller.borrow_mut().stop() {
                Ok(state) => {
                    if let Some(label) = &pause_label {
                        set_pause_label(label, state);
                    }
                }
                Err(err) => log::error!("stop failed : {:#}", err),
            }
        })?;
    }
    Ok(())
}

fn set_pause_label(button: &HtmlElement, state: State) {
    button.set_inner_text(if state.is_running() { "Pause" } else { "Resume" });
}

fn on_load(page: Rc<Page>) -> Result<()> {
    page.controller.borrow_mut().begin_loading()?;
    resize(&page.controller)?;

    let imports = environment(&page.config, &page.controller, &page.bridge, &page.marshaller)
        .to_import_object(&page.config.import_namespace)
        .context("Failed to build the import object")?;
    let loader = ModuleLoader::new(BrowserFetch).cache_busting(page.config.cache_bust);

    browser::spawn_local(async move {
        let path = page.config.module_path.clone();
        let attached = match loader.load(&path, &imports).await {
            Ok(instance) => attach(&page, &instance),
            Err(err) => Err(err),
        };
        match attached {
            Ok(()) => log::info!("{} loaded", path),
            Err(err) => log::error!("could not start {} : {:#}", path, err),
        }
    });
    Ok(())
}

fn attach(page: &Page, instance: &WebAssembly::Instance) -> Result<()> {
    let now = browser::now()?;
    attach_instance(
        &page.controller,
        &page.marshaller,
        instance,
        now,
        page.config.start_running,
    )?;
    if let Some(label) = browser::element(&page.config.pause_button_id)? {
        set_pause_label(&label, page.controller.borrow().state());
    }
    Ok(())
}

/// Bind the module's memory, then hand the module to the controller
pub fn attach_instance(
    controller: &SharedController,
    marshaller: &Marshaller<LinearMemory>,
    instance: &WebAssembly::Instance,
    now: f64,
    running: bool,
) -> Result<()> {
    let instance = WasmInstance::new(instance);
    // bound before init(), the module may log from there
    marshaller.memory().bind(instance.memory()?)?;
    controller.borrow_mut().attach(instance, now, running)
}

// ==================== Imports ====================
/// Every import the module can link against, keyed by its final name
pub fn environment(
    config: &Config,
    controller: &SharedController,
    bridge: &Rc<CanvasBridge<Canvas2d>>,
    marshaller: &Rc<Marshaller<LinearMemory>>,
) -> Environment<JsValue> {
    let mut env = Environment::new();

    let console_marshaller = marshaller.clone();
    let console_import = Closure::<dyn Fn(i32, i32, i32)>::new(move |level: i32, ptr: i32, len: i32| {
        console::write(level, &console_marshaller.read_str(ptr as u32, len as u32));
    });
    env.insert("console", console_import.into_js_value());

    let controller = Rc::downgrade(controller);
    let timeout = Closure::<dyn Fn(f64)>::new(move |seconds: f64| {
        if let Err(err) = schedule_timeout(controller.clone(), seconds) {
            log::error!("timeout failed : {:#}", err);
        }
    });
    env.insert("timeout", timeout.into_js_value());

    let size_bridge = bridge.clone();
    let size_marshaller = marshaller.clone();
    let size = Closure::<dyn Fn(i32)>::new(move |ptr: i32| {
        let size = size_bridge.surface().size();
        if let Err(err) = size_marshaller.write_size(ptr as u32, size) {
            log::error!("size query failed : {:#}", err);
        }
    });
    env.insert("size", size.into_js_value());

    env.import(&canvas_table(bridge.clone()), Some(config.canvas_prefix.as_str()));
    if let Some(prefix) = &config.math_prefix {
        env.import(&math::math_table(), Some(prefix.as_str()));
    }
    log::debug!("imports: {}", env.names().collect::<Vec<_>>().join(", "));
    env
}

fn schedule_timeout(
    controller: Weak<RefCell<Controller<WasmInstance, BrowserHost>>>,
    seconds: f64,
) -> Result<()> {
    let requested = browser::now()?;
    browser::set_timeout(seconds, move || {
        let controller = match controller.upgrade() {
            Some(controller) => controller,
            None => return,
        };
        let fired = browser::now()
            .map(|now| (now - requested) / 1000.0)
            .and_then(|elapsed| controller.borrow_mut().on_timeout(elapsed));
        if let Err(err) = fired {
            log::error!("timeout callback failed : {:#}", err);
        }
    })?;
    Ok(())
}
