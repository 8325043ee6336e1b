use crate::viewport::Size;
use anyhow::{anyhow, ensure, Result};

pub mod state;

pub use self::state::{Event, State};

// ==================== Seams ====================
/// The instantiated module, seen from the controller
pub trait Instance {
    fn init(&mut self) -> Result<()>;
    /// Advance and draw one frame, `dt` in seconds
    fn frame(&mut self, dt: f64) -> Result<()>;
    /// Draw again without advancing time
    fn redraw(&mut self) -> Result<()>;
    /// Tell the module about a new surface size, a no-op without a `resize` export
    fn resize(&mut self, size: Size) -> Result<()>;
    fn timeout(&mut self, elapsed: f64) -> Result<()>;
}

/// Side effects the controller asks of the page
pub trait Host {
    /// Arrange for `Controller::on_frame` to be called on the next animation frame
    fn request_frame(&mut self) -> Result<()>;
    /// Resize the drawing surface's backing store
    fn resize_surface(&mut self, size: Size) -> Result<()>;
}

/// Seconds between two `performance.now()` style millisecond timestamps
/// - never negative: a frame stamped before the resume click counts as zero
pub fn delta_seconds(last: f64, now: f64) -> f64 {
    ((now - last) / 1000.0).max(0.0)
}

// ==================== Controller ====================
/// Owns the instance, the running flag and the last frame timestamp.
///
/// Everything runs on the page's event loop: each handler finishes before the
/// next one starts, so plain `&mut self` is all the synchronisation needed.
/// At most one animation frame is pending at any time.
pub struct Controller<I, H> {
    state: State,
    instance: Option<I>,
    host: H,
    last: f64,
    size: Size,
    frame_pending: bool,
}

impl<I: Instance, H: Host> Controller<I, H> {
    pub fn new(host: H) -> Self {
        Controller {
            state: State::Uninitialized,
            instance: None,
            host,
            last: 0.0,
            size: Size::default(),
            frame_pending: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn instance(&self) -> Option<&I> {
        self.instance.as_ref()
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Page loaded, the fetch is about to start
    pub fn begin_loading(&mut self) -> Result<()> {
        ensure!(
            self.state == State::Uninitialized,
            "cannot start loading while {}",
            self.state.name()
        );
        self.apply(Event::Load);
        Ok(())
    }

    /// Take ownership of a freshly instantiated module and run `init()`.
    ///
    /// A module that starts paused is drawn once so the page isn't blank.
    pub fn attach(&mut self, mut instance: I, now: f64, running: bool) -> Result<()> {
        ensure!(
            self.state == State::Loading,
            "cannot attach a module while {}",
            self.state.name()
        );
        instance.init()?;
        self.instance = Some(instance);
        self.apply(Event::Ready { running });
        if running {
            self.last = now;
            self.schedule_frame()?;
        } else {
            self.redraw()?;
        }
        log::info!("module ready, {}", self.state.name());
        Ok(())
    }

    pub fn start(&mut self, now: f64) -> Result<State> {
        self.handle(Event::Start, now)
    }

    /// Stopping never schedules anything, a frame already requested still runs
    pub fn stop(&mut self) -> Result<State> {
        Ok(self.apply(Event::Stop))
    }

    pub fn toggle(&mut self, now: f64) -> Result<State> {
        self.handle(Event::Toggle, now)
    }

    fn handle(&mut self, event: Event, now: f64) -> Result<State> {
        let previous = self.state;
        let next = self.apply(event);
        if next == State::Running && previous != State::Running {
            self.last = now;
            self.schedule_frame()?;
        }
        Ok(next)
    }

    fn apply(&mut self, event: Event) -> State {
        let next = self.state.transition(event);
        if next != self.state {
            log::debug!("lifecycle: {} -> {}", self.state.name(), next.name());
            self.state = next;
        }
        next
    }

    fn schedule_frame(&mut self) -> Result<()> {
        if !self.frame_pending {
            self.host.request_frame()?;
            self.frame_pending = true;
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        match self.instance.as_mut() {
            Some(instance) => instance.redraw(),
            None => Ok(()),
        }
    }

    /// Animation frame callback.
    ///
    /// A frame that was already requested when the loop got stopped still runs
    /// once; the running flag is only consulted before asking for the next one.
    pub fn on_frame(&mut self, now: f64) -> Result<()> {
        self.frame_pending = false;
        let instance = match self.instance.as_mut() {
            Some(instance) => instance,
            None => return Ok(()),
        };
        let dt = delta_seconds(self.last, now);
        instance.frame(dt)?;
        self.last = now;
        if self.state.is_running() {
            self.schedule_frame()?;
        }
        Ok(())
    }

    /// Window resize, valid in any state.
    ///
    /// Once a module is attached it hears about the new size, and a paused
    /// module is redrawn so the still frame matches the surface.
    pub fn on_resize(&mut self, size: Size) -> Result<()> {
        self.size = size;
        self.host.resize_surface(size)?;
        log::info!("resize: {} x {}", size.width, size.height);
        if let Some(instance) = self.instance.as_mut() {
            instance.resize(size)?;
            if self.state == State::Paused {
                instance.redraw()?;
            }
        }
        Ok(())
    }

    /// Expiry of a timer the module asked for through the `timeout` import
    pub fn on_timeout(&mut self, elapsed: f64) -> Result<()> {
        self.instance
            .as_mut()
            .ok_or_else(|| anyhow!("timer fired with no module attached"))?
            .timeout(elapsed)
    }
}
