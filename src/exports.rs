// Modules come in a few shapes when it comes to per-frame exports:
//
// ┌────────────┬────────────────────┬──────────────────┬──────────────┐
// │ FrameMode  │ exports present    │ every frame      │ forced redraw│
// ├────────────┼────────────────────┼──────────────────┼──────────────┤
// │ Split      │ step + render      │ step(dt) render()│ render()     │
// │ Combined   │ render             │ render(dt)       │ render(0)    │
// │ DrawOnly   │ draw               │ draw()           │ draw()       │
// └────────────┴────────────────────┴──────────────────┴──────────────┘
//
// dt is always in seconds.

pub const INIT: &str = "init";
pub const STEP: &str = "step";
pub const RENDER: &str = "render";
pub const DRAW: &str = "draw";
pub const RESIZE: &str = "resize";
pub const TIMEOUT: &str = "timeout";
pub const MEMORY: &str = "memory";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    Split,
    Combined,
    DrawOnly,
}

/// One call into the module: export name plus an optional float argument
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportCall {
    pub name: &'static str,
    pub arg: Option<f64>,
}

impl ExportCall {
    fn bare(name: &'static str) -> Self {
        ExportCall { name, arg: None }
    }

    fn with(name: &'static str, arg: f64) -> Self {
        ExportCall {
            name,
            arg: Some(arg),
        }
    }
}

impl FrameMode {
    /// Pick a mode from the exports the module actually has.
    ///
    /// With none of them present `Combined` is assumed, the missing `render`
    /// then fails on the first frame instead of at load time.
    pub fn detect(has_export: impl Fn(&str) -> bool) -> Self {
        match (has_export(STEP), has_export(RENDER), has_export(DRAW)) {
            (true, true, _) => FrameMode::Split,
            (_, true, _) => FrameMode::Combined,
            (_, false, true) => FrameMode::DrawOnly,
            _ => FrameMode::Combined,
        }
    }

    /// Calls for one animation frame, in order
    pub fn frame_calls(self, dt: f64) -> Vec<ExportCall> {
        match self {
            FrameMode::Split => vec![ExportCall::with(STEP, dt), ExportCall::bare(RENDER)],
            FrameMode::Combined => vec![ExportCall::with(RENDER, dt)],
            FrameMode::DrawOnly => vec![ExportCall::bare(DRAW)],
        }
    }

    /// The single call used to repaint without advancing time
    pub fn redraw_call(self) -> ExportCall {
        match self {
            FrameMode::Split => ExportCall::bare(RENDER),
            FrameMode::Combined => ExportCall::with(RENDER, 0.0),
            FrameMode::DrawOnly => ExportCall::bare(DRAW),
        }
    }
}
