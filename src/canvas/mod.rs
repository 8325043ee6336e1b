// ==================== Canvas Bridge ====================
// The module draws through a flat table of host functions. Every entry is a
// straight forward to the drawing surface, only two things get translated:
//
// ┌──────────────────────┬──────────────────────────────────────────────┐
// │ Import               │ Surface call                                 │
// ├──────────────────────┼──────────────────────────────────────────────┤
// │ clear / fill         │ clear_rect / fill_rect over (0, 0, w, h)     │
// │ set_*_style(r,g,b,a) │ "rgba(255r,255g,255b,a)" style string        │
// │ draw_circle(x,y,r)   │ arc(x, y, r, 0, 2π)                          │
// │ everything else      │ same name, arguments passed through untouched│
// └──────────────────────┴──────────────────────────────────────────────┘
use crate::viewport::Size;
use std::f64::consts::PI;

#[cfg(target_arch = "wasm32")]
pub mod bind;

/// Import names, before any prefix is applied
pub mod names {
    pub const CLEAR: &str = "clear";
    pub const FILL: &str = "fill";
    pub const FILL_RECT: &str = "fill_rect";
    pub const STROKE_RECT: &str = "stroke_rect";
    pub const CLEAR_RECT: &str = "clear_rect";
    pub const SET_FILL_STYLE: &str = "set_fill_style";
    pub const SET_STROKE_STYLE: &str = "set_stroke_style";
    pub const SET_LINE_WIDTH: &str = "set_line_width";
    pub const SET_TRANSFORM: &str = "set_transform";
    pub const PATH_BEGIN: &str = "path_begin";
    pub const PATH_CLOSE: &str = "path_close";
    pub const PATH_FILL: &str = "path_fill";
    pub const PATH_STROKE: &str = "path_stroke";
    pub const MOVE_TO: &str = "move_to";
    pub const LINE_TO: &str = "line_to";
    pub const CURVE_TO: &str = "curve_to";
    pub const QUADRATIC_CURVE_TO: &str = "quadratic_curve_to";
    pub const ARC: &str = "arc";
    pub const ELLIPSE: &str = "ellipse";
    pub const RECT: &str = "rect";
    pub const DRAW_CIRCLE: &str = "draw_circle";
    pub const GET_WIDTH: &str = "get_width";
    pub const GET_HEIGHT: &str = "get_height";

    pub const ALL: [&str; 23] = [
        CLEAR,
        FILL,
        FILL_RECT,
        STROKE_RECT,
        CLEAR_RECT,
        SET_FILL_STYLE,
        SET_STROKE_STYLE,
        SET_LINE_WIDTH,
        SET_TRANSFORM,
        PATH_BEGIN,
        PATH_CLOSE,
        PATH_FILL,
        PATH_STROKE,
        MOVE_TO,
        LINE_TO,
        CURVE_TO,
        QUADRATIC_CURVE_TO,
        ARC,
        ELLIPSE,
        RECT,
        DRAW_CIRCLE,
        GET_WIDTH,
        GET_HEIGHT,
    ];
}

/// Color with every channel in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    /// CSS style string, color channels scaled to 0..255, alpha kept as is
    /// - no clamping, the canvas decides what to do with out of range values
    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{})",
            255.0 * self.r,
            255.0 * self.g,
            255.0 * self.b,
            self.a
        )
    }
}

/// The subset of `CanvasRenderingContext2d` the bridge forwards to.
///
/// Methods take `&self`, the browser context is a shared handle and the test
/// recorder keeps its log in a `RefCell`.
pub trait Surface {
    fn size(&self) -> Size;

    fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64);
    fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64);

    fn begin_path(&self);
    fn close_path(&self);
    fn fill(&self);
    fn stroke(&self);

    fn move_to(&self, x: f64, y: f64);
    fn line_to(&self, x: f64, y: f64);
    fn bezier_curve_to(&self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn quadratic_curve_to(&self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn arc(&self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool);
    #[allow(clippy::too_many_arguments)]
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
    );
    fn rect(&self, x: f64, y: f64, w: f64, h: f64);

    fn set_fill_style(&self, style: &str);
    fn set_stroke_style(&self, style: &str);
    fn set_line_width(&self, width: f64);
    fn set_transform(&self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64);
}

/// Host side of the canvas imports, one method per import name
pub struct CanvasBridge<S> {
    surface: S,
}

impl<S: Surface> CanvasBridge<S> {
    pub fn new(surface: S) -> Self {
        CanvasBridge { surface }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn clear(&self) {
        let size = self.surface.size();
        self.surface
            .clear_rect(0.0, 0.0, size.width.into(), size.height.into());
    }

    pub fn fill(&self) {
        let size = self.surface.size();
        self.surface
            .fill_rect(0.0, 0.0, size.width.into(), size.height.into());
    }

    pub fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.surface.fill_rect(x, y, w, h);
    }

    pub fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.surface.stroke_rect(x, y, w, h);
    }

    pub fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.surface.clear_rect(x, y, w, h);
    }

    pub fn set_fill_style(&self, r: f64, g: f64, b: f64, a: f64) {
        self.surface.set_fill_style(&Rgba { r, g, b, a }.to_css());
    }

    pub fn set_stroke_style(&self, r: f64, g: f64, b: f64, a: f64) {
        self.surface.set_stroke_style(&Rgba { r, g, b, a }.to_css());
    }

    pub fn set_line_width(&self, width: f64) {
        self.surface.set_line_width(width);
    }

    pub fn set_transform(&self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.surface.set_transform(a, b, c, d, e, f);
    }

    pub fn path_begin(&self) {
        self.surface.begin_path();
    }

    pub fn path_close(&self) {
        self.surface.close_path();
    }

    pub fn path_fill(&self) {
        self.surface.fill();
    }

    pub fn path_stroke(&self) {
        self.surface.stroke();
    }

    pub fn move_to(&self, x: f64, y: f64) {
        self.surface.move_to(x, y);
    }

    pub fn line_to(&self, x: f64, y: f64) {
        self.surface.line_to(x, y);
    }

    pub fn curve_to(&self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.surface.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y);
    }

    pub fn quadratic_curve_to(&self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.surface.quadratic_curve_to(cpx, cpy, x, y);
    }

    /// `anticlockwise` arrives as a wasm i32, anything non-zero counts
    pub fn arc(&self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: f64) {
        self.surface
            .arc(x, y, radius, start, end, anticlockwise != 0.0);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn ellipse(
        &self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start: f64,
        end: f64,
        anticlockwise: f64,
    ) {
        self.surface.ellipse(
            x,
            y,
            radius_x,
            radius_y,
            rotation,
            start,
            end,
            anticlockwise != 0.0,
        );
    }

    pub fn rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.surface.rect(x, y, w, h);
    }

    pub fn draw_circle(&self, x: f64, y: f64, radius: f64) {
        self.surface.arc(x, y, radius, 0.0, 2.0 * PI, false);
    }

    pub fn get_width(&self) -> i32 {
        self.surface.size().width
    }

    pub fn get_height(&self) -> i32 {
        self.surface.size().height
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Surface that writes every call down as a line of text
    #[derive(Default)]
    pub struct Recorder {
        pub size: Size,
        pub calls: RefCell<Vec<String>>,
    }

    impl Recorder {
        pub fn with_size(width: i32, height: i32) -> Self {
            Recorder {
                size: Size { width, height },
                calls: RefCell::new(Vec::new()),
            }
        }

        fn push(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }

        pub fn take(&self) -> Vec<String> {
            self.calls.take()
        }
    }

    impl Surface for Recorder {
        fn size(&self) -> Size {
            self.size
        }
        fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64) {
            self.push(format!("clear_rect {} {} {} {}", x, y, w, h));
        }
        fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64) {
            self.push(format!("fill_rect {} {} {} {}", x, y, w, h));
        }
        fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64) {
            self.push(format!("stroke_rect {} {} {} {}", x, y, w, h));
        }
        fn begin_path(&self) {
            self.push("begin_path".into());
        }
        fn close_path(&self) {
            self.push("close_path".into());
        }
        fn fill(&self) {
            self.push("fill".into());
        }
        fn stroke(&self) {
            self.push("stroke".into());
        }
        fn move_to(&self, x: f64, y: f64) {
            self.push(format!("move_to {} {}", x, y));
        }
        fn line_to(&self, x: f64, y: f64) {
            self.push(format!("line_to {} {}", x, y));
        }
        fn bezier_curve_to(&self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
            self.push(format!(
                "bezier_curve_to {} {} {} {} {} {}",
                cp1x, cp1y, cp2x, cp2y, x, y
            ));
        }
        fn quadratic_curve_to(&self, cpx: f64, cpy: f64, x: f64, y: f64) {
            self.push(format!("quadratic_curve_to {} {} {} {}", cpx, cpy, x, y));
        }
        fn arc(&self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
            self.push(format!(
                "arc {} {} {} {} {:.4} {}",
                x, y, radius, start, end, anticlockwise
            ));
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
            self.push(format!(
                "ellipse {} {} {} {} {} {} {} {}",
                x, y, radius_x, radius_y, rotation, start, end, anticlockwise
            ));
        }
        fn rect(&self, x: f64, y: f64, w: f64, h: f64) {
            self.push(format!("rect {} {} {} {}", x, y, w, h));
        }
        fn set_fill_style(&self, style: &str) {
            self.push(format!("fill_style {}", style));
        }
        fn set_stroke_style(&self, style: &str) {
            self.push(format!("stroke_style {}", style));
        }
        fn set_line_width(&self, width: f64) {
            self.push(format!("line_width {}", width));
        }
        fn set_transform(&self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
            self.push(format!("transform {} {} {} {} {} {}", a, b, c, d, e, f));
        }
    }

    #[test]
    fn rgba_scales_color_channels_but_not_alpha() {
        let color = Rgba { r: 1.0, g: 0.0, b: 0.5, a: 0.25 };
        assert_eq!(color.to_css(), "rgba(255,0,127.5,0.25)");
    }

    #[test]
    fn rgba_forwards_out_of_range_values() {
        let color = Rgba { r: 2.0, g: -1.0, b: 0.0, a: 3.0 };
        assert_eq!(color.to_css(), "rgba(510,-255,0,3)");
    }

    #[test]
    fn clear_and_fill_cover_the_whole_surface() {
        let bridge = CanvasBridge::new(Recorder::with_size(800, 600));
        bridge.clear();
        bridge.set_fill_style(0.0, 0.0, 0.0, 1.0);
        bridge.fill();
        assert_eq!(
            bridge.surface().take(),
            vec![
                "clear_rect 0 0 800 600",
                "fill_style rgba(0,0,0,1)",
                "fill_rect 0 0 800 600",
            ]
        );
    }

    #[test]
    fn circle_is_a_full_arc() {
        let bridge = CanvasBridge::new(Recorder::default());
        bridge.path_begin();
        bridge.draw_circle(10.0, 20.0, 5.0);
        bridge.path_stroke();
        assert_eq!(
            bridge.surface().take(),
            vec!["begin_path", "arc 10 20 5 0 6.2832 false", "stroke"]
        );
    }

    #[test]
    fn path_operations_pass_arguments_through() {
        let bridge = CanvasBridge::new(Recorder::default());
        bridge.move_to(1.0, 2.0);
        bridge.line_to(3.0, 4.0);
        bridge.curve_to(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        bridge.quadratic_curve_to(7.0, 8.0, 9.0, 10.0);
        bridge.arc(0.0, 0.0, -1.0, 0.0, 1.0, 1.0);
        bridge.ellipse(1.0, 1.0, 2.0, 3.0, 0.5, 0.0, 1.0, 0.0);
        bridge.rect(0.0, 0.0, 10.0, 10.0);
        bridge.path_close();
        bridge.path_fill();
        assert_eq!(
            bridge.surface().take(),
            vec![
                "move_to 1 2",
                "line_to 3 4",
                "bezier_curve_to 1 2 3 4 5 6",
                "quadratic_curve_to 7 8 9 10",
                "arc 0 0 -1 0 1.0000 true",
                "ellipse 1 1 2 3 0.5 0 1 false",
                "rect 0 0 10 10",
                "close_path",
                "fill",
            ]
        );
    }

    #[test]
    fn style_and_transform_forwarding() {
        let bridge = CanvasBridge::new(Recorder::default());
        bridge.set_stroke_style(0.0, 1.0, 0.0, 0.5);
        bridge.set_line_width(2.5);
        bridge.set_transform(1.0, 0.0, 0.0, 1.0, 10.0, 20.0);
        bridge.fill_rect(1.0, 2.0, 3.0, 4.0);
        bridge.stroke_rect(5.0, 6.0, 7.0, 8.0);
        bridge.clear_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(
            bridge.surface().take(),
            vec![
                "stroke_style rgba(0,255,0,0.5)",
                "line_width 2.5",
                "transform 1 0 0 1 10 20",
                "fill_rect 1 2 3 4",
                "stroke_rect 5 6 7 8",
                "clear_rect 0 0 1 1",
            ]
        );
    }

    #[test]
    fn size_queries_follow_the_surface() {
        let bridge = CanvasBridge::new(Recorder::with_size(1024, 768));
        assert_eq!((bridge.get_width(), bridge.get_height()), (1024, 768));
    }
}
