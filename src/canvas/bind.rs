use super::{names, CanvasBridge, Surface};
use crate::env::FunctionTable;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;

// Every import becomes a JS function owned by the import object.
// - `into_js_value` hands the closure over to the JS GC, the module keeps the
// table alive for the lifetime of the page so nothing is ever dropped
macro_rules! bind {
    (@f64 $arg:ident) => { f64 };
    ($table:ident, $bridge:ident, $name:expr, |$($arg:ident),*| $method:ident) => {{
        let bridge = Rc::clone(&$bridge);
        let function = Closure::<dyn Fn($(bind!(@f64 $arg)),*)>::new(move |$($arg: f64),*| {
            bridge.$method($($arg),*);
        });
        $table.insert($name.to_string(), function.into_js_value());
    }};
}

/// Canvas imports for `bridge`, keyed by unprefixed import name
pub fn canvas_table<S: Surface + 'static>(bridge: Rc<CanvasBridge<S>>) -> FunctionTable<JsValue> {
    let mut table = FunctionTable::new();

    bind!(table, bridge, names::CLEAR, | | clear);
    bind!(table, bridge, names::FILL, | | fill);
    bind!(table, bridge, names::FILL_RECT, |x, y, w, h| fill_rect);
    bind!(table, bridge, names::STROKE_RECT, |x, y, w, h| stroke_rect);
    bind!(table, bridge, names::CLEAR_RECT, |x, y, w, h| clear_rect);
    bind!(table, bridge, names::SET_FILL_STYLE, |r, g, b, a| set_fill_style);
    bind!(table, bridge, names::SET_STROKE_STYLE, |r, g, b, a| set_stroke_style);
    bind!(table, bridge, names::SET_LINE_WIDTH, |w| set_line_width);
    bind!(table, bridge, names::SET_TRANSFORM, |a, b, c, d, e, f| set_transform);
    bind!(table, bridge, names::PATH_BEGIN, | | path_begin);
    bind!(table, bridge, names::PATH_CLOSE, | | path_close);
    bind!(table, bridge, names::PATH_FILL, | | path_fill);
    bind!(table, bridge, names::PATH_STROKE, | | path_stroke);
    bind!(table, bridge, names::MOVE_TO, |x, y| move_to);
    bind!(table, bridge, names::LINE_TO, |x, y| line_to);
    bind!(table, bridge, names::CURVE_TO, |a, b, c, d, x, y| curve_to);
    bind!(table, bridge, names::QUADRATIC_CURVE_TO, |a, b, x, y| quadratic_curve_to);
    bind!(table, bridge, names::ARC, |x, y, r, s, e, ccw| arc);
    bind!(table, bridge, names::ELLIPSE, |x, y, rx, ry, rot, s, e, ccw| ellipse);
    bind!(table, bridge, names::RECT, |x, y, w, h| rect);
    bind!(table, bridge, names::DRAW_CIRCLE, |x, y, r| draw_circle);

    // size queries return a value, so they don't fit the macro
    let width_bridge = Rc::clone(&bridge);
    let get_width = Closure::<dyn Fn() -> i32>::new(move || width_bridge.get_width());
    table.insert(names::GET_WIDTH.to_string(), get_width.into_js_value());

    let get_height = Closure::<dyn Fn() -> i32>::new(move || bridge.get_height());
    table.insert(names::GET_HEIGHT.to_string(), get_height.into_js_value());

    table
}
