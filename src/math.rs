// Optional `math_*` imports. Modules built without a libm call back into the
// host for transcendental functions, the table below is what they get.

/// One-argument functions, `name(x) -> f64`
pub const UNARY: [(&str, fn(f64) -> f64); 7] = [
    ("exp", f64::exp),
    ("sin", f64::sin),
    ("cos", f64::cos),
    ("tan", f64::tan),
    ("sinh", f64::sinh),
    ("cosh", f64::cosh),
    ("tanh", f64::tanh),
];

/// Two-argument functions, `name(x, y) -> f64`
pub const BINARY: [(&str, fn(f64, f64) -> f64); 1] = [("pow", f64::powf)];

#[cfg(target_arch = "wasm32")]
pub fn math_table() -> crate::env::FunctionTable<wasm_bindgen::JsValue> {
    use wasm_bindgen::closure::Closure;

    let mut table = crate::env::FunctionTable::new();
    for (name, function) in UNARY {
        let closure = Closure::<dyn Fn(f64) -> f64>::new(move |x: f64| function(x));
        table.insert(name.to_string(), closure.into_js_value());
    }
    for (name, function) in BINARY {
        let closure = Closure::<dyn Fn(f64, f64) -> f64>::new(move |x: f64, y: f64| function(x, y));
        table.insert(name.to_string(), closure.into_js_value());
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unary(name: &str) -> fn(f64) -> f64 {
        UNARY
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .unwrap()
    }

    #[test]
    fn table_covers_every_function() {
        let names: Vec<_> = UNARY
            .iter()
            .map(|(name, _)| *name)
            .chain(BINARY.iter().map(|(name, _)| *name))
            .collect();
        assert_eq!(
            names,
            vec!["exp", "sin", "cos", "tan", "sinh", "cosh", "tanh", "pow"]
        );
    }

    #[test]
    fn functions_compute_what_their_names_say() {
        assert_relative_eq!(unary("exp")(1.0), std::f64::consts::E);
        assert_relative_eq!(unary("sin")(std::f64::consts::FRAC_PI_2), 1.0);
        assert_relative_eq!(unary("cos")(0.0), 1.0);
        assert_relative_eq!(unary("tanh")(0.0), 0.0);
        assert_relative_eq!((BINARY[0].1)(2.0, 10.0), 1024.0);
    }
}
