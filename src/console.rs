use log::Level;

/// Log target for everything the module prints
pub const TARGET: &str = "wasm";

/// Map the module's level code onto a `log` level
/// - `1` error, `2` warn, `3` debug, anything else info
pub fn level(code: i32) -> Level {
    match code {
        1 => Level::Error,
        2 => Level::Warn,
        3 => Level::Debug,
        _ => Level::Info,
    }
}

/// Forward one message from the module to the logger
pub fn write(code: i32, message: &str) {
    log::log!(target: TARGET, level(code), "{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_codes() {
        assert_eq!(level(0), Level::Info);
        assert_eq!(level(1), Level::Error);
        assert_eq!(level(2), Level::Warn);
        assert_eq!(level(3), Level::Debug);
        assert_eq!(level(-7), Level::Info);
        assert_eq!(level(42), Level::Info);
    }
}
