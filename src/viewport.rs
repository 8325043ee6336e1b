/// Pixel dimensions of the drawing surface
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    /// Layout the module reads back from `size(ptr)`
    /// - width first, then height, both little-endian
    pub fn to_le_bytes(self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&self.width.to_le_bytes());
        bytes[4..].copy_from_slice(&self.height.to_le_bytes());
        bytes
    }
}

/// First usable measurement out of a list of candidates.
///
/// Browsers disagree on which of `window.innerWidth`,
/// `documentElement.clientWidth` and `body.clientWidth` is populated, so the
/// candidates are tried in order and a missing or zero value falls through.
pub fn first_available(candidates: &[Option<i32>]) -> i32 {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| *value != 0)
        .unwrap_or(0)
}

/// Measurements collected from window, document element and body
#[derive(Debug, Default, Clone, Copy)]
pub struct Measurements {
    pub window: Option<Size>,
    pub document: Option<Size>,
    pub body: Option<Size>,
}

impl Measurements {
    /// Width and height are picked independently, same as the `a || b || c`
    /// chains a page script would write
    pub fn resolve(&self) -> Size {
        let sources = [self.window, self.document, self.body];
        Size {
            width: first_available(&sources.map(|size| size.map(|s| s.width))),
            height: first_available(&sources.map(|size| size.map(|s| s.height))),
        }
    }
}
