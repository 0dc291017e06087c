use tracing::trace;

const WDL_MARKER: &str = " wdl ";

/// Win/draw/loss permille triple, always from White's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wdl {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl Wdl {
    /// Even split used when the engine reports nothing.
    pub const UNKNOWN: Wdl = Wdl::new(333, 334, 333);

    pub const fn new(win: u32, draw: u32, loss: u32) -> Self {
        Self { win, draw, loss }
    }

    /// Swaps win and loss, i.e. the same distribution seen by the other side.
    pub const fn flipped(self) -> Self {
        Self::new(self.loss, self.draw, self.win)
    }

    /// Applies the ` wdl W D L` field of an engine `info` line.
    ///
    /// Returns `false` when the line carries no complete triple. A component
    /// that does not parse keeps its current value.
    pub fn update_from_info(&mut self, line: &str) -> bool {
        let Some(pos) = line.find(WDL_MARKER) else {
            return false;
        };
        let mut fields = line[pos + WDL_MARKER.len()..].split_whitespace();
        let (Some(w), Some(d), Some(l)) = (fields.next(), fields.next(), fields.next()) else {
            return false;
        };

        for (slot, raw) in [(&mut self.win, w), (&mut self.draw, d), (&mut self.loss, l)] {
            match raw.parse() {
                Ok(value) => *slot = value,
                Err(_) => trace!(field = raw, "unparsable wdl field, keeping {}", *slot),
            }
        }
        true
    }
}

impl Default for Wdl {
    fn default() -> Self {
        Self::UNKNOWN
    }
}
