/// Scan effort/quality level, matching the `SCAN_DEVICE_QUALITY_*`
/// constants bit-for-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    Low = 0,
    Medium = 3,
    #[default]
    High = 8,
    Best = 10,
}

impl Quality {
    /// Longest edge (px) a working image is downscaled to before detection.
    /// Images already smaller than this are left untouched.
    pub(crate) fn max_edge(self) -> u32 {
        match self {
            Quality::Low => 240,
            Quality::Medium => 320,
            Quality::High => 480,
            Quality::Best => 960,
        }
    }

    /// At High and Best quality the preprocessor sharpens twice.
    pub(crate) fn double_sharpen(self) -> bool {
        matches!(self, Quality::High | Quality::Best)
    }

    /// Adaptive-threshold block size: a tighter window at lower quality.
    pub(crate) fn adaptive_block(self) -> u32 {
        if self.double_sharpen() {
            19
        } else {
            13
        }
    }
}
