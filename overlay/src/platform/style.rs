//! Extended window style bits
//!
//! The values are the Win32 `WS_EX_*` constants. Other backends translate
//! each bit into their own mechanism (X11: input shape, `WM_HINTS`, EWMH state).

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Platform-neutral extended window style bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExtendedStyle(u32);

impl ExtendedStyle {
    pub const NONE: Self = Self(0);
    /// Composited with per-pixel alpha
    pub const LAYERED: Self = Self(0x0008_0000);
    /// Pointer input falls through to the window below
    pub const TRANSPARENT: Self = Self(0x0000_0020);
    /// Hidden from the taskbar and task switchers
    pub const TOOL_WINDOW: Self = Self(0x0000_0080);
    /// Never takes focus
    pub const NO_ACTIVATE: Self = Self(0x0800_0000);

    /// Bits that must be present while click-through is on
    pub const CLICK_THROUGH: Self = Self::LAYERED
        .union(Self::TRANSPARENT)
        .union(Self::TOOL_WINDOW)
        .union(Self::NO_ACTIVATE);

    /// Bits cleared when click-through is turned off
    pub const INTERACTIVE_CLEARED: Self = Self::TRANSPARENT.union(Self::NO_ACTIVATE);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Compute the style to write for the requested click-through state.
    ///
    /// Bits outside the managed set are preserved. Turning click-through off
    /// keeps `TOOL_WINDOW` as it was.
    pub const fn with_click_through(self, enabled: bool) -> Self {
        if enabled {
            self.union(Self::CLICK_THROUGH)
        } else {
            self.union(Self::LAYERED).difference(Self::INTERACTIVE_CLEARED)
        }
    }

    /// Whether this style already expresses the requested click-through state
    pub const fn satisfies(self, enabled: bool) -> bool {
        if enabled {
            self.contains(Self::CLICK_THROUGH)
        } else {
            self.contains(Self::LAYERED) && !self.intersects(Self::INTERACTIVE_CLEARED)
        }
    }
}

impl BitOr for ExtendedStyle {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for ExtendedStyle {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for ExtendedStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ExtendedStyle, &str); 4] = [
            (ExtendedStyle::LAYERED, "LAYERED"),
            (ExtendedStyle::TRANSPARENT, "TRANSPARENT"),
            (ExtendedStyle::TOOL_WINDOW, "TOOL_WINDOW"),
            (ExtendedStyle::NO_ACTIVATE, "NO_ACTIVATE"),
        ];

        write!(f, "{:#010x}", self.0)?;
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        if !names.is_empty() {
            write!(f, " [{}]", names.join("|"))?;
        }
        Ok(())
    }
}
