//! Brush and leaf contents flags.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// What occupies a brush or a BSP leaf.
    ///
    /// A leaf holding several brushes carries the union of their flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Contents: u32 {
        const SOLID = 0x1;
        const WINDOW = 0x2;
        const AUX = 0x4;
        const LAVA = 0x8;
        const SLIME = 0x10;
        const WATER = 0x20;
        const MIST = 0x40;

        const AREA_PORTAL = 0x8000;
        const PLAYER_CLIP = 0x10000;
        const MONSTER_CLIP = 0x20000;

        /// Removed before compiling; marks an entity origin.
        const ORIGIN = 0x100_0000;
        /// Does not take part in visibility; may be kept out of CSG.
        const DETAIL = 0x800_0000;
        const TRANSLUCENT = 0x1000_0000;
        const LADDER = 0x2000_0000;
    }
}

impl Contents {
    /// Liquids and other non-solid volumes the player can be inside.
    pub const LIQUID: Contents = Contents::LAVA.union(Contents::SLIME).union(Contents::WATER);

    /// Returns `true` for contents that block faces behind them.
    #[inline]
    pub fn is_solid(self) -> bool {
        self.contains(Contents::SOLID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_contents() {
        let c = Contents::SOLID | Contents::DETAIL;
        assert!(c.is_solid());
        assert!(c.contains(Contents::DETAIL));
        assert_eq!(c.bits(), 0x800_0001);
    }

    #[test]
    fn liquid_is_not_solid() {
        assert!(!Contents::LIQUID.is_solid());
        assert!(Contents::LIQUID.contains(Contents::WATER));
        assert!(Contents::default().is_empty());
    }
}
