use std::fmt;
use std::str::FromStr;

use kontur_core::KonturError;

/// Number of compiled fragment programs. `Original` draws nothing and
/// has no program slot.
pub const PROGRAM_COUNT: usize = 3;

/// The effects the preview renderer knows about.
///
/// Each effect with a fragment program owns a fixed slot in the
/// renderer's pipeline table, so lookups are plain array indexing
/// rather than a keyed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Pass-through: clear the target, draw nothing.
    Original,
    /// BT.601 luma conversion.
    Grayscale,
    /// Sobel edge magnitude.
    Edge,
    /// Per-channel color inversion.
    Invert,
}

impl EffectKind {
    pub const ALL: [EffectKind; 4] = [
        EffectKind::Original,
        EffectKind::Grayscale,
        EffectKind::Edge,
        EffectKind::Invert,
    ];

    /// Pipeline table slot for this effect, or `None` for `Original`.
    pub fn slot(self) -> Option<usize> {
        match self {
            EffectKind::Original => None,
            EffectKind::Grayscale => Some(0),
            EffectKind::Edge => Some(1),
            EffectKind::Invert => Some(2),
        }
    }

    /// WGSL fragment source for this effect, or `None` for `Original`.
    pub fn fragment_source(self) -> Option<&'static str> {
        match self {
            EffectKind::Original => None,
            EffectKind::Grayscale => Some(include_str!("shaders/grayscale.wgsl")),
            EffectKind::Edge => Some(include_str!("shaders/edge.wgsl")),
            EffectKind::Invert => Some(include_str!("shaders/invert.wgsl")),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EffectKind::Original => "original",
            EffectKind::Grayscale => "grayscale",
            EffectKind::Edge => "edge",
            EffectKind::Invert => "invert",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for EffectKind {
    type Err = KonturError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(EffectKind::Original),
            "grayscale" => Ok(EffectKind::Grayscale),
            "edge" => Ok(EffectKind::Edge),
            "invert" => Ok(EffectKind::Invert),
            other => Err(KonturError::config(format!(
                "unknown effect '{other}' (expected original, grayscale, edge, or invert)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_cover_program_table() {
        let mut seen = [false; PROGRAM_COUNT];
        for effect in EffectKind::ALL {
            if let Some(slot) = effect.slot() {
                assert!(slot < PROGRAM_COUNT);
                assert!(!seen[slot], "slot {slot} assigned twice");
                seen[slot] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_original_has_no_program() {
        assert_eq!(EffectKind::Original.slot(), None);
        assert!(EffectKind::Original.fragment_source().is_none());
    }

    #[test]
    fn test_name_round_trip() {
        for effect in EffectKind::ALL {
            let parsed: EffectKind = effect.to_string().parse().unwrap();
            assert_eq!(parsed, effect);
        }
    }

    #[test]
    fn test_unknown_name_is_config_error() {
        let err = "sepia".parse::<EffectKind>().unwrap_err();
        assert!(err.to_string().contains("sepia"));
    }
}
