//! Sticker calibrations
//!
//! Reference signatures measured by hand on the v1 square PCB (common-anode
//! RGB LED, photodiode, 300/500 µs settle). Each row is
//! `[red, green, blue, infrared]` in raw 10-bit ADC units after ambient
//! cancellation.
//!
//! The same measurements back two tables: the full four-channel one, and a
//! color-only one where IR is left to presence detection.

use crate::domain::signature::{ChannelPolicy, SIGNATURE_CHANNELS};
use crate::domain::sticker::{
    ClassifierConfig, NotationMap, StickerClassifier, StickerTable, EMPTY_LABEL,
};
use crate::error::ConfigError;

/// Notation used for the empty square
pub const EMPTY_NOTATION: char = '-';

/// A named calibration: sticker references plus their notation
#[derive(Clone, Copy, Debug)]
pub struct Calibration {
    /// Board revision this was measured on
    pub name: &'static str,
    /// `(label, [R, G, B, IR])` in table order
    pub stickers: &'static [(&'static str, [u16; SIGNATURE_CHANNELS])],
    /// `(label, notation)`; white is uppercase, black lowercase (PNBRQK)
    pub notation: &'static [(&'static str, char)],
}

impl Calibration {
    /// v1 square PCB, 13 stickers
    pub const PCB_V1: Self = Self {
        name: "pcb-v1",
        stickers: &[
            (EMPTY_LABEL, [0, 0, 0, 478]),
            ("Red", [72, 5, 9, 716]),
            ("Green", [2, 41, 10, 673]),
            ("Blue", [5, 65, 110, 659]),
            ("Gold", [107, 126, 128, 758]),
            ("LightBlue", [31, 99, 165, 720]),
            ("White", [103, 141, 236, 783]),
            ("Pink", [100, 19, 91, 796]),
            ("Silver", [82, 118, 188, 692]),
            ("Purple", [23, 14, 68, 742]),
            ("Gray", [18, 22, 33, 547]),
            ("LightGreen", [11, 53, 11, 655]),
            ("Black", [3, 4, 7, 494]),
        ],
        notation: &[
            (EMPTY_LABEL, EMPTY_NOTATION),
            ("Red", 'p'),
            ("Green", 'P'),
            ("Blue", 'Q'),
            ("Gold", 'q'),
            ("LightBlue", 'r'),
            ("White", 'R'),
            ("Pink", 'B'),
            ("Silver", 'N'),
            ("Purple", 'b'),
            ("Gray", 'n'),
            ("LightGreen", 'K'),
            ("Black", 'k'),
        ],
    };

    /// Sticker table truncated to the policy's channels
    pub fn table(&self, policy: ChannelPolicy) -> Result<StickerTable, ConfigError> {
        let mut table = StickerTable::new();
        for (label, reference) in self.stickers {
            table.push(label, &reference[..policy.len()])?;
        }
        Ok(table)
    }

    pub fn notation_map(&self) -> Result<NotationMap, ConfigError> {
        NotationMap::from_rows(self.notation)
    }

    /// Ready-to-use classifier for this calibration
    pub fn classifier(&self, config: ClassifierConfig) -> Result<StickerClassifier, ConfigError> {
        StickerClassifier::new(self.table(config.policy)?, self.notation_map()?, config)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::PCB_V1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signature::Signature;
    use crate::domain::sticker::UNKNOWN_NOTATION;

    #[test]
    fn test_pcb_v1_every_sticker_has_notation() {
        let cal = Calibration::PCB_V1;
        let notation = cal.notation_map().unwrap();
        for (label, _) in cal.stickers {
            assert_ne!(notation.notation_for(label), UNKNOWN_NOTATION, "{label}");
        }
    }

    #[test]
    fn test_references_classify_as_themselves() {
        let cal = Calibration::PCB_V1;
        for policy in [ChannelPolicy::ColorOnly, ChannelPolicy::ColorAndInfrared] {
            let classifier = cal.classifier(ClassifierConfig::with_policy(policy)).unwrap();
            for (label, reference) in cal.stickers {
                let sig = Signature::from_array(*reference);
                assert_eq!(classifier.classify(&sig), *label);
            }
        }
    }

    #[test]
    fn test_color_only_table_has_three_channels() {
        let table = Calibration::PCB_V1.table(ChannelPolicy::ColorOnly).unwrap();
        assert_eq!(table.len(), 13);
        assert!(table.entries().iter().all(|e| e.reference().len() == 3));
    }

    #[test]
    fn test_noisy_red_scan() {
        let classifier = Calibration::PCB_V1
            .classifier(ClassifierConfig::default())
            .unwrap();
        let label = classifier.classify(&Signature::new(70, 6, 10, 700));
        assert_eq!(label, "Red");
        assert_eq!(classifier.notation_for(label.as_str()), 'p');
    }
}
