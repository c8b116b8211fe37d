//! Optical signature domain entity
//!
//! A signature is the per-square feature vector produced by one full scan:
//! the ambient-cancelled response under red, green and blue illumination,
//! then under the infrared emitter.

/// Number of optical channels sampled per scan
pub const SIGNATURE_CHANNELS: usize = 4;

/// One optical channel of a scan, in read order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpticalChannel {
    Red,
    Green,
    Blue,
    Infrared,
}

impl OpticalChannel {
    /// Read order of a full scan
    pub const SCAN_ORDER: [OpticalChannel; SIGNATURE_CHANNELS] = [
        OpticalChannel::Red,
        OpticalChannel::Green,
        OpticalChannel::Blue,
        OpticalChannel::Infrared,
    ];

    /// Position of this channel in a `Signature`
    pub const fn index(self) -> usize {
        match self {
            OpticalChannel::Red => 0,
            OpticalChannel::Green => 1,
            OpticalChannel::Blue => 2,
            OpticalChannel::Infrared => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OpticalChannel::Red => "red",
            OpticalChannel::Green => "green",
            OpticalChannel::Blue => "blue",
            OpticalChannel::Infrared => "ir",
        }
    }
}

/// Ambient-cancelled intensities of one scan
///
/// Order: red, green, blue, infrared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Signature {
    channels: [u16; SIGNATURE_CHANNELS],
}

impl Signature {
    pub const fn new(red: u16, green: u16, blue: u16, infrared: u16) -> Self {
        Self {
            channels: [red, green, blue, infrared],
        }
    }

    pub const fn from_array(channels: [u16; SIGNATURE_CHANNELS]) -> Self {
        Self { channels }
    }

    pub const fn red(&self) -> u16 {
        self.channels[0]
    }

    pub const fn green(&self) -> u16 {
        self.channels[1]
    }

    pub const fn blue(&self) -> u16 {
        self.channels[2]
    }

    pub const fn infrared(&self) -> u16 {
        self.channels[3]
    }

    pub const fn get(&self, channel: OpticalChannel) -> u16 {
        self.channels[channel.index()]
    }

    /// All channels in scan order
    pub const fn as_array(&self) -> &[u16; SIGNATURE_CHANNELS] {
        &self.channels
    }

    /// The leading `policy.len()` channels, the part a classifier compares
    pub fn view(&self, policy: ChannelPolicy) -> &[u16] {
        &self.channels[..policy.len()]
    }
}

/// How many signature channels take part in classification
///
/// Every reference in a table must have exactly this many values. Tables of
/// mixed length are rejected when the classifier is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelPolicy {
    /// Red, green, blue. IR is left to presence detection.
    #[default]
    ColorOnly,
    /// Red, green, blue and infrared
    ColorAndInfrared,
}

impl ChannelPolicy {
    pub const fn len(self) -> usize {
        match self {
            ChannelPolicy::ColorOnly => 3,
            ChannelPolicy::ColorAndInfrared => 4,
        }
    }

    /// Policy matching a reference of `len` channels, if any
    pub const fn for_len(len: usize) -> Option<Self> {
        match len {
            3 => Some(ChannelPolicy::ColorOnly),
            4 => Some(ChannelPolicy::ColorAndInfrared),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_follow_scan_order() {
        let sig = Signature::new(1, 2, 3, 4);
        for (i, ch) in OpticalChannel::SCAN_ORDER.iter().enumerate() {
            assert_eq!(ch.index(), i);
            assert_eq!(sig.get(*ch) as usize, i + 1);
        }
        assert_eq!(sig.infrared(), 4);
    }

    #[test]
    fn test_view_respects_policy() {
        let sig = Signature::new(70, 6, 10, 700);
        assert_eq!(sig.view(ChannelPolicy::ColorOnly), &[70, 6, 10]);
        assert_eq!(sig.view(ChannelPolicy::ColorAndInfrared), &[70, 6, 10, 700]);
    }

    #[test]
    fn test_policy_for_len() {
        assert_eq!(ChannelPolicy::for_len(3), Some(ChannelPolicy::ColorOnly));
        assert_eq!(ChannelPolicy::for_len(4), Some(ChannelPolicy::ColorAndInfrared));
        assert_eq!(ChannelPolicy::for_len(2), None);
    }
}
