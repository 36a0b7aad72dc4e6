use crate::{
    constants::{G1_CHANNEL_SPACING_HZ, G1_FREQUENCY_HZ, L1_FREQUENCY_HZ, SPEED_OF_LIGHT_M_S},
    prelude::Constellation,
};

/// Primary band carriers the pipeline exploits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Carrier {
    /// L1 (GPS/QZSS/SBAS) same frequency as E1 and B1aB1c
    #[default]
    L1,
    /// E1 (Galileo)
    E1,
    /// B1I (BDS)
    B1I,
    /// G1 (Glonass) FDMA, on given frequency channel (-7..=6)
    G1(i8),
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::L1 => write!(f, "L1"),
            Self::E1 => write!(f, "E1"),
            Self::B1I => write!(f, "B1I"),
            Self::G1(k) => write!(f, "G1({})", k),
        }
    }
}

impl Carrier {
    /// Identifies primary band [Carrier] from u-blox (gnssId, sigId).
    /// Secondary bands are not exploited and return None.
    pub fn from_ublox(constellation: Constellation, sig_id: u8, glonass_channel: i8) -> Option<Self> {
        match (constellation, sig_id) {
            (Constellation::GPS, 0) | (Constellation::QZSS, 0) | (Constellation::SBAS, 0) => {
                Some(Self::L1)
            },
            (Constellation::Galileo, 0) | (Constellation::Galileo, 1) => Some(Self::E1),
            (Constellation::BeiDou, 0) | (Constellation::BeiDou, 1) => Some(Self::B1I),
            (Constellation::Glonass, 0) => Some(Self::G1(glonass_channel)),
            _ => None,
        }
    }

    pub fn frequency(&self) -> f64 {
        match self {
            Self::L1 | Self::E1 => L1_FREQUENCY_HZ,
            Self::B1I => 1561.098E6_f64,
            Self::G1(k) => G1_FREQUENCY_HZ + (*k as f64) * G1_CHANNEL_SPACING_HZ,
        }
    }

    pub fn wavelength(&self) -> f64 {
        SPEED_OF_LIGHT_M_S / self.frequency()
    }
}
