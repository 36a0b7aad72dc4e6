use crate::prelude::{Constellation, Error, SV};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Constellation identifier, as published in the output stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConstellationId {
    #[default]
    Gps,
    Sbas,
    Galileo,
    Beidou,
    Imes,
    Qznss,
    Glonass,
}

impl std::fmt::Display for ConstellationId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Gps => write!(f, "gps"),
            Self::Sbas => write!(f, "sbas"),
            Self::Galileo => write!(f, "galileo"),
            Self::Beidou => write!(f, "beidou"),
            Self::Imes => write!(f, "imes"),
            Self::Qznss => write!(f, "qznss"),
            Self::Glonass => write!(f, "glonass"),
        }
    }
}

impl ConstellationId {
    /// One letter prefix of satellite identifiers.
    pub fn letter(&self) -> char {
        match self {
            Self::Gps => 'G',
            Self::Sbas => 'S',
            Self::Galileo => 'E',
            Self::Beidou => 'C',
            Self::Imes => 'I',
            Self::Qznss => 'J',
            Self::Glonass => 'R',
        }
    }

    /// Identifies [ConstellationId] from identifier prefix.
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'G' => Some(Self::Gps),
            'S' => Some(Self::Sbas),
            'E' => Some(Self::Galileo),
            'C' => Some(Self::Beidou),
            'I' => Some(Self::Imes),
            'J' => Some(Self::Qznss),
            'R' => Some(Self::Glonass),
            _ => None,
        }
    }

    /// Converts [Constellation] to [ConstellationId].
    /// Augmentation systems all map to [ConstellationId::Sbas].
    pub fn from_constellation(constellation: Constellation) -> Option<Self> {
        match constellation {
            Constellation::GPS => Some(Self::Gps),
            Constellation::Glonass => Some(Self::Glonass),
            Constellation::Galileo => Some(Self::Galileo),
            Constellation::BeiDou => Some(Self::Beidou),
            Constellation::QZSS => Some(Self::Qznss),
            c if c.is_sbas() => Some(Self::Sbas),
            _ => None,
        }
    }

    /// Converts [ConstellationId] to [Constellation].
    pub fn to_constellation(&self) -> Option<Constellation> {
        match self {
            Self::Gps => Some(Constellation::GPS),
            Self::Glonass => Some(Constellation::Glonass),
            Self::Galileo => Some(Constellation::Galileo),
            Self::Beidou => Some(Constellation::BeiDou),
            Self::Qznss => Some(Constellation::QZSS),
            Self::Sbas => Some(Constellation::SBAS),
            Self::Imes => None,
        }
    }
}

/// Satellite identifier ("G01", "R14"..) of this [SV].
pub fn satellite_id(sv: &SV) -> String {
    let letter = ConstellationId::from_constellation(sv.constellation)
        .map(|c| c.letter())
        .unwrap_or('?');
    format!("{}{:02}", letter, sv.prn)
}

/// Parses a satellite identifier ("G01", "R14"..) to [SV].
pub fn parse_satellite_id(id: &str) -> Result<SV, Error> {
    let mut chars = id.trim().chars();
    let constellation = chars
        .next()
        .and_then(ConstellationId::from_letter)
        .and_then(|c| c.to_constellation())
        .ok_or_else(|| Error::InvalidSatelliteId(id.to_string()))?;
    let prn = chars
        .as_str()
        .parse::<u8>()
        .map_err(|_| Error::InvalidSatelliteId(id.to_string()))?;
    Ok(SV::new(constellation, prn))
}
