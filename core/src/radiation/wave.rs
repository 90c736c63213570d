use crate::prelude::SourceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Amplitude ratio between two body-wave fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RatioKind {
    SOverP,
    POverS,
    ShOverP,
    SvOverP,
    ShOverS,
    SvOverS,
}

impl RatioKind {
    /// Numerator and denominator wave types.
    pub fn terms(self) -> (WaveType, WaveType) {
        match self {
            Self::SOverP => (WaveType::S, WaveType::P),
            Self::POverS => (WaveType::P, WaveType::S),
            Self::ShOverP => (WaveType::Sh, WaveType::P),
            Self::SvOverP => (WaveType::Sv, WaveType::P),
            Self::ShOverS => (WaveType::Sh, WaveType::S),
            Self::SvOverS => (WaveType::Sv, WaveType::S),
        }
    }
}

/// Seismic wave type evaluated by the forward models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WaveType {
    P,
    S,
    /// S projected on the vertical.
    Sv,
    /// S projected on the parallels of the focal sphere.
    Sh,
    /// S projected on the meridians of the focal sphere.
    Sm,
    Ratio(RatioKind),
}

impl WaveType {
    /// File-name safe tag.
    pub fn cache_tag(self) -> String {
        self.to_string().replace('/', "over")
    }
}

impl fmt::Display for WaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::P => "P",
            Self::S => "S",
            Self::Sv => "Sv",
            Self::Sh => "Sh",
            Self::Sm => "Sm",
            Self::Ratio(RatioKind::SOverP) => "S/P",
            Self::Ratio(RatioKind::POverS) => "P/S",
            Self::Ratio(RatioKind::ShOverP) => "SH/P",
            Self::Ratio(RatioKind::SvOverP) => "SV/P",
            Self::Ratio(RatioKind::ShOverS) => "SH/S",
            Self::Ratio(RatioKind::SvOverS) => "SV/S",
        };
        f.write_str(name)
    }
}

impl FromStr for WaveType {
    type Err = SourceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wave = match raw.trim().to_ascii_lowercase().as_str() {
            "p" | "p wave" | "p-wave" => Self::P,
            "s" | "s wave" | "s-wave" => Self::S,
            "sv" | "s_v" | "sv wave" | "sv-wave" => Self::Sv,
            "sh" | "st" | "s_h" | "sh wave" | "sh-wave" => Self::Sh,
            "sm" | "sq" | "sn" | "snrh" | "snrh wave" | "snrh-wave" => Self::Sm,
            "s/p" => Self::Ratio(RatioKind::SOverP),
            "p/s" => Self::Ratio(RatioKind::POverS),
            "sh/p" => Self::Ratio(RatioKind::ShOverP),
            "sv/p" => Self::Ratio(RatioKind::SvOverP),
            "sh/s" => Self::Ratio(RatioKind::ShOverS),
            "sv/s" => Self::Ratio(RatioKind::SvOverS),
            _ => {
                return Err(SourceError::Unsupported(format!(
                    "wave type {:?}; expected P, S, Sv, Sh, Sm or one of S/P, P/S, SH/P, SV/P, SH/S, SV/S",
                    raw
                )))
            }
        };
        Ok(wave)
    }
}

impl TryFrom<String> for WaveType {
    type Error = SourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WaveType> for String {
    fn from(value: WaveType) -> Self {
        value.to_string()
    }
}

/// Polarization component on the focal sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Component {
    /// Along the ray (`L`).
    Radial,
    /// Along the parallel (`T`).
    Horizontal,
    /// Along the meridian (`Q`).
    Meridian,
    /// Along `+z` (`V`).
    Vertical,
}

impl Component {
    /// Single-character channel tag.
    pub fn tag(self) -> char {
        match self {
            Self::Radial => 'L',
            Self::Horizontal => 'T',
            Self::Meridian => 'Q',
            Self::Vertical => 'V',
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Component {
    type Err = SourceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let component = match raw.trim().to_ascii_lowercase().as_str() {
            "l" | "r" | "radial" => Self::Radial,
            "t" | "h" | "horizontal" | "horiz" => Self::Horizontal,
            "q" | "m" | "n" | "meridian" | "nhr" => Self::Meridian,
            "v" | "vertical" => Self::Vertical,
            _ => {
                return Err(SourceError::Unsupported(format!(
                    "component {:?}; expected L (radial), T (horizontal), Q (meridian) or V (vertical)",
                    raw
                )))
            }
        };
        Ok(component)
    }
}

impl TryFrom<String> for Component {
    type Error = SourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Component> for String {
    fn from(value: Component) -> Self {
        value.to_string()
    }
}
