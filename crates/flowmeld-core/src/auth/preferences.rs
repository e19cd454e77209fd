use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentColor {
    #[default]
    Cyan,
    Blue,
    Indigo,
    Purple,
    Fuchsia,
    Rose,
    Orange,
    Lime,
    Emerald,
    Teal,
}

impl AccentColor {
    pub const ALL: [AccentColor; 10] = [
        AccentColor::Cyan,
        AccentColor::Blue,
        AccentColor::Indigo,
        AccentColor::Purple,
        AccentColor::Fuchsia,
        AccentColor::Rose,
        AccentColor::Orange,
        AccentColor::Lime,
        AccentColor::Emerald,
        AccentColor::Teal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccentColor::Cyan => "cyan",
            AccentColor::Blue => "blue",
            AccentColor::Indigo => "indigo",
            AccentColor::Purple => "purple",
            AccentColor::Fuchsia => "fuchsia",
            AccentColor::Rose => "rose",
            AccentColor::Orange => "orange",
            AccentColor::Lime => "lime",
            AccentColor::Emerald => "emerald",
            AccentColor::Teal => "teal",
        }
    }
}

/// A preference string outside its fixed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownPreference {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

fn parse_from<T: Copy>(
    kind: &'static str,
    value: &str,
    all: &[T],
    name: fn(&T) -> &'static str,
) -> Result<T, UnknownPreference> {
    let wanted = value.trim();
    all.iter()
        .find(|candidate| name(candidate).eq_ignore_ascii_case(wanted))
        .copied()
        .ok_or_else(|| UnknownPreference {
            kind,
            value: value.to_string(),
            expected: all.iter().map(name).collect::<Vec<_>>().join(", "),
        })
}

impl FromStr for Theme {
    type Err = UnknownPreference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_from("theme", s, &Theme::ALL, Theme::as_str)
    }
}

impl FromStr for AccentColor {
    type Err = UnknownPreference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_from("accent color", s, &AccentColor::ALL, AccentColor::as_str)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AccentColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(AccentColor::default(), AccentColor::Cyan);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(" EMERALD ".parse::<AccentColor>().unwrap(), AccentColor::Emerald);
    }

    #[test]
    fn test_parse_rejects_values_outside_the_set() {
        let err = "magenta".parse::<AccentColor>().unwrap_err();
        assert_eq!(err.kind, "accent color");
        assert!(err.to_string().contains("fuchsia"));
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn test_every_color_round_trips_through_its_name() {
        for color in AccentColor::ALL {
            assert_eq!(color.as_str().parse::<AccentColor>().unwrap(), color);
        }
    }

    #[test]
    fn test_toggled() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
