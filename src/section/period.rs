use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One entry of the canonical row order: the twelve months followed by the
/// annual sum row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
    AnnualSum,
}

/// Label of the summary row closing every section
pub const ANNUAL_SUM_LABEL: &str = "Jahressumme";

impl Period {
    /// Canonical display and iteration order
    pub const CANONICAL: [Period; 13] = [
        Period::January,
        Period::February,
        Period::March,
        Period::April,
        Period::May,
        Period::June,
        Period::July,
        Period::August,
        Period::September,
        Period::October,
        Period::November,
        Period::December,
        Period::AnnualSum,
    ];

    /// Label as written in the workbook
    pub fn label(self) -> &'static str {
        match self {
            Period::January => "Januar",
            Period::February => "Februar",
            Period::March => "März",
            Period::April => "April",
            Period::May => "Mai",
            Period::June => "Juni",
            Period::July => "Juli",
            Period::August => "August",
            Period::September => "September",
            Period::October => "Oktober",
            Period::November => "November",
            Period::December => "Dezember",
            Period::AnnualSum => ANNUAL_SUM_LABEL,
        }
    }

    /// Position in [`Period::CANONICAL`]
    pub fn position(self) -> usize {
        self as usize
    }

    pub fn is_month(self) -> bool {
        self != Period::AnnualSum
    }

    /// Recognize a row key; surrounding whitespace is ignored, case is not
    pub fn from_label(label: &str) -> Option<Period> {
        let label = label.trim();
        Period::CANONICAL.into_iter().find(|p| p.label() == label)
    }

    /// Labels of all periods in canonical order
    pub fn canonical_labels() -> Vec<&'static str> {
        Period::CANONICAL.iter().map(|p| p.label()).collect()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPeriod(pub String);

impl fmt::Display for UnknownPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown month '{}', expected one of: {}",
            self.0,
            Period::canonical_labels().join(", ")
        )
    }
}

impl std::error::Error for UnknownPeriod {}

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::from_label(s).ok_or_else(|| UnknownPeriod(s.to_string()))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Row key of an extracted section row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Period(Period),
    /// Key text that is neither a month nor the annual sum
    Other(String),
}

impl RowKey {
    pub fn from_label(label: &str) -> RowKey {
        match Period::from_label(label) {
            Some(period) => RowKey::Period(period),
            None => RowKey::Other(label.trim().to_string()),
        }
    }

    pub fn period(&self) -> Option<Period> {
        match self {
            RowKey::Period(p) => Some(*p),
            RowKey::Other(_) => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RowKey::Period(p) => p.label(),
            RowKey::Other(s) => s,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for RowKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
