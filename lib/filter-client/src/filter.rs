use crate::Error;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Numeric parameter accepted by a filter endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub min: u8,
    pub max: u8,
    pub default: u8,
}

/// One entry of the filter catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub endpoint: &'static str,
    pub label: &'static str,
    pub parameter: Option<ParameterSpec>,
}

pub const PERCENTAGE: ParameterSpec = ParameterSpec {
    name: "percentage",
    min: 1,
    max: 99,
    default: 50,
};

pub static FILTERS: [FilterSpec; 3] = [
    FilterSpec {
        kind: FilterKind::Grayscale,
        endpoint: "grayscale",
        label: "Grayscale",
        parameter: None,
    },
    FilterSpec {
        kind: FilterKind::BlurEdges,
        endpoint: "blur_edges",
        label: "Blur Edges",
        parameter: None,
    },
    FilterSpec {
        kind: FilterKind::Resize,
        endpoint: "resize",
        label: "Resize",
        parameter: Some(PERCENTAGE),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Grayscale,
    BlurEdges,
    Resize,
}

impl FilterKind {
    pub fn spec(self) -> &'static FilterSpec {
        match self {
            FilterKind::Grayscale => &FILTERS[0],
            FilterKind::BlurEdges => &FILTERS[1],
            FilterKind::Resize => &FILTERS[2],
        }
    }

    /// Path segment appended to the service base URL.
    pub fn endpoint(self) -> &'static str {
        self.spec().endpoint
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn requires_parameter(self) -> bool {
        self.spec().parameter.is_some()
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}

impl FromStr for FilterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace(['-', ' '], "_");

        FILTERS
            .iter()
            .find(|spec| spec.endpoint == name || spec.label.to_lowercase().replace(' ', "_") == name)
            .map(|spec| spec.kind)
            .ok_or_else(|| Error::UnknownFilter(s.to_string()))
    }
}

/// Resize percentage, always inside `[1, 99]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percentage(u8);

impl Percentage {
    /// Clamps `value` into the accepted range. Out-of-range values are never sent.
    pub fn new(value: i64) -> Self {
        Self(value.clamp(PERCENTAGE.min as i64, PERCENTAGE.max as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self(PERCENTAGE.default)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The filter chosen by the user, together with its parameter when it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSelection {
    Grayscale,
    BlurEdges,
    Resize(Percentage),
}

impl FilterSelection {
    pub fn from_kind(kind: FilterKind, percentage: Percentage) -> Self {
        match kind {
            FilterKind::Grayscale => FilterSelection::Grayscale,
            FilterKind::BlurEdges => FilterSelection::BlurEdges,
            FilterKind::Resize => FilterSelection::Resize(percentage),
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            FilterSelection::Grayscale => FilterKind::Grayscale,
            FilterSelection::BlurEdges => FilterKind::BlurEdges,
            FilterSelection::Resize(_) => FilterKind::Resize,
        }
    }

    pub fn percentage(&self) -> Option<Percentage> {
        match self {
            FilterSelection::Resize(p) => Some(*p),
            _ => None,
        }
    }

    /// Replaces the resize percentage. Other filters are returned unchanged.
    pub fn with_percentage(self, percentage: Percentage) -> Self {
        match self {
            FilterSelection::Resize(_) => FilterSelection::Resize(percentage),
            other => other,
        }
    }

    /// Extra string fields sent next to the image part.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            FilterSelection::Resize(p) => vec![(PERCENTAGE.name, p.to_string())],
            _ => vec![],
        }
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSelection::Resize(p) => write!(f, "{} ({p}%)", self.kind().label()),
            _ => write!(f, "{}", self.kind().label()),
        }
    }
}
