use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::fmt;

/// Successful response body of the analysis endpoint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisResult {
    pub filename: String,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub metadata: MetadataTree,
}

/// A terminal metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

/// One entry of a metadata tree: either a value or a nested mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Leaf(Scalar),
    Node(MetadataTree),
}

/// Ordered mapping of metadata keys, nested arbitrarily deep.
///
/// Key order follows the response body. JSON arrays become nodes keyed by
/// their index, and `null` is a leaf rather than an empty group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTree {
    entries: Vec<(String, MetadataValue)>,
}

impl MetadataTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetadataValue) {
        self.entries.push((key.into(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl From<Value> for MetadataTree {
    /// Mappings and arrays become trees; any other top-level value means no
    /// metadata was returned.
    fn from(value: Value) -> Self {
        match MetadataValue::from(value) {
            MetadataValue::Node(tree) => tree,
            MetadataValue::Leaf(_) => Self::default(),
        }
    }
}

impl From<Value> for MetadataValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Leaf(Scalar::Null),
            Value::Bool(b) => Self::Leaf(Scalar::Bool(b)),
            Value::Number(n) => Self::Leaf(Scalar::Number(n)),
            Value::String(s) => Self::Leaf(Scalar::String(s)),
            Value::Array(items) => Self::Node(MetadataTree {
                entries: items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), Self::from(v)))
                    .collect(),
            }),
            Value::Object(map) => Self::Node(MetadataTree {
                entries: map.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for MetadataTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for MetadataTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(Scalar::Null) => serializer.serialize_unit(),
            Self::Leaf(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Self::Leaf(Scalar::Number(n)) => n.serialize(serializer),
            Self::Leaf(Scalar::String(s)) => serializer.serialize_str(s),
            Self::Node(tree) => tree.serialize(serializer),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::String(s) => f.write_str(s),
            Self::Number(n) => match n.as_f64() {
                Some(v) if n.is_f64() => f.write_str(&float_text(v)),
                _ => write!(f, "{n}"),
            },
        }
    }
}

/// Shortest round-trip digits, as the service's web client prints numbers:
/// plain decimals for exponents -7 < e < 21, `1e-7` / `1e+21` style outside,
/// and no `.0` on integral values.
fn float_text(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let sci = format!("{v:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-6..21).contains(&exp) {
        format!("{v}")
    } else if exp < 0 {
        format!("{mantissa}e{exp}")
    } else {
        format!("{mantissa}e+{exp}")
    }
}
