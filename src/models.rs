use indexmap::IndexMap;
use serde::{ser::SerializeStruct, Serialize, Serializer};

use crate::extractors::ExtractError;

/// Page url -> provider identifier, in the order the hosters were listed.
pub type ProviderMap = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedStream {
    pub label: String,
    pub url: String,
}

impl DecodedStream {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Ordered aggregation result.
///
/// Serializes to the flat `{"streams": [label, url, label, url, ...]}` layout
/// the players consume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamBundle {
    pub streams: Vec<DecodedStream>,
}

impl StreamBundle {
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.label.as_str()).collect()
    }
}

impl Serialize for StreamBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flat: Vec<&str> = self
            .streams
            .iter()
            .flat_map(|s| [s.label.as_str(), s.url.as_str()])
            .collect();

        let mut state = serializer.serialize_struct("StreamBundle", 1)?;
        state.serialize_field("streams", &flat)?;
        state.end()
    }
}

/// Why a provider entry produced no stream.
#[derive(Debug)]
pub struct ProviderFailure {
    pub url: String,
    pub provider: String,
    pub error: ExtractError,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub bundle: StreamBundle,
    pub failures: Vec<ProviderFailure>,
}
