use serde::{Deserialize, Deserializer, Serialize};

use crate::feed::record::RawRecord;
use crate::prelude::{StageError, StageResult};

/// One response of the upstream `states/all` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Unix seconds the states are valid for.
    #[serde(default)]
    pub time: Option<i64>,
    /// The feed sends `null` instead of an empty list when nothing is tracked.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub states: Vec<RawRecord>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RawRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RawRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

impl StateSnapshot {
    pub fn new(time: Option<i64>, states: Vec<RawRecord>) -> Self {
        Self { time, states }
    }

    pub fn from_json(text: &str) -> StageResult<Self> {
        serde_json::from_str(text)
            .map_err(|err| StageError::InvalidInput(format!("snapshot decode failed: {err}")))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
