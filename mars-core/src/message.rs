use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One message returned by the status endpoint.
///
/// On the wire: `{ "processkey": "...", "jobName": "...", ...payload }`.
/// Every field other than the process key and job name lands in `payload`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Key of the job this message answers, if any.
    #[serde(
        rename = "processkey",
        alias = "processKey",
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub process_key: Option<String>,

    /// Channel used for broker routing when nobody is waiting on the key.
    #[serde(rename = "jobName", default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,

    /// Server-specific fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl StatusMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process_key(mut self, key: impl Into<String>) -> Self {
        self.process_key = Some(key.into());
        self
    }

    pub fn with_job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }

    /// Look up a payload field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }
}

// Some servers emit numeric process keys.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "processkey must be a string or number, got {other}"
        ))),
    }
}
