//! Telemetry event model and its JSON transport form
//!
//! Every event carries the same eight parameters in a fixed order. The
//! uploader parses them positionally, so [`TelemetryEvent`] never exposes a
//! way to reorder, drop, or add parameters after construction.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Schema id of the agent's operational event
pub const EVENT_SCHEMA_ID: u32 = 1;

/// Provider GUID embedded in every record
pub const PROVIDER_ID: &str = "69B669B9-4AF8-4C50-BDC4-6006FA76E975";

/// Parameter names, in the order they are written
pub const PARAMETER_NAMES: [&str; 8] = [
    "Name",
    "Version",
    "IsInternal",
    "Operation",
    "OperationSuccess",
    "Message",
    "Duration",
    "ExtensionType",
];

/// The type tag written next to every parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Bool,
    Int,
}

/// A typed parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    String(String),
    Bool(bool),
    Int(i64),
}

impl ParamValue {
    /// Type tag for this value
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::String(_) => ParamType::String,
            Self::Bool(_) => ParamType::Bool,
            Self::Int(_) => ParamType::Int,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
        }
    }
}

/// One `{name, value, type}` entry of an event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawParam")]
pub struct TelemetryEventParam {
    name: String,
    value: ParamValue,
}

impl TelemetryEventParam {
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }
}

impl Serialize for TelemetryEventParam {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TelemetryEventParam", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("type", &self.value.param_type())?;
        state.end()
    }
}

/// Wire shape of a parameter before its value is checked against its tag
#[derive(Deserialize)]
struct RawParam {
    name: String,
    value: serde_json::Value,
    #[serde(rename = "type")]
    kind: ParamType,
}

impl TryFrom<RawParam> for TelemetryEventParam {
    type Error = String;

    fn try_from(raw: RawParam) -> Result<Self, Self::Error> {
        let value = match (raw.kind, raw.value) {
            (ParamType::String, serde_json::Value::String(s)) => ParamValue::String(s),
            (ParamType::Bool, serde_json::Value::Bool(b)) => ParamValue::Bool(b),
            (ParamType::Int, serde_json::Value::Number(n)) => match n.as_i64() {
                Some(i) => ParamValue::Int(i),
                None => return Err(format!("parameter {} is not a 64-bit integer", raw.name)),
            },
            (kind, other) => {
                return Err(format!(
                    "parameter {} tagged {:?} has mismatched value {}",
                    raw.name, kind, other
                ));
            }
        };
        Ok(Self {
            name: raw.name,
            value,
        })
    }
}

/// Caller-supplied fields of an event, with the documented defaults
///
/// `version` stays `None` until the reporter fills in the current agent
/// version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventArgs {
    pub name: String,
    pub operation: String,
    pub is_success: bool,
    /// Duration of the operation in milliseconds
    pub duration: i64,
    pub version: Option<String>,
    pub message: String,
    pub event_type: String,
    pub is_internal: bool,
    /// Echo a human-readable line to the log; failures are echoed regardless
    pub log_event: bool,
}

impl EventArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation: String::new(),
            is_success: true,
            duration: 0,
            version: None,
            message: String::new(),
            event_type: String::new(),
            is_internal: false,
            log_event: true,
        }
    }

    pub fn operation(mut self, operation: impl AsRef<str>) -> Self {
        self.operation = operation.as_ref().to_string();
        self
    }

    pub fn success(mut self, is_success: bool) -> Self {
        self.is_success = is_success;
        self
    }

    pub fn duration(mut self, duration_ms: i64) -> Self {
        self.duration = duration_ms;
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn internal(mut self, is_internal: bool) -> Self {
        self.is_internal = is_internal;
        self
    }

    pub fn log_event(mut self, log_event: bool) -> Self {
        self.log_event = log_event;
        self
    }
}

/// A fully populated, immutable telemetry event
///
/// Decoding is strict: the parameters must be exactly [`PARAMETER_NAMES`],
/// in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawEvent")]
pub struct TelemetryEvent {
    event_id: u32,
    provider_id: String,
    parameters: Vec<TelemetryEventParam>,
}

/// Wire shape of an event before its parameter list is checked
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    event_id: u32,
    provider_id: String,
    parameters: Vec<TelemetryEventParam>,
}

impl TryFrom<RawEvent> for TelemetryEvent {
    type Error = String;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let names: Vec<&str> = raw.parameters.iter().map(|p| p.name()).collect();
        if names != PARAMETER_NAMES {
            return Err(format!(
                "expected parameters {:?}, found {:?}",
                PARAMETER_NAMES, names
            ));
        }
        Ok(Self {
            event_id: raw.event_id,
            provider_id: raw.provider_id,
            parameters: raw.parameters,
        })
    }
}

impl TelemetryEvent {
    /// Build the record from `args`, using `default_version` when the caller
    /// did not pin one.
    pub fn from_args(args: &EventArgs, default_version: &str) -> Self {
        let version = args.version.as_deref().unwrap_or(default_version);
        let parameters = vec![
            TelemetryEventParam::new("Name", args.name.as_str()),
            TelemetryEventParam::new("Version", version),
            TelemetryEventParam::new("IsInternal", args.is_internal),
            TelemetryEventParam::new("Operation", args.operation.as_str()),
            TelemetryEventParam::new("OperationSuccess", args.is_success),
            TelemetryEventParam::new("Message", args.message.as_str()),
            TelemetryEventParam::new("Duration", args.duration),
            TelemetryEventParam::new("ExtensionType", args.event_type.as_str()),
        ];

        Self {
            event_id: EVENT_SCHEMA_ID,
            provider_id: PROVIDER_ID.to_string(),
            parameters,
        }
    }

    pub fn event_id(&self) -> u32 {
        self.event_id
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn parameters(&self) -> &[TelemetryEventParam] {
        &self.parameters
    }

    /// Look up a parameter value by name
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Serialize to the compact JSON written into spool files
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a spool file payload
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
