use hook_store::{CaptureId, CapturedBody};
use serde_json::Value;
use tracing::debug;

/// Nesting depth at which serde_json stops parsing. Deeper documents are opaque.
pub const MAX_DOCUMENT_DEPTH: usize = 128;

/// What a stored body turned out to be.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleValue {
    /// A parsed JSON document. Absent bodies become `Value::Null`.
    Structured(Value),
    /// The body was not valid JSON.
    Opaque,
}

/// One captured body, interpreted.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedSample {
    pub id: CaptureId,
    pub value: SampleValue,
}

impl ParsedSample {
    /// Parse a stored body. Never fails: anything that isn't JSON is classified as opaque.
    ///
    /// Numbers go through `serde_json::Number`, so integers beyond 64 bits and decimals beyond
    /// double precision are not preserved exactly. Only the kind of a number reaches a schema.
    pub fn parse(id: CaptureId, body: Option<&str>) -> Self {
        let value = match body {
            None => SampleValue::Structured(Value::Null),
            Some(text) if text.trim().is_empty() => SampleValue::Structured(Value::Null),
            Some(text) => match serde_json::from_str::<Value>(text) {
                Ok(value) => SampleValue::Structured(value),
                Err(error) => {
                    debug!(capture_id = %id, %error, "body is not valid JSON");
                    SampleValue::Opaque
                }
            },
        };

        Self { id, value }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self.value, SampleValue::Opaque)
    }

    /// Empty samples carry no structure: no body, a blank body, or a literal `null`.
    pub fn is_empty(&self) -> bool {
        matches!(self.value, SampleValue::Structured(Value::Null))
    }

    /// The parsed document, if it can contribute structure.
    pub fn structure(&self) -> Option<&Value> {
        match &self.value {
            SampleValue::Structured(Value::Null) | SampleValue::Opaque => None,
            SampleValue::Structured(value) => Some(value),
        }
    }
}

impl From<&CapturedBody> for ParsedSample {
    fn from(captured: &CapturedBody) -> Self {
        ParsedSample::parse(captured.id, captured.body.as_deref())
    }
}
