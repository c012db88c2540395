//! The `{success, data, error}` result shape shared by every API call.

use log::warn;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Uniform result of one API round trip.
///
/// Construction never fails: transport problems, HTTP errors and undecodable
/// bodies are all represented as `success == false` with an `error` string.
/// The type parameter defaults to raw JSON; typed views are produced with
/// [`Envelope::decode`] and [`Envelope::decode_list`].
///
/// An envelope parsed from a response body serializes back to that body
/// exactly, explicit `null`s and extra keys included.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T = Value> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(skip)]
    raw: Option<Value>,
}

impl<T: PartialEq> PartialEq for Envelope<T> {
    fn eq(&self, other: &Self) -> bool {
        self.success == other.success && self.data == other.data && self.error == other.error
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if let Some(raw) = &self.raw {
            return raw.serialize(serializer);
        }
        let len = 1 + usize::from(self.data.is_some()) + usize::from(self.error.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("success", &self.success)?;
        if let Some(data) = &self.data {
            map.serialize_entry("data", data)?;
        }
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        map.end()
    }
}

/// Fallback text when a failed envelope carries no error string.
const UNKNOWN_ERROR: &str = "unknown error";

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            raw: None,
        }
    }

    /// Successful envelope without a payload.
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            raw: None,
        }
    }

    /// Failed envelope with the given message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            raw: None,
        }
    }

    /// Transport-level failure: refused, unreachable, DNS, timeout.
    pub fn connection_failed(reason: impl std::fmt::Display) -> Self {
        Self::failure(format!("Connection failed: {reason}"))
    }

    /// Non-2xx status, optionally with the service's own error detail.
    pub fn http_status(code: u16, reason: &str, detail: Option<&str>) -> Self {
        match detail {
            Some(detail) if !detail.is_empty() => {
                Self::failure(format!("HTTP {code}: {reason} ({detail})"))
            }
            _ => Self::failure(format!("HTTP {code}: {reason}")),
        }
    }

    /// A body (or its `data`) that could not be decoded.
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        Self::failure(format!("Malformed response: {reason}"))
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Error text of a failed envelope, never empty.
    pub fn error_message(&self) -> &str {
        match self.error.as_deref() {
            Some(msg) if !msg.is_empty() => msg,
            _ => UNKNOWN_ERROR,
        }
    }
}

impl Envelope<Value> {
    /// Parse a response body. Fails on invalid JSON or a missing boolean
    /// `success` field.
    pub fn parse(body: &str) -> std::result::Result<Self, serde_json::Error> {
        let raw: Value = serde_json::from_str(body)?;
        let mut envelope = Self::deserialize(&raw)?;
        envelope.raw = Some(raw);
        Ok(envelope)
    }

    /// Decode `data` into an endpoint-specific shape.
    ///
    /// Failures pass through unchanged. A successful envelope whose `data`
    /// does not match `U` becomes a `Malformed response` failure. A `null`
    /// or missing `data` stays successful with no payload.
    pub fn decode<U: DeserializeOwned>(self) -> Envelope<U> {
        if !self.success {
            return self.failed();
        }
        match self.data {
            None | Some(Value::Null) => Envelope::empty(),
            Some(value) => match serde_json::from_value(value) {
                Ok(data) => Envelope::ok(data),
                Err(err) => Envelope::malformed(err),
            },
        }
    }

    /// Decode an array payload item by item.
    ///
    /// Items that do not match `U` are dropped with a warning so one bad
    /// record cannot hide the rest. A payload that is not an array is
    /// malformed.
    pub fn decode_list<U: DeserializeOwned>(self) -> Envelope<Vec<U>> {
        if !self.success {
            return self.failed();
        }
        match self.data {
            None | Some(Value::Null) => Envelope::empty(),
            Some(Value::Array(items)) => {
                let items = items
                    .into_iter()
                    .enumerate()
                    .filter_map(|(index, item)| match serde_json::from_value(item) {
                        Ok(decoded) => Some(decoded),
                        Err(err) => {
                            warn!("skipping undecodable item {index}: {err}");
                            None
                        }
                    })
                    .collect();
                Envelope::ok(items)
            }
            Some(_) => Envelope::malformed("expected an array"),
        }
    }

    fn failed<U>(self) -> Envelope<U> {
        Envelope {
            success: false,
            data: None,
            error: self.error,
            raw: None,
        }
    }

    /// Borrow a string field of an object payload.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.as_ref()?.get(key)?.as_str()
    }
}
