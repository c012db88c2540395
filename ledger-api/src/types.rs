//! Request bodies and typed `data` payloads for the core service API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Outgoing delivery preference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Let the service pick peer-to-peer or the mail bridge.
    #[default]
    Auto,
    P2pOnly,
    GmailOnly,
}

impl DeliveryMode {
    /// Every accepted mode, in usage order.
    pub const ALL: [DeliveryMode; 3] = [
        DeliveryMode::Auto,
        DeliveryMode::P2pOnly,
        DeliveryMode::GmailOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Auto => "auto",
            DeliveryMode::P2pOnly => "p2p_only",
            DeliveryMode::GmailOnly => "gmail_only",
        }
    }

    /// `auto|p2p_only|gmail_only`, for usage messages.
    pub fn usage() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(DeliveryMode::Auto),
            "p2p_only" => Ok(DeliveryMode::P2pOnly),
            "gmail_only" => Ok(DeliveryMode::GmailOnly),
            _ => Err(format!(
                "unknown delivery mode: {} (valid: {})",
                s,
                Self::usage()
            )),
        }
    }
}

/// How a stored message travelled.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    P2p,
    Gmail,
    Fallback,
    #[default]
    #[serde(other)]
    Unknown,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::P2p => "p2p",
            DeliveryMethod::Gmail => "gmail",
            DeliveryMethod::Fallback => "fallback",
            DeliveryMethod::Unknown => "unknown",
        }
    }

    /// Listing glyph.
    pub fn glyph(&self) -> &'static str {
        match self {
            DeliveryMethod::P2p => "🔒",
            DeliveryMethod::Gmail => "📧",
            DeliveryMethod::Fallback => "⚠️",
            DeliveryMethod::Unknown => "❓",
        }
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mailbox folder filter for message listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    Inbox,
    Sent,
    Drafts,
}

impl Folder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Folder::Inbox => "inbox",
            Folder::Sent => "sent",
            Folder::Drafts => "drafts",
        }
    }
}

/// Local node identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub ledger_id: String,
    pub public_key: String,
    pub peer_id: String,
}

/// A stored message as listed by the service.
///
/// Every field is optional on the wire, and a field of the wrong type reads
/// as absent rather than failing the message; the console renders
/// placeholders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "lenient_text")]
    pub subject: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub from_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub to_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub body: Option<String>,
    /// Unix seconds.
    #[serde(deserialize_with = "lenient_int")]
    pub timestamp: Option<i64>,
    #[serde(deserialize_with = "lenient_method")]
    pub delivery_method: DeliveryMethod,
    #[serde(deserialize_with = "lenient_flag")]
    pub is_read: bool,
    #[serde(deserialize_with = "lenient_text")]
    pub folder: Option<String>,
    #[serde(deserialize_with = "lenient_flag")]
    pub encrypted: bool,
}

fn lenient_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(text) => Some(text),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    lenient_text(de).map(Option::unwrap_or_default)
}

fn lenient_int<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    Ok(Value::deserialize(de)?.as_i64())
}

fn lenient_flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(Value::deserialize(de)?.as_bool().unwrap_or_default())
}

fn lenient_method<'de, D: Deserializer<'de>>(de: D) -> Result<DeliveryMethod, D::Error> {
    Ok(serde_json::from_value(Value::deserialize(de)?).unwrap_or_default())
}

impl Message {
    /// Subject, or `(no subject)` when absent or blank.
    pub fn subject_or_placeholder(&self) -> &str {
        match self.subject.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => "(no subject)",
        }
    }

    /// First 8 characters of the id.
    pub fn short_id(&self) -> String {
        self.id.chars().take(8).collect()
    }
}

/// A connected peer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Peer {
    pub peer_id: String,
    pub address: String,
    pub ledger_id: Option<String>,
}

/// Address book entry; also the body of `POST /api/contacts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub ledger_id: String,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gmail_address: Option<String>,
}

/// Body of `POST /api/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub mode: DeliveryMode,
}

/// Body of `POST /api/peers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectPeer {
    pub multiaddr: String,
}

/// Result of `POST /api/peers`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConnection {
    pub peer_id: String,
    pub status: String,
}

/// Partial settings update; unset fields are omitted from the body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_mode: Option<DeliveryMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tor_enabled: Option<bool>,
}

impl SettingsUpdate {
    pub fn delivery_mode(mode: DeliveryMode) -> Self {
        Self {
            delivery_mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn tor_enabled(enabled: bool) -> Self {
        Self {
            tor_enabled: Some(enabled),
            ..Self::default()
        }
    }
}

/// Body of `POST /api/gmail/config`.
#[derive(Clone, Serialize, Deserialize)]
pub struct GmailCredentials {
    pub email: String,
    pub app_password: String,
}

impl std::fmt::Debug for GmailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailCredentials")
            .field("email", &self.email)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

/// Result of `GET /api/gmail/config`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailStatus {
    pub configured: bool,
    pub email: Option<String>,
}

/// Body of `POST /api/gmail/send`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailSend {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Result of `POST /api/gmail/fetch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchReport {
    pub fetched: usize,
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_mode_parse_and_display() {
        for mode in DeliveryMode::ALL {
            assert_eq!(mode.as_str().parse::<DeliveryMode>(), Ok(mode));
        }
        assert!("P2P_ONLY".parse::<DeliveryMode>().is_err());
        assert!("foo".parse::<DeliveryMode>().is_err());
        assert_eq!(DeliveryMode::usage(), "auto|p2p_only|gmail_only");
    }

    #[test]
    fn test_delivery_method_unknown_values() {
        let known: DeliveryMethod = serde_json::from_str(r#""gmail""#).unwrap();
        assert_eq!(known, DeliveryMethod::Gmail);
        let other: DeliveryMethod = serde_json::from_str(r#""carrier_pigeon""#).unwrap();
        assert_eq!(other, DeliveryMethod::Unknown);
        assert_eq!(other.glyph(), "❓");
    }

    #[test]
    fn test_message_placeholders() {
        let msg: Message = serde_json::from_str(r#"{"id":"deadbeef01","subject":""}"#).unwrap();
        assert_eq!(msg.subject_or_placeholder(), "(no subject)");
        assert_eq!(msg.short_id(), "deadbeef");
        assert_eq!(msg.delivery_method, DeliveryMethod::Unknown);
    }

    #[test]
    fn test_message_wrong_field_types_read_as_absent() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "id": null,
            "subject": 42,
            "from_id": {"nested": true},
            "to_id": null,
            "timestamp": "yesterday",
            "delivery_method": null,
            "is_read": "no"
        }))
        .unwrap();
        assert_eq!(msg.id, "");
        assert_eq!(msg.subject.as_deref(), Some("42"));
        assert_eq!(msg.from_id, None);
        assert_eq!(msg.to_id, None);
        assert_eq!(msg.timestamp, None);
        assert_eq!(msg.delivery_method, DeliveryMethod::Unknown);
        assert!(!msg.is_read);
    }

    #[test]
    fn test_short_id_of_short_id() {
        let msg = Message {
            id: "abc".to_string(),
            ..Message::default()
        };
        assert_eq!(msg.short_id(), "abc");
    }

    #[test]
    fn test_settings_update_omits_unset_fields() {
        let json = serde_json::to_value(SettingsUpdate::delivery_mode(DeliveryMode::P2pOnly))
            .unwrap();
        assert_eq!(json, serde_json::json!({"delivery_mode": "p2p_only"}));

        let json = serde_json::to_value(SettingsUpdate::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_contact_omits_optional_fields() {
        let contact = Contact {
            ledger_id: "ledger:abc".to_string(),
            public_key: "pk".to_string(),
            display_name: None,
            gmail_address: Some("a@example.com".to_string()),
        };
        let json = serde_json::to_value(&contact).unwrap();
        assert!(json.get("display_name").is_none());
        assert_eq!(json["gmail_address"], "a@example.com");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = GmailCredentials {
            email: "a@example.com".to_string(),
            app_password: "hunter2".to_string(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
