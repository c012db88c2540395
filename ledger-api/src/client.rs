//! Blocking HTTP client for the Ledger core service API.
//!
//! Every operation returns an [`Envelope`]. Transport failures, non-2xx
//! statuses and undecodable bodies are folded into `success: false`
//! envelopes; nothing here panics or returns `Err` once the client exists.

use std::error::Error as StdError;
use std::time::Duration;

use log::{debug, trace, warn};
use reqwest::Method;
use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde_json::Value;

use crate::envelope::Envelope;
use crate::error::Result;
use crate::types::{
    ConnectPeer, Contact, Folder, GmailCredentials, GmailSend, SendMessage, SettingsUpdate,
};

/// Default base URL of the core service.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8420";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client for the core service's JSON API.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: Client,
    base_url: String,
}

impl LedgerClient {
    /// Create a new client. Only fails if the TLS/HTTP stack cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let timeout = timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the local identity.
    pub fn identity(&self) -> Envelope {
        self.get("/api/identity")
    }

    /// List messages, optionally restricted to one folder.
    pub fn list_messages(&self, folder: Option<Folder>) -> Envelope {
        match folder {
            Some(f) => self.get(&format!("/api/messages?folder={}", f.as_str())),
            None => self.get("/api/messages"),
        }
    }

    /// Fetch a single message.
    pub fn get_message(&self, id: &str) -> Envelope {
        self.get(&format!("/api/messages/{}", urlencoding::encode(id)))
    }

    /// Send a message.
    pub fn send_message(&self, message: &SendMessage) -> Envelope {
        self.send_json(Method::POST, "/api/messages", message)
    }

    /// Delete a message.
    pub fn delete_message(&self, id: &str) -> Envelope {
        self.delete(&format!("/api/messages/{}", urlencoding::encode(id)))
    }

    /// List connected peers.
    pub fn list_peers(&self) -> Envelope {
        self.get("/api/peers")
    }

    /// Dial a peer. The multiaddress is passed through unvalidated.
    pub fn connect_peer(&self, multiaddr: &str) -> Envelope {
        let body = ConnectPeer {
            multiaddr: multiaddr.to_string(),
        };
        self.send_json(Method::POST, "/api/peers", &body)
    }

    /// Fetch service settings.
    pub fn settings(&self) -> Envelope {
        self.get("/api/settings")
    }

    /// Partially update settings; only the fields set in `update` are sent.
    pub fn update_settings(&self, update: &SettingsUpdate) -> Envelope {
        self.send_json(Method::PUT, "/api/settings", update)
    }

    /// Mail bridge configuration status.
    pub fn gmail_status(&self) -> Envelope {
        self.get("/api/gmail/config")
    }

    /// Store mail bridge credentials.
    pub fn configure_gmail(&self, credentials: &GmailCredentials) -> Envelope {
        self.send_json(Method::POST, "/api/gmail/config", credentials)
    }

    /// Trigger a mail bridge fetch.
    pub fn fetch_gmail(&self) -> Envelope {
        self.request(Method::POST, "/api/gmail/fetch", None)
    }

    /// Send directly through the mail bridge, bypassing routing.
    pub fn gmail_send(&self, mail: &GmailSend) -> Envelope {
        self.send_json(Method::POST, "/api/gmail/send", mail)
    }

    /// List address book entries.
    pub fn list_contacts(&self) -> Envelope {
        self.get("/api/contacts")
    }

    /// Add or replace a contact.
    pub fn add_contact(&self, contact: &Contact) -> Envelope {
        self.send_json(Method::POST, "/api/contacts", contact)
    }

    pub fn get(&self, path: &str) -> Envelope {
        self.request(Method::GET, path, None)
    }

    pub fn delete(&self, path: &str) -> Envelope {
        self.request(Method::DELETE, path, None)
    }

    /// Issue one request and fold the outcome into an envelope.
    ///
    /// A present `body` is sent as JSON with `Content-Type: application/json`;
    /// `None` sends no payload.
    pub fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Envelope {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut builder = self.http.request(method, &url);
        if let Some(payload) = body {
            builder = builder.json(payload);
        }

        match builder.send() {
            Ok(resp) => self.handle_response(&url, resp),
            Err(err) => {
                let reason = transport_reason(&err);
                debug!("request to {} failed: {}", url, reason);
                Envelope::connection_failed(reason)
            }
        }
    }

    fn send_json<T: Serialize>(&self, method: Method, path: &str, body: &T) -> Envelope {
        match serde_json::to_value(body) {
            Ok(payload) => self.request(method, path, Some(&payload)),
            Err(err) => Envelope::failure(format!("Invalid request body: {err}")),
        }
    }

    fn handle_response(&self, url: &str, resp: Response) -> Envelope {
        let status = resp.status();
        trace!("{} -> {}", url, status);

        let text = match resp.text() {
            Ok(text) => text,
            Err(err) => return Envelope::connection_failed(transport_reason(&err)),
        };

        if !status.is_success() {
            // The service usually explains itself in an envelope body
            let detail = serde_json::from_str::<Value>(&text).ok().and_then(|val| {
                val.get("error")
                    .or_else(|| val.get("detail"))
                    .and_then(|d| d.as_str())
                    .map(str::to_string)
            });
            return Envelope::http_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status"),
                detail.as_deref(),
            );
        }

        match Envelope::parse(&text) {
            Ok(envelope) => envelope,
            Err(err) => {
                let snippet: String = text.chars().take(200).collect();
                warn!("malformed response from {}: {} (body: {:?})", url, err, snippet);
                Envelope::malformed(err)
            }
        }
    }
}

/// Short, operator-facing cause of a transport failure.
fn transport_reason(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        return "request timed out".to_string();
    }
    // reqwest wraps the interesting part (refused, DNS) a few sources deep
    let mut source: Option<&dyn StdError> = err.source();
    let mut innermost = None;
    while let Some(cause) = source {
        innermost = Some(cause.to_string());
        source = cause.source();
    }
    innermost.unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeliveryMode;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::net::TcpListener;

    fn client_for(server: &MockServer) -> LedgerClient {
        LedgerClient::new(&server.base_url(), None).unwrap()
    }

    /// Base URL of a port that refuses connections.
    fn dead_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}")
    }

    #[test]
    fn test_client_url_normalization() {
        let client = LedgerClient::new("http://localhost:8420/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8420");
    }

    #[test]
    fn test_envelope_returned_verbatim() {
        let server = MockServer::start();
        let body = json!({
            "success": true,
            "data": {"ledger_id": "abc123", "public_key": "pk1", "peer_id": "p1"}
        });
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/identity");
            then.status(200).json_body(body.clone());
        });

        let envelope = client_for(&server).identity();
        mock.assert();
        assert_eq!(serde_json::to_value(&envelope).unwrap(), body);
    }

    #[test]
    fn test_envelope_with_explicit_nulls_returned_verbatim() {
        let server = MockServer::start();
        let body = json!({"success": true, "data": {"ledger_id": "abc"}, "error": null});
        server.mock(|when, then| {
            when.method(GET).path("/api/identity");
            then.status(200).json_body(body.clone());
        });
        let failure = json!({"success": false, "data": null, "error": "Failed to get peers"});
        server.mock(|when, then| {
            when.method(GET).path("/api/peers");
            then.status(200).json_body(failure.clone());
        });

        let client = client_for(&server);
        assert_eq!(serde_json::to_value(client.identity()).unwrap(), body);
        let peers = client.list_peers();
        assert_eq!(peers.error_message(), "Failed to get peers");
        assert_eq!(serde_json::to_value(&peers).unwrap(), failure);
    }

    #[test]
    fn test_list_messages_folder_filter() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/messages")
                .query_param("folder", "sent");
            then.status(200).json_body(json!({"success": true, "data": []}));
        });

        let envelope = client_for(&server).list_messages(Some(Folder::Sent));
        mock.assert();
        assert!(envelope.is_success());
    }

    #[test]
    fn test_send_message_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/messages")
                .header("content-type", "application/json")
                .json_body(json!({
                    "to": "ledger:bob",
                    "subject": "Hi",
                    "body": "Hello",
                    "mode": "auto"
                }));
            then.status(200)
                .json_body(json!({"success": true, "data": {"delivery_method": "p2p"}}));
        });

        let message = SendMessage {
            to: "ledger:bob".to_string(),
            subject: "Hi".to_string(),
            body: "Hello".to_string(),
            mode: DeliveryMode::default(),
        };
        let envelope = client_for(&server).send_message(&message);
        mock.assert();
        assert_eq!(envelope.data_str("delivery_method"), Some("p2p"));
    }

    #[test]
    fn test_update_settings_sends_only_set_fields() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/settings")
                .json_body(json!({"delivery_mode": "gmail_only"}));
            then.status(200).json_body(json!({"success": true, "data": {}}));
        });

        let update = SettingsUpdate::delivery_mode(DeliveryMode::GmailOnly);
        let envelope = client_for(&server).update_settings(&update);
        mock.assert();
        assert!(envelope.is_success());
    }

    #[test]
    fn test_delete_message_encodes_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/api/messages/a%2Fb");
            then.status(200).json_body(json!({"success": true, "data": "Deleted"}));
        });

        let envelope = client_for(&server).delete_message("a/b");
        mock.assert();
        assert!(envelope.is_success());
    }

    #[test]
    fn test_add_contact_omits_missing_optionals() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/contacts")
                .json_body(json!({"ledger_id": "ledger:x", "public_key": "pk"}));
            then.status(200)
                .json_body(json!({"success": true, "data": "Contact added"}));
        });

        let contact = Contact {
            ledger_id: "ledger:x".to_string(),
            public_key: "pk".to_string(),
            ..Contact::default()
        };
        assert!(client_for(&server).add_contact(&contact).is_success());
        mock.assert();
    }

    #[test]
    fn test_connect_peer_and_gmail_calls() {
        let server = MockServer::start();
        let peer = server.mock(|when, then| {
            when.method(POST)
                .path("/api/peers")
                .json_body(json!({"multiaddr": "/ip4/1.2.3.4/tcp/4001"}));
            then.status(200)
                .json_body(json!({"success": true, "data": {"peer_id": "p", "status": "connecting"}}));
        });
        let config = server.mock(|when, then| {
            when.method(POST)
                .path("/api/gmail/config")
                .json_body(json!({"email": "me@gmail.com", "app_password": "secret"}));
            then.status(200)
                .json_body(json!({"success": true, "data": "Gmail configured"}));
        });
        let fetch = server.mock(|when, then| {
            when.method(POST).path("/api/gmail/fetch");
            then.status(200)
                .json_body(json!({"success": true, "data": {"fetched": 0, "messages": []}}));
        });
        let send = server.mock(|when, then| {
            when.method(POST)
                .path("/api/gmail/send")
                .json_body(json!({"to": "a@b.c", "subject": "s", "body": "b"}));
            then.status(200).json_body(json!({"success": true, "data": "Email sent"}));
        });

        let client = client_for(&server);
        assert!(client.connect_peer("/ip4/1.2.3.4/tcp/4001").is_success());
        let creds = GmailCredentials {
            email: "me@gmail.com".to_string(),
            app_password: "secret".to_string(),
        };
        assert!(client.configure_gmail(&creds).is_success());
        assert!(client.fetch_gmail().is_success());
        let mail = GmailSend {
            to: "a@b.c".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        };
        assert!(client.gmail_send(&mail).is_success());

        peer.assert();
        config.assert();
        fetch.assert();
        send.assert();
    }

    #[test]
    fn test_application_error_passes_through() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/peers");
            then.status(200)
                .json_body(json!({"success": false, "error": "P2P node not running"}));
        });

        let envelope = client_for(&server).list_peers();
        assert!(!envelope.is_success());
        assert_eq!(envelope.error_message(), "P2P node not running");
    }

    #[test]
    fn test_non_2xx_status_becomes_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/settings");
            then.status(503).body("down for maintenance");
        });

        let envelope = client_for(&server).settings();
        assert!(!envelope.is_success());
        assert_eq!(envelope.error_message(), "HTTP 503: Service Unavailable");
    }

    #[test]
    fn test_non_2xx_status_keeps_service_detail() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/gmail/fetch");
            then.status(400)
                .json_body(json!({"success": false, "error": "Gmail not configured"}));
        });

        let envelope = client_for(&server).fetch_gmail();
        assert_eq!(
            envelope.error_message(),
            "HTTP 400: Bad Request (Gmail not configured)"
        );
    }

    #[test]
    fn test_malformed_body_becomes_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/identity");
            then.status(200).body("{not json");
        });

        let envelope = client_for(&server).identity();
        assert!(!envelope.is_success());
        assert!(envelope.error_message().starts_with("Malformed response:"));
    }

    #[test]
    fn test_connection_refused_never_raises() {
        let client = LedgerClient::new(&dead_url(), Some(Duration::from_secs(2))).unwrap();
        let results = [
            client.identity(),
            client.list_messages(None),
            client.list_peers(),
            client.settings(),
            client.gmail_status(),
            client.fetch_gmail(),
            client.delete_message("x"),
            client.update_settings(&SettingsUpdate::tor_enabled(true)),
        ];
        for envelope in results {
            assert!(!envelope.is_success());
            assert!(envelope.error_message().starts_with("Connection failed: "));
            assert!(envelope.error_message().len() > "Connection failed: ".len());
        }
    }

    #[test]
    fn test_timeout_is_connection_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/identity");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(json!({"success": true}));
        });

        let client =
            LedgerClient::new(&server.base_url(), Some(Duration::from_millis(200))).unwrap();
        let envelope = client.identity();
        assert!(!envelope.is_success());
        assert!(envelope.error_message().starts_with("Connection failed:"));
    }
}
