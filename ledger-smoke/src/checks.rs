//! The fixed battery of API checks.

use std::io::{self, Write};

use ledger_api::{Envelope, LedgerClient};
use log::debug;
use serde::Serialize;
use serde_json::Value;

/// One named pass/fail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Records in execution order.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub api_url: String,
    pub checks: Vec<Check>,
}

impl Report {
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            checks: Vec::new(),
        }
    }

    pub fn record(&mut self, name: &str, passed: bool, detail: Option<String>) -> &Check {
        debug!("{name}: {}", if passed { "pass" } else { "fail" });
        self.checks.push(Check {
            name: name.to_string(),
            passed,
            detail,
        });
        &self.checks[self.checks.len() - 1]
    }

    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn total(&self) -> usize {
        self.checks.len()
    }

    /// 0 when every check passed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.passed() == self.total() { 0 } else { 1 }
    }
}

/// Run every check against `client`, writing one line per record to `out`.
///
/// A failing call never skips the checks after it.
pub fn run_checks(client: &LedgerClient, out: &mut dyn Write) -> io::Result<Report> {
    let mut report = Report::new(client.base_url());
    let mut emit = |report: &mut Report, name: &str, passed: bool, detail: Option<String>| {
        let check = report.record(name, passed, detail);
        print_check(out, check)
    };

    let identity = client.identity();
    let ledger_id = identity.data_str("ledger_id").unwrap_or("N/A");
    let detail = format!("ledger_id={}...", ledger_id.chars().take(20).collect::<String>());
    emit(
        &mut report,
        "GET /api/identity returns success",
        identity.is_success(),
        Some(failure_or(&identity, detail)),
    )?;
    for field in ["ledger_id", "public_key", "peer_id"] {
        let present = identity.data_str(field).is_some_and(|v| !v.is_empty());
        emit(&mut report, &format!("Identity has {field}"), present, None)?;
    }

    let messages = client.list_messages(None);
    emit(
        &mut report,
        "GET /api/messages returns success",
        messages.is_success(),
        failure_detail(&messages),
    )?;
    let is_array = matches!(messages.data, Some(Value::Array(_)));
    emit(&mut report, "Messages response has data array", is_array, None)?;

    let settings = client.settings();
    emit(
        &mut report,
        "GET /api/settings returns success",
        settings.is_success(),
        failure_detail(&settings),
    )?;

    let peers = client.list_peers();
    emit(
        &mut report,
        "GET /api/peers returns success",
        peers.is_success(),
        failure_detail(&peers),
    )?;

    let gmail = client.gmail_status();
    emit(
        &mut report,
        "GET /api/gmail/config returns success",
        gmail.is_success(),
        failure_detail(&gmail),
    )?;

    Ok(report)
}

fn failure_detail(envelope: &Envelope) -> Option<String> {
    (!envelope.is_success()).then(|| envelope.error_message().to_string())
}

fn failure_or(envelope: &Envelope, detail: String) -> String {
    failure_detail(envelope).unwrap_or(detail)
}

fn print_check(out: &mut dyn Write, check: &Check) -> io::Result<()> {
    let marker = if check.passed { "✅" } else { "❌" };
    match &check.detail {
        Some(detail) => writeln!(out, "  {marker} {}  ({detail})", check.name),
        None => writeln!(out, "  {marker} {}", check.name),
    }
}

/// Banner printed before the first check.
pub fn print_banner(out: &mut dyn Write, api_url: &str) -> io::Result<()> {
    writeln!(out, "╔═══════════════════════════════════════╗")?;
    writeln!(out, "║     LEDGER SMOKE TESTS                ║")?;
    writeln!(out, "║     API: {api_url:<28} ║")?;
    writeln!(out, "╚═══════════════════════════════════════╝")?;
    writeln!(out)
}

/// Totals box printed after the last check.
pub fn print_summary(out: &mut dyn Write, report: &Report) -> io::Result<()> {
    let rule = "=".repeat(40);
    writeln!(out, "\n{rule}")?;
    writeln!(out, "  Results: {}/{} passed", report.passed(), report.total())?;
    if report.exit_code() == 0 {
        writeln!(out, "  🎉 All tests passed!")?;
    } else {
        writeln!(
            out,
            "  ⚠️  {} test(s) failed",
            report.total() - report.passed()
        )?;
    }
    writeln!(out, "{rule}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn identity_fixture(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/api/identity");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"ledger_id": "abc123def456", "public_key": "pk1", "peer_id": "p1"}
            }));
        });
    }

    fn ok_fixture(server: &MockServer, path: &str, data: Value) {
        let path = path.to_string();
        server.mock(move |when, then| {
            when.method(GET).path(path);
            then.status(200).json_body(json!({"success": true, "data": data}));
        });
    }

    fn run(server: &MockServer) -> (Report, String) {
        let client = LedgerClient::new(&server.base_url(), None).unwrap();
        let mut out = Vec::new();
        let report = run_checks(&client, &mut out).unwrap();
        (report, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_identity_fixture_passes_identity_checks() {
        let server = MockServer::start();
        identity_fixture(&server);
        let (report, text) = run(&server);

        let names: Vec<&str> = report.checks[..4].iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "GET /api/identity returns success",
                "Identity has ledger_id",
                "Identity has public_key",
                "Identity has peer_id",
            ]
        );
        assert!(report.checks[..4].iter().all(|c| c.passed));
        assert!(text.contains("ledger_id=abc123def456..."));
    }

    #[test]
    fn test_responsive_service_exits_zero() {
        let server = MockServer::start();
        identity_fixture(&server);
        ok_fixture(&server, "/api/messages", json!([]));
        ok_fixture(&server, "/api/settings", json!({"delivery_mode": "auto"}));
        ok_fixture(&server, "/api/peers", json!([]));
        ok_fixture(&server, "/api/gmail/config", json!({"configured": false}));

        let (report, text) = run(&server);
        assert_eq!(report.total(), 9);
        assert_eq!(report.passed(), 9);
        assert_eq!(report.exit_code(), 0);
        assert!(!text.contains("❌"));
    }

    #[test]
    fn test_one_failure_still_runs_everything() {
        let server = MockServer::start();
        identity_fixture(&server);
        ok_fixture(&server, "/api/messages", json!([]));
        server.mock(|when, then| {
            when.method(GET).path("/api/settings");
            then.status(200)
                .json_body(json!({"success": false, "error": "settings unavailable"}));
        });
        let peers = server.mock(|when, then| {
            when.method(GET).path("/api/peers");
            then.status(200).json_body(json!({"success": true, "data": []}));
        });
        let gmail = server.mock(|when, then| {
            when.method(GET).path("/api/gmail/config");
            then.status(200).json_body(json!({"success": true, "data": {}}));
        });

        let (report, text) = run(&server);
        peers.assert();
        gmail.assert();
        assert_eq!(report.total(), 9);
        assert_eq!(report.passed(), 8);
        assert_eq!(report.exit_code(), 1);
        assert!(text.contains("❌ GET /api/settings returns success  (settings unavailable)"));
    }

    #[test]
    fn test_dead_service_fails_every_check() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = LedgerClient::new(&format!("http://127.0.0.1:{port}"), None).unwrap();
        let mut out = Vec::new();
        let report = run_checks(&client, &mut out).unwrap();
        assert_eq!(report.total(), 9);
        assert_eq!(report.passed(), 0);
        assert_eq!(report.exit_code(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Connection failed"));
        assert_eq!(text.matches("❌").count(), 9);
    }

    #[test]
    fn test_messages_without_array_fails_shape_check() {
        let server = MockServer::start();
        ok_fixture(&server, "/api/messages", json!({"not": "a list"}));
        let (report, _) = run(&server);
        let shape = report
            .checks
            .iter()
            .find(|c| c.name == "Messages response has data array")
            .unwrap();
        assert!(!shape.passed);
        let listing = report
            .checks
            .iter()
            .find(|c| c.name == "GET /api/messages returns success")
            .unwrap();
        assert!(listing.passed);
    }

    #[test]
    fn test_summary_and_json_report() {
        let mut report = Report::new("http://127.0.0.1:8420");
        report.record("a", true, None);
        report.record("b", false, Some("boom".into()));
        let mut out = Vec::new();
        print_summary(&mut out, &report).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Results: 1/2 passed"));
        assert!(text.contains("1 test(s) failed"));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["checks"][0], json!({"name": "a", "passed": true}));
        assert_eq!(value["checks"][1]["detail"], "boom");
    }
}
