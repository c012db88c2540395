//! Turning envelopes into console output.

use std::io::{self, Write};

use chrono::{DateTime, Datelike, Local, TimeZone};
use ledger_api::Envelope;
use ledger_api::types::{Contact, FetchReport, GmailStatus, Identity, Message, Peer, PeerConnection};
use owo_colors::OwoColorize;
use serde::Serialize;

const PASS: &str = "✅";
const FAIL: &str = "❌";

/// Colour policy for one output stream.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub color: bool,
}

impl Style {
    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Success marker, green when colour is on.
    pub fn pass(&self) -> String {
        if self.color {
            PASS.green().to_string()
        } else {
            PASS.to_string()
        }
    }

    /// Failure marker, red when colour is on.
    pub fn fail(&self) -> String {
        if self.color {
            FAIL.red().to_string()
        } else {
            FAIL.to_string()
        }
    }

    fn id(&self, text: &str) -> String {
        if self.color {
            text.cyan().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn error(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Indented JSON dump of a whole envelope.
pub fn json<T: Serialize>(out: &mut dyn Write, value: &T) -> io::Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(out, "{text}")
}

/// `  ❌ Failed: <error>`.
pub fn failure<T>(out: &mut dyn Write, style: Style, envelope: &Envelope<T>) -> io::Result<()> {
    writeln!(
        out,
        "  {} Failed: {}",
        style.fail(),
        style.error(envelope.error_message())
    )
}

/// Generic commands: full envelope, plus a marked error line on failure.
pub fn generic(out: &mut dyn Write, style: Style, envelope: &Envelope) -> io::Result<bool> {
    json(out, envelope)?;
    if !envelope.is_success() {
        failure(out, style, envelope)?;
    }
    Ok(envelope.is_success())
}

/// Startup connectivity line.
pub fn connectivity(
    out: &mut dyn Write,
    style: Style,
    envelope: &Envelope<Identity>,
) -> io::Result<()> {
    if envelope.is_success() {
        let ledger_id = envelope
            .data
            .as_ref()
            .map(|id| id.ledger_id.as_str())
            .filter(|id| !id.is_empty())
            .unwrap_or("unknown");
        writeln!(out, "  Connected! Ledger ID: {}", style.id(ledger_id))
    } else {
        writeln!(
            out,
            "  ⚠ Not connected: {}",
            style.error(envelope.error_message())
        )?;
        writeln!(out, "  (Commands will fail until ledger-core is running)")
    }
}

/// `status`: marker line, then the identity envelope on success.
pub fn status(out: &mut dyn Write, style: Style, envelope: &Envelope) -> io::Result<bool> {
    if envelope.is_success() {
        writeln!(out, "  {} Ledger Core is running", style.pass())?;
        json(out, envelope)?;
        Ok(true)
    } else {
        writeln!(
            out,
            "  {} Not connected: {}",
            style.fail(),
            style.error(envelope.error_message())
        )?;
        Ok(false)
    }
}

/// Inbox listing: glyph and subject, then sender and short id.
pub fn inbox(
    out: &mut dyn Write,
    style: Style,
    envelope: &Envelope<Vec<Message>>,
    empty_text: &str,
) -> io::Result<bool> {
    if !envelope.is_success() {
        failure(out, style, envelope)?;
        return Ok(false);
    }
    let messages = envelope.data.as_deref().unwrap_or_default();
    if messages.is_empty() {
        writeln!(out, "  {empty_text}")?;
        return Ok(true);
    }
    for msg in messages {
        let subject = msg.subject_or_placeholder();
        let subject = if msg.is_read {
            subject.to_string()
        } else {
            style.bold(subject)
        };
        writeln!(out, "  {} {}", msg.delivery_method.glyph(), subject)?;

        let from = msg.from_id.as_deref().unwrap_or("?");
        let mut meta = format!(
            "     From: {}  |  {}...",
            from,
            style.id(&msg.short_id())
        );
        if let Some(ts) = msg.timestamp {
            meta.push_str(&format!("  |  {}", style.dim(&format_timestamp(ts))));
        }
        writeln!(out, "{meta}")?;
    }
    Ok(true)
}

/// Sent/drafts listing: one line per message with its recipient.
pub fn outgoing(
    out: &mut dyn Write,
    style: Style,
    envelope: &Envelope<Vec<Message>>,
    empty_text: &str,
) -> io::Result<bool> {
    if !envelope.is_success() {
        failure(out, style, envelope)?;
        return Ok(false);
    }
    let messages = envelope.data.as_deref().unwrap_or_default();
    if messages.is_empty() {
        writeln!(out, "  {empty_text}")?;
        return Ok(true);
    }
    for msg in messages {
        writeln!(
            out,
            "  → {} → {}",
            msg.subject_or_placeholder(),
            msg.to_id.as_deref().unwrap_or("?")
        )?;
    }
    Ok(true)
}

/// Result of `send`.
pub fn sent(out: &mut dyn Write, style: Style, envelope: &Envelope<Message>) -> io::Result<bool> {
    if !envelope.is_success() {
        failure(out, style, envelope)?;
        return Ok(false);
    }
    match &envelope.data {
        Some(msg) => writeln!(out, "  {} Sent via {}", style.pass(), msg.delivery_method)?,
        None => writeln!(out, "  {} Sent via ?", style.pass())?,
    }
    Ok(true)
}

/// Full message view for `read`.
pub fn message(out: &mut dyn Write, style: Style, envelope: &Envelope<Message>) -> io::Result<bool> {
    if !envelope.is_success() {
        failure(out, style, envelope)?;
        return Ok(false);
    }
    let Some(msg) = &envelope.data else {
        writeln!(out, "  Message not found.")?;
        return Ok(false);
    };
    writeln!(out, "  Subject: {}", style.bold(msg.subject_or_placeholder()))?;
    writeln!(out, "  From:    {}", msg.from_id.as_deref().unwrap_or("?"))?;
    writeln!(out, "  To:      {}", msg.to_id.as_deref().unwrap_or("?"))?;
    if let Some(ts) = msg.timestamp {
        writeln!(out, "  Date:    {}", format_timestamp(ts))?;
    }
    let lock = if msg.encrypted { "  (encrypted)" } else { "" };
    writeln!(
        out,
        "  Via:     {} {}{}",
        msg.delivery_method.glyph(),
        msg.delivery_method,
        lock
    )?;
    writeln!(out, "  Id:      {}", style.id(&msg.id))?;
    writeln!(out)?;
    for line in msg.body.as_deref().unwrap_or("").lines() {
        writeln!(out, "  {line}")?;
    }
    Ok(true)
}

/// Address book listing.
pub fn contacts(
    out: &mut dyn Write,
    style: Style,
    envelope: &Envelope<Vec<Contact>>,
) -> io::Result<bool> {
    if !envelope.is_success() {
        failure(out, style, envelope)?;
        return Ok(false);
    }
    let contacts = envelope.data.as_deref().unwrap_or_default();
    if contacts.is_empty() {
        writeln!(out, "  No contacts.")?;
        return Ok(true);
    }
    for contact in contacts {
        let name = contact.display_name.as_deref().unwrap_or("(unnamed)");
        let gmail = contact
            .gmail_address
            .as_deref()
            .map(|addr| format!("  <{addr}>"))
            .unwrap_or_default();
        writeln!(
            out,
            "  - {} {}{gmail}",
            style.bold(name),
            style.id(&contact.ledger_id)
        )?;
    }
    Ok(true)
}

/// One-line summary of the mail bridge configuration, shown before the dump.
pub fn gmail_status(out: &mut dyn Write, style: Style, envelope: Envelope) -> io::Result<bool> {
    let ok = generic(out, style, &envelope)?;
    if ok {
        let status: Envelope<GmailStatus> = envelope.decode();
        if let Some(status) = status.data {
            match (status.configured, status.email) {
                (true, Some(email)) => writeln!(out, "  Gmail bridge configured for {email}")?,
                _ => writeln!(out, "  Gmail bridge not configured (run gmail-config)")?,
            }
        }
    }
    Ok(ok)
}

/// `peers`: the envelope, then one line per connected peer.
pub fn peers(out: &mut dyn Write, style: Style, envelope: Envelope) -> io::Result<bool> {
    let ok = generic(out, style, &envelope)?;
    if ok {
        let peers: Vec<Peer> = envelope.decode_list().data.unwrap_or_default();
        if peers.is_empty() {
            writeln!(out, "  No peers connected.")?;
        }
        for peer in &peers {
            match peer.ledger_id.as_deref() {
                Some(ledger_id) => {
                    writeln!(out, "  - {} ({ledger_id})", style.id(&peer.peer_id))?
                }
                None => writeln!(out, "  - {}", style.id(&peer.peer_id))?,
            }
        }
    }
    Ok(ok)
}

/// `connect`: the envelope, then the dial status.
pub fn connection(out: &mut dyn Write, style: Style, envelope: Envelope) -> io::Result<bool> {
    let ok = generic(out, style, &envelope)?;
    if ok {
        if let Some(conn) = envelope.decode::<PeerConnection>().data {
            writeln!(out, "  {} {}: {}", style.pass(), style.id(&conn.peer_id), conn.status)?;
        }
    }
    Ok(ok)
}

/// `gmail-fetch`: the envelope, then a count and the fetched subjects.
pub fn fetched(out: &mut dyn Write, style: Style, envelope: Envelope) -> io::Result<bool> {
    let ok = generic(out, style, &envelope)?;
    if ok {
        if let Some(report) = envelope.decode::<FetchReport>().data {
            writeln!(out, "  {} Fetched {} message(s)", style.pass(), report.fetched)?;
            for msg in &report.messages {
                writeln!(out, "    {} {}", msg.delivery_method.glyph(), msg.subject_or_placeholder())?;
            }
        }
    }
    Ok(ok)
}

/// Human-readable unix timestamp, relative to now.
pub fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => format_relative(dt, Local::now()),
        None => ts.to_string(),
    }
}

/// "Today 14:30", "Yesterday 09:15", "Mon 14:30", "Dec 5" or "Dec 5 2023".
fn format_relative(dt: DateTime<Local>, now: DateTime<Local>) -> String {
    let today = now.date_naive();
    let date = dt.date_naive();
    let yesterday = today.pred_opt().unwrap_or(today);

    if date == today {
        format!("Today {}", dt.format("%H:%M"))
    } else if date == yesterday {
        format!("Yesterday {}", dt.format("%H:%M"))
    } else if date < today && (today - date).num_days() < 7 {
        dt.format("%a %H:%M").to_string()
    } else if date.year() == today.year() {
        dt.format("%b %-d").to_string()
    } else {
        dt.format("%b %-d %Y").to_string()
    }
}
