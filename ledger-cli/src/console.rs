//! Interactive read/dispatch loop.
//!
//! Each line is parsed, validated, sent to the service and rendered before
//! the next prompt appears. A failing command only prints its error.

use std::io::{self, Write};

use ledger_api::types::{
    Contact, DeliveryMode, Folder, GmailCredentials, Identity, Message, SendMessage,
    SettingsUpdate,
};
use ledger_api::{Envelope, LedgerClient};
use log::debug;

use crate::command::{Action, Command, HELP};
use crate::render::{self, Style};
use crate::terminal::Terminal;

/// What a dispatched line amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Blank line.
    Nothing,
    /// Command ran; `ok` is false for any rendered failure.
    Done { ok: bool },
    /// Operator asked to leave.
    Quit,
}

/// Console state shared across commands.
pub struct Console<'a, T: Terminal, W: Write> {
    client: &'a LedgerClient,
    term: T,
    out: W,
    style: Style,
    prompt: String,
    default_mode: DeliveryMode,
}

impl<'a, T: Terminal, W: Write> Console<'a, T, W> {
    pub fn new(client: &'a LedgerClient, term: T, out: W) -> Self {
        Self {
            client,
            term,
            out,
            style: Style::plain(),
            prompt: "ledger> ".to_string(),
            default_mode: DeliveryMode::default(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_default_mode(mut self, mode: DeliveryMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Report connectivity, then read and dispatch until quit or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.out, "  API: {}", self.client.base_url())?;
        let identity: Envelope<Identity> = self.client.identity().decode();
        render::connectivity(&mut self.out, self.style, &identity)?;
        writeln!(self.out)?;

        loop {
            self.out.flush()?;
            let Some(line) = self.term.read_line(&self.prompt)? else {
                writeln!(self.out, "\nGoodbye!")?;
                break;
            };
            if self.execute(&line)? == Outcome::Quit {
                break;
            }
        }
        self.out.flush()
    }

    /// Dispatch a single line.
    pub fn execute(&mut self, line: &str) -> io::Result<Outcome> {
        let Some(cmd) = Command::parse(line) else {
            return Ok(Outcome::Nothing);
        };
        debug!("dispatching {:?}", cmd.action);

        let ok = match &cmd.action {
            Action::Quit => {
                writeln!(self.out, "Goodbye!")?;
                return Ok(Outcome::Quit);
            }
            Action::Help => {
                writeln!(self.out, "{HELP}")?;
                true
            }
            Action::Identity => {
                let envelope = self.client.identity();
                render::generic(&mut self.out, self.style, &envelope)?
            }
            Action::Status => {
                let envelope = self.client.identity();
                render::status(&mut self.out, self.style, &envelope)?
            }
            Action::Inbox => {
                let envelope = self.client.list_messages(Some(Folder::Inbox)).decode_list();
                render::inbox(&mut self.out, self.style, &envelope, "No messages in inbox.")?
            }
            Action::Sent => {
                let envelope = self.client.list_messages(Some(Folder::Sent)).decode_list();
                render::outgoing(&mut self.out, self.style, &envelope, "No sent messages.")?
            }
            Action::Drafts => {
                let envelope = self.client.list_messages(Some(Folder::Drafts)).decode_list();
                render::outgoing(&mut self.out, self.style, &envelope, "No drafts.")?
            }
            Action::Read => self.read(&cmd)?,
            Action::Send => self.send()?,
            Action::Delete => self.delete(&cmd)?,
            Action::Peers => {
                let envelope = self.client.list_peers();
                render::peers(&mut self.out, self.style, envelope)?
            }
            Action::Connect => self.connect(&cmd)?,
            Action::Settings => {
                let envelope = self.client.settings();
                render::generic(&mut self.out, self.style, &envelope)?
            }
            Action::Mode => self.mode(&cmd)?,
            Action::Tor => self.tor(&cmd)?,
            Action::Contacts => {
                let envelope = self.client.list_contacts().decode_list::<Contact>();
                render::contacts(&mut self.out, self.style, &envelope)?
            }
            Action::AddContact => self.add_contact()?,
            Action::GmailConfig => self.gmail_config()?,
            Action::GmailStatus => {
                let envelope = self.client.gmail_status();
                render::gmail_status(&mut self.out, self.style, envelope)?
            }
            Action::GmailFetch => {
                let envelope = self.client.fetch_gmail();
                render::fetched(&mut self.out, self.style, envelope)?
            }
            Action::Unknown(name) => {
                writeln!(
                    self.out,
                    "  Unknown command: {name}. Type 'help' for commands."
                )?;
                false
            }
        };
        Ok(Outcome::Done { ok })
    }

    fn read(&mut self, cmd: &Command) -> io::Result<bool> {
        let Some(id) = self.arg_or_prompt(cmd, "  Message id: ")? else {
            return self.cancelled();
        };
        let envelope: Envelope<Message> = self.client.get_message(&id).decode();
        render::message(&mut self.out, self.style, &envelope)
    }

    fn delete(&mut self, cmd: &Command) -> io::Result<bool> {
        let Some(id) = self.arg_or_prompt(cmd, "  Message id: ")? else {
            return self.cancelled();
        };
        let envelope = self.client.delete_message(&id);
        render::generic(&mut self.out, self.style, &envelope)
    }

    fn connect(&mut self, cmd: &Command) -> io::Result<bool> {
        let Some(addr) = self.arg_or_prompt(cmd, "  Multiaddr: ")? else {
            return self.cancelled();
        };
        let envelope = self.client.connect_peer(&addr);
        render::connection(&mut self.out, self.style, envelope)
    }

    fn send(&mut self) -> io::Result<bool> {
        let Some(to) = self.field("  To (ledger:... or email): ")? else {
            return self.cancelled();
        };
        let Some(subject) = self.field("  Subject: ")? else {
            return self.cancelled();
        };
        let Some(body) = self.field("  Body: ")? else {
            return self.cancelled();
        };
        let mode_prompt = format!(
            "  Mode ({}) [{}]: ",
            DeliveryMode::ALL.map(|m| m.as_str()).join("/"),
            self.default_mode
        );
        let Some(mode) = self.field(&mode_prompt)? else {
            return self.cancelled();
        };
        let mode = if mode.is_empty() {
            self.default_mode
        } else {
            match mode.parse::<DeliveryMode>() {
                Ok(mode) => mode,
                Err(_) => return self.mode_usage(),
            }
        };

        let message = SendMessage {
            to,
            subject,
            body,
            mode,
        };
        let envelope: Envelope<Message> = self.client.send_message(&message).decode();
        render::sent(&mut self.out, self.style, &envelope)
    }

    fn mode(&mut self, cmd: &Command) -> io::Result<bool> {
        // Validated locally; an invalid mode never reaches the service
        let Ok(mode) = cmd.argument.parse::<DeliveryMode>() else {
            return self.mode_usage();
        };
        let envelope = self
            .client
            .update_settings(&SettingsUpdate::delivery_mode(mode));
        render::generic(&mut self.out, self.style, &envelope)
    }

    fn tor(&mut self, cmd: &Command) -> io::Result<bool> {
        let enabled = match cmd.argument.to_lowercase().as_str() {
            "on" | "true" | "enable" => true,
            "off" | "false" | "disable" => false,
            _ => {
                writeln!(self.out, "  Usage: tor on|off")?;
                return Ok(false);
            }
        };
        let envelope = self
            .client
            .update_settings(&SettingsUpdate::tor_enabled(enabled));
        render::generic(&mut self.out, self.style, &envelope)
    }

    fn add_contact(&mut self) -> io::Result<bool> {
        let Some(ledger_id) = self.field("  Ledger ID: ")? else {
            return self.cancelled();
        };
        let Some(public_key) = self.field("  Public key: ")? else {
            return self.cancelled();
        };
        let Some(display_name) = self.field("  Display name (optional): ")? else {
            return self.cancelled();
        };
        let Some(gmail_address) = self.field("  Gmail address (optional): ")? else {
            return self.cancelled();
        };

        let contact = Contact {
            ledger_id,
            public_key,
            display_name: non_empty(display_name),
            gmail_address: non_empty(gmail_address),
        };
        let envelope = self.client.add_contact(&contact);
        render::generic(&mut self.out, self.style, &envelope)
    }

    fn gmail_config(&mut self) -> io::Result<bool> {
        let Some(email) = self.field("  Gmail address: ")? else {
            return self.cancelled();
        };
        self.out.flush()?;
        let Some(app_password) = self.term.read_secret("  App password: ")? else {
            return self.cancelled();
        };
        let credentials = GmailCredentials {
            email,
            app_password: app_password.trim().to_string(),
        };
        let envelope = self.client.configure_gmail(&credentials);
        render::generic(&mut self.out, self.style, &envelope)
    }

    fn mode_usage(&mut self) -> io::Result<bool> {
        writeln!(self.out, "  Usage: mode {}", DeliveryMode::usage())?;
        Ok(false)
    }

    fn cancelled(&mut self) -> io::Result<bool> {
        writeln!(self.out, "\n  Cancelled.")?;
        Ok(false)
    }

    /// Prompt for one field; `None` if input ended.
    fn field(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.out.flush()?;
        Ok(self
            .term
            .read_line(prompt)?
            .map(|value| value.trim().to_string()))
    }

    /// Inline argument, or an interactive prompt when it is missing.
    fn arg_or_prompt(&mut self, cmd: &Command, prompt: &str) -> io::Result<Option<String>> {
        match cmd.arg() {
            Some(arg) => Ok(Some(arg.to_string())),
            None => self.field(prompt),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
