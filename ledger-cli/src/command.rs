//! Parsing one line of operator input.

/// Console commands, after alias resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Identity,
    Inbox,
    Sent,
    Drafts,
    Read,
    Send,
    Delete,
    Peers,
    Connect,
    Settings,
    Mode,
    Tor,
    Contacts,
    AddContact,
    GmailConfig,
    GmailStatus,
    GmailFetch,
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl Action {
    /// Resolve a lowercased command word.
    fn from_name(name: &str) -> Self {
        match name {
            "identity" | "id" => Action::Identity,
            "inbox" | "ls" => Action::Inbox,
            "sent" => Action::Sent,
            "drafts" => Action::Drafts,
            "read" | "show" => Action::Read,
            "send" => Action::Send,
            "delete" | "rm" => Action::Delete,
            "peers" => Action::Peers,
            "connect" => Action::Connect,
            "settings" => Action::Settings,
            "mode" => Action::Mode,
            "tor" => Action::Tor,
            "contacts" => Action::Contacts,
            "add-contact" => Action::AddContact,
            "gmail-config" => Action::GmailConfig,
            "gmail-status" => Action::GmailStatus,
            "gmail-fetch" => Action::GmailFetch,
            "status" => Action::Status,
            "help" | "?" => Action::Help,
            "quit" | "exit" | "q" => Action::Quit,
            other => Action::Unknown(other.to_string()),
        }
    }
}

/// One dispatchable input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub action: Action,
    /// Remainder of the line after the command word, trimmed. May be empty.
    pub argument: String,
}

impl Command {
    /// Split a line into a lowercased command word and the rest.
    ///
    /// Returns `None` for blank input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        Some(Self {
            action: Action::from_name(&word.to_lowercase()),
            argument: rest.to_string(),
        })
    }

    /// Inline argument, if one was given.
    pub fn arg(&self) -> Option<&str> {
        if self.argument.is_empty() {
            None
        } else {
            Some(&self.argument)
        }
    }
}

pub const HELP: &str = "
  Available Commands:
  ─────────────────────────────────────
  identity          Show your Ledger ID and peer info
  inbox             List inbox messages
  sent              List sent messages
  drafts            List draft messages
  read <id>         Show a message
  send              Send a message (interactive)
  delete <id>       Delete a message
  peers             List connected peers
  connect <addr>    Connect to a peer
  settings          Show current settings
  mode <mode>       Set delivery mode (auto/p2p_only/gmail_only)
  tor <on|off>      Enable or disable Tor transport
  contacts          List contacts
  add-contact       Add a contact (interactive)
  gmail-config      Configure Gmail (interactive)
  gmail-status      Show Gmail configuration
  gmail-fetch       Fetch Gmail messages
  status            Check API connectivity
  help              Show this help
  quit              Exit
";
