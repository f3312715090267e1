/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// The fixed command vocabulary the bot answers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Start,
    Help,
    Status,
    Stats,
    Docker,
    K8s,
}

impl CommandKind {
    pub const ALL: [CommandKind; 6] = [
        CommandKind::Start,
        CommandKind::Help,
        CommandKind::Status,
        CommandKind::Stats,
        CommandKind::Docker,
        CommandKind::K8s,
    ];

    /// Bare command name; also the command counter key.
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Start => "start",
            CommandKind::Help => "help",
            CommandKind::Status => "status",
            CommandKind::Stats => "stats",
            CommandKind::Docker => "docker",
            CommandKind::K8s => "k8s",
        }
    }

    /// Slash form as the user typed it; recorded in the interaction log.
    pub fn token(self) -> String {
        format!("/{}", self.name())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// Who sent an interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub user_id: UserId,
    /// Telegram `@username`, if the user has one.
    pub username: Option<String>,
    /// Human name used in greetings (Telegram first name).
    pub display_name: Option<String>,
}

impl Sender {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id: UserId(user_id),
            username: None,
            display_name: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Best name to greet the user with.
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("there")
    }
}

/// One inbound unit of user input, already classified by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    Command { kind: CommandKind, sender: Sender },
    FreeText { sender: Sender, text: String },
}

impl Interaction {
    pub fn command(kind: CommandKind, sender: Sender) -> Self {
        Interaction::Command { kind, sender }
    }

    pub fn free_text(sender: Sender, text: impl Into<String>) -> Self {
        Interaction::FreeText {
            sender,
            text: text.into(),
        }
    }

    pub fn sender(&self) -> &Sender {
        match self {
            Interaction::Command { sender, .. } | Interaction::FreeText { sender, .. } => sender,
        }
    }

    /// Text recorded in the interaction log: the command token or the raw text.
    pub fn log_message(&self) -> String {
        match self {
            Interaction::Command { kind, .. } => kind.token(),
            Interaction::FreeText { text, .. } => text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_round_trip_case_insensitively() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(CommandKind::from_name("Docker"), Some(CommandKind::Docker));
        assert_eq!(CommandKind::from_name("K8S"), Some(CommandKind::K8s));
        assert_eq!(CommandKind::from_name("restart"), None);
        assert_eq!(CommandKind::from_name(""), None);
    }

    #[test]
    fn log_message_uses_token_for_commands_and_raw_text_otherwise() {
        let s = Sender::new(1);
        assert_eq!(
            Interaction::command(CommandKind::Start, s.clone()).log_message(),
            "/start"
        );
        assert_eq!(Interaction::free_text(s, "  ").log_message(), "  ");
    }

    #[test]
    fn greeting_prefers_display_name() {
        let s = Sender::new(1).with_username("neo");
        assert_eq!(s.greeting_name(), "neo");
        assert_eq!(s.clone().with_display_name("Thomas").greeting_name(), "Thomas");
        assert_eq!(Sender::new(2).greeting_name(), "there");
    }
}
