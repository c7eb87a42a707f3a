//! Slash command parsing.
//!
//! Lines starting with `/` are commands; anything else is message text for
//! the selected contact.

use sociogram_client::AccountId;

/// Parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/signin`
    SignIn,
    /// `/callback <url>`: process the wallet redirect.
    Callback {
        /// Redirect URL or query string.
        redirect: String,
    },
    /// `/signout`
    SignOut,
    /// `/register <name>`
    Register {
        /// Requested username (may contain spaces).
        username: String,
    },
    /// `/refresh`: reload contacts and the open thread.
    Refresh,
    /// `/users`: reload contacts.
    Users,
    /// `/select <account>`
    Select {
        /// Contact to open.
        account: AccountId,
    },
    /// `/help`
    Help,
    /// `/quit` or `/q`
    Quit,
    /// Plain text.
    Message {
        /// Message text.
        content: String,
    },
    /// Unrecognized command.
    Unknown {
        /// The command word.
        input: String,
    },
    /// Known command with missing or bad arguments.
    InvalidArgs {
        /// The command word.
        command: &'static str,
        /// Usage hint.
        error: &'static str,
    },
}

/// Help text listing every command.
pub const HELP: &str = "/signin /callback <url> /signout /register <name> /refresh /users /select <account> /quit";

/// Parse one input line.
pub fn parse(line: &str) -> Command {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Command::Message { content: line.to_owned() };
    };

    let (word, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let args = args.trim();

    match word {
        "signin" | "login" => Command::SignIn,
        "signout" | "logout" => Command::SignOut,
        "callback" => {
            if args.is_empty() {
                Command::InvalidArgs { command: "callback", error: "usage: /callback <redirect-url>" }
            } else {
                Command::Callback { redirect: args.to_owned() }
            }
        },
        "register" => {
            if args.is_empty() {
                Command::InvalidArgs { command: "register", error: "usage: /register <name>" }
            } else {
                Command::Register { username: args.to_owned() }
            }
        },
        "select" => match args.split_whitespace().next() {
            Some(account) => Command::Select { account: AccountId::from(account) },
            None => Command::InvalidArgs { command: "select", error: "usage: /select <account>" },
        },
        "refresh" => Command::Refresh,
        "users" => Command::Users,
        "help" => Command::Help,
        "quit" | "q" => Command::Quit,
        _ => Command::Unknown { input: word.to_owned() },
    }
}
