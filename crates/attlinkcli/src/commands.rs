//! Command sequence parsing
//!
//! Everything after the options is a list of commands run left to right,
//! some of which take one or two arguments.

use attlink::{TransportMode, Uuid};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{0}: missing argument")]
    MissingArgument(&'static str),

    #[error("{command}: invalid argument '{value}'")]
    InvalidArgument { command: &'static str, value: String },

    #[error("{0}: not available over RFCOMM")]
    NotInRawMode(&'static str),
}

/// One step of the command sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List primary services
    Primary,
    /// List characteristic declarations
    Chars,
    /// List descriptors
    CharDesc,
    /// Print the battery level
    BatLevel,
    /// Change the receive timeout; negative waits forever
    Timeout(i64),
    /// Change the verbosity
    Verbose(u8),
    /// Subscribe to a characteristic and print notifications until idle
    Watch { service: u16, characteristic: u16 },
    /// Send one raw PDU
    Send(Vec<u8>),
    /// Receive one raw PDU
    Recv,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Primary => "primary",
            Command::Chars => "chars",
            Command::CharDesc => "char-desc",
            Command::BatLevel => "batlevel",
            Command::Timeout(_) => "timeout",
            Command::Verbose(_) => "verbose",
            Command::Watch { .. } => "watch",
            Command::Send(_) => "send",
            Command::Recv => "recv",
        }
    }

    /// Whether the command makes sense on a channel in `mode`
    pub fn allowed_in(&self, mode: TransportMode) -> bool {
        match mode {
            TransportMode::Att => true,
            TransportMode::Raw => matches!(
                self,
                Command::Timeout(_) | Command::Verbose(_) | Command::Send(_) | Command::Recv
            ),
        }
    }
}

/// Parses a 16-bit UUID such as `180f` or `0x2a19`
fn parse_short_uuid(command: &'static str, value: &str) -> Result<u16, CommandError> {
    value
        .parse::<Uuid>()
        .ok()
        .and_then(|uuid| uuid.as_short())
        .ok_or_else(|| CommandError::InvalidArgument {
            command,
            value: value.to_string(),
        })
}

fn parse_number<T: std::str::FromStr>(
    command: &'static str,
    value: &str,
) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidArgument {
        command,
        value: value.to_string(),
    })
}

/// Parses the whole command sequence, checking each command against `mode`
pub fn parse_commands<S: AsRef<str>>(
    args: &[S],
    mode: TransportMode,
) -> Result<Vec<Command>, CommandError> {
    let mut args = args.iter().map(AsRef::<str>::as_ref);
    let mut commands = Vec::new();

    while let Some(word) = args.next() {
        let mut arg =
            |name: &'static str| args.next().ok_or(CommandError::MissingArgument(name));

        let command = match word {
            "primary" => Command::Primary,
            "chars" => Command::Chars,
            "char-desc" | "char_desc" => Command::CharDesc,
            "batlevel" => Command::BatLevel,
            "timeout" => Command::Timeout(parse_number("timeout", arg("timeout")?)?),
            "verbose" => Command::Verbose(parse_number("verbose", arg("verbose")?)?),
            "watch" => {
                let service = parse_short_uuid("watch", arg("watch")?)?;
                let characteristic = parse_short_uuid("watch", arg("watch")?)?;
                Command::Watch {
                    service,
                    characteristic,
                }
            }
            "send" => {
                let value = arg("send")?;
                let bytes = hex::decode(value.replace([' ', ':'], "")).map_err(|_| {
                    CommandError::InvalidArgument {
                        command: "send",
                        value: value.to_string(),
                    }
                })?;
                if bytes.is_empty() {
                    return Err(CommandError::InvalidArgument {
                        command: "send",
                        value: value.to_string(),
                    });
                }
                Command::Send(bytes)
            }
            "recv" => Command::Recv,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        if !command.allowed_in(mode) {
            return Err(CommandError::NotInRawMode(command.name()));
        }
        commands.push(command);
    }

    Ok(commands)
}
