//! Command parser for the : command system

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch to a configured network by name
    Network(String),
    /// Set the block tag of reads (`latest` or a number)
    Block(String),
    /// Set the gas price in gwei (`auto` for the node's price)
    Gas(Option<String>),
    /// Sign with the n-th node account
    Account(usize),
    /// Reconnect, optionally to an explicit endpoint URL
    Connect(Option<String>),
    /// Drop the session
    Disconnect,
    /// Reload the config file and rescan deployments
    Reload,
    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cmd.to_lowercase().as_str() {
        "network" | "net" => match args {
            Some(name) => Command::Network(name),
            None => Command::Unknown(input.to_string()),
        },
        "block" | "blk" => Command::Block(args.unwrap_or_else(|| "latest".to_string())),
        "gas" => Command::Gas(args),
        "account" | "acc" => {
            match args.as_deref().map(str::parse::<usize>) {
                Some(Ok(index)) => Command::Account(index),
                None => Command::Account(0),
                Some(Err(_)) => Command::Unknown(input.to_string()),
            }
        }
        "connect" | "conn" => Command::Connect(args),
        "disconnect" | "logout" => Command::Disconnect,
        "reload" => Command::Reload,
        "help" | "h" => Command::Help,
        "quit" | "q" => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(
            parse_command("network kcc-test"),
            Command::Network("kcc-test".to_string())
        );
        assert_eq!(parse_command("connect"), Command::Connect(None));
        assert_eq!(
            parse_command("conn ws://localhost:8546"),
            Command::Connect(Some("ws://localhost:8546".to_string()))
        );
        assert_eq!(parse_command("disconnect"), Command::Disconnect);
        assert_eq!(parse_command("account"), Command::Account(0));
        assert_eq!(parse_command("acc 3"), Command::Account(3));
    }

    #[test]
    fn test_parse_block_and_gas() {
        assert_eq!(parse_command("block"), Command::Block("latest".to_string()));
        assert_eq!(
            parse_command("block 1200"),
            Command::Block("1200".to_string())
        );
        assert_eq!(parse_command("gas"), Command::Gas(None));
        assert_eq!(parse_command("gas 1.5"), Command::Gas(Some("1.5".to_string())));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse_command("notacommand"),
            Command::Unknown("notacommand".to_string())
        );
        assert_eq!(
            parse_command("network"),
            Command::Unknown("network".to_string())
        );
        assert_eq!(
            parse_command("account x"),
            Command::Unknown("account x".to_string())
        );
    }
}
