use clap::{builder::ValueParser, Arg, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
            return Err("invalid log level".to_string());
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("CARDKEEP_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::with_args;

    fn parse_env_level(level: &str) -> Result<Option<u8>, clap::Error> {
        temp_env::with_var("CARDKEEP_LOG_LEVEL", Some(level), || {
            let command = with_args(clap::Command::new("test"));
            command
                .try_get_matches_from(vec!["test"])
                .map(|matches| matches.get_one::<u8>(super::ARG_VERBOSITY).copied())
        })
    }

    #[test]
    fn log_level_names_and_numbers() {
        for (value, expected) in [("error", 0_u8), ("warn", 1), ("INFO", 2), ("3", 3)] {
            assert_eq!(parse_env_level(value).ok().flatten(), Some(expected));
        }
    }

    #[test]
    fn log_level_rejects_garbage() {
        assert!(parse_env_level("verbose").is_err());
        assert!(parse_env_level("42").is_err());
    }
}
