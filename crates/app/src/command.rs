use std::fmt;

/// One line typed at the quiz prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 1-based question number and the chosen value.
    Answer { number: usize, value: String },
    Submit,
    Retry,
    New,
    Shuffle,
    Status,
    Review,
    History,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    BadNumber(String),
    MissingAnswer,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "type a command; `help` lists them"),
            CommandError::Unknown(raw) => write!(f, "unknown command: {raw}"),
            CommandError::BadNumber(raw) => write!(f, "not a question number: {raw}"),
            CommandError::MissingAnswer => write!(f, "usage: answer <number> <value>"),
        }
    }
}

impl std::error::Error for CommandError {}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(head, rest)| (head, rest.trim()));

        match head {
            "" => Err(CommandError::Empty),
            "answer" | "a" => {
                let (number, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::MissingAnswer)?;
                let number: usize = number
                    .parse()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| CommandError::BadNumber(number.to_string()))?;
                let value = value.trim();
                if value.is_empty() {
                    return Err(CommandError::MissingAnswer);
                }
                Ok(Command::Answer {
                    number,
                    value: value.to_string(),
                })
            }
            "submit" => Ok(Command::Submit),
            "retry" => Ok(Command::Retry),
            "new" => Ok(Command::New),
            "shuffle" => Ok(Command::Shuffle),
            "status" | "s" => Ok(Command::Status),
            "review" => Ok(Command::Review),
            "history" => Ok(Command::History),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_answer_with_spaces_in_value() {
        assert_eq!(
            Command::parse("answer 3  New York ").unwrap(),
            Command::Answer {
                number: 3,
                value: "New York".into()
            }
        );
        assert_eq!(
            Command::parse("a 1 صح").unwrap(),
            Command::Answer {
                number: 1,
                value: "صح".into()
            }
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert_eq!(Command::parse("answer 2"), Err(CommandError::MissingAnswer));
        assert_eq!(
            Command::parse("answer 0 x"),
            Err(CommandError::BadNumber("0".into()))
        );
        assert_eq!(
            Command::parse("dance"),
            Err(CommandError::Unknown("dance".into()))
        );
    }

    #[test]
    fn parses_plain_commands() {
        assert_eq!(Command::parse("submit").unwrap(), Command::Submit);
        assert_eq!(Command::parse(" q ").unwrap(), Command::Quit);
        assert_eq!(Command::parse("shuffle").unwrap(), Command::Shuffle);
    }
}
