/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: post it as a notice.
    Post(String),
    /// `/name <new name>`
    Rename(String),
    /// `/poll`
    Poll,
    /// `/quit`
    Quit,
    /// `/help`
    Help,
    /// Blank line.
    Nothing,
    /// Anything else starting with `/`.
    Unknown(String),
}

pub const HELP: &str = "\
Type a line and press enter to post it.
  /name <name>  change your author name
  /poll         check for new notices now
  /quit         exit";

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Command::Nothing;
        }

        let Some(rest) = line.trim_start().strip_prefix('/') else {
            return Command::Post(line.to_string());
        };

        let (word, arg) = match rest.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (rest, ""),
        };

        match word {
            "name" => Command::Rename(arg.to_string()),
            "poll" => Command::Poll,
            "quit" | "exit" => Command::Quit,
            "help" => Command::Help,
            _ => Command::Unknown(word.to_string()),
        }
    }
}
