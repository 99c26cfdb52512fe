/// A classified input line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Blank line, ignored.
    Empty,
    /// `exit` or `quit`.
    Exit,
    /// `clear`: restore the initial transcript.
    Clear,
    /// `history`: print the transcript.
    History,
    /// `model <name>`: switch models.
    SwitchModel(&'a str),
    /// `model` alone: print the current model.
    ShowModel,
    /// `models`: list the models the provider offers.
    ListModels,
    /// `help`: print the command summary.
    Help,
    /// Anything else is sent to the model.
    Chat(&'a str),
}

impl<'a> Command<'a> {
    /// Classifies `line`. Keywords are matched case-insensitively.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };
        let is = |name: &str| keyword.eq_ignore_ascii_case(name);
        match rest {
            "" if is("exit") || is("quit") => Command::Exit,
            "" if is("clear") => Command::Clear,
            "" if is("history") => Command::History,
            "" if is("model") => Command::ShowModel,
            "" if is("models") => Command::ListModels,
            "" if is("help") => Command::Help,
            name if is("model") => Command::SwitchModel(name),
            _ => Command::Chat(line),
        }
    }
}

/// The summary printed by `help` and at startup.
pub const HELP: &str = "\
Commands:
- Type 'exit' or 'quit' to quit
- Type 'clear' to clear history
- Type 'history' to view chat history
- Type 'model <name>' to switch models
- Type 'model' to show the current model
- Type 'models' to list available models
- Type 'help' to show this message";
