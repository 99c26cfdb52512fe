//! The interactive loop.

use std::future::pending;
use std::io::{self, Write};
use std::pin::{Pin, pin};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use llm_chat_core::ConversationClient;
use owo_colors::{OwoColorize, Style};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::command::{Command, HELP};
use crate::config::ProviderKind;

const SPINNER_TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const INTERRUPTED: &str = "\n\nExiting gracefully...";

type Interrupt = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Reads lines from `input`, dispatches commands and chats through a
/// [`ConversationClient`], writing everything to `output`.
///
/// The loop ends on `exit`, `quit`, end of input or an interrupt. Provider
/// failures are reported and the loop keeps going. Lines that aren't valid
/// UTF-8 are skipped.
pub struct Repl<R, W> {
    client: ConversationClient,
    kind: ProviderKind,
    input: R,
    output: W,
    terminal: bool,
    spinner: Option<ProgressStyle>,
    interrupt: Interrupt,
}

impl<R, W> Repl<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    /// Creates a loop over `client`.
    pub fn new(
        client: ConversationClient,
        kind: ProviderKind,
        input: R,
        output: W,
    ) -> Self {
        Self {
            client,
            kind,
            input,
            output,
            terminal: false,
            spinner: None,
            interrupt: Box::pin(pending()),
        }
    }

    /// Stops the loop when `interrupt` completes, whether it is waiting
    /// for input or for a reply. The binary passes Ctrl+C here.
    pub fn with_interrupt<F>(mut self, interrupt: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.interrupt = Box::pin(interrupt);
        self
    }

    /// Colors the labels and shows a spinner while waiting for the reply.
    /// Only makes sense when the output is a terminal.
    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self.spinner = terminal
            .then(|| ProgressStyle::with_template("{spinner} {wide_msg}").ok())
            .flatten()
            .map(|style| style.tick_chars(SPINNER_TICKS));
        self
    }

    /// Returns the conversation client.
    #[inline]
    pub fn client(&self) -> &ConversationClient {
        &self.client
    }

    /// Returns the output sink.
    #[inline]
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Runs until the user quits or the input ends.
    pub async fn run(&mut self) -> io::Result<()> {
        self.print_banner()?;

        let mut buf = Vec::new();
        loop {
            let style = Style::new().bright_green().bold();
            let label = paint(self.terminal, "You:", style);
            write!(self.output, "\n{label} ")?;
            self.output.flush()?;

            buf.clear();
            let read = select! {
                biased;
                _ = self.interrupt.as_mut() => None,
                read = self.input.read_until(b'\n', &mut buf) => Some(read),
            };
            let Some(read) = read else {
                self.interrupt = Box::pin(pending());
                writeln!(self.output, "{INTERRUPTED}")?;
                return Ok(());
            };
            if read? == 0 {
                // End of input.
                writeln!(self.output, "\n\nGoodbye!")?;
                return Ok(());
            }

            let Ok(line) = std::str::from_utf8(&buf) else {
                warn!("ignoring an input line that is not valid UTF-8");
                continue;
            };
            if !self.dispatch(line).await? {
                return Ok(());
            }
        }
    }

    fn print_banner(&mut self) -> io::Result<()> {
        let out = &mut self.output;
        writeln!(
            out,
            "\n=== Welcome to {} Chat! ===",
            self.kind.display_name()
        )?;
        writeln!(out, "\nUsing model: {}", self.client.model())?;
        writeln!(out, "\n{HELP}")
    }

    /// Handles one input line. Returns `false` when the loop should stop.
    async fn dispatch(&mut self, line: &str) -> io::Result<bool> {
        match Command::parse(line) {
            Command::Empty => {}
            Command::Exit => {
                writeln!(self.output, "\nGoodbye!")?;
                return Ok(false);
            }
            Command::Clear => {
                self.client.clear();
                writeln!(self.output, "\nConversation history cleared.")?;
            }
            Command::History => {
                let history = self.client.format_history();
                if history.is_empty() {
                    writeln!(self.output, "\nNo messages yet.")?;
                } else {
                    write!(self.output, "\n{history}")?;
                }
            }
            Command::SwitchModel(name) => {
                let model = self.kind.resolve_model(name);
                self.client.switch_model(model);
                writeln!(
                    self.output,
                    "\nSwitched to model: {}",
                    self.client.model()
                )?;
            }
            Command::ShowModel => {
                let model = self.client.model();
                writeln!(self.output, "\nCurrent model: {model}")?;
            }
            Command::ListModels => self.list_models().await?,
            Command::Help => writeln!(self.output, "\n{HELP}")?,
            Command::Chat(text) => return self.chat(text).await,
        }
        Ok(true)
    }

    async fn list_models(&mut self) -> io::Result<()> {
        let aliases = self.kind.model_aliases();
        if !aliases.is_empty() {
            writeln!(self.output, "\nAvailable models:")?;
            for (i, (alias, id)) in aliases.iter().enumerate() {
                writeln!(self.output, "{}. {alias} ({id})", i + 1)?;
            }
            return Ok(());
        }

        match self.client.list_models().await {
            Ok(models) if models.is_empty() => {
                writeln!(
                    self.output,
                    "\nThe provider did not list any models."
                )?;
            }
            Ok(models) => {
                let models = models.join(", ");
                writeln!(self.output, "\nAvailable models: {models}")?;
            }
            Err(err) => self.print_error(&err)?,
        }
        Ok(())
    }

    /// Sends one chat line. Returns `false` if the user interrupted it.
    async fn chat(&mut self, text: &str) -> io::Result<bool> {
        let Self {
            client,
            output,
            terminal,
            spinner,
            interrupt,
            ..
        } = self;
        let label = paint(*terminal, "AI:", Style::new().bright_cyan().bold());

        let (delta_tx, mut delta_rx) = mpsc::unbounded_channel();
        let mut progress_bar = spinner.as_ref().map(|style| {
            let progress_bar = ProgressBar::new_spinner();
            progress_bar.set_style(style.clone());
            progress_bar.set_message("🤔 Thinking...");
            progress_bar
        });
        let mut started = false;

        let outcome = {
            let mut send_fut = pin!(client.send_with(text, move |delta| {
                delta_tx.send(delta).ok();
            }));
            loop {
                select! {
                    biased;
                    Some(delta) = delta_rx.recv() => {
                        // Clear the spinner before printing anything else.
                        if let Some(progress_bar) = progress_bar.take() {
                            progress_bar.finish_and_clear();
                        }
                        write_delta(output, &label, &mut started, &delta)?;
                    }
                    _ = interrupt.as_mut() => break None,
                    result = &mut send_fut => break Some(result),
                    _ = sleep(Duration::from_millis(100)),
                        if progress_bar.is_some() =>
                    {
                        if let Some(progress_bar) = &progress_bar {
                            progress_bar.inc(1);
                        }
                    }
                }
            }
        };
        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }
        let Some(result) = outcome else {
            *interrupt = Box::pin(pending());
            writeln!(output, "{INTERRUPTED}")?;
            return Ok(false);
        };
        // Fragments emitted in the same poll that completed the call.
        while let Ok(delta) = delta_rx.try_recv() {
            write_delta(output, &label, &mut started, &delta)?;
        }

        match result {
            Ok(_) => {
                if !started {
                    write_delta(output, &label, &mut started, "")?;
                }
                writeln!(output)?;
            }
            Err(err) => {
                if started {
                    writeln!(output)?;
                }
                self.print_error(&err)?;
            }
        }
        Ok(true)
    }

    fn print_error(&mut self, err: &llm_chat_core::Error) -> io::Result<()> {
        error!("{err}");
        let style = Style::new().bright_red().bold();
        let label = paint(self.terminal, "Error:", style);
        writeln!(self.output, "\n{label} {err}")?;
        writeln!(self.output, "Please try again.")
    }
}

fn paint(terminal: bool, label: &str, style: Style) -> String {
    if terminal {
        label.style(style).to_string()
    } else {
        label.to_owned()
    }
}

fn write_delta<W: Write>(
    output: &mut W,
    label: &str,
    started: &mut bool,
    delta: &str,
) -> io::Result<()> {
    if !*started {
        write!(output, "\n{label} ")?;
        *started = true;
    }
    write!(output, "{delta}")?;
    output.flush()
}
