//! Interactive console front end.

use crate::assistant::ResearchAssistant;
use crate::error::AssistantError;
use crate::pipeline::ProgressEvent;
use crate::report::{to_markdown, ReportFormat};
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::warn;

const HELP: &str = "\
Commands:
  <text>               research a topic, or ask a follow-up once a summary exists
  /research <topic>    start a new research session
  /ask <question>      ask a follow-up about the current summary
  /show                print the current session as Markdown
  /export <json|md|pdf|all>
                       write research_report.* to the export directory
  /help                show this help
  /quit                leave (Ctrl-D also works)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Text(String),
    Research(String),
    Ask(String),
    Show,
    Export(Vec<ReportFormat>),
    Help,
    Quit,
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Text(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "research" | "r" => Command::Research(arg.to_string()),
        "ask" | "a" => Command::Ask(arg.to_string()),
        "show" => Command::Show,
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "export" | "e" => {
            if arg.eq_ignore_ascii_case("all") {
                return Command::Export(ReportFormat::ALL.to_vec());
            }
            match ReportFormat::parse(arg) {
                Some(format) => Command::Export(vec![format]),
                None => Command::Invalid(format!(
                    "unknown export format {:?}; use json, md, pdf or all",
                    arg
                )),
            }
        }
        other => Command::Invalid(format!("unknown command /{}; type /help", other)),
    }
}

/// Prints pipeline progress the way the console shows it.
pub fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::Searching { query } => println!("\nSearching the web for {:?}...", query),
        ProgressEvent::Scraping { url } => println!("Scraping: {}", url),
        ProgressEvent::ScrapeFailed { error, .. } => println!("  {}", error),
        ProgressEvent::Summarizing => println!("\nSummarizing the research..."),
    }
}

pub struct Shell<'a> {
    assistant: &'a mut ResearchAssistant,
    export_dir: PathBuf,
}

impl<'a> Shell<'a> {
    pub fn new(assistant: &'a mut ResearchAssistant, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            assistant,
            export_dir: export_dir.into(),
        }
    }

    pub fn greeting(&self) -> String {
        match self.assistant.snapshot() {
            Some(session) if self.assistant.has_session() => format!(
                "Resumed research on {:?} ({} follow-ups). Ask a follow-up, /research a new topic, or /help.",
                session.topic,
                session.followups.len()
            ),
            _ => "What would you like me to research? (/help for commands)".to_string(),
        }
    }

    /// Handles one input line. Action failures are reported to `out`, never returned.
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        match parse_command(line) {
            Command::Empty => {}
            Command::Text(text) if self.assistant.has_session() => self.ask(&text, out).await?,
            Command::Text(text) => self.research(&text, out).await?,
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Exit),
            Command::Invalid(message) => writeln!(out, "{}", message)?,
            Command::Research(topic) => self.research(&topic, out).await?,
            Command::Ask(question) => self.ask(&question, out).await?,
            Command::Show => match self.assistant.snapshot() {
                Some(session) if self.assistant.has_session() => {
                    write!(out, "{}", to_markdown(&session))?
                }
                _ => report_error(out, &AssistantError::NoActiveSession)?,
            },
            Command::Export(formats) => {
                for format in formats {
                    match self.assistant.export_to_dir(format, &self.export_dir) {
                        Ok(path) => writeln!(out, "Saved {}", path.display())?,
                        Err(e) => {
                            report_error(out, &e)?;
                            break;
                        }
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    async fn research<W: Write>(&mut self, topic: &str, out: &mut W) -> io::Result<()> {
        match self.assistant.research(topic).await {
            Ok(outcome) => {
                let failed = outcome.pages.iter().filter(|p| p.is_failed()).count();
                if failed > 0 {
                    writeln!(out, "({} of {} pages could not be read)", failed, outcome.pages.len())?;
                }
                writeln!(out, "\nSummary of Findings:\n{}\n", outcome.summary)?;
                writeln!(
                    out,
                    "Ask a follow-up question, or /export json|md|pdf|all to save the report."
                )
            }
            Err(e) => report_error(out, &e),
        }
    }

    async fn ask<W: Write>(&mut self, question: &str, out: &mut W) -> io::Result<()> {
        match self.assistant.ask(question).await {
            Ok(followup) => writeln!(out, "\nAnswer:\n{}\n", followup.answer),
            Err(e) => report_error(out, &e),
        }
    }
}

fn report_error<W: Write>(out: &mut W, err: &AssistantError) -> io::Result<()> {
    match err {
        AssistantError::NothingToSummarize(_) | AssistantError::NoActiveSession | AssistantError::EmptyInput(_) => {}
        other => warn!("Action failed: {}", other),
    }
    writeln!(out, "Error: {}", err)
}

/// Runs the read-eval-print loop on the terminal until the user quits.
pub async fn run(assistant: &mut ResearchAssistant, export_dir: PathBuf) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut shell = Shell::new(assistant, export_dir);
    let mut stdout = io::stdout();

    println!("{}", shell.greeting());
    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        let flow = shell.handle_line(&line, &mut stdout).await?;
        stdout.flush()?;
        if flow == Flow::Exit {
            break;
        }
    }

    if let Err(e) = shell.assistant.save() {
        report_error(&mut stdout, &e)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::tests::quantum_assistant;
    use crate::testing::ScriptedModel;
    use std::fs;
    use tempfile::TempDir;

    async fn feed(shell: &mut Shell<'_>, line: &str) -> (Flow, String) {
        let mut out = Vec::new();
        let flow = shell.handle_line(line, &mut out).await.unwrap();
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("   "), Command::Empty);
        assert_eq!(parse_command("quantum computing"), Command::Text("quantum computing".into()));
        assert_eq!(parse_command("/research  rust  "), Command::Research("rust".into()));
        assert_eq!(parse_command("/ASK why?"), Command::Ask("why?".into()));
        assert_eq!(parse_command("/export pdf"), Command::Export(vec![ReportFormat::Pdf]));
        assert_eq!(parse_command("/export all"), Command::Export(ReportFormat::ALL.to_vec()));
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert!(matches!(parse_command("/export docx"), Command::Invalid(_)));
        assert!(matches!(parse_command("/frobnicate"), Command::Invalid(_)));
    }

    #[tokio::test]
    async fn test_plain_text_researches_then_asks() {
        let dir = TempDir::new().unwrap();
        let model = ScriptedModel::replying(&["Quantum computers use qubits...", "A qubit is..."]);
        let mut assistant = quantum_assistant(&dir, &model);
        let mut shell = Shell::new(&mut assistant, dir.path());

        assert!(shell.greeting().starts_with("What would you like"));

        let (flow, out) = feed(&mut shell, "quantum computing").await;
        assert_eq!(flow, Flow::Continue);
        assert!(out.contains("Quantum computers use qubits..."));

        let (_, out) = feed(&mut shell, "What is a qubit?").await;
        assert!(out.contains("A qubit is..."));

        let session = assistant.snapshot().unwrap();
        assert_eq!(session.followups.len(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_printed_and_loop_continues() {
        let dir = TempDir::new().unwrap();
        let model = ScriptedModel::default();
        let mut assistant = quantum_assistant(&dir, &model);
        let mut shell = Shell::new(&mut assistant, dir.path());

        let (flow, out) = feed(&mut shell, "/ask anything?").await;
        assert_eq!(flow, Flow::Continue);
        assert!(out.starts_with("Error: no active research session"));

        let (flow, out) = feed(&mut shell, "quantum computing").await;
        assert_eq!(flow, Flow::Continue);
        assert!(out.starts_with("Error:"));

        let (_, out) = feed(&mut shell, "/export md").await;
        assert!(out.starts_with("Error: no active research session"));
        assert!(!dir.path().join("research_report.md").exists());
    }

    #[tokio::test]
    async fn test_export_all_writes_three_files() {
        let dir = TempDir::new().unwrap();
        let model = ScriptedModel::replying(&["Quantum computers use qubits..."]);
        let mut assistant = quantum_assistant(&dir, &model);
        let mut shell = Shell::new(&mut assistant, dir.path().join("out"));

        feed(&mut shell, "/research quantum computing").await;
        let (_, out) = feed(&mut shell, "/export all").await;
        assert_eq!(out.lines().count(), 3);

        let md = fs::read_to_string(dir.path().join("out").join("research_report.md")).unwrap();
        assert!(!md.contains("Follow-Up Questions"));
        assert!(dir.path().join("out").join("research_report.pdf").exists());
        assert!(dir.path().join("out").join("research_report.json").exists());
    }

    #[tokio::test]
    async fn test_show_and_quit() {
        let dir = TempDir::new().unwrap();
        let model = ScriptedModel::replying(&["Quantum computers use qubits..."]);
        let mut assistant = quantum_assistant(&dir, &model);
        let mut shell = Shell::new(&mut assistant, dir.path());

        feed(&mut shell, "quantum computing").await;
        let (_, out) = feed(&mut shell, "/show").await;
        assert!(out.starts_with("# AI Research Report"));
        assert!(shell.greeting().starts_with("Resumed research on \"quantum computing\""));

        let (flow, _) = feed(&mut shell, "/quit").await;
        assert_eq!(flow, Flow::Exit);
    }
}
