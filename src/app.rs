use crate::config::Config;
use crate::logbook::{self, KeyRepr, LogEntry};
use crossterm::event::{KeyCode, KeyModifiers};
use std::path::PathBuf;

pub const EMPTY_PLACEHOLDER: &str = "(log is empty)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Modal message shown over the UI until dismissed, the terminal
/// equivalent of the desktop message box.
#[derive(Clone, Debug)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    LogPath,
    ExportPath,
}

/// Inline path prompt, the stand-in for a file picker dialog.
#[derive(Clone, Debug)]
pub struct Prompt {
    pub kind: PromptKind,
    pub buffer: String,
}

impl Prompt {
    pub fn title(&self) -> &'static str {
        match self.kind {
            PromptKind::LogPath => "New log file path",
            PromptKind::ExportPath => "Export CSV to",
        }
    }
}

pub struct App {
    pub log_path: PathBuf,
    pub preview_lines: usize,
    /// Session State: keys are only recorded while this is true.
    /// Always starts false; never persisted.
    pub logging: bool,
    pub preview: Vec<String>,
    /// Read-error text shown in place of the preview contents.
    pub preview_note: Option<String>,
    pub notice: Option<Notice>,
    pub prompt: Option<Prompt>,
    pub status: String,
    pub recorded_count: u64,
    pub quit: bool,
}

impl App {
    pub fn new(config: Config) -> App {
        let mut app = App {
            log_path: config.log_path,
            preview_lines: config.preview_lines,
            logging: false,
            preview: Vec::new(),
            preview_note: None,
            notice: None,
            prompt: None,
            status: String::from("Idle. Press F2 to start logging."),
            recorded_count: 0,
            quit: false,
        };
        app.refresh_preview();
        app
    }

    /// Top-level key dispatch. A pending notice swallows keys until it is
    /// dismissed; a pending prompt consumes keys as path input; otherwise
    /// control bindings run their action and everything else is recorded.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.notice.is_some() {
            if matches!(code, KeyCode::Enter | KeyCode::Esc) {
                self.notice = None;
            }
            return;
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(code, modifiers);
            return;
        }
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('q') {
            self.quit = true;
            return;
        }
        match code {
            KeyCode::F(2) => self.start_logging(),
            KeyCode::F(3) => self.stop_logging(),
            KeyCode::F(4) => self.begin_choose_path(),
            KeyCode::F(5) => self.refresh_preview(),
            KeyCode::F(6) => self.clear_log(),
            KeyCode::F(7) => self.begin_export(),
            _ => self.record_key(code, modifiers),
        }
    }

    pub fn start_logging(&mut self) {
        self.logging = true;
        self.status = format!("Logging to {}. Type away.", self.log_path.display());
    }

    pub fn stop_logging(&mut self) {
        self.logging = false;
        self.status = String::from("Logging stopped.");
    }

    /// Records one key press: classify, timestamp, append, update preview.
    pub fn record_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        let entry = LogEntry::now(KeyRepr::classify(code, modifiers));
        self.record_entry(entry);
    }

    /// No-op while Session State is inactive. A failed append stops
    /// logging and raises an error notice; it never continues silently.
    pub fn record_entry(&mut self, entry: LogEntry) {
        if !self.logging {
            return;
        }
        let line = entry.to_line();
        match logbook::append_entry(&self.log_path, &line) {
            Ok(()) => {
                self.preview.push(line.trim_end().to_string());
                if self.preview.len() > self.preview_lines {
                    let overflow = self.preview.len() - self.preview_lines;
                    self.preview.drain(..overflow);
                }
                self.recorded_count += 1;
            }
            Err(err) => {
                self.logging = false;
                self.raise(
                    Severity::Error,
                    format!("Write failed, logging stopped: {err:#}"),
                );
            }
        }
    }

    /// Rereads the log file and replaces the preview buffer verbatim.
    pub fn refresh_preview(&mut self) {
        match logbook::read_log(&self.log_path) {
            Ok(Some(contents)) => {
                self.preview = contents.lines().map(str::to_string).collect();
                if self.preview.len() > self.preview_lines {
                    let overflow = self.preview.len() - self.preview_lines;
                    self.preview.drain(..overflow);
                }
                self.preview_note = None;
            }
            Ok(None) => {
                self.preview.clear();
                self.preview_note = None;
            }
            Err(err) => {
                self.preview.clear();
                self.preview_note = Some(format!("(cannot read log: {err:#})"));
            }
        }
    }

    pub fn clear_log(&mut self) {
        match logbook::clear_log(&self.log_path) {
            Ok(()) => {
                self.refresh_preview();
                self.raise(Severity::Info, String::from("Log cleared."));
            }
            Err(err) => {
                self.raise(Severity::Error, format!("Clear failed: {err:#}"));
            }
        }
    }

    pub fn begin_choose_path(&mut self) {
        self.prompt = Some(Prompt {
            kind: PromptKind::LogPath,
            buffer: self.log_path.display().to_string(),
        });
    }

    /// Export is refused up front when there is no log file yet, before
    /// any output path is asked for or created.
    pub fn begin_export(&mut self) {
        if !self.log_path.exists() {
            self.raise(
                Severity::Warn,
                String::from("No log file to export yet."),
            );
            return;
        }
        self.prompt = Some(Prompt {
            kind: PromptKind::ExportPath,
            buffer: self.log_path.with_extension("csv").display().to_string(),
        });
    }

    fn handle_prompt_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Esc => {
                self.prompt = None;
                self.status = String::from("Cancelled.");
            }
            KeyCode::Enter => self.submit_prompt(),
            KeyCode::Backspace => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.buffer.pop();
                }
            }
            // Chorded characters are bindings, not path input.
            KeyCode::Char(c)
                if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                if let Some(prompt) = &mut self.prompt {
                    prompt.buffer.push(c);
                }
            }
            _ => {}
        }
    }

    pub fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        let input = prompt.buffer.trim();
        if input.is_empty() {
            self.status = String::from("Cancelled.");
            return;
        }
        match prompt.kind {
            PromptKind::LogPath => {
                self.log_path = PathBuf::from(input);
                self.refresh_preview();
                self.status = format!("Log file set to {input}.");
            }
            PromptKind::ExportPath => {
                match logbook::export_csv(&self.log_path, &PathBuf::from(input)) {
                    Ok(rows) => {
                        self.raise(
                            Severity::Info,
                            format!("Exported {rows} rows to {input}."),
                        );
                    }
                    Err(err) => {
                        self.raise(Severity::Error, format!("Export failed: {err:#}"));
                    }
                }
            }
        }
    }

    fn raise(&mut self, severity: Severity, text: String) {
        self.notice = Some(Notice { severity, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local, TimeZone};
    use std::fs;
    use std::path::Path;

    fn app_at(log_path: &Path) -> App {
        App::new(Config {
            log_path: log_path.to_path_buf(),
            preview_lines: 200,
        })
    }

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
    }

    fn entry(timestamp: DateTime<Local>, key: KeyRepr) -> LogEntry {
        LogEntry { timestamp, key }
    }

    #[test]
    fn session_starts_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_at(&dir.path().join("log.txt"));
        assert!(!app.logging);
    }

    #[test]
    fn inactive_session_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_at(&path);
        app.record_entry(entry(ts(10, 0, 0), KeyRepr::Printable('a')));
        assert!(!path.exists());
        assert!(app.preview.is_empty());
        assert_eq!(app.recorded_count, 0);
    }

    #[test]
    fn stop_then_type_appends_nothing_more() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_at(&path);
        app.start_logging();
        app.record_entry(entry(ts(10, 0, 0), KeyRepr::Printable('a')));
        app.stop_logging();
        app.record_entry(entry(ts(10, 0, 1), KeyRepr::Printable('b')));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "2024-01-01 10:00:00 - 'a'\n"
        );
    }

    #[test]
    fn recorded_key_lands_in_file_and_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_at(&path);
        app.start_logging();
        app.record_entry(entry(ts(10, 0, 0), KeyRepr::Printable('a')));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "2024-01-01 10:00:00 - 'a'\n"
        );
        assert_eq!(app.preview, vec!["2024-01-01 10:00:00 - 'a'"]);
        assert_eq!(app.recorded_count, 1);
    }

    #[test]
    fn write_failure_stops_logging_and_raises_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("log.txt");
        let mut app = app_at(&path);
        app.start_logging();
        app.record_entry(entry(ts(10, 0, 0), KeyRepr::Printable('a')));
        assert!(!app.logging);
        let notice = app.notice.expect("expected an error notice");
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(app.recorded_count, 0);
    }

    #[test]
    fn clear_missing_log_confirms_and_shows_empty_preview() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_at(&dir.path().join("absent.txt"));
        app.clear_log();
        let notice = app.notice.expect("expected a confirmation notice");
        assert_eq!(notice.severity, Severity::Info);
        assert!(app.preview.is_empty());
        assert!(app.preview_note.is_none());
    }

    #[test]
    fn clear_deletes_file_and_resets_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_at(&path);
        app.start_logging();
        app.record_entry(entry(ts(10, 0, 0), KeyRepr::Printable('a')));
        app.clear_log();
        assert!(!path.exists());
        assert!(app.preview.is_empty());
    }

    #[test]
    fn export_without_log_file_warns_and_opens_no_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_at(&dir.path().join("absent.txt"));
        app.begin_export();
        let notice = app.notice.expect("expected a warning notice");
        assert_eq!(notice.severity, Severity::Warn);
        assert!(app.prompt.is_none());
        assert!(!dir.path().join("absent.csv").exists());
    }

    #[test]
    fn export_scenario_round_trips_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_at(&path);
        app.start_logging();
        app.record_entry(entry(ts(10, 0, 0), KeyRepr::Printable('a')));
        app.begin_export();
        assert_eq!(
            app.prompt.as_ref().map(|p| p.kind),
            Some(PromptKind::ExportPath)
        );
        app.submit_prompt();
        let notice = app.notice.expect("expected a confirmation notice");
        assert_eq!(notice.severity, Severity::Info);
        let csv = fs::read_to_string(dir.path().join("log.csv")).unwrap();
        assert_eq!(csv, "timestamp,key\n2024-01-01 10:00:00,'a'\n");
    }

    #[test]
    fn choose_path_redirects_writes_without_moving_old_log() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.txt");
        let new = dir.path().join("new.txt");
        let mut app = app_at(&old);
        app.start_logging();
        app.record_entry(entry(ts(10, 0, 0), KeyRepr::Printable('a')));

        app.begin_choose_path();
        app.prompt.as_mut().unwrap().buffer = new.display().to_string();
        app.submit_prompt();
        assert_eq!(app.log_path, new);
        // New path does not exist yet; preview shows the empty state.
        assert!(app.preview.is_empty());

        app.record_entry(entry(ts(10, 0, 1), KeyRepr::Printable('b')));
        assert_eq!(
            fs::read_to_string(&old).unwrap(),
            "2024-01-01 10:00:00 - 'a'\n"
        );
        assert_eq!(
            fs::read_to_string(&new).unwrap(),
            "2024-01-01 10:00:01 - 'b'\n"
        );
    }

    #[test]
    fn blank_prompt_input_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_at(&path);
        app.begin_choose_path();
        app.prompt.as_mut().unwrap().buffer = String::from("   ");
        app.submit_prompt();
        assert_eq!(app.log_path, path);
    }

    #[test]
    fn refresh_preview_mirrors_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(
            &path,
            "2024-01-01 10:00:00 - 'a'\n2024-01-01 10:00:01 - [Return]\n",
        )
        .unwrap();
        let app = app_at(&path);
        assert_eq!(
            app.preview,
            vec!["2024-01-01 10:00:00 - 'a'", "2024-01-01 10:00:01 - [Return]"]
        );
    }

    #[test]
    fn refresh_preview_shows_error_for_unreadable_log() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the log path exists but cannot be read as a file.
        let path = dir.path().join("log-as-dir");
        fs::create_dir(&path).unwrap();
        let app = app_at(&path);
        assert!(app.preview.is_empty());
        let note = app.preview_note.expect("expected a read-error placeholder");
        assert!(note.contains("cannot read log"), "unexpected note: {note}");
    }

    #[test]
    fn preview_is_capped_at_configured_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = App::new(Config {
            log_path: path,
            preview_lines: 10,
        });
        app.start_logging();
        for s in 0..15 {
            app.record_entry(entry(ts(10, 0, s), KeyRepr::Printable('x')));
        }
        assert_eq!(app.preview.len(), 10);
        assert_eq!(app.preview.last().unwrap(), "2024-01-01 10:00:14 - 'x'");
    }

    #[test]
    fn control_bindings_are_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_at(&path);
        app.handle_key(KeyCode::F(2), KeyModifiers::NONE);
        assert!(app.logging);
        app.handle_key(KeyCode::F(5), KeyModifiers::NONE);
        app.handle_key(KeyCode::F(3), KeyModifiers::NONE);
        assert!(!path.exists());
    }

    #[test]
    fn handle_key_records_plain_chars_while_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_at(&path);
        app.handle_key(KeyCode::F(2), KeyModifiers::NONE);
        app.handle_key(KeyCode::Char('a'), KeyModifiers::NONE);
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with(" - 'a'\n"));
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn enter_key_logs_return_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_at(&path);
        app.handle_key(KeyCode::F(2), KeyModifiers::NONE);
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.trim_end().ends_with("- [Return]"));
    }

    #[test]
    fn notice_swallows_keys_until_dismissed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_at(&path);
        app.start_logging();
        app.notice = Some(Notice {
            severity: Severity::Info,
            text: String::from("hello"),
        });
        app.handle_key(KeyCode::Char('a'), KeyModifiers::NONE);
        assert!(!path.exists());
        assert!(app.notice.is_some());
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.notice.is_none());
    }

    #[test]
    fn chorded_chars_are_not_typed_into_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_at(&dir.path().join("log.txt"));
        app.begin_choose_path();
        let before = app.prompt.as_ref().unwrap().buffer.clone();
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(app.prompt.as_ref().unwrap().buffer, before);
        assert!(!app.quit);
        app.handle_key(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(app.prompt.as_ref().unwrap().buffer, before);
        app.handle_key(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(
            app.prompt.as_ref().unwrap().buffer,
            format!("{before}x")
        );
    }

    #[test]
    fn ctrl_q_requests_quit() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_at(&dir.path().join("log.txt"));
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.quit);
    }
}
