use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyModifiers};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Separator between the timestamp and the key field in a log line.
/// Export splits on the first occurrence, so key representations must
/// never contain it (single quoted chars and keysym names never do).
const SEPARATOR: &str = " - ";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Explicit classification of a key press. Printable characters are
/// logged quoted, everything else is logged as a bracketed symbol name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyRepr {
    Printable(char),
    Symbolic(String),
}

impl KeyRepr {
    /// Classifies a terminal key event. A plain character with no
    /// CONTROL/ALT modifier is printable; control characters and every
    /// other key code map to a symbolic name.
    pub fn classify(code: KeyCode, modifiers: KeyModifiers) -> KeyRepr {
        match code {
            KeyCode::Char(c)
                if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    && !c.is_control() =>
            {
                KeyRepr::Printable(c)
            }
            // Modified or control characters: keep the base character as
            // the symbol, matching how keysyms name chorded keys.
            KeyCode::Char(c) => KeyRepr::Symbolic(c.to_string()),
            other => KeyRepr::Symbolic(keysym_name(other)),
        }
    }
}

/// X11-keysym-style names for non-character keys.
fn keysym_name(code: KeyCode) -> String {
    let name = match code {
        KeyCode::Enter => "Return",
        KeyCode::Backspace => "BackSpace",
        KeyCode::Tab => "Tab",
        KeyCode::BackTab => "ISO_Left_Tab",
        KeyCode::Esc => "Escape",
        KeyCode::Left => "Left",
        KeyCode::Right => "Right",
        KeyCode::Up => "Up",
        KeyCode::Down => "Down",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "Prior",
        KeyCode::PageDown => "Next",
        KeyCode::Insert => "Insert",
        KeyCode::Delete => "Delete",
        KeyCode::CapsLock => "Caps_Lock",
        KeyCode::ScrollLock => "Scroll_Lock",
        KeyCode::NumLock => "Num_Lock",
        KeyCode::PrintScreen => "Print",
        KeyCode::Pause => "Pause",
        KeyCode::Menu => "Menu",
        KeyCode::F(n) => return format!("F{n}"),
        other => return format!("{other:?}"),
    };
    name.to_string()
}

/// One timestamped key event, the unit of the log file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub key: KeyRepr,
}

impl LogEntry {
    pub fn now(key: KeyRepr) -> LogEntry {
        LogEntry {
            timestamp: Local::now(),
            key,
        }
    }

    /// Renders the entry as a complete log line, trailing newline included.
    pub fn to_line(&self) -> String {
        let ts = self.timestamp.format(TIMESTAMP_FORMAT);
        match &self.key {
            KeyRepr::Printable(c) => format!("{ts}{SEPARATOR}'{c}'\n"),
            KeyRepr::Symbolic(name) => format!("{ts}{SEPARATOR}[{name}]\n"),
        }
    }
}

/// Appends one already-rendered line to the log file, creating it if absent.
pub fn append_entry(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("Failed to append to log file {}", path.display()))?;
    Ok(())
}

/// Splits a log line into (timestamp, key) on the first separator.
/// Lines without a separator keep all their text in the key column.
pub fn split_line(line: &str) -> (String, String) {
    match line.split_once(SEPARATOR) {
        Some((ts, key)) => (ts.to_string(), key.to_string()),
        None => (String::new(), line.to_string()),
    }
}

/// Reparses the log file into a two-column CSV file with a
/// `timestamp,key` header. Returns the number of data rows written.
/// The caller is expected to check that the source exists first; a
/// missing source is reported as an error here as a backstop.
pub fn export_csv(log_path: &Path, csv_path: &Path) -> Result<usize> {
    let file = fs::File::open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    let out = fs::File::create(csv_path)
        .with_context(|| format!("Failed to create CSV file {}", csv_path.display()))?;
    let mut writer = csv::WriterBuilder::new().from_writer(out);
    writer
        .write_record(["timestamp", "key"])
        .context("Failed to write CSV header")?;

    let mut rows = 0;
    for line in BufReader::new(file).lines() {
        let line = line
            .with_context(|| format!("Failed to read log file {}", log_path.display()))?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let (ts, key) = split_line(line);
        writer
            .write_record([ts.as_str(), key.as_str()])
            .context("Failed to write CSV row")?;
        rows += 1;
    }
    writer.flush().context("Failed to flush CSV file")?;
    Ok(rows)
}

/// Deletes the log file. A file that never existed counts as success.
pub fn clear_log(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to delete log file {}", path.display()))
        }
    }
}

/// Reads the whole log file. `Ok(None)` means the file does not exist yet.
pub fn read_log(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file {}", path.display()))?;
    Ok(Some(contents))
}
