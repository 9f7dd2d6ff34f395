//! Table and JSON rendering of command results.
//!
//! Table mode prints a title line followed by a box-drawn grid or a plain
//! message. JSON mode prints exactly one envelope per report:
//!
//! ```text
//! {"status":"success","data":[{"index":1,"name":"edge-gateway-container"}]}
//! {"status":"error","message":"Container not found"}
//! ```

use super::config::OutputFormat;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;
use std::io::{self, Write};
use tracing::{error, warn};

/// Envelope status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
    Info,
}

/// Writes reports to an output stream in the selected format.
pub struct Reporter {
    format: OutputFormat,
    out: Box<dyn Write + Send>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    pub fn new(format: OutputFormat, out: Box<dyn Write + Send>) -> Self {
        Self { format, out }
    }

    /// Reporter writing to stdout.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, Box::new(io::stdout()))
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Report rows under `headers`.
    pub fn table(&mut self, title: &str, headers: &[&str], rows: &[Vec<Value>]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let keys: Vec<String> = headers.iter().map(|h| json_key(h)).collect();
                let data: Vec<Value> = rows
                    .iter()
                    .map(|row| {
                        let object: Map<String, Value> =
                            keys.iter().cloned().zip(row.iter().cloned()).collect();
                        Value::Object(object)
                    })
                    .collect();
                self.envelope(json!({ "status": Status::Success, "data": data }))
            }
            OutputFormat::Table => {
                writeln!(self.out, "{}", title)?;
                write!(self.out, "{}", render_grid(headers, rows))?;
                self.out.flush()
            }
        }
    }

    /// Report a single message.
    pub fn message(&mut self, status: Status, message: &str) -> io::Result<()> {
        self.titled_message("", status, message)
    }

    /// Report a single message under a title (the title is table mode only).
    pub fn titled_message(&mut self, title: &str, status: Status, message: &str) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                self.envelope(json!({ "status": status, "message": message }))
            }
            OutputFormat::Table => {
                writeln!(self.out, "{}", title)?;
                writeln!(self.out, "{}", message)?;
                self.out.flush()
            }
        }
    }

    /// Progress text for a human reader. Dropped in JSON mode.
    pub fn note(&mut self, text: &str) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        writeln!(self.out, "{}", text)?;
        self.out.flush()
    }

    /// Free-form output such as container logs.
    pub fn text(&mut self, body: &str) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.message(Status::Success, body),
            OutputFormat::Table => {
                writeln!(self.out, "{}", body)?;
                self.out.flush()
            }
        }
    }

    /// Report how a run ended and pick the process exit code.
    ///
    /// A failure is logged, reported as an error message with its full cause
    /// chain and yields 1; success reports nothing and yields 0.
    pub fn conclude<E: fmt::Display>(&mut self, outcome: Result<(), E>) -> u8 {
        let Err(e) = outcome else {
            return 0;
        };

        let message = format!("{:#}", e);
        error!("{}", message);
        if let Err(write_err) = self.message(Status::Error, &message) {
            warn!("Failed to report the error: {}", write_err);
        }
        1
    }

    /// Question for the user before reading a line. Goes to stderr in JSON
    /// mode so stdout stays parseable.
    pub fn prompt(&mut self, question: &str) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let mut stderr = io::stderr();
                writeln!(stderr, "{}", question)?;
                stderr.flush()
            }
            OutputFormat::Table => {
                writeln!(self.out, "{}", question)?;
                self.out.flush()
            }
        }
    }

    fn envelope(&mut self, value: Value) -> io::Result<()> {
        writeln!(self.out, "{}", value)?;
        self.out.flush()
    }
}

/// `"Gateway ID"` becomes `"gateway_id"`.
fn json_key(header: &str) -> String {
    header.replace(' ', "_").to_lowercase()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Render a grid with double rules around the header:
///
/// ```text
/// ╒═══════╤══════╕
/// │ Index │ Name │
/// ╞═══════╪══════╡
/// │ 1     │ gw   │
/// ╘═══════╧══════╛
/// ```
fn render_grid(headers: &[&str], rows: &[Vec<Value>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            (0..headers.len())
                .map(|i| row.get(i).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule = |left: char, fill: char, mid: char, right: char| {
        let segments: Vec<String> = widths
            .iter()
            .map(|w| fill.to_string().repeat(w + 2))
            .collect();
        format!("{}{}{}\n", left, segments.join(&mid.to_string()), right)
    };
    let line = |values: Vec<&str>| {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!(" {}{} ", v, " ".repeat(w - v.chars().count())))
            .collect();
        format!("│{}│\n", padded.join("│"))
    };

    let mut grid = rule('╒', '═', '╤', '╕');
    grid.push_str(&line(headers.to_vec()));
    grid.push_str(&rule('╞', '═', '╪', '╡'));
    for (i, row) in cells.iter().enumerate() {
        if i > 0 {
            grid.push_str(&rule('├', '─', '┼', '┤'));
        }
        grid.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    grid.push_str(&rule('╘', '═', '╧', '╛'));
    grid
}
