//! CLI output formatting module

use crate::config::OutputFormat;
use qagen_core::{GeneratedQa, Result};
use serde::Serialize;
use std::io::{self, Write};

/// Output formatter for CLI results
pub struct OutputFormatter {
    format: OutputFormat,
    use_colors: bool,
    writer: Box<dyn Write + Send>,
}

impl OutputFormatter {
    /// Create a formatter with specific format
    pub fn with_format(format: OutputFormat, use_colors: bool) -> Self {
        Self {
            format,
            use_colors: use_colors && crate::config::supports_color(),
            writer: Box::new(io::stdout()),
        }
    }

    /// Create a formatter with custom writer
    pub fn with_writer<W: Write + Send + 'static>(
        format: OutputFormat,
        use_colors: bool,
        writer: W,
    ) -> Self {
        Self {
            format,
            use_colors: use_colors && crate::config::supports_color(),
            writer: Box::new(writer),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format and output a serializable value
    pub fn output<T: Serialize>(&mut self, value: &T) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(value)?;
                writeln!(self.writer, "{}", json)?;
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(value)?;
                write!(self.writer, "{}", yaml)?;
            }
            OutputFormat::Compact => {
                let json = serde_json::to_string(value)?;
                writeln!(self.writer, "{}", json)?;
            }
            OutputFormat::Pretty => {
                let json_value = serde_json::to_value(value)?;
                self.format_json_pretty(&json_value, 0)?;
            }
        }
        Ok(())
    }

    /// Output ranked question/answer pairs
    ///
    /// Pretty output numbers the pairs and shows the quality first; the
    /// other formats serialize the list as is.
    pub fn output_qas(&mut self, qas: &[GeneratedQa]) -> Result<()> {
        if self.format != OutputFormat::Pretty {
            return self.output(&qas);
        }

        for (i, qa) in qas.iter().enumerate() {
            let quality = qa
                .quality
                .map(|q| format!("{:.3}", q))
                .unwrap_or_else(|| "unscored".to_string());
            writeln!(
                self.writer,
                "{} quality {}",
                self.colorize_key(&format!("[{}]", i + 1)),
                quality
            )?;
            writeln!(self.writer, "  Q: {}", qa.question)?;
            writeln!(self.writer, "  A: {}", qa.answer)?;
            writeln!(self.writer, "  context: {}", preview(&qa.context, 80))?;
        }
        Ok(())
    }

    /// Output chunks with their token counts
    pub fn output_chunks(&mut self, chunks: &[(String, usize)]) -> Result<()> {
        if self.format != OutputFormat::Pretty {
            let texts: Vec<&str> = chunks.iter().map(|(text, _)| text.as_str()).collect();
            return self.output(&texts);
        }

        for (i, (text, tokens)) in chunks.iter().enumerate() {
            writeln!(
                self.writer,
                "{} {} tokens",
                self.colorize_key(&format!("[chunk {}]", i + 1)),
                tokens
            )?;
            writeln!(self.writer, "{}", text)?;
            writeln!(self.writer)?;
        }
        Ok(())
    }

    /// Format JSON value in a pretty, human-readable way
    fn format_json_pretty(&mut self, value: &serde_json::Value, indent: usize) -> Result<()> {
        let indent_str = "  ".repeat(indent);

        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map {
                    match val {
                        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                            writeln!(self.writer, "{}{}:", indent_str, self.colorize_key(key))?;
                            self.format_json_pretty(val, indent + 1)?;
                        }
                        _ => {
                            writeln!(
                                self.writer,
                                "{}{}: {}",
                                indent_str,
                                self.colorize_key(key),
                                self.format_value(val)
                            )?;
                        }
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    writeln!(self.writer, "{}[{}]:", indent_str, i)?;
                    self.format_json_pretty(item, indent + 1)?;
                }
            }
            _ => {
                writeln!(self.writer, "{}{}", indent_str, self.format_value(value))?;
            }
        }
        Ok(())
    }

    /// Format a single value with appropriate styling
    fn format_value(&self, value: &serde_json::Value) -> String {
        let (plain, color) = match value {
            serde_json::Value::String(s) => (s.clone(), "32"),
            serde_json::Value::Number(n) => (n.to_string(), "36"),
            serde_json::Value::Bool(b) => (b.to_string(), "35"),
            serde_json::Value::Null => ("null".to_string(), "90"),
            serde_json::Value::Array(arr) => return format!("[{} items]", arr.len()),
            serde_json::Value::Object(obj) => return format!("{{{}}} keys", obj.len()),
        };

        if self.use_colors {
            format!("\x1b[{}m{}\x1b[0m", color, plain)
        } else {
            plain
        }
    }

    /// Colorize a key name
    fn colorize_key(&self, key: &str) -> String {
        if self.use_colors {
            format!("\x1b[34m{}\x1b[0m", key)
        } else {
            key.to_string()
        }
    }

    /// Output a simple message
    pub fn message(&mut self, msg: &str) -> Result<()> {
        writeln!(self.writer, "{}", msg)?;
        Ok(())
    }

    /// Output a success message
    pub fn success(&mut self, msg: &str) -> Result<()> {
        if self.use_colors {
            writeln!(self.writer, "\x1b[32m✓\x1b[0m {}", msg)?;
        } else {
            writeln!(self.writer, "✓ {}", msg)?;
        }
        Ok(())
    }

    /// Output an error message
    pub fn error(&mut self, msg: &str) -> Result<()> {
        if self.use_colors {
            writeln!(self.writer, "\x1b[31m✗\x1b[0m {}", msg)?;
        } else {
            writeln!(self.writer, "✗ {}", msg)?;
        }
        Ok(())
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
