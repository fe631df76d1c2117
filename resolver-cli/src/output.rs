use crate::{cli::OutputFormat, error::Result};
#[cfg(feature = "colored-output")]
use colored::*;
use serde::Serialize;
use std::io::Write;
use stream_resolver::{MediaStream, VariantStream};
#[cfg(feature = "table-output")]
use tabled::{Table, Tabled, settings::Style};

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_streams(&self, streams: &[MediaStream], format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.pretty_streams(streams)),
            OutputFormat::Json => to_json(streams, true),
            OutputFormat::JsonCompact => to_json(streams, false),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => Ok(self.table_streams(streams)),
            #[cfg(not(feature = "table-output"))]
            OutputFormat::Table => Ok(self.pretty_streams(streams)),
        }
    }

    pub fn format_variants(
        &self,
        variants: &[VariantStream],
        format: &OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Json => to_json(variants, true),
            OutputFormat::JsonCompact => to_json(variants, false),
            _ => {
                let mut output = self.colorize("Variants:", &Color::Green, true);
                output.push('\n');
                for (idx, variant) in variants.iter().enumerate() {
                    let bandwidth = variant
                        .bandwidth
                        .map(|bw| format!(" ({} kbps)", bw / 1000))
                        .unwrap_or_default();
                    output.push_str(&format!(
                        "  {}. {}{}\n     {}\n",
                        idx + 1,
                        self.colorize(&variant.resolution_label, &Color::Yellow, false),
                        bandwidth,
                        self.colorize(&variant.uri, &Color::Blue, false)
                    ));
                }
                Ok(output)
            }
        }
    }

    pub fn format_hosters(&self, ids: &[&str], format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => to_json(ids, true),
            OutputFormat::JsonCompact => to_json(ids, false),
            _ => {
                let mut output = self.colorize("Registered hosters:", &Color::Green, true);
                output.push('\n');
                for id in ids {
                    output.push_str(&format!("  - {}\n", self.colorize(id, &Color::Cyan, false)));
                }
                Ok(output)
            }
        }
    }

    fn pretty_streams(&self, streams: &[MediaStream]) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize(
            &format!("Streams ({}):", streams.len()),
            &Color::Green,
            true,
        ));
        output.push('\n');

        for (idx, stream) in streams.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {}\n",
                idx + 1,
                self.colorize(&stream.label, &Color::Yellow, true)
            ));
            output.push_str(&format!(
                "     {}: {}\n",
                self.colorize("URL", &Color::Yellow, false),
                self.colorize(&stream.url, &Color::Blue, false)
            ));
            if !stream.referer.is_empty() {
                output.push_str(&format!(
                    "     {}: {}\n",
                    self.colorize("Referer", &Color::Yellow, false),
                    self.colorize(&stream.referer, &Color::Cyan, false)
                ));
            }

            let mut headers: Vec<_> = stream.request_headers.iter().collect();
            headers.sort();
            for (key, value) in headers {
                output.push_str(&format!(
                    "     {}: {}\n",
                    self.colorize(key, &Color::Green, false),
                    value
                ));
            }

            for track in &stream.subtitles {
                output.push_str(&format!(
                    "     {} {}: {}\n",
                    self.colorize("Subtitle", &Color::Yellow, false),
                    track.label,
                    self.colorize(&track.url, &Color::Blue, false)
                ));
            }
        }

        output
    }

    #[cfg(feature = "table-output")]
    fn table_streams(&self, streams: &[MediaStream]) -> String {
        #[derive(Tabled)]
        struct TableRow<'a> {
            #[tabled(rename = "#")]
            rank: usize,
            label: &'a str,
            url: &'a str,
            subtitles: usize,
        }

        let rows = streams.iter().enumerate().map(|(idx, stream)| TableRow {
            rank: idx + 1,
            label: &stream.label,
            url: &stream.url,
            subtitles: stream.subtitles.len(),
        });

        Table::new(rows).with(Style::modern()).to_string()
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (self.colored, color, bold);
            text.to_string()
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let mut json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    json.push('\n');
    Ok(json)
}

enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
}

pub fn write_output(content: &str, output_file: Option<&std::path::Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        None => {
            print!("{content}");
            std::io::stdout().flush()?;
        }
    }
    Ok(())
}
