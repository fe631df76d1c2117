use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use stream_resolver::Candidate;

#[derive(Parser, Debug)]
#[command(
    name = "sresolve",
    about = "sresolve - resolve, decrypt and rank media streams from embed pages",
    version,
    author
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Proxy URL (supports http, https, socks5)
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Proxy username (if proxy requires authentication)
    #[arg(long, global = true)]
    pub proxy_username: Option<String>,

    /// Proxy password (if proxy requires authentication)
    #[arg(long, global = true)]
    pub proxy_password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve candidates into a ranked list of streams
    Resolve {
        /// JSON file holding an array of candidates
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// A candidate as NAME=URL, may be repeated
        #[arg(long = "candidate", value_parser = parse_candidate)]
        candidates: Vec<Candidate>,

        /// Referer sent with the first request of --candidate entries
        #[arg(long)]
        referer: Option<String>,

        /// Language tag of --candidate entries (e.g. "Sub", "Dub")
        #[arg(long)]
        lang: Option<String>,

        /// Preferred quality substring (e.g. "1080")
        #[arg(long)]
        quality: Option<String>,

        /// Preferred server substring
        #[arg(long)]
        server: Option<String>,

        /// Preferred language substring
        #[arg(long)]
        language: Option<String>,

        /// Preferred subtitle language
        #[arg(long)]
        subtitle_language: Option<String>,

        /// Overall deadline in seconds
        #[arg(long)]
        deadline: Option<u64>,

        /// Output format
        #[arg(short, long)]
        output: Option<OutputFormat>,

        /// Save output to file
        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// Decrypt a single cipher payload
    Decrypt {
        /// The payload as found on the page
        payload: String,

        /// Cipher profile
        #[arg(long, default_value = "salted-prefix")]
        profile: ProfileKind,

        /// Key derivation digest (salted-prefix, json-params)
        #[arg(long, default_value = "md5")]
        digest: DigestKind,

        /// AES key size in bits (salted-prefix, json-params)
        #[arg(long, default_value = "256")]
        key_bits: u32,

        /// Passphrase
        #[arg(long, conflicts_with = "key")]
        password: Option<String>,

        /// Raw UTF-8 key (static-key, prefixed-iv)
        #[arg(long)]
        key: Option<String>,

        /// Raw UTF-8 IV (static-key)
        #[arg(long)]
        iv: Option<String>,
    },

    /// Parse a local HLS master playlist
    Manifest {
        /// Playlist file
        file: PathBuf,

        /// URL the playlist was fetched from
        #[arg(long)]
        base_url: String,

        /// Output format
        #[arg(short, long)]
        output: Option<OutputFormat>,
    },

    /// List registered hoster extractors
    Hosters {
        /// Output format
        #[arg(short, long)]
        output: Option<OutputFormat>,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Show configuration information
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty-printed human-readable output
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// Compact JSON output
    JsonCompact,
    /// Table format
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonCompact => write!(f, "json-compact"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileKind {
    SaltedPrefix,
    JsonParams,
    StaticKey,
    PrefixedIv,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestKind {
    Md5,
    Sha256,
}

/// Parses `NAME=URL`.
pub fn parse_candidate(s: &str) -> Result<Candidate, String> {
    let (name, url) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=URL, got '{s}'"))?;
    let (name, url) = (name.trim(), url.trim());
    if name.is_empty() || url.is_empty() {
        return Err(format!("expected NAME=URL, got '{s}'"));
    }
    Ok(Candidate::new(name, url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candidate() {
        let candidate = parse_candidate("Vidplay=https://v.example/e/1?a=b").unwrap();
        assert_eq!(candidate.name, "Vidplay");
        assert_eq!(candidate.url, "https://v.example/e/1?a=b");

        assert!(parse_candidate("https://v.example/e/1").is_err());
        assert!(parse_candidate("=https://v.example/e/1").is_err());
    }

    #[test]
    fn test_resolve_args() {
        let args = Args::try_parse_from([
            "sresolve",
            "resolve",
            "--candidate",
            "A=https://a.example/e/1",
            "--candidate",
            "B=https://b.example/e/2",
            "--quality",
            "1080",
            "--output",
            "json-compact",
        ])
        .unwrap();

        match args.command {
            Commands::Resolve {
                candidates,
                quality,
                output,
                ..
            } => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(quality.as_deref(), Some("1080"));
                assert_eq!(output, Some(OutputFormat::JsonCompact));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
