use crate::{
    cli::{DigestKind, OutputFormat, ProfileKind},
    config::AppConfig,
    error::{CliError, Result},
    output::{OutputManager, write_output},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::{path::Path, time::Duration};
use stream_resolver::{
    Candidate, CipherProfile, CipherSecret, Preference, StreamResolver,
    cipher::KdfDigest,
    extractor::ProxyConfig,
    manifest,
};
use tracing::{debug, info};

/// Candidate sources of one `resolve` invocation.
#[derive(Debug, Default)]
pub struct CandidateArgs {
    pub candidates: Vec<Candidate>,
    pub referer: Option<String>,
    pub lang: Option<String>,
}

/// Preference flags; unset ones fall back to the configured preference.
#[derive(Debug, Default)]
pub struct PreferenceArgs {
    pub quality: Option<String>,
    pub server: Option<String>,
    pub language: Option<String>,
    pub subtitle_language: Option<String>,
}

impl PreferenceArgs {
    pub fn apply(self, mut pref: Preference) -> Preference {
        if let Some(quality) = self.quality {
            pref.preferred_quality_substring = quality;
        }
        if let Some(server) = self.server {
            pref.preferred_server_substring = server;
        }
        if let Some(language) = self.language {
            pref.preferred_language = language;
        }
        if let Some(subtitle_language) = self.subtitle_language {
            pref.preferred_subtitle_language = Some(subtitle_language);
        }
        pref
    }
}

pub struct CommandExecutor {
    config: AppConfig,
}

impl CommandExecutor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Applies command line overrides of the network settings.
    pub fn with_overrides(
        mut self,
        timeout: Option<u64>,
        proxy_url: Option<String>,
        proxy_username: Option<String>,
        proxy_password: Option<String>,
    ) -> Self {
        if let Some(timeout) = timeout {
            self.config.resolver.request_timeout = timeout;
        }
        if let Some(url) = proxy_url {
            self.config.resolver.proxy = Some(ProxyConfig {
                url,
                username: proxy_username,
                password: proxy_password,
            });
        }
        self
    }

    fn output_manager(&self) -> OutputManager {
        OutputManager::new(self.config.colored_output)
    }

    fn output_format(&self, format: Option<OutputFormat>) -> OutputFormat {
        format.unwrap_or(self.config.default_output_format)
    }

    fn resolver(&self) -> Result<StreamResolver> {
        Ok(StreamResolver::from_config(self.config.resolver.clone())?)
    }

    pub async fn resolve(
        &self,
        input: Option<&Path>,
        candidate_args: CandidateArgs,
        preference_args: PreferenceArgs,
        deadline: Option<u64>,
        output_format: Option<OutputFormat>,
        output_file: Option<&Path>,
    ) -> Result<()> {
        let candidates = load_candidates(input, candidate_args)?;
        if candidates.is_empty() {
            return Err(CliError::invalid_input(
                "no candidates given, use --input or --candidate",
            ));
        }

        let pref = preference_args.apply(self.config.preference.clone());
        let deadline = deadline
            .or(self.config.default_deadline)
            .map(Duration::from_secs);
        debug!("Preference: {:?}, deadline: {:?}", pref, deadline);

        let resolver = self.resolver()?;
        let pb = self.create_progress_bar(&format!("Resolving {} sources...", candidates.len()));
        let result = resolver
            .resolve_best_streams(&candidates, &pref, deadline)
            .await;
        pb.finish_and_clear();

        let streams = result?;
        if streams.is_empty() {
            return Err(CliError::no_streams_found());
        }
        info!("Resolved {} streams", streams.len());

        let output = self
            .output_manager()
            .format_streams(&streams, &self.output_format(output_format))?;
        write_output(&output, output_file)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn decrypt(
        &self,
        payload: &str,
        profile: ProfileKind,
        digest: DigestKind,
        key_bits: u32,
        password: Option<String>,
        key: Option<String>,
        iv: Option<String>,
    ) -> Result<()> {
        let digest = match digest {
            DigestKind::Md5 => KdfDigest::Md5,
            DigestKind::Sha256 => KdfDigest::Sha256,
        };
        let profile = match profile {
            ProfileKind::SaltedPrefix => CipherProfile::SaltedPrefix { digest, key_bits },
            ProfileKind::JsonParams => CipherProfile::JsonParams { digest, key_bits },
            ProfileKind::StaticKey => CipherProfile::StaticKey,
            ProfileKind::PrefixedIv => CipherProfile::PrefixedIv,
        };

        let password = password
            .or(key)
            .ok_or_else(|| CliError::invalid_input("--password or --key is required"))?;
        let secret = CipherSecret { password, iv };

        let plaintext = profile.decrypt(payload, &secret)?;
        let mut output = String::from_utf8_lossy(&plaintext).into_owned();
        output.push('\n');
        write_output(&output, None)
    }

    pub fn manifest(
        &self,
        file: &Path,
        base_url: &str,
        output_format: Option<OutputFormat>,
    ) -> Result<()> {
        let text = std::fs::read_to_string(file)?;
        let variants = manifest::parse(&text, base_url);
        if variants.is_empty() {
            return Err(CliError::invalid_input(format!(
                "{} has no variant streams",
                file.display()
            )));
        }

        let output = self
            .output_manager()
            .format_variants(&variants, &self.output_format(output_format))?;
        write_output(&output, None)
    }

    pub fn list_hosters(&self, output_format: Option<OutputFormat>) -> Result<()> {
        let resolver = self.resolver()?;
        let output = self
            .output_manager()
            .format_hosters(&resolver.registry().ids(), &self.output_format(output_format))?;
        write_output(&output, None)
    }

    fn create_progress_bar(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(500));
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        pb.set_message(message.to_string());
        pb
    }
}

/// Candidates from the JSON input file followed by the `--candidate` ones.
pub fn load_candidates(input: Option<&Path>, args: CandidateArgs) -> Result<Vec<Candidate>> {
    let mut candidates: Vec<Candidate> = match input {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        }
        None => Vec::new(),
    };

    candidates.extend(args.candidates.into_iter().map(|mut candidate| {
        if let Some(referer) = &args.referer {
            candidate.referer = referer.clone();
        }
        if let Some(lang) = &args.lang {
            candidate.language_tag = lang.clone();
        }
        candidate
    }));

    Ok(candidates)
}
