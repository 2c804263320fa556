// ABOUTME: CLI argument parsing and context builder utilities
// ABOUTME: Shared by the gsound-play binary and its tests

use crate::attr;
use crate::attributes::Attributes;
use crate::context::ContextConfig;
use crate::native::BackendKind;
use clap::Args;
use std::path::PathBuf;

/// Playback arguments for `gsound-play`
///
/// Use with `#[command(flatten)]` in the binary's Args struct.
#[derive(Args, Debug, Clone, Default)]
pub struct PlayArgs {
    /// Sound file to play
    #[arg(short, long)]
    pub file: Option<String>,

    /// Sound theme event id to play (e.g. "bell", "complete")
    #[arg(short, long)]
    pub event_id: Option<String>,

    /// Extra attribute as key=value (repeatable)
    #[arg(short, long = "attr", value_name = "KEY=VALUE")]
    pub attrs: Vec<String>,

    /// JSON file with an object of extra attributes
    #[arg(long)]
    pub attrs_file: Option<PathBuf>,

    /// JSON context configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Native driver to use (overrides the config file)
    #[arg(short, long)]
    pub driver: Option<String>,

    /// Backend: "null" or "canberra" (overrides the config file)
    #[arg(short, long)]
    pub backend: Option<BackendKind>,

    /// Cache the sound instead of playing it
    #[arg(long)]
    pub cache: bool,

    /// Wait for playback to finish and report its outcome
    #[arg(short, long)]
    pub wait: bool,

    /// Cancel playback after this many milliseconds (implies --wait)
    #[arg(long, value_name = "MS")]
    pub cancel_after_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl PlayArgs {
    /// Initialize tracing based on verbosity flag
    pub fn init_tracing(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let filter = if self.verbose {
            "gsound=debug,gsound_play=debug"
        } else {
            "gsound=info,gsound_play=info"
        };

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| filter.into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Whether the binary should wait for the outcome
    pub fn waits(&self) -> bool {
        self.wait || self.cancel_after_ms.is_some()
    }

    /// Build the request attributes
    ///
    /// Order of precedence, lowest first: `--attrs-file`, `--attr`, then
    /// `--file` and `--event-id`.
    pub fn build_attributes(&self) -> Result<Attributes, Box<dyn std::error::Error + Send + Sync>> {
        let mut attrs = match &self.attrs_file {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
                serde_json::from_str::<Attributes>(&text)
                    .map_err(|e| format!("Invalid attributes in '{}': {}", path.display(), e))?
            }
            None => Attributes::new(),
        };

        for pair in &self.attrs {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("Attribute '{}' is not in KEY=VALUE form", pair))?;
            attrs.insert(key, value);
        }
        if let Some(file) = &self.file {
            attrs.insert(attr::MEDIA_FILENAME, file.as_str());
        }
        if let Some(event_id) = &self.event_id {
            attrs.insert(attr::EVENT_ID, event_id.as_str());
        }

        if !attrs.contains_key(attr::MEDIA_FILENAME) && !attrs.contains_key(attr::EVENT_ID) {
            return Err("Nothing to play: pass --file or --event-id".into());
        }
        Ok(attrs)
    }

    /// Build the context configuration from the config file and flags
    pub fn build_config(&self) -> Result<ContextConfig, crate::ConfigError> {
        let mut config = match &self.config {
            Some(path) => ContextConfig::from_file(path)?,
            None => ContextConfig::new(),
        };
        if let Some(driver) = &self.driver {
            config = config.driver(driver.as_str());
        }
        if let Some(backend) = self.backend {
            config = config.backend(backend);
        }
        Ok(config)
    }

    /// Log what is about to happen
    pub fn log_startup_info(&self, config: &ContextConfig, attrs: &Attributes) {
        tracing::info!("gsound-play v{}", env!("CARGO_PKG_VERSION"));
        tracing::info!(
            "Backend: {:?}, driver: {}",
            config.backend,
            config.driver.as_deref().unwrap_or("auto")
        );
        for (key, value) in attrs.iter() {
            tracing::debug!("  {} = {}", key, value);
        }
    }
}
