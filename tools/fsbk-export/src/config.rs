//! Build configuration
//!
//! Three independent choices drive a build:
//! - [`OutputFormat`]: how sample data is stored (and the default budget)
//! - [`EnvelopeScheme`]: which definition row profile is read
//! - [`RegionLayout`]: which region record layout is written
//!
//! Values are layered: defaults, then an optional TOML file, then CLI flags.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use fsbk_common::{RegionLayout, SampleFormat};

/// Sound RAM available for samples on the PS1 SPU (512 KiB minus
/// reverb work area and driver reservations)
pub const PSX_SAMPLE_BUDGET: u64 = 380 * 1024;

/// Budget for raw PCM banks
pub const PCM16_SAMPLE_BUDGET: u64 = 256 * 1024 * 1024;

pub const DEFAULT_DELIMITER: char = ';';

/// Stored sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// SPU-ADPCM, 16 bytes per 28 samples
    Psx,
    /// Raw 16-bit little-endian PCM
    Pcm16,
}

impl OutputFormat {
    pub fn default_budget(self) -> u64 {
        match self {
            OutputFormat::Psx => PSX_SAMPLE_BUDGET,
            OutputFormat::Pcm16 => PCM16_SAMPLE_BUDGET,
        }
    }

    pub fn sample_format(self) -> SampleFormat {
        match self {
            OutputFormat::Psx => SampleFormat::SpuAdpcm,
            OutputFormat::Pcm16 => SampleFormat::Pcm16,
        }
    }
}

/// Envelope fields expected in definition rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeScheme {
    /// delay, attack, hold, decay, sustain, release in ms (12 fields per row)
    #[default]
    Simple,
    /// ADSR register fields (18 fields per row)
    Raw,
}

impl EnvelopeScheme {
    /// Region layout used when none is configured
    pub fn default_layout(self) -> RegionLayout {
        match self {
            EnvelopeScheme::Simple => RegionLayout::Split,
            EnvelopeScheme::Raw => RegionLayout::Packed,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("raw envelopes need the packed region layout (split regions store millisecond timings)")]
    RawEnvelopeInSplitLayout,

    #[error("sample budget {0} exceeds the 32-bit offset range")]
    BudgetTooLarge(u64),

    #[error("{0:?} cannot be used as a field delimiter")]
    InvalidDelimiter(char),
}

/// Optional settings from a TOML file
///
/// ```toml
/// envelope = "raw"
/// layout = "packed"
/// budget = 262144
/// delimiter = ","
/// lenient = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub envelope: Option<EnvelopeScheme>,
    pub layout: Option<RegionLayout>,
    pub budget: Option<u64>,
    pub delimiter: Option<char>,
    pub lenient: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Settings given on the command line; `None`/`false` defers to lower layers
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub envelope: Option<EnvelopeScheme>,
    pub layout: Option<RegionLayout>,
    pub budget: Option<u64>,
    pub delimiter: Option<char>,
    pub lenient: bool,
}

/// Fully resolved build settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub format: OutputFormat,
    pub envelope: EnvelopeScheme,
    pub layout: RegionLayout,
    /// Sample arena capacity in bytes
    pub budget: u64,
    pub delimiter: char,
    /// Read unparseable integer fields as 0 instead of rejecting the row
    pub lenient: bool,
}

impl BuildConfig {
    /// Defaults for `format`: simple envelopes, split layout, format budget
    pub fn new(format: OutputFormat) -> Self {
        let envelope = EnvelopeScheme::default();
        Self {
            format,
            envelope,
            layout: envelope.default_layout(),
            budget: format.default_budget(),
            delimiter: DEFAULT_DELIMITER,
            lenient: false,
        }
    }

    /// Layer file settings and CLI overrides over the defaults and validate
    pub fn resolve(
        format: OutputFormat,
        file: Option<&ConfigFile>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let file = file.cloned().unwrap_or_default();

        let envelope = overrides
            .envelope
            .or(file.envelope)
            .unwrap_or_default();
        let layout = overrides
            .layout
            .or(file.layout)
            .unwrap_or_else(|| envelope.default_layout());

        let config = Self {
            format,
            envelope,
            layout,
            budget: overrides
                .budget
                .or(file.budget)
                .unwrap_or_else(|| format.default_budget()),
            delimiter: overrides
                .delimiter
                .or(file.delimiter)
                .unwrap_or(DEFAULT_DELIMITER),
            lenient: overrides.lenient || file.lenient.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.envelope == EnvelopeScheme::Raw && self.layout == RegionLayout::Split {
            return Err(ConfigError::RawEnvelopeInSplitLayout);
        }
        if self.budget > u32::MAX as u64 {
            return Err(ConfigError::BudgetTooLarge(self.budget));
        }
        if matches!(self.delimiter, '#' | '\n' | '\r') || self.delimiter.is_ascii_digit() {
            return Err(ConfigError::InvalidDelimiter(self.delimiter));
        }
        Ok(())
    }
}
