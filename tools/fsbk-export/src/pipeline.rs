//! Soundbank build pipeline
//!
//! Each definition row is processed to completion before the next is read:
//! envelope check, WAV load, encode, arena commit, table registration.
//! Rows that fail are skipped and reported; the run only fails at the end
//! if the arena went over budget (or a table limit was hit).

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use fsbk_common::{
    AdsrRegisters, EnvelopeError, PackedRegion, RegionLayout, RegionRecord, SampleHeader,
    SoundbankImage, SplitRegion,
};

use crate::arena::{ArenaStats, SampleArena};
use crate::config::{BuildConfig, ConfigError};
use crate::definition::{DefinitionReader, DefinitionRow, RowEnvelope};
use crate::encoder::encode_sample;
use crate::tables::TableBuilder;
use crate::wav::WaveAsset;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("definition file not found: {}", .0.display())]
    DefinitionFileNotFound(PathBuf),

    #[error("sample data is over budget. Amount of bytes to reduce: {bytes}")]
    ArenaOverflow { bytes: u64 },
}

/// A definition row that did not make it into the soundbank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line in the definition table
    pub line: Option<usize>,
    /// Resolved sample path, when the row got that far
    pub path: Option<PathBuf>,
    pub reason: String,
}

/// Outcome of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Samples stored in the soundbank
    pub samples: usize,
    pub skipped: Vec<SkippedRow>,
    pub arena: ArenaStats,
    pub budget: u64,
    /// Budget left after charging every loaded sample
    pub remaining: i64,
}

impl BuildReport {
    /// Bytes that have to be cut for everything to fit
    pub fn overflow_bytes(&self) -> Option<u64> {
        (self.remaining < 0).then(|| self.remaining.unsigned_abs())
    }
}

/// Image plus report; the image holds only samples that fit
#[derive(Debug, Clone)]
pub struct BuiltSoundbank {
    pub image: SoundbankImage,
    pub report: BuildReport,
}

/// Build a soundbank from a definition table on disk
///
/// Sample paths resolve against the table's directory.
pub fn build_soundbank(definitions: &Path, config: &BuildConfig) -> Result<BuiltSoundbank> {
    let file = File::open(definitions).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::Error::new(BuildError::DefinitionFileNotFound(definitions.to_path_buf()))
        } else {
            anyhow::Error::new(e)
                .context(format!("Failed to open definitions: {}", definitions.display()))
        }
    })?;
    let base_dir = definitions.parent().unwrap_or_else(|| Path::new(""));

    build_from_reader(BufReader::new(file), base_dir, config)
        .with_context(|| format!("Failed to build soundbank from {}", definitions.display()))
}

/// Build a soundbank from any definition source
pub fn build_from_reader<R: BufRead>(
    source: R,
    base_dir: &Path,
    config: &BuildConfig,
) -> Result<BuiltSoundbank> {
    config.validate()?;

    let mut arena = SampleArena::new(config.budget);
    let mut tables = TableBuilder::new();
    let mut sample_headers = Vec::new();
    let mut skipped = Vec::new();

    let rows = DefinitionReader::new(source, config.envelope, config.delimiter)
        .lenient(config.lenient);

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(e) if e.is_row_error() => {
                warn!("Skipping row: {}", e);
                skipped.push(SkippedRow {
                    line: e.line(),
                    path: None,
                    reason: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let path = base_dir.join(&row.sample_path);
        let skip = |reason: String| {
            warn!("Skipping line {} ({}): {}", row.line, path.display(), reason);
            SkippedRow {
                line: Some(row.line),
                path: Some(path.clone()),
                reason,
            }
        };

        let registers = match packed_registers(&row, config.layout) {
            Ok(registers) => registers,
            Err(e) => {
                skipped.push(skip(e.to_string()));
                continue;
            }
        };

        let wave = match WaveAsset::load(&path) {
            Ok(wave) => wave,
            Err(e) => {
                skipped.push(skip(e.to_string()));
                continue;
            }
        };

        let encoded = encode_sample(
            &wave.samples,
            wave.effective_len(),
            wave.loop_start(),
            config.format,
        );

        let Some(offset) = arena.commit(&encoded.bytes) else {
            debug!(
                "Line {}: {} bytes over budget ({} remaining)",
                row.line,
                encoded.len(),
                arena.remaining()
            );
            continue;
        };
        debug!(
            "Line {}: {} -> offset {:#x}, {} bytes",
            row.line,
            path.display(),
            offset,
            encoded.len()
        );

        let record = match registers {
            Some(adsr) => RegionRecord::Packed(PackedRegion {
                sample_start: offset,
                sample_rate: wave.sample_rate,
                loop_start: encoded.loop_offset.unwrap_or(fsbk_common::NO_LOOP),
                adsr,
                volume: row.volume,
                panning: row.panning,
                key_min: row.key_min,
                key_max: row.key_max,
                format: encoded.format,
            }),
            None => {
                let RowEnvelope::Simple(envelope) = row.envelope else {
                    return Err(ConfigError::RawEnvelopeInSplitLayout.into());
                };
                let sample_index = sample_headers.len() as u16;
                sample_headers.push(SampleHeader::new(
                    offset,
                    wave.sample_rate,
                    encoded.loop_offset,
                    encoded.format,
                ));
                RegionRecord::Split(SplitRegion {
                    sample_index,
                    envelope,
                    volume: row.volume,
                    panning: row.panning,
                    key_min: row.key_min,
                    key_max: row.key_max,
                })
            }
        };
        tables.push(row.instrument, record);
    }

    // A table error still reports the overflow so both can be fixed in one go
    let tables = match tables.finalize() {
        Ok(tables) => tables,
        Err(e) => {
            let err = anyhow::Error::from(e);
            return Err(match arena.overflow_bytes() {
                Some(bytes) => {
                    warn!("Sample data is also {} bytes over budget", bytes);
                    err.context(BuildError::ArenaOverflow { bytes })
                }
                None => err,
            });
        }
    };
    let stats = arena.stats();
    let report = BuildReport {
        samples: stats.committed,
        skipped,
        arena: stats,
        budget: arena.capacity(),
        remaining: arena.remaining(),
    };

    let image = SoundbankImage::new(
        config.layout,
        tables.instruments,
        tables.regions,
        sample_headers,
        arena.into_data(),
    )?;

    info!(
        "{} samples, {} of {} bytes used, {} padding, {} rows skipped",
        report.samples,
        report.arena.peak_cursor,
        report.budget,
        report.arena.padding_bytes,
        report.skipped.len()
    );

    Ok(BuiltSoundbank { image, report })
}

/// Registers for the packed layout, `None` for the split layout
fn packed_registers(
    row: &DefinitionRow,
    layout: RegionLayout,
) -> Result<Option<AdsrRegisters>, EnvelopeError> {
    match (layout, row.envelope) {
        (RegionLayout::Split, _) => Ok(None),
        (RegionLayout::Packed, RowEnvelope::Simple(envelope)) => envelope.to_raw().pack().map(Some),
        (RegionLayout::Packed, RowEnvelope::Raw(envelope)) => envelope.pack().map(Some),
    }
}

/// Build and write a soundbank
///
/// Nothing is written when the samples do not fit the budget.
pub fn export_soundbank(
    definitions: &Path,
    output: &Path,
    config: &BuildConfig,
) -> Result<BuildReport> {
    let built = build_soundbank(definitions, config)?;

    if let Some(bytes) = built.report.overflow_bytes() {
        return Err(BuildError::ArenaOverflow { bytes }.into());
    }

    std::fs::write(output, built.image.to_bytes())
        .with_context(|| format!("Failed to write soundbank: {}", output.display()))?;
    info!("Wrote {} ({} bytes)", output.display(), built.image.size());

    Ok(built.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvelopeScheme, OutputFormat};
    use fsbk_common::ParsedSoundbank;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn pcm_config() -> BuildConfig {
        BuildConfig::new(OutputFormat::Pcm16)
    }

    #[test]
    fn test_regions_grouped_and_indexed() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), 1, &[1; 10]);
        write_wav(&dir.path().join("b.wav"), 1, &[2; 20]);

        let table = "\
            4;60;127;0;0;0;0;0;0;100;127;a.wav\n\
            1;0;127;0;0;0;0;0;0;100;127;b.wav\n\
            4;0;59;0;0;0;0;0;0;100;127;b.wav\n";
        let built = build_from_reader(Cursor::new(table), dir.path(), &pcm_config()).unwrap();
        let image = &built.image;

        assert_eq!(built.report.samples, 3);
        assert_eq!(image.instruments()[1].region_range(), 0..1);
        assert_eq!(image.instruments()[4].region_range(), 1..3);

        // Split regions keep arrival-order sample indices
        let indices: Vec<u16> = image
            .regions()
            .iter()
            .map(|r| match r {
                RegionRecord::Split(s) => s.sample_index,
                RegionRecord::Packed(_) => unreachable!(),
            })
            .collect();
        assert_eq!(indices, vec![1, 0, 2]);

        let starts: Vec<u32> = image.sample_headers().iter().map(|h| h.sample_start).collect();
        assert_eq!(starts, vec![0, 32, 80]);
        assert_eq!(image.sample_data().len(), 80 + 40);
    }

    #[test]
    fn test_missing_and_stereo_skipped() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("mono.wav"), 1, &[0; 8]);
        write_wav(&dir.path().join("stereo.wav"), 2, &[0; 8]);

        let table = "\
            0;0;127;0;0;0;0;0;0;0;0;missing.wav\n\
            0;0;127;0;0;0;0;0;0;0;0;stereo.wav\n\
            0;0;127;0;0;0;0;0;0;0;0;mono.wav\n";
        let built = build_from_reader(Cursor::new(table), dir.path(), &pcm_config()).unwrap();

        assert_eq!(built.report.samples, 1);
        let lines: Vec<Option<usize>> = built.report.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![Some(1), Some(2)]);
        assert!(built.report.skipped[1].reason.contains("2 channel"));
        assert_eq!(built.image.instruments()[0].region_count, 1);
    }

    #[test]
    fn test_bad_envelope_skipped_before_charging() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), 1, &[0; 28]);
        let config = BuildConfig::resolve(
            OutputFormat::Psx,
            None,
            &crate::config::ConfigOverrides {
                envelope: Some(EnvelopeScheme::Raw),
                ..Default::default()
            },
        )
        .unwrap();

        // decay_shift 16 does not fit 4 bits
        let table = "\
            0;0;127;0;0;0;16;0;0;0;0;0;0;0;0;0;127;a.wav\n\
            0;0;127;1;10;3;4;15;0;0;31;0;0;1;8;0x3FFF;127;a.wav\n";
        let built = build_from_reader(Cursor::new(table), dir.path(), &config).unwrap();

        assert_eq!(built.report.skipped.len(), 1);
        assert!(built.report.skipped[0].reason.contains("decay_shift"));
        assert_eq!(built.report.arena.peak_cursor, 16);
        match built.image.regions()[0] {
            RegionRecord::Packed(region) => {
                assert_eq!(region.sample_start, 0);
                assert_eq!(region.volume, 0x3FFF);
                assert_eq!(region.adsr.unpack().release_shift, 8);
            }
            RegionRecord::Split(_) => panic!("expected packed region"),
        }
    }

    #[test]
    fn test_overflow_reported() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), 1, &[0; 40]);
        let mut config = pcm_config();
        config.budget = 100;

        let table = "\
            0;0;127;0;0;0;0;0;0;0;0;a.wav\n\
            1;0;127;0;0;0;0;0;0;0;0;a.wav\n";
        let built = build_from_reader(Cursor::new(table), dir.path(), &config).unwrap();

        // 80 bytes, then 80 more at offset 80
        assert_eq!(built.report.samples, 1);
        assert_eq!(built.report.overflow_bytes(), Some(60));
        assert_eq!(built.image.instruments()[1].region_count, 0);
    }

    #[test]
    fn test_image_parses_back() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), 1, &[100; 60]);
        let mut config = BuildConfig::new(OutputFormat::Psx);
        config.layout = RegionLayout::Packed;

        let table = "7;0;127;0;5;0;100;65535;200;127;64;a.wav\n";
        let built = build_from_reader(Cursor::new(table), dir.path(), &config).unwrap();
        let bytes = built.image.to_bytes();
        let parsed = ParsedSoundbank::parse(&bytes, RegionLayout::Packed).unwrap();

        assert_eq!(parsed.header.sample_count, 1);
        assert_eq!(parsed.regions_for(7).len(), 1);
        assert_eq!(parsed.sample_data.len(), 48);
        assert!(parsed.sample_headers.is_empty());
    }

    #[test]
    fn test_too_many_regions_fatal() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), 1, &[0; 4]);
        let table = "3;0;127;0;0;0;0;0;0;0;0;a.wav\n".repeat(17);

        let result = build_from_reader(Cursor::new(table), dir.path(), &pcm_config());
        assert!(result.is_err());
    }

    #[test]
    fn test_too_many_regions_still_reports_overflow() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("short.wav"), 1, &[0; 40]);
        write_wav(&dir.path().join("long.wav"), 1, &[0; 2000]);
        let mut config = pcm_config();
        config.budget = 2000;

        // 17 x 80 bytes, then 4000 bytes at 1360
        let mut table = "3;0;127;0;0;0;0;0;0;0;0;short.wav\n".repeat(17);
        table.push_str("4;0;127;0;0;0;0;0;0;0;0;long.wav\n");

        let err = build_from_reader(Cursor::new(table), dir.path(), &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ArenaOverflow { bytes: 3360 })
        ));
        assert!(matches!(
            err.downcast_ref::<crate::tables::TableError>(),
            Some(crate::tables::TableError::TooManyRegions { instrument: 3, count: 17 })
        ));
    }

    #[test]
    fn test_latin1_comment_skipped_and_record_reported() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), 1, &[0; 8]);

        let table: &[u8] = b"# caf\xe9 piano\n\
            0;0;127;0;0;0;0;0;0;0;0;a.wav\n\
            1;0;127;0;0;0;0;0;0;0;0;caf\xe9.wav\n";
        let built = build_from_reader(Cursor::new(table), dir.path(), &pcm_config()).unwrap();

        assert_eq!(built.report.samples, 1);
        assert_eq!(built.image.instruments()[0].region_count, 1);
        assert_eq!(built.report.skipped.len(), 1);
        assert_eq!(built.report.skipped[0].line, Some(3));
    }

    #[test]
    fn test_definition_file_not_found() {
        let dir = tempdir().unwrap();
        let err = build_soundbank(&dir.path().join("nope.csv"), &pcm_config()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::DefinitionFileNotFound(_))
        ));
    }

    #[test]
    fn test_export_writes_nothing_on_overflow() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), 1, &[0; 64]);
        let definitions = dir.path().join("bank.csv");
        std::fs::write(&definitions, "0;0;127;0;0;0;0;0;0;0;0;a.wav\n").unwrap();
        let output = dir.path().join("bank.sbk");

        let mut config = pcm_config();
        config.budget = 100;
        let err = export_soundbank(&definitions, &output, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ArenaOverflow { bytes: 28 })
        ));
        assert!(!output.exists());
    }
}
