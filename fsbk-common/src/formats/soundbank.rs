//! Soundbank image writer and reader
//!
//! [`SoundbankImage`] holds finalized tables plus the sample data blob and
//! serializes them in the fixed section order. Offsets are a running sum of
//! section sizes starting at 0 (the first byte after the header); there is
//! no padding between sections.
//!
//! [`ParsedSoundbank`] reads an image back and checks that every declared
//! offset and size matches the record counts.

use std::io::{self, Write};

use super::{
    BinarySerializable, INSTRUMENT_SLOTS, InstrumentDescriptor, RegionLayout, RegionRecord,
    SampleHeader, SoundbankHeader,
};

/// Errors building or reading a soundbank image
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("expected {expected} instrument descriptors, got {found}")]
    InstrumentCount { expected: usize, found: usize },

    #[error("region record {index} uses the {found} layout in a {expected} bank")]
    RegionLayoutMismatch {
        index: usize,
        expected: RegionLayout,
        found: RegionLayout,
    },

    #[error("{regions} regions but {headers} sample headers")]
    SampleHeaderCount { regions: usize, headers: usize },

    #[error("soundbank exceeds the 4 GiB offset range")]
    TooLarge,

    #[error("data too short: need {needed} bytes, have {found}")]
    TooShort { needed: usize, found: usize },

    #[error("missing FSBK magic")]
    BadMagic,

    #[error("{section} offset is {found}, expected {expected}")]
    SectionMismatch {
        section: &'static str,
        expected: u32,
        found: u32,
    },

    #[error("invalid record in {section} section")]
    InvalidRecord { section: &'static str },
}

/// Offset and size of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub offset: u32,
    pub size: u32,
}

impl Section {
    /// Offset of the byte after this section
    pub fn end(&self) -> u32 {
        self.offset + self.size
    }
}

/// Section placement for one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    pub instruments: Section,
    pub regions: Section,
    pub sample_headers: Option<Section>,
    pub sample_data: Section,
}

impl SectionLayout {
    /// Compute sections by running sum in file order
    pub fn compute(layout: RegionLayout, sample_count: u32, sample_data_size: u32) -> Self {
        let record_size = layout.region_record_size() as u32;

        let instruments = Section {
            offset: 0,
            size: (INSTRUMENT_SLOTS * InstrumentDescriptor::SIZE) as u32,
        };
        let regions = Section {
            offset: instruments.end(),
            size: sample_count * record_size,
        };
        let sample_headers = layout.has_sample_headers().then(|| Section {
            offset: regions.end(),
            size: sample_count * SampleHeader::SIZE as u32,
        });
        let sample_data = Section {
            offset: sample_headers.unwrap_or(regions).end(),
            size: sample_data_size,
        };

        Self {
            instruments,
            regions,
            sample_headers,
            sample_data,
        }
    }

    /// Body size (everything after the header)
    pub fn body_size(&self) -> u32 {
        self.sample_data.end()
    }
}

/// A complete soundbank ready to serialize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundbankImage {
    layout: RegionLayout,
    instruments: Vec<InstrumentDescriptor>,
    regions: Vec<RegionRecord>,
    sample_headers: Vec<SampleHeader>,
    sample_data: Vec<u8>,
}

impl SoundbankImage {
    /// Assemble an image from finalized tables
    ///
    /// # Errors
    /// - `InstrumentCount` unless there are exactly 256 descriptors
    /// - `RegionLayoutMismatch` if a record does not match `layout`
    /// - `SampleHeaderCount` if the split layout lacks one header per region,
    ///   or the packed layout has any
    /// - `TooLarge` if any offset would overflow `u32`
    pub fn new(
        layout: RegionLayout,
        instruments: Vec<InstrumentDescriptor>,
        regions: Vec<RegionRecord>,
        sample_headers: Vec<SampleHeader>,
        sample_data: Vec<u8>,
    ) -> Result<Self, FormatError> {
        if instruments.len() != INSTRUMENT_SLOTS {
            return Err(FormatError::InstrumentCount {
                expected: INSTRUMENT_SLOTS,
                found: instruments.len(),
            });
        }

        if let Some((index, record)) = regions
            .iter()
            .enumerate()
            .find(|(_, r)| r.layout() != layout)
        {
            return Err(FormatError::RegionLayoutMismatch {
                index,
                expected: layout,
                found: record.layout(),
            });
        }

        let expected_headers = if layout.has_sample_headers() {
            regions.len()
        } else {
            0
        };
        if sample_headers.len() != expected_headers {
            return Err(FormatError::SampleHeaderCount {
                regions: regions.len(),
                headers: sample_headers.len(),
            });
        }

        let total = layout.header_size() as u64
            + (INSTRUMENT_SLOTS * InstrumentDescriptor::SIZE) as u64
            + (regions.len() * layout.region_record_size()) as u64
            + (sample_headers.len() * SampleHeader::SIZE) as u64
            + sample_data.len() as u64;
        if total > u32::MAX as u64 {
            return Err(FormatError::TooLarge);
        }

        Ok(Self {
            layout,
            instruments,
            regions,
            sample_headers,
            sample_data,
        })
    }

    pub fn layout(&self) -> RegionLayout {
        self.layout
    }

    pub fn sample_count(&self) -> u32 {
        self.regions.len() as u32
    }

    pub fn instruments(&self) -> &[InstrumentDescriptor] {
        &self.instruments
    }

    pub fn regions(&self) -> &[RegionRecord] {
        &self.regions
    }

    pub fn sample_headers(&self) -> &[SampleHeader] {
        &self.sample_headers
    }

    pub fn sample_data(&self) -> &[u8] {
        &self.sample_data
    }

    pub fn sections(&self) -> SectionLayout {
        SectionLayout::compute(
            self.layout,
            self.sample_count(),
            self.sample_data.len() as u32,
        )
    }

    pub fn header(&self) -> SoundbankHeader {
        let sections = self.sections();
        SoundbankHeader {
            sample_count: self.sample_count(),
            instrument_offset: sections.instruments.offset,
            region_offset: sections.regions.offset,
            sample_header_offset: sections.sample_headers.map(|s| s.offset),
            sample_data_offset: sections.sample_data.offset,
            sample_data_size: sections.sample_data.size,
        }
    }

    /// Total serialized size in bytes
    pub fn size(&self) -> usize {
        self.layout.header_size() + self.sections().body_size() as usize
    }

    /// Write the header followed by every section in file order
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.header().to_bytes())?;
        w.write_all(&InstrumentDescriptor::serialize_table(&self.instruments))?;
        for region in &self.regions {
            w.write_all(&region.to_bytes())?;
        }
        w.write_all(&SampleHeader::serialize_table(&self.sample_headers))?;
        w.write_all(&self.sample_data)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        // Writing to a Vec cannot fail
        let _ = self.write_to(&mut bytes);
        bytes
    }
}

/// A soundbank read back from bytes
#[derive(Debug, Clone)]
pub struct ParsedSoundbank<'a> {
    pub header: SoundbankHeader,
    pub instruments: Vec<InstrumentDescriptor>,
    pub regions: Vec<RegionRecord>,
    pub sample_headers: Vec<SampleHeader>,
    pub sample_data: &'a [u8],
}

impl<'a> ParsedSoundbank<'a> {
    /// Parse and validate a soundbank built with `layout`
    pub fn parse(bytes: &'a [u8], layout: RegionLayout) -> Result<Self, FormatError> {
        let header_size = layout.header_size();
        if bytes.len() < header_size {
            return Err(FormatError::TooShort {
                needed: header_size,
                found: bytes.len(),
            });
        }
        let header =
            SoundbankHeader::from_bytes(bytes, layout).ok_or(FormatError::BadMagic)?;

        let per_sample = layout.region_record_size()
            + if layout.has_sample_headers() {
                SampleHeader::SIZE
            } else {
                0
            };
        let needed = header_size as u64
            + (INSTRUMENT_SLOTS * InstrumentDescriptor::SIZE) as u64
            + header.sample_count as u64 * per_sample as u64
            + header.sample_data_size as u64;
        if needed > bytes.len() as u64 {
            return Err(FormatError::TooShort {
                needed: needed.min(usize::MAX as u64) as usize,
                found: bytes.len(),
            });
        }

        let expected =
            SectionLayout::compute(layout, header.sample_count, header.sample_data_size);
        let declared = [
            ("instrument", expected.instruments.offset, header.instrument_offset),
            ("region", expected.regions.offset, header.region_offset),
            (
                "sample header",
                expected.sample_headers.map_or(0, |s| s.offset),
                header.sample_header_offset.unwrap_or(0),
            ),
            ("sample data", expected.sample_data.offset, header.sample_data_offset),
        ];
        for (section, expected, found) in declared {
            if expected != found {
                return Err(FormatError::SectionMismatch {
                    section,
                    expected,
                    found,
                });
            }
        }

        let body = &bytes[header_size..];
        let slice = |s: Section| &body[s.offset as usize..s.end() as usize];

        let instruments = InstrumentDescriptor::deserialize_table(slice(expected.instruments))
            .ok_or(FormatError::InvalidRecord {
                section: "instrument",
            })?;

        let regions = slice(expected.regions)
            .chunks_exact(layout.region_record_size())
            .map(|chunk| RegionRecord::from_bytes(chunk, layout))
            .collect::<Option<Vec<_>>>()
            .ok_or(FormatError::InvalidRecord { section: "region" })?;

        let sample_headers = match expected.sample_headers {
            Some(section) => SampleHeader::deserialize_table(slice(section)).ok_or(
                FormatError::InvalidRecord {
                    section: "sample header",
                },
            )?,
            None => Vec::new(),
        };

        Ok(Self {
            header,
            instruments,
            regions,
            sample_headers,
            sample_data: slice(expected.sample_data),
        })
    }

    /// All regions of one instrument, in table order
    pub fn regions_for(&self, instrument: u8) -> &[RegionRecord] {
        let range = self.instruments[instrument as usize].region_range();
        self.regions.get(range).unwrap_or(&[])
    }
}
