//! Instrument/region table builder
//!
//! Regions arrive in definition order tagged with an instrument id. The
//! finalized region table is ordered by instrument id, then arrival order,
//! and each instrument descriptor holds the start index and count of its run.

use fsbk_common::{INSTRUMENT_SLOTS, InstrumentDescriptor, MAX_REGIONS_PER_INSTRUMENT};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("instrument {instrument} has {count} regions (max {MAX_REGIONS_PER_INSTRUMENT})")]
    TooManyRegions { instrument: u8, count: usize },
}

/// Finalized tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalTables<T> {
    /// One descriptor per instrument slot
    pub instruments: Vec<InstrumentDescriptor>,
    /// Regions grouped by instrument id
    pub regions: Vec<T>,
}

/// Groups regions by instrument as they are committed
#[derive(Debug, Clone)]
pub struct TableBuilder<T> {
    groups: Vec<Vec<T>>,
    len: usize,
}

impl<T> Default for TableBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TableBuilder<T> {
    pub fn new() -> Self {
        Self {
            groups: (0..INSTRUMENT_SLOTS).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    pub fn push(&mut self, instrument: u8, region: T) {
        self.groups[instrument as usize].push(region);
        self.len += 1;
    }

    /// Regions pushed so far
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn region_count(&self, instrument: u8) -> usize {
        self.groups[instrument as usize].len()
    }

    /// Flatten groups into the region table and build descriptors
    ///
    /// Fails with `TooManyRegions` if an instrument exceeds 16 regions; with
    /// that cap every start index fits in `u16`.
    pub fn finalize(self) -> Result<FinalTables<T>, TableError> {
        if let Some((instrument, group)) = self
            .groups
            .iter()
            .enumerate()
            .find(|(_, group)| group.len() > MAX_REGIONS_PER_INSTRUMENT)
        {
            return Err(TableError::TooManyRegions {
                instrument: instrument as u8,
                count: group.len(),
            });
        }

        let mut instruments = Vec::with_capacity(INSTRUMENT_SLOTS);
        let mut regions = Vec::with_capacity(self.len);
        for group in self.groups {
            instruments.push(InstrumentDescriptor::new(
                regions.len() as u16,
                group.len() as u16,
            ));
            regions.extend(group);
        }

        Ok(FinalTables {
            instruments,
            regions,
        })
    }
}
