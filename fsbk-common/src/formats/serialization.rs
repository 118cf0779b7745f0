//! Binary serialization trait for fixed-size records.
//!
//! Instrument descriptors, region records and sample headers implement
//! `BinarySerializable` so section writers and readers can treat them
//! uniformly. Each record keeps its type-specific `to_bytes()` returning a
//! fixed-size array.

/// Trait for fixed-size binary records.
///
/// The trait uses `Vec<u8>` for the return type because associated const
/// generics in return types (`[u8; Self::SIZE]`) are not yet stable in Rust.
///
/// # Example
///
/// ```
/// use fsbk_common::formats::{BinarySerializable, InstrumentDescriptor};
///
/// let desc = InstrumentDescriptor::new(4, 2);
/// let bytes = desc.serialize();
/// let parsed = InstrumentDescriptor::deserialize(&bytes).unwrap();
/// assert_eq!(parsed, desc);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized record in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short or contains invalid data.
    fn deserialize(bytes: &[u8]) -> Option<Self>;

    /// Serialize a table of records back to back
    fn serialize_table(records: &[Self]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(records.len() * Self::SIZE);
        for record in records {
            bytes.extend_from_slice(&record.serialize());
        }
        bytes
    }

    /// Deserialize a table of records; `None` if any record is invalid or
    /// the slice is not a whole number of records
    fn deserialize_table(bytes: &[u8]) -> Option<Vec<Self>> {
        if !bytes.len().is_multiple_of(Self::SIZE) {
            return None;
        }
        bytes.chunks_exact(Self::SIZE).map(Self::deserialize).collect()
    }
}

macro_rules! impl_binary_serializable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BinarySerializable for $ty {
                const SIZE: usize = Self::SIZE;

                fn serialize(&self) -> Vec<u8> {
                    self.to_bytes().to_vec()
                }

                fn deserialize(bytes: &[u8]) -> Option<Self> {
                    Self::from_bytes(bytes)
                }
            }
        )*
    };
}

impl_binary_serializable!(
    super::InstrumentDescriptor,
    super::SplitRegion,
    super::PackedRegion,
    super::SampleHeader,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{InstrumentDescriptor, PackedRegion, SampleHeader, SplitRegion};

    #[test]
    fn test_record_sizes() {
        assert_eq!(<InstrumentDescriptor as BinarySerializable>::SIZE, 4);
        assert_eq!(<SplitRegion as BinarySerializable>::SIZE, 20);
        assert_eq!(<PackedRegion as BinarySerializable>::SIZE, 24);
        assert_eq!(<SampleHeader as BinarySerializable>::SIZE, 16);
    }

    #[test]
    fn test_table_roundtrip() {
        let table = vec![
            InstrumentDescriptor::new(0, 2),
            InstrumentDescriptor::new(2, 0),
            InstrumentDescriptor::new(2, 1),
        ];
        let bytes = InstrumentDescriptor::serialize_table(&table);
        assert_eq!(bytes.len(), 12);
        assert_eq!(InstrumentDescriptor::deserialize_table(&bytes), Some(table));
    }

    #[test]
    fn test_table_partial_record() {
        assert!(InstrumentDescriptor::deserialize_table(&[0u8; 6]).is_none());
    }
}
