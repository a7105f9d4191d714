//! Binary serialization trait for format records.
//!
//! Every rig asset record implements `BinarySerializable` so the chunk
//! decoder can split a payload into typed records generically. Each record
//! also keeps a type-specific `to_bytes()` returning a fixed-size array.

/// Trait for fixed-size binary records.
///
/// The trait uses `Vec<u8>` for the return type because associated const
/// generics in return types (`[u8; Self::SIZE]`) are not yet stable in Rust.
///
/// # Example
///
/// ```
/// use rig_common::formats::{BinarySerializable, StringRef};
///
/// let name = StringRef::new(4, 9);
/// let bytes = name.serialize();
/// let parsed = StringRef::deserialize(&bytes).unwrap();
/// assert_eq!(parsed, name);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized record in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;

    /// Split a chunk payload into records.
    ///
    /// Returns `None` if the payload length is not a multiple of [`Self::SIZE`].
    fn deserialize_all(payload: &[u8]) -> Option<Vec<Self>> {
        if payload.len() % Self::SIZE != 0 {
            return None;
        }
        payload
            .chunks_exact(Self::SIZE)
            .map(Self::deserialize)
            .collect()
    }
}

macro_rules! impl_binary_serializable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BinarySerializable for $ty {
                const SIZE: usize = <$ty>::SIZE;

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
    super::StringRef,
    super::BoneRecord,
    super::BoneTrs,
    super::ActionRecord,
    super::SkinVertex,
);

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

pub(crate) fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    read_u32(bytes, offset) as i32
}

pub(crate) fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_bits(read_u32(bytes, offset))
}

/// Read `N` consecutive f32 values starting at `offset`
pub(crate) fn read_f32s<const N: usize>(bytes: &[u8], offset: usize) -> [f32; N] {
    std::array::from_fn(|i| read_f32(bytes, offset + i * 4))
}

/// Write consecutive f32 values starting at `offset`
pub(crate) fn write_f32s(bytes: &mut [u8], offset: usize, values: &[f32]) {
    for (i, f) in values.iter().enumerate() {
        bytes[offset + i * 4..offset + (i + 1) * 4].copy_from_slice(&f.to_le_bytes());
    }
}
