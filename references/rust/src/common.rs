use crate::consts::MAX_LOCAL_EDGE_INDEX;
use crate::{Result, TileError, TileErrorCode};

/// A contiguous bit range inside a packed 64-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BitField {
    pub shift: u32,
    pub width: u32,
}

impl BitField {
    pub const fn new(shift: u32, width: u32) -> Self {
        assert!(width > 0 && shift + width <= 64);
        Self { shift, width }
    }

    pub const fn max(self) -> u64 {
        if self.width == 64 {
            u64::MAX
        } else {
            (1_u64 << self.width) - 1
        }
    }

    fn mask(self) -> u64 {
        self.max() << self.shift
    }

    pub fn extract(self, word: u64) -> u64 {
        (word & self.mask()) >> self.shift
    }

    /// Stores `value` into its bit range, rejecting anything wider than the field.
    pub fn insert(self, word: u64, value: u64, name: &str) -> Result<u64> {
        if value > self.max() {
            return Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!(
                    "{name} value {value} exceeds {} bit field (max {}).",
                    self.width,
                    self.max()
                ),
            ));
        }
        Ok((word & !self.mask()) | (value << self.shift))
    }

    /// Sub-field for one local edge slot of `slot_bits` bits.
    pub fn slot(self, local_index: u32, slot_bits: u32) -> Result<BitField> {
        check_local_index(local_index)?;
        let shift = self.shift + local_index * slot_bits;
        debug_assert!(shift + slot_bits <= self.shift + self.width);
        Ok(BitField::new(shift, slot_bits))
    }
}

pub(crate) fn check_local_index(local_index: u32) -> Result<()> {
    if local_index > MAX_LOCAL_EDGE_INDEX {
        return Err(TileError::new(
            TileErrorCode::LocalIndexOutOfRange,
            format!("Local edge index must be <= {MAX_LOCAL_EDGE_INDEX}, got {local_index}."),
        ));
    }
    Ok(())
}

fn field_bytes<const N: usize>(bytes: &[u8], offset: usize, what: &str) -> Result<[u8; N]> {
    let value_bytes = offset
        .checked_add(N)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            TileError::new(
                TileErrorCode::InvalidHeaderLength,
                format!("Could not read {what} field at offset {offset}."),
            )
        })?;
    value_bytes.try_into().map_err(|_| {
        TileError::new(
            TileErrorCode::InvalidHeaderLength,
            format!("Could not parse {what} field bytes."),
        )
    })
}

pub(crate) fn read_u32_le(bytes: &[u8], offset: usize) -> Result<u32> {
    field_bytes(bytes, offset, "u32").map(u32::from_le_bytes)
}

pub(crate) fn read_u64_le(bytes: &[u8], offset: usize) -> Result<u64> {
    field_bytes(bytes, offset, "u64").map(u64::from_le_bytes)
}

pub(crate) fn read_i64_le(bytes: &[u8], offset: usize) -> Result<i64> {
    field_bytes(bytes, offset, "i64").map(i64::from_le_bytes)
}

pub(crate) fn read_f32_le(bytes: &[u8], offset: usize) -> Result<f32> {
    field_bytes(bytes, offset, "f32").map(f32::from_le_bytes)
}

pub(crate) fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N]> {
    field_bytes(bytes, offset, "byte array")
}
