use core::fmt::{self, Debug};

use gst_serialization::{NumBytes, Read, ReadError, Write, WriteError};
use time::{Duration, OffsetDateTime, macros::format_description};

/// A block time expressed as a slot count: 500 ms intervals since
/// 2000-01-01T00:00:00Z.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockTimestamp {
    slot: u32,
}

impl BlockTimestamp {
    pub const BLOCK_INTERVAL_MS: i64 = 500;
    pub const BLOCK_TIMESTAMP_EPOCH_MS: i64 = 946_684_800_000; // 2000-01-01T00:00:00Z

    #[inline]
    pub const fn new(slot: u32) -> Self {
        Self { slot }
    }

    #[inline]
    pub const fn min() -> Self {
        Self { slot: 0 }
    }

    #[inline]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    pub fn to_block_string(&self) -> String {
        let total_ms =
            (self.slot as i64) * Self::BLOCK_INTERVAL_MS + Self::BLOCK_TIMESTAMP_EPOCH_MS;

        let secs = total_ms.div_euclid(1000);
        let rem_ms = total_ms.rem_euclid(1000);

        let mut dt =
            OffsetDateTime::from_unix_timestamp(secs).expect("valid timestamp for BlockTimestamp");
        dt += Duration::milliseconds(rem_ms);

        // "YYYY-MM-DDTHH:MM:SS.sss" (no 'Z')
        const FMT: &[time::format_description::FormatItem<'_>] = format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]"
        );

        dt.format(FMT).expect("formatting never fails")
    }
}

impl fmt::Display for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_block_string())
    }
}

impl Debug for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_block_string().as_str())
    }
}

impl Default for BlockTimestamp {
    fn default() -> Self {
        BlockTimestamp::min()
    }
}

impl serde::Serialize for BlockTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_block_string())
    }
}

impl NumBytes for BlockTimestamp {
    fn num_bytes(&self) -> usize {
        4
    }
}

impl Read for BlockTimestamp {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        let slot = u32::read(bytes, pos)?;
        Ok(BlockTimestamp::new(slot))
    }
}

impl Write for BlockTimestamp {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.slot.write(bytes, pos)
    }
}
