//! Absolute (nLockTime) and relative (BIP68 sequence) lock times.

/// Lock times below this value are block heights, at or above it timestamps.
pub const NLOCKTIME_BLOCKHEIGHT_LIMIT: u32 = 500_000_000;

pub const NLOCKTIME_MAX_VALUE: u64 = 0xffff_ffff;

/// Final sequence number; disables lock time and RBF for the input.
pub const DEFAULT_SEQNUMBER: u32 = 0xffff_ffff;

/// Sequence number that enables nLockTime without signalling RBF.
pub const DEFAULT_LOCKTIME_SEQNUMBER: u32 = 0xffff_fffe;

/// Sequence number that signals replace-by-fee.
pub const DEFAULT_RBF_SEQNUMBER: u32 = 0xffff_fffd;

pub const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;
pub const SEQUENCE_LOCKTIME_TYPE_FLAG: u32 = 1 << 22;
pub const SEQUENCE_LOCKTIME_MASK: u32 = 0xffff;
pub const SEQUENCE_LOCKTIME_GRANULARITY: u32 = 512;
pub const SEQUENCE_BLOCKDIFF_LIMIT: u32 = 0xffff;

/// The meaning of a non-zero nLockTime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockTime {
    BlockHeight(u32),
    /// Unix seconds.
    Timestamp(u32),
}

impl LockTime {
    /// Interpret a raw nLockTime; zero means no lock.
    pub fn from_raw(value: u32) -> Option<LockTime> {
        match value {
            0 => None,
            v if v < NLOCKTIME_BLOCKHEIGHT_LIMIT => Some(LockTime::BlockHeight(v)),
            v => Some(LockTime::Timestamp(v)),
        }
    }
}

/// A BIP68 relative lock decoded from an input's sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelativeLockTime {
    /// Blocks that must pass after the spent output confirms.
    Blocks(u32),
    /// Seconds, in multiples of 512.
    Seconds(u32),
}

impl RelativeLockTime {
    pub fn from_sequence(sequence: u32) -> Option<RelativeLockTime> {
        if sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
            return None;
        }
        let value = sequence & SEQUENCE_LOCKTIME_MASK;
        if sequence & SEQUENCE_LOCKTIME_TYPE_FLAG != 0 {
            Some(RelativeLockTime::Seconds(value * SEQUENCE_LOCKTIME_GRANULARITY))
        } else {
            Some(RelativeLockTime::Blocks(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_time_from_raw() {
        assert_eq!(LockTime::from_raw(0), None);
        assert_eq!(LockTime::from_raw(1), Some(LockTime::BlockHeight(1)));
        assert_eq!(
            LockTime::from_raw(NLOCKTIME_BLOCKHEIGHT_LIMIT - 1),
            Some(LockTime::BlockHeight(499_999_999))
        );
        assert_eq!(
            LockTime::from_raw(NLOCKTIME_BLOCKHEIGHT_LIMIT),
            Some(LockTime::Timestamp(500_000_000))
        );
    }

    #[test]
    fn test_relative_lock_time_from_sequence() {
        assert_eq!(RelativeLockTime::from_sequence(DEFAULT_SEQNUMBER), None);
        assert_eq!(RelativeLockTime::from_sequence(10), Some(RelativeLockTime::Blocks(10)));
        assert_eq!(
            RelativeLockTime::from_sequence(SEQUENCE_LOCKTIME_TYPE_FLAG | 3),
            Some(RelativeLockTime::Seconds(1536))
        );
    }
}
