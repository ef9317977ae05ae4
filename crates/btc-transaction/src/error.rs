use std::fmt;

/// Which bound a fee check tripped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeErrorKind {
    /// The unspent value is above the security margin times the estimate.
    TooLarge,
    /// The unspent value is below the estimate divided by the margin.
    TooSmall,
    /// An explicit fee was set that differs from the unspent value.
    Different,
}

impl fmt::Display for FeeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeErrorKind::TooLarge => write!(f, "fee is too large"),
            FeeErrorKind::TooSmall => write!(f, "fee is too small"),
            FeeErrorKind::Different => write!(f, "unspent value differs from the specified fee"),
        }
    }
}

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// A constructor or method was given malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An input was added without the output it spends.
    #[error("need more info: {0}")]
    NeedMoreInfo(String),

    #[error("missing script")]
    MissingScript,

    /// The output script does not match any spending condition the engine signs for.
    #[error("unsupported script: {0}")]
    UnsupportedScript(String),

    /// An amount was needed from an input rehydrated without its spent output.
    #[error("missing previous output for input {index}")]
    MissingPreviousOutput { index: usize },

    #[error("output {index} has an invalid amount of {satoshis} satoshis")]
    InvalidSatoshis { index: usize, satoshis: u64 },

    #[error("output amount {output} exceeds input amount {input}")]
    InvalidOutputAmountSum { input: u64, output: u64 },

    #[error("fee of {unspent} exceeds the maximum of {maximum} and no change address was provided")]
    ChangeAddressMissing { unspent: u64, maximum: u64 },

    #[error("{kind}: {message}")]
    FeeError { kind: FeeErrorKind, message: String },

    #[error("output {index} of {satoshis} satoshis is below the dust threshold")]
    DustOutputs { index: usize, satoshis: u64 },

    #[error("some inputs have not been fully signed")]
    MissingSignatures,

    #[error("invalid sorting: {0}")]
    InvalidSorting(String),

    #[error("index {index} out of range for {len} elements")]
    InvalidIndex { index: usize, len: usize },

    /// An absolute lock time below the block-height limit was given as a date.
    #[error("lock time {0} is too early to be a timestamp")]
    LockTimeTooEarly(u64),

    #[error("block height {0} is too high for a lock time")]
    BlockHeightTooHigh(u64),

    #[error("lock time {0} is out of range")]
    NLockTimeOutOfRange(u64),

    /// A relative lock of this many seconds cannot be encoded in a sequence number.
    #[error("relative lock of {0} seconds is out of range")]
    LockTimeRange(u64),

    #[error("relative block height {0} is out of range")]
    BlockHeightOutOfRange(u64),

    #[error("unable to verify signature: {0}")]
    UnableToVerifySignature(String),

    /// The input's script kind has not been resolved, so it cannot sign.
    #[error("abstract method invoked: {0}")]
    AbstractMethodInvoked(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// A consensus sanity check failed.
    #[error("transaction verification failed: {0}")]
    Verify(String),

    /// An error occurred during binary/hex serialization or deserialization.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// An underlying script error (forwarded from `btc-script`).
    #[error("script error: {0}")]
    Script(#[from] btc_script::ScriptError),

    /// An underlying primitives error (forwarded from `btc-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] btc_primitives::PrimitivesError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
