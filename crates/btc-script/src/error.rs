/// Error types for script operations.
///
/// Covers parsing errors, push encoding failures, template extraction
/// and address encoding problems.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Generic invalid script error.
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// Invalid hex token encountered during ASM parsing.
    #[error("invalid opcode data")]
    InvalidOpcodeData,

    /// Attempted to use append_opcodes for a push data opcode.
    #[error("use append_push_data for push data funcs: {0}")]
    InvalidOpcodeType(String),

    /// Script does not match the template an operation needs.
    #[error("unsupported script: {0}")]
    UnsupportedScript(String),

    /// Invalid address string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Address is valid but not for the expected network.
    #[error("address {address} is not a {expected:?} address")]
    WrongNetwork {
        address: String,
        expected: btc_primitives::Network,
    },

    /// Invalid hex string.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Script is empty when a non-empty script was expected.
    #[error("script is empty")]
    EmptyScript,

    /// Script is neither P2PKH nor P2WPKH.
    #[error("not a public key hash output")]
    NotPublicKeyHash,

    /// Script is not a P2SH output.
    #[error("not a script hash output")]
    NotScriptHash,

    /// Not enough data in script to complete a push operation.
    #[error("not enough data")]
    DataTooSmall,

    /// Push data exceeds the maximum encodable size.
    #[error("data too big")]
    DataTooBig,

    /// A push data part exceeds protocol limits.
    #[error("part too big '{0}'")]
    PartTooBig(usize),

    /// Script index is out of range.
    #[error("script index out of range")]
    IndexOutOfRange,

    /// Error from primitives crate.
    #[error("primitives error: {0}")]
    Primitives(#[from] btc_primitives::PrimitivesError),
}
