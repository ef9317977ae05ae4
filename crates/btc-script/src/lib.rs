/// Script parsing, standard templates and address handling.
///
/// Provides the `Script` type, opcode definitions, script chunk parsing,
/// classifiers and builders for the standard output templates, and
/// base58 / bech32 address conversion.

pub mod script;
pub mod opcodes;
pub mod chunk;
pub mod address;

mod error;
pub use error::ScriptError;
pub use script::Script;
pub use address::{Address, AddressType};
pub use chunk::ScriptChunk;
pub use btc_primitives::Network;
