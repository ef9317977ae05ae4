//! Bitcoin transaction construction, fee balancing and multi-party signing.
//!
//! A [`Transaction`] is built from unspent outputs and payment outputs,
//! balanced against a fee rate with an optional change output, and signed
//! by one or more parties with the legacy, BIP143 or BIP341 digest each
//! input calls for.

pub mod fee;
pub mod input;
pub mod lock_time;
pub mod object;
pub mod output;
pub mod sighash;
pub mod signature;
pub mod transaction;
pub mod unspent_output;

mod error;
pub use error::{FeeErrorKind, TransactionError};
pub use fee::FeeConfig;
pub use input::{Input, InputKind, MultisigParams, MultisigState, ScriptWrapping};
pub use object::{InputObject, TransactionObject};
pub use output::Output;
pub use signature::{SignatureData, SigningMethod, TransactionSignature};
pub use transaction::{SerializeOptions, Transaction};
pub use unspent_output::UnspentOutput;
