extern crate parking_lot;
extern crate secp256k1;
extern crate primitives;
extern crate chain;
extern crate serialization as ser;
extern crate dagcrypto as crypto;

mod cache;
mod error;
mod interpreter;
mod script;
mod sign;

pub use primitives::{bytes, hash};

pub use cache::SignatureCache;
pub use error::Error;
pub use interpreter::verify_script;
pub use script::{Script, Builder, Opcode, script_sigops, transaction_sigops, is_pay_to_script_hash};
pub use sign::{TransactionInputSigner, TransactionSignatureChecker, signature_hash};
