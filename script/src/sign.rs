//! Transaction signature hash and signature checking.

use chain::{Transaction, TransactionInput, OutPoint};
use bytes::Bytes;
use crypto::dhash256;
use hash::H256;
use ser::Stream;
use secp256k1::{Message, PublicKey, Secp256k1, Signature};
use error::Error;

/// Computes the hash a signature for the given input commits to.
///
/// The commitment covers the transaction with every signature script
/// blanked, the index of the input being signed, the output script being
/// spent and the amount it carries.
pub fn signature_hash(
	transaction: &Transaction,
	input_index: usize,
	script_pubkey: &[u8],
	input_amount: u64,
) -> H256 {
	let mut stream = Stream::default();
	stream.append(&transaction.version);

	stream.append_list(&transaction.inputs.iter().map(|input| TransactionInput {
		previous_outpoint: input.previous_outpoint.clone(),
		signature_script: Bytes::new(),
		sequence: input.sequence,
	}).collect::<Vec<_>>());

	stream.append_list(&transaction.outputs);
	stream
		.append(&transaction.lock_time)
		.append(&transaction.subnetwork_id)
		.append(&transaction.payload)
		.append(&(input_index as u32))
		.append(&input_amount);
	stream.append_slice(script_pubkey);

	dhash256(&stream.out())
}

/// Signs transaction inputs. Holds the transaction an input of which is
/// being signed.
#[derive(Debug, Clone)]
pub struct TransactionInputSigner {
	pub transaction: Transaction,
}

impl From<Transaction> for TransactionInputSigner {
	fn from(transaction: Transaction) -> Self {
		TransactionInputSigner {
			transaction: transaction,
		}
	}
}

impl TransactionInputSigner {
	pub fn signature_hash(&self, input_index: usize, script_pubkey: &[u8], input_amount: u64) -> H256 {
		signature_hash(&self.transaction, input_index, script_pubkey, input_amount)
	}

	pub fn previous_outpoint(&self, input_index: usize) -> &OutPoint {
		&self.transaction.inputs[input_index].previous_outpoint
	}
}

/// Checks a single input's signatures against the output script being
/// spent.
pub struct TransactionSignatureChecker {
	pub signer: TransactionInputSigner,
	pub input_index: usize,
	pub input_amount: u64,
}

impl TransactionSignatureChecker {
	/// Verifies a 64-byte compact ECDSA signature made by the owner of
	/// the given 33-byte compressed public key. Unparseable material is
	/// `SignatureFormat`; a well-formed signature that does not verify
	/// is `SignatureInvalid`.
	pub fn check_signature(&self, signature: &[u8], pubkey: &[u8], script_pubkey: &[u8]) -> Result<(), Error> {
		let sighash = self.signer.signature_hash(self.input_index, script_pubkey, self.input_amount);

		let secp = Secp256k1::verification_only();
		let message = Message::from_slice(&*sighash).map_err(|_| Error::SignatureFormat)?;
		let signature = Signature::from_compact(signature).map_err(|_| Error::SignatureFormat)?;
		let pubkey = PublicKey::from_slice(pubkey).map_err(|_| Error::SignatureFormat)?;

		secp.verify(&message, &signature, &pubkey).map_err(|_| Error::SignatureInvalid)
	}
}

#[cfg(test)]
mod tests {
	use chain::{OutPoint, Transaction, TransactionInput, TransactionOutput};
	use secp256k1::{Secp256k1, SecretKey, PublicKey, Message};
	use super::{signature_hash, TransactionInputSigner, TransactionSignatureChecker};

	fn sample_transaction() -> Transaction {
		Transaction {
			version: 1,
			inputs: vec![TransactionInput {
				previous_outpoint: OutPoint::new(1u8.into(), 0),
				signature_script: "00".into(),
				sequence: 0,
			}],
			outputs: vec![TransactionOutput {
				value: 10,
				script_pubkey: "51".into(),
			}],
			..Default::default()
		}
	}

	#[test]
	fn test_signature_hash_ignores_signature_scripts() {
		let transaction = sample_transaction();
		let mut malleated = transaction.clone();
		malleated.inputs[0].signature_script = "0145".into();

		assert_eq!(
			signature_hash(&transaction, 0, b"script", 10),
			signature_hash(&malleated, 0, b"script", 10),
		);
	}

	#[test]
	fn test_signature_hash_commits_to_amount() {
		let transaction = sample_transaction();
		assert!(signature_hash(&transaction, 0, b"script", 10) != signature_hash(&transaction, 0, b"script", 11));
	}

	#[test]
	fn test_check_signature_round_trip() {
		let secp = Secp256k1::new();
		let secret = SecretKey::from_slice(&[0x11; 32]).unwrap();
		let pubkey = PublicKey::from_secret_key(&secp, &secret);

		let transaction = sample_transaction();
		let script_pubkey = b"prev-script";
		let sighash = signature_hash(&transaction, 0, script_pubkey, 10);
		let message = Message::from_slice(&*sighash).unwrap();
		let signature = secp.sign(&message, &secret).serialize_compact();

		let checker = TransactionSignatureChecker {
			signer: TransactionInputSigner::from(transaction),
			input_index: 0,
			input_amount: 10,
		};

		assert_eq!(checker.check_signature(&signature, &pubkey.serialize(), script_pubkey), Ok(()));
		// wrong amount breaks the commitment
		let wrong = TransactionSignatureChecker {
			signer: checker.signer.clone(),
			input_index: 0,
			input_amount: 11,
		};
		assert_eq!(
			wrong.check_signature(&signature, &pubkey.serialize(), script_pubkey),
			Err(::error::Error::SignatureInvalid),
		);
		// malformed material is a format error, not a failed check
		assert_eq!(
			checker.check_signature(&[0u8; 10], &pubkey.serialize(), script_pubkey),
			Err(::error::Error::SignatureFormat),
		);
	}
}
