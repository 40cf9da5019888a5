//! Reduced script interpreter.

use crypto::dhash256;
use cache::SignatureCache;
use error::Error;
use script::{Instruction, Opcode, Script};
use sign::TransactionSignatureChecker;

/// Verifies that the signature script satisfies the output script being
/// spent. Handles the pay-to-script-hash indirection: when the output
/// script matches the template, the last push of the signature script is
/// executed as the real spending condition.
pub fn verify_script(
	signature_script: &Script,
	script_pubkey: &Script,
	checker: &TransactionSignatureChecker,
	cache: &SignatureCache,
) -> Result<(), Error> {
	let mut stack: Vec<Vec<u8>> = Vec::new();
	eval_script(&mut stack, signature_script, checker, cache)?;
	let stack_copy = stack.clone();

	eval_script(&mut stack, script_pubkey, checker, cache)?;
	if !top_is_truthy(&stack) {
		return Err(Error::EvalFalse);
	}

	if script_pubkey.is_pay_to_script_hash() {
		let mut stack = stack_copy;
		let serialized = stack.pop().ok_or(Error::InvalidStackOperation)?;
		let redeem_script = Script::from(serialized);

		eval_script(&mut stack, &redeem_script, checker, cache)?;
		if !top_is_truthy(&stack) {
			return Err(Error::EvalFalse);
		}
	}

	Ok(())
}

fn eval_script(
	stack: &mut Vec<Vec<u8>>,
	script: &Script,
	checker: &TransactionSignatureChecker,
	cache: &SignatureCache,
) -> Result<(), Error> {
	for instruction in script.instructions()? {
		match instruction {
			Instruction::Push(data) => stack.push(data.to_vec()),
			Instruction::Op(Opcode::OP_0) => stack.push(vec![]),
			Instruction::Op(Opcode::OP_1) => stack.push(vec![1]),
			Instruction::Op(Opcode::OP_DUP) => {
				let top = stack.last().cloned().ok_or(Error::InvalidStackOperation)?;
				stack.push(top);
			},
			Instruction::Op(Opcode::OP_HASH256) => {
				let top = stack.pop().ok_or(Error::InvalidStackOperation)?;
				stack.push(dhash256(&top).take().to_vec());
			},
			Instruction::Op(Opcode::OP_EQUAL) => {
				let equal = pop_equal(stack)?;
				stack.push(if equal { vec![1] } else { vec![] });
			},
			Instruction::Op(Opcode::OP_EQUALVERIFY) => {
				if !pop_equal(stack)? {
					return Err(Error::EqualVerify);
				}
			},
			Instruction::Op(Opcode::OP_CHECKSIG) => {
				let pubkey = stack.pop().ok_or(Error::InvalidStackOperation)?;
				let signature = stack.pop().ok_or(Error::InvalidStackOperation)?;
				// a failed check aborts the script rather than pushing
				// false, so the caller sees the precise failure
				check_signature(checker, cache, &signature, &pubkey, script)?;
				stack.push(vec![1]);
			},
			// push opcodes are expanded by Script::instructions
			Instruction::Op(_) => return Err(Error::BadOpcode),
		}
	}

	Ok(())
}

fn check_signature(
	checker: &TransactionSignatureChecker,
	cache: &SignatureCache,
	signature: &[u8],
	pubkey: &[u8],
	script_code: &Script,
) -> Result<(), Error> {
	let sighash = checker.signer.signature_hash(checker.input_index, script_code, checker.input_amount);
	if cache.contains(&sighash, signature, pubkey) {
		return Ok(());
	}

	checker.check_signature(signature, pubkey, script_code)?;
	cache.insert(&sighash, signature, pubkey);
	Ok(())
}

fn pop_equal(stack: &mut Vec<Vec<u8>>) -> Result<bool, Error> {
	let a = stack.pop().ok_or(Error::InvalidStackOperation)?;
	let b = stack.pop().ok_or(Error::InvalidStackOperation)?;
	Ok(a == b)
}

fn top_is_truthy(stack: &[Vec<u8>]) -> bool {
	match stack.last() {
		Some(top) => top.iter().any(|b| *b != 0),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	use chain::{OutPoint, Transaction, TransactionInput, TransactionOutput};
	use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
	use cache::SignatureCache;
	use crypto::dhash256;
	use error::Error;
	use script::{Builder, Script};
	use sign::{signature_hash, TransactionInputSigner, TransactionSignatureChecker};
	use super::verify_script;

	fn spending_transaction() -> Transaction {
		Transaction {
			version: 1,
			inputs: vec![TransactionInput {
				previous_outpoint: OutPoint::new(9u8.into(), 0),
				signature_script: Default::default(),
				sequence: 0,
			}],
			outputs: vec![TransactionOutput {
				value: 5,
				script_pubkey: "51".into(),
			}],
			..Default::default()
		}
	}

	fn checker_for(transaction: &Transaction) -> TransactionSignatureChecker {
		TransactionSignatureChecker {
			signer: TransactionInputSigner::from(transaction.clone()),
			input_index: 0,
			input_amount: 10,
		}
	}

	#[test]
	fn test_anyone_can_spend() {
		let transaction = spending_transaction();
		let checker = checker_for(&transaction);
		let cache = SignatureCache::new();

		assert_eq!(
			verify_script(&Script::default(), &Builder::build_true(), &checker, &cache),
			Ok(()),
		);
	}

	#[test]
	fn test_false_output_script_fails() {
		let transaction = spending_transaction();
		let checker = checker_for(&transaction);
		let cache = SignatureCache::new();

		assert_eq!(
			verify_script(&Script::default(), &Script::from(vec![0x00]), &checker, &cache),
			Err(Error::EvalFalse),
		);
	}

	#[test]
	fn test_pay_to_pubkey() {
		let secp = Secp256k1::new();
		let secret = SecretKey::from_slice(&[0x22; 32]).unwrap();
		let pubkey = PublicKey::from_secret_key(&secp, &secret);

		let transaction = spending_transaction();
		let script_pubkey = Builder::build_p2pk(&pubkey.serialize());

		let sighash = signature_hash(&transaction, 0, &script_pubkey, 10);
		let message = Message::from_slice(&*sighash).unwrap();
		let signature = secp.sign(&message, &secret).serialize_compact();

		let signature_script = Builder::default().push_data(&signature).into_script();

		let checker = checker_for(&transaction);
		let cache = SignatureCache::new();
		assert_eq!(verify_script(&signature_script, &script_pubkey, &checker, &cache), Ok(()));
		assert_eq!(cache.len(), 1);

		// a hit serves the second verification
		assert_eq!(verify_script(&signature_script, &script_pubkey, &checker, &cache), Ok(()));

		// a different key does not satisfy the script
		let other_secret = SecretKey::from_slice(&[0x33; 32]).unwrap();
		let other_signature = secp.sign(&message, &other_secret).serialize_compact();
		let bad_script = Builder::default().push_data(&other_signature).into_script();
		assert_eq!(verify_script(&bad_script, &script_pubkey, &checker, &cache), Err(Error::SignatureInvalid));
	}

	#[test]
	fn test_pay_to_script_hash() {
		let transaction = spending_transaction();
		let redeem_script = Builder::build_true();
		let script_hash = dhash256(&redeem_script);
		let script_pubkey = Builder::build_p2sh(&*script_hash);

		let signature_script = Builder::default().push_data(&redeem_script).into_script();

		let checker = checker_for(&transaction);
		let cache = SignatureCache::new();
		assert_eq!(verify_script(&signature_script, &script_pubkey, &checker, &cache), Ok(()));

		// wrong redeem script hash
		let wrong_pubkey = Builder::build_p2sh(&[0x13; 32]);
		assert_eq!(verify_script(&signature_script, &wrong_pubkey, &checker, &cache), Err(Error::EvalFalse));
	}
}
