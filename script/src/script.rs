//! Serialized script, used inside transaction inputs and outputs.

use std::{fmt, ops};
use bytes::Bytes;
use chain::Transaction;
use error::Error;

/// Script opcodes recognized by the reduced interpreter.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Opcode {
	/// Push an empty value.
	OP_0 = 0x00,
	OP_PUSHDATA1 = 0x4c,
	OP_PUSHDATA2 = 0x4d,
	OP_PUSHDATA4 = 0x4e,
	OP_1 = 0x51,
	OP_DUP = 0x76,
	OP_EQUAL = 0x87,
	OP_EQUALVERIFY = 0x88,
	OP_HASH256 = 0xaa,
	OP_CHECKSIG = 0xac,
}

impl Opcode {
	pub fn from_u8(value: u8) -> Option<Opcode> {
		match value {
			0x00 => Some(Opcode::OP_0),
			0x4c => Some(Opcode::OP_PUSHDATA1),
			0x4d => Some(Opcode::OP_PUSHDATA2),
			0x4e => Some(Opcode::OP_PUSHDATA4),
			0x51 => Some(Opcode::OP_1),
			0x76 => Some(Opcode::OP_DUP),
			0x87 => Some(Opcode::OP_EQUAL),
			0x88 => Some(Opcode::OP_EQUALVERIFY),
			0xaa => Some(Opcode::OP_HASH256),
			0xac => Some(Opcode::OP_CHECKSIG),
			_ => None,
		}
	}
}

/// A single parsed script instruction.
#[derive(Debug, PartialEq)]
pub enum Instruction<'a> {
	Push(&'a [u8]),
	Op(Opcode),
}

/// Serialized script, used inside transaction inputs and outputs.
#[derive(PartialEq, Default, Clone)]
pub struct Script {
	data: Bytes,
}

impl From<Bytes> for Script {
	fn from(s: Bytes) -> Self {
		Script { data: s }
	}
}

impl From<Vec<u8>> for Script {
	fn from(v: Vec<u8>) -> Self {
		Script { data: v.into() }
	}
}

impl From<Script> for Bytes {
	fn from(script: Script) -> Self {
		script.data
	}
}

impl ops::Deref for Script {
	type Target = [u8];

	fn deref(&self) -> &Self::Target {
		&self.data
	}
}

impl fmt::Debug for Script {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&self.data, f)
	}
}

impl Script {
	pub fn new(data: Bytes) -> Self {
		Script { data: data }
	}

	pub fn to_bytes(&self) -> Bytes {
		self.data.clone()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Pay-to-script-hash template: `OP_HASH256 <32-byte hash> OP_EQUAL`.
	pub fn is_pay_to_script_hash(&self) -> bool {
		self.data.len() == 35 &&
			self.data[0] == Opcode::OP_HASH256 as u8 &&
			self.data[1] == 32 &&
			self.data[34] == Opcode::OP_EQUAL as u8
	}

	/// Parses the script into instructions; stops with an error at the
	/// first malformed opcode.
	pub fn instructions(&self) -> Result<Vec<Instruction>, Error> {
		let mut result = Vec::new();
		let mut pc = 0usize;

		while pc < self.data.len() {
			let opcode = self.data[pc];
			pc += 1;

			// direct pushes
			if opcode >= 0x01 && opcode <= 0x4b {
				let len = opcode as usize;
				result.push(Instruction::Push(self.read_slice(&mut pc, len)?));
				continue;
			}

			match Opcode::from_u8(opcode) {
				Some(Opcode::OP_0) => result.push(Instruction::Push(&[])),
				Some(Opcode::OP_PUSHDATA1) => {
					let len = self.read_slice(&mut pc, 1)?[0] as usize;
					result.push(Instruction::Push(self.read_slice(&mut pc, len)?));
				},
				Some(Opcode::OP_PUSHDATA2) => {
					let raw = self.read_slice(&mut pc, 2)?;
					let len = (raw[0] as usize) | ((raw[1] as usize) << 8);
					result.push(Instruction::Push(self.read_slice(&mut pc, len)?));
				},
				Some(Opcode::OP_PUSHDATA4) => {
					let raw = self.read_slice(&mut pc, 4)?;
					let len = (raw[0] as usize) | ((raw[1] as usize) << 8) |
						((raw[2] as usize) << 16) | ((raw[3] as usize) << 24);
					result.push(Instruction::Push(self.read_slice(&mut pc, len)?));
				},
				Some(op) => result.push(Instruction::Op(op)),
				None => return Err(Error::BadOpcode),
			}
		}

		Ok(result)
	}

	fn read_slice(&self, pc: &mut usize, len: usize) -> Result<&[u8], Error> {
		if *pc + len > self.data.len() {
			return Err(Error::UnexpectedEnd);
		}
		let slice = &self.data[*pc..*pc + len];
		*pc += len;
		Ok(slice)
	}

	/// Last push of the script, used to extract the serialized redeem
	/// script out of a pay-to-script-hash signature script.
	pub fn last_push(&self) -> Option<Bytes> {
		self.instructions().ok().and_then(|instructions| {
			instructions.iter().rev().find_map(|i| match *i {
				Instruction::Push(data) => Some(data.into()),
				_ => None,
			})
		})
	}
}

/// Counts signature operations in the script. Malformed tails stop the
/// count without failing, matching how miners account mass.
pub fn script_sigops(script: &Script) -> usize {
	match script.instructions() {
		Ok(instructions) => instructions.iter()
			.filter(|i| **i == Instruction::Op(Opcode::OP_CHECKSIG))
			.count(),
		Err(_) => 0,
	}
}

/// Pattern check on raw output script bytes.
pub fn is_pay_to_script_hash(script_pubkey: &[u8]) -> bool {
	Script::from(script_pubkey.to_vec()).is_pay_to_script_hash()
}

/// Precise signature operation count for a transaction, given the output
/// scripts its inputs refer to. A pay-to-script-hash output contributes
/// the sigops of the embedded redeem script.
pub fn transaction_sigops(transaction: &Transaction, previous_script_pubkeys: &[Bytes]) -> usize {
	let mut sigops = 0usize;

	for (input, script_pubkey) in transaction.inputs.iter().zip(previous_script_pubkeys) {
		let script_pubkey = Script::from(script_pubkey.clone());
		sigops += script_sigops(&script_pubkey);

		if script_pubkey.is_pay_to_script_hash() {
			let signature_script = Script::from(input.signature_script.clone());
			if let Some(redeem) = signature_script.last_push() {
				sigops += script_sigops(&Script::from(redeem));
			}
		}
	}

	sigops
}

/// Fluent builder for scripts.
#[derive(Default)]
pub struct Builder {
	data: Bytes,
}

impl Builder {
	/// `OP_1`: anyone-can-spend output.
	pub fn build_true() -> Script {
		Builder::default().push_opcode(Opcode::OP_1).into_script()
	}

	/// `<pubkey> OP_CHECKSIG`: pay to the given 33-byte public key.
	pub fn build_p2pk(pubkey: &[u8]) -> Script {
		Builder::default()
			.push_data(pubkey)
			.push_opcode(Opcode::OP_CHECKSIG)
			.into_script()
	}

	/// `OP_HASH256 <hash> OP_EQUAL`: pay to the script with the given
	/// 32-byte hash.
	pub fn build_p2sh(script_hash: &[u8]) -> Script {
		Builder::default()
			.push_opcode(Opcode::OP_HASH256)
			.push_data(script_hash)
			.push_opcode(Opcode::OP_EQUAL)
			.into_script()
	}

	pub fn push_opcode(mut self, opcode: Opcode) -> Self {
		self.data.push(opcode as u8);
		self
	}

	pub fn push_data(mut self, data: &[u8]) -> Self {
		if data.len() <= 0x4b {
			self.data.push(data.len() as u8);
		} else if data.len() <= 0xff {
			self.data.push(Opcode::OP_PUSHDATA1 as u8);
			self.data.push(data.len() as u8);
		} else {
			self.data.push(Opcode::OP_PUSHDATA2 as u8);
			self.data.push((data.len() & 0xff) as u8);
			self.data.push((data.len() >> 8) as u8);
		}
		self.data.extend_from_slice(data);
		self
	}

	pub fn into_script(self) -> Script {
		Script { data: self.data }
	}
}

#[cfg(test)]
mod tests {
	use super::{Builder, Instruction, Opcode, Script, script_sigops};

	#[test]
	fn test_instructions() {
		let script = Builder::default()
			.push_data(b"ab")
			.push_opcode(Opcode::OP_DUP)
			.into_script();

		assert_eq!(script.instructions().unwrap(), vec![
			Instruction::Push(b"ab"),
			Instruction::Op(Opcode::OP_DUP),
		]);
	}

	#[test]
	fn test_truncated_push_fails() {
		let script = Script::from(vec![0x05, 0x01]);
		assert!(script.instructions().is_err());
	}

	#[test]
	fn test_is_pay_to_script_hash() {
		let p2sh = Builder::build_p2sh(&[0x42; 32]);
		assert!(p2sh.is_pay_to_script_hash());
		assert!(!Builder::build_true().is_pay_to_script_hash());
	}

	#[test]
	fn test_script_sigops() {
		let p2pk = Builder::build_p2pk(&[0x02; 33]);
		assert_eq!(script_sigops(&p2pk), 1);
		assert_eq!(script_sigops(&Builder::build_true()), 0);
	}
}
