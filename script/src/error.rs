use std::fmt;

/// All possible script verification errors
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Error {
	/// Script contains an unknown or malformed opcode.
	BadOpcode,
	/// A push opcode ran past the end of the script.
	UnexpectedEnd,
	/// An operation required more stack items than were available.
	InvalidStackOperation,
	/// OP_EQUALVERIFY failed.
	EqualVerify,
	/// Script finished with a false value on top of the stack.
	EvalFalse,
	/// Signature or public key is not parseable.
	SignatureFormat,
	/// Signature did not verify against the public key.
	SignatureInvalid,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Error::BadOpcode => "Bad opcode".fmt(f),
			Error::UnexpectedEnd => "Unexpected end of script".fmt(f),
			Error::InvalidStackOperation => "Invalid stack operation".fmt(f),
			Error::EqualVerify => "Equal verify failed".fmt(f),
			Error::EvalFalse => "Script evaluated to false".fmt(f),
			Error::SignatureFormat => "Malformed signature or public key".fmt(f),
			Error::SignatureInvalid => "Signature check failed".fmt(f),
		}
	}
}
