use std::fmt::{Display, Formatter};

/// Fatal conditions raised while serializing. None of these are recovered
/// inside the core; the caller is expected to discard the partially written
/// stream.
#[derive(Debug)]
pub enum WriteError {
	IoError(std::io::Error),
	/// A type on the scan path did not derive `GraphObject`/register as custom.
	NotSerializable(&'static str),
	/// A type has `>= 255` serializable fields.
	TooManyFields(&'static str),
	/// An array had rank != 1. `graphwire` only models rank-1 arrays
	/// (`GraphArray<E>`), so this currently can't be produced by derived
	/// code, but custom `GraphObject` impls can still trip it.
	UnsupportedRank(&'static str),
}

impl From<std::io::Error> for WriteError {
	fn from(value: std::io::Error) -> Self {
		WriteError::IoError(value)
	}
}

impl Display for WriteError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			WriteError::IoError(e) => write!(f, "io error: {e}"),
			WriteError::NotSerializable(name) => write!(f, "type `{name}` is not serializable"),
			WriteError::TooManyFields(name) => write!(f, "type `{name}` has >= 255 serializable fields"),
			WriteError::UnsupportedRank(name) => write!(f, "type `{name}` is an array of rank != 1"),
		}
	}
}

impl std::error::Error for WriteError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			WriteError::IoError(e) => Some(e),
			_ => None,
		}
	}
}

/// Fatal conditions raised while deserializing, per `spec.md` §7.
#[derive(Debug)]
pub enum ReadError {
	IoError(std::io::Error),
	/// Stream ended before a value completed.
	TruncatedStream,
	/// A type name in the type table could not be resolved against the
	/// process's linked `inventory` registrations.
	UnknownType(String),
	/// A type is special (array/primitive/string/custom) on one side but a
	/// plain struct on the other.
	SchemaSpecialMismatch { type_name: String },
	/// Field count, name order, or declared type differs from the current
	/// schema of the resolved type.
	SchemaFieldMismatch { type_name: String, detail: String },
	/// A custom-serializable type has no registered deserialization
	/// constructor (`from_entries`).
	NoDeserializationCtor { type_name: String },
	/// An object's type id falls in the schema-only region
	/// (`[typeCountForObjects, typesCount)`) but was used as an instance's
	/// runtime type.
	SchemaOnlyTypeUsedAsInstance { type_name: String },
}

impl From<std::io::Error> for ReadError {
	fn from(value: std::io::Error) -> Self {
		match value.kind() {
			std::io::ErrorKind::UnexpectedEof => ReadError::TruncatedStream,
			_ => ReadError::IoError(value),
		}
	}
}

impl Display for ReadError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ReadError::IoError(e) => write!(f, "io error: {e}"),
			ReadError::TruncatedStream => write!(f, "stream ended before a value completed"),
			ReadError::UnknownType(name) => write!(f, "unknown type `{name}`"),
			ReadError::SchemaSpecialMismatch { type_name } => {
				write!(f, "type `{type_name}` is special on one side but not the other")
			}
			ReadError::SchemaFieldMismatch { type_name, detail } => {
				write!(f, "schema mismatch for `{type_name}`: {detail}")
			}
			ReadError::NoDeserializationCtor { type_name } => {
				write!(f, "`{type_name}` has no deserialization constructor")
			}
			ReadError::SchemaOnlyTypeUsedAsInstance { type_name } => {
				write!(f, "`{type_name}` is schema-only and cannot be an instance's runtime type")
			}
		}
	}
}

impl std::error::Error for ReadError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			ReadError::IoError(e) => Some(e),
			_ => None,
		}
	}
}
