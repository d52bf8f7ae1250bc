//! String-like types for the names and descriptors stored in the mappings.
//!
//! These don't check their contents, they exist so that a field name can't be passed where a class name is expected.

use std::borrow::Borrow;
use std::fmt::{Display, Formatter};

macro_rules! make_name_type {
	(
		$( #[$doc:meta] )*
		$name:ident
	) => {
		$( #[$doc] )*
		#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name(String);

		impl $name {
			pub fn as_str(&self) -> &str {
				&self.0
			}

			pub fn into_inner(self) -> String {
				self.0
			}
		}

		impl From<String> for $name {
			fn from(value: String) -> Self {
				$name(value)
			}
		}

		impl From<&str> for $name {
			fn from(value: &str) -> Self {
				$name(value.to_owned())
			}
		}

		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}

		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}

		impl Display for $name {
			fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
				f.write_str(&self.0)
			}
		}
	}
}

make_name_type! {
	/// A class name in internal form, like `net/minecraft/Main` or `a`.
	ClassName
}

make_name_type! {
	FieldName
}

make_name_type! {
	MethodName
}

make_name_type! {
	ParameterName
}

make_name_type! {
	/// A field descriptor, like `I` or `[Lnet/minecraft/Main;`.
	FieldDescriptor
}

make_name_type! {
	/// A method descriptor, like `(ILjava/lang/String;)V`.
	MethodDescriptor
}
