//! Templates
//!
//! A [`Template`] is literal markup with positional placeholders plus the
//! values that fill them. The [`html!`](crate::html) macro is the usual way
//! to build one:
//!
//! ```
//! use weft_pages::html;
//! use weft_pages::template::on;
//!
//! let count = 3;
//! let view = html!(
//!     "<button onclick={}>Count: {}</button>",
//!     on(|_| println!("clicked")),
//!     count
//! );
//! assert_eq!(view.values().len(), 2);
//! ```
//!
//! Placeholder positions decide how a value is used:
//!
//! | Position | Example | Effect |
//! |----------|---------|--------|
//! | content | `<p>{}</p>` | nodes; lists and nested templates flatten, `None` renders nothing |
//! | event attribute | `<a onclick={}>` | listener; the value must be a handler and the only thing in the attribute |
//! | attribute name | `<a {}>` | attribute map spread |
//! | prop binding | `<user-card :user={}>` | JSON prop data on the element |
//! | attribute value | `<a class="x {}">` | string substitution |

mod compile;
mod error;
mod interp;

use std::fmt;
use std::rc::Rc;

pub use compile::materialize;
pub use error::{BindingError, TemplateError};
pub use interp::{Interp, attrs, on};

/// Builds a [`Template`] from a markup literal and its placeholder values.
///
/// `{}` marks a placeholder; `{{` and `}}` produce literal braces.
#[macro_export]
macro_rules! html {
	($markup:expr $(,)?) => {
		$crate::template::Template::new($markup, ::std::vec::Vec::new())
	};
	($markup:expr, $($value:expr),+ $(,)?) => {
		$crate::template::Template::new(
			$markup,
			::std::vec![$($crate::template::Interp::from($value)),+],
		)
	};
}

/// Literal markup pieces and the values placed between them.
#[derive(Clone)]
pub struct Template {
	pieces: Rc<[String]>,
	values: Vec<Interp>,
}

impl Template {
	pub fn new(markup: &str, values: Vec<Interp>) -> Self {
		Self {
			pieces: split_placeholders(markup).into(),
			values,
		}
	}

	/// A template rendering nothing.
	pub fn empty() -> Self {
		Self::new("", Vec::new())
	}

	/// A template made of a single content placeholder.
	pub fn of(value: impl Into<Interp>) -> Self {
		Self::new("{}", vec![value.into()])
	}

	pub fn pieces(&self) -> &[String] {
		&self.pieces
	}

	pub fn values(&self) -> &[Interp] {
		&self.values
	}
}

impl Default for Template {
	fn default() -> Self {
		Self::empty()
	}
}

impl fmt::Debug for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Template")
			.field("pieces", &self.pieces)
			.field("values", &self.values)
			.finish()
	}
}

fn split_placeholders(markup: &str) -> Vec<String> {
	let mut pieces = vec![String::new()];
	let mut chars = markup.chars().peekable();
	while let Some(c) = chars.next() {
		match (c, chars.peek()) {
			('{', Some('{')) => {
				chars.next();
				push_char(&mut pieces, '{');
			}
			('}', Some('}')) => {
				chars.next();
				push_char(&mut pieces, '}');
			}
			('{', Some('}')) => {
				chars.next();
				pieces.push(String::new());
			}
			_ => push_char(&mut pieces, c),
		}
	}
	pieces
}

fn push_char(pieces: &mut [String], c: char) {
	if let Some(last) = pieces.last_mut() {
		last.push(c);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("<p>{}</p>", vec!["<p>", "</p>"])]
	#[case("a{}b{}c", vec!["a", "b", "c"])]
	#[case("{{x}}", vec!["{x}"])]
	#[case("", vec![""])]
	fn test_split_placeholders(#[case] markup: &str, #[case] expected: Vec<&str>) {
		assert_eq!(split_placeholders(markup), expected);
	}

	#[rstest]
	fn test_macro_collects_values() {
		let t = crate::html!("<p>{} {}</p>", "a", 1);
		assert_eq!(t.pieces().len(), 3);
		assert_eq!(t.values().len(), 2);
	}
}
