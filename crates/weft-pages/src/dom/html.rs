//! Markup lexer and HTML escaping
//!
//! The lexer works on a list of literal pieces: a slot sits between every
//! two consecutive pieces. Plain HTML is the single-piece case.

use thiserror::Error;

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(crate) fn is_void_element(tag: &str) -> bool {
	VOID_ELEMENTS.contains(&tag)
}

pub(crate) fn is_raw_text_element(tag: &str) -> bool {
	RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Malformed markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
	#[error("unterminated tag `<{0}`")]
	UnterminatedTag(String),
	#[error("unterminated comment")]
	UnterminatedComment,
	#[error("closing tag `</{found}>` does not match open `<{expected}>`")]
	MismatchedClose { expected: String, found: String },
	#[error("closing tag `</{0}>` has no open element")]
	UnexpectedClose(String),
	#[error("element `<{0}>` is never closed")]
	Unclosed(String),
	#[error("placeholder inside tag or attribute name near `{0}`")]
	SlotInName(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Part {
	Lit(String),
	Slot(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AttrToken {
	Named {
		name: String,
		value: Option<Vec<Part>>,
	},
	/// A placeholder standing where an attribute name would be
	Spread(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
	Text(Vec<Part>),
	Open {
		tag: String,
		attrs: Vec<AttrToken>,
		self_closing: bool,
	},
	Close(String),
	Comment(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Item {
	Char(char),
	Slot(usize),
}

struct Lexer {
	items: Vec<Item>,
	pos: usize,
}

/// Splits `pieces` into tokens, with a slot between consecutive pieces.
pub(crate) fn tokenize<S: AsRef<str>>(pieces: &[S]) -> Result<Vec<Token>, MarkupError> {
	let mut items = Vec::new();
	for (index, piece) in pieces.iter().enumerate() {
		if index > 0 {
			items.push(Item::Slot(index - 1));
		}
		items.extend(piece.as_ref().chars().map(Item::Char));
	}
	Lexer { items, pos: 0 }.run()
}

impl Lexer {
	fn peek(&self) -> Option<Item> {
		self.items.get(self.pos).copied()
	}

	fn peek_char(&self, offset: usize) -> Option<char> {
		match self.items.get(self.pos + offset) {
			Some(Item::Char(c)) => Some(*c),
			_ => None,
		}
	}

	fn starts_with(&self, s: &str) -> bool {
		s.chars()
			.enumerate()
			.all(|(i, c)| self.peek_char(i) == Some(c))
	}

	fn starts_with_ignore_case(&self, s: &str) -> bool {
		s.chars().enumerate().all(|(i, c)| {
			self.peek_char(i)
				.is_some_and(|p| p.eq_ignore_ascii_case(&c))
		})
	}

	fn skip_whitespace(&mut self) {
		while self.peek_char(0).is_some_and(char::is_whitespace) {
			self.pos += 1;
		}
	}

	fn at_markup(&self) -> bool {
		self.peek_char(0) == Some('<')
			&& self
				.peek_char(1)
				.is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
	}

	fn run(mut self) -> Result<Vec<Token>, MarkupError> {
		let mut tokens = Vec::new();
		while self.peek().is_some() {
			if self.at_markup() {
				if self.starts_with("<!--") {
					tokens.push(self.comment()?);
				} else if self.starts_with("<!") {
					self.declaration();
				} else if self.starts_with("</") {
					tokens.push(self.close_tag()?);
				} else {
					let open = self.open_tag()?;
					let raw = match &open {
						Token::Open {
							tag, self_closing, ..
						} if !self_closing && is_raw_text_element(tag) => Some(tag.clone()),
						_ => None,
					};
					tokens.push(open);
					if let Some(tag) = raw {
						let parts = self.raw_text(&tag);
						if !parts.is_empty() {
							tokens.push(Token::Text(parts));
						}
					}
				}
			} else {
				tokens.push(Token::Text(self.text()));
			}
		}
		Ok(tokens)
	}

	fn text(&mut self) -> Vec<Part> {
		let mut parts = PartBuffer::default();
		while let Some(item) = self.peek() {
			if self.at_markup() {
				break;
			}
			parts.push(item);
			self.pos += 1;
		}
		parts.finish(true)
	}

	fn raw_text(&mut self, tag: &str) -> Vec<Part> {
		let closing = format!("</{tag}");
		let mut parts = PartBuffer::default();
		while let Some(item) = self.peek() {
			if self.starts_with_ignore_case(&closing) {
				break;
			}
			parts.push(item);
			self.pos += 1;
		}
		parts.finish(false)
	}

	fn comment(&mut self) -> Result<Token, MarkupError> {
		self.pos += 4;
		let mut body = String::new();
		loop {
			if self.starts_with("-->") {
				self.pos += 3;
				return Ok(Token::Comment(body));
			}
			match self.peek() {
				Some(Item::Char(c)) => body.push(c),
				Some(Item::Slot(_)) => {}
				None => return Err(MarkupError::UnterminatedComment),
			}
			self.pos += 1;
		}
	}

	fn declaration(&mut self) {
		while let Some(item) = self.peek() {
			self.pos += 1;
			if item == Item::Char('>') {
				break;
			}
		}
	}

	fn name(&mut self, stop: impl Fn(char) -> bool) -> Result<String, MarkupError> {
		let mut name = String::new();
		while let Some(item) = self.peek() {
			match item {
				Item::Char(c) if !stop(c) => name.push(c),
				Item::Char(_) => break,
				Item::Slot(_) if name.is_empty() => break,
				Item::Slot(_) => return Err(MarkupError::SlotInName(name)),
			}
			self.pos += 1;
		}
		Ok(name)
	}

	fn close_tag(&mut self) -> Result<Token, MarkupError> {
		self.pos += 2;
		let tag = self.name(|c| c == '>' || c.is_whitespace())?.to_ascii_lowercase();
		self.skip_whitespace();
		if self.peek_char(0) != Some('>') {
			return Err(MarkupError::UnterminatedTag(format!("/{tag}")));
		}
		self.pos += 1;
		Ok(Token::Close(tag))
	}

	fn open_tag(&mut self) -> Result<Token, MarkupError> {
		self.pos += 1;
		let tag = self
			.name(|c| c == '>' || c == '/' || c.is_whitespace())?
			.to_ascii_lowercase();
		let mut attrs = Vec::new();

		loop {
			self.skip_whitespace();
			match self.peek() {
				None => return Err(MarkupError::UnterminatedTag(tag)),
				Some(Item::Char('>')) => {
					self.pos += 1;
					return Ok(Token::Open {
						tag,
						attrs,
						self_closing: false,
					});
				}
				Some(Item::Char('/')) if self.peek_char(1) == Some('>') => {
					self.pos += 2;
					return Ok(Token::Open {
						tag,
						attrs,
						self_closing: true,
					});
				}
				Some(Item::Slot(index)) => {
					self.pos += 1;
					attrs.push(AttrToken::Spread(index));
				}
				Some(Item::Char(_)) => attrs.push(self.attribute(&tag)?),
			}
		}
	}

	fn attribute(&mut self, tag: &str) -> Result<AttrToken, MarkupError> {
		let name = self.name(|c| c == '=' || c == '>' || c == '/' || c.is_whitespace())?;
		if name.is_empty() {
			// stray '/' inside the tag
			self.pos += 1;
			return Ok(AttrToken::Named {
				name: String::new(),
				value: None,
			});
		}
		self.skip_whitespace();
		if self.peek_char(0) != Some('=') {
			return Ok(AttrToken::Named { name, value: None });
		}
		self.pos += 1;
		self.skip_whitespace();

		let mut parts = PartBuffer::default();
		match self.peek_char(0) {
			Some(quote @ ('"' | '\'')) => {
				self.pos += 1;
				loop {
					match self.peek() {
						None => return Err(MarkupError::UnterminatedTag(tag.to_string())),
						Some(Item::Char(c)) if c == quote => {
							self.pos += 1;
							break;
						}
						Some(item) => parts.push(item),
					}
					self.pos += 1;
				}
			}
			_ => {
				while let Some(item) = self.peek() {
					if let Item::Char(c) = item
						&& (c.is_whitespace() || c == '>')
					{
						break;
					}
					parts.push(item);
					self.pos += 1;
				}
			}
		}
		Ok(AttrToken::Named {
			name,
			value: Some(parts.finish(true)),
		})
	}
}

#[derive(Default)]
struct PartBuffer {
	parts: Vec<Part>,
	literal: String,
}

impl PartBuffer {
	fn push(&mut self, item: Item) {
		match item {
			Item::Char(c) => self.literal.push(c),
			Item::Slot(index) => {
				self.flush_literal(true);
				self.parts.push(Part::Slot(index));
			}
		}
	}

	fn flush_literal(&mut self, decode: bool) {
		if self.literal.is_empty() {
			return;
		}
		let literal = std::mem::take(&mut self.literal);
		let text = if decode {
			decode_entities(&literal)
		} else {
			literal
		};
		self.parts.push(Part::Lit(text));
	}

	fn finish(mut self, decode: bool) -> Vec<Part> {
		self.flush_literal(decode);
		self.parts
	}
}

/// Decodes the named and numeric character references the serializer emits.
pub(crate) fn decode_entities(input: &str) -> String {
	if !input.contains('&') {
		return input.to_string();
	}
	let mut out = String::with_capacity(input.len());
	let mut rest = input;
	while let Some(start) = rest.find('&') {
		out.push_str(&rest[..start]);
		let after = &rest[start..];
		let decoded = after.find(';').and_then(|end| {
			let entity = &after[1..end];
			let ch = match entity {
				"amp" => Some('&'),
				"lt" => Some('<'),
				"gt" => Some('>'),
				"quot" => Some('"'),
				"apos" => Some('\''),
				"nbsp" => Some('\u{a0}'),
				_ => entity
					.strip_prefix("#x")
					.or_else(|| entity.strip_prefix("#X"))
					.and_then(|hex| u32::from_str_radix(hex, 16).ok())
					.or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
					.and_then(char::from_u32),
			};
			ch.map(|c| (c, end + 1))
		});
		match decoded {
			Some((c, consumed)) => {
				out.push(c);
				rest = &after[consumed..];
			}
			None => {
				out.push('&');
				rest = &after[1..];
			}
		}
	}
	out.push_str(rest);
	out
}

pub(crate) fn escape_text(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	for c in input.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			_ => out.push(c),
		}
	}
	out
}

pub(crate) fn escape_attr(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	for c in input.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'"' => out.push_str("&quot;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			_ => out.push(c),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn lit(s: &str) -> Part {
		Part::Lit(s.to_string())
	}

	#[rstest]
	fn test_slots_in_content_and_attributes() {
		let tokens = tokenize(&["<p class=\"a ", "\" ", ">x ", " y</p>"]).unwrap();
		assert_eq!(
			tokens,
			vec![
				Token::Open {
					tag: "p".into(),
					attrs: vec![
						AttrToken::Named {
							name: "class".into(),
							value: Some(vec![lit("a "), Part::Slot(0)]),
						},
						AttrToken::Spread(1),
					],
					self_closing: false,
				},
				Token::Text(vec![lit("x "), Part::Slot(2), lit(" y")]),
				Token::Close("p".into()),
			]
		);
	}

	#[rstest]
	fn test_unquoted_and_bare_attributes() {
		let tokens = tokenize(&["<input type=checkbox checked onclick=", ">"]).unwrap();
		let Token::Open { attrs, .. } = &tokens[0] else {
			panic!("expected open tag");
		};
		assert_eq!(
			attrs,
			&vec![
				AttrToken::Named {
					name: "type".into(),
					value: Some(vec![lit("checkbox")]),
				},
				AttrToken::Named {
					name: "checked".into(),
					value: None,
				},
				AttrToken::Named {
					name: "onclick".into(),
					value: Some(vec![Part::Slot(0)]),
				},
			]
		);
	}

	#[rstest]
	fn test_script_content_is_raw() {
		let tokens = tokenize(&["<script>a < b && c</script>"]).unwrap();
		assert_eq!(tokens[1], Token::Text(vec![lit("a < b && c")]));
		assert_eq!(tokens[2], Token::Close("script".into()));
	}

	#[rstest]
	fn test_comments_and_doctype() {
		let tokens = tokenize(&["<!DOCTYPE html><!-- hi --><br/>"]).unwrap();
		assert_eq!(tokens[0], Token::Comment(" hi ".into()));
		assert!(matches!(&tokens[1], Token::Open { tag, self_closing: true, .. } if tag == "br"));
	}

	#[rstest]
	fn test_slot_inside_attribute_name_is_rejected() {
		let err = tokenize(&["<p data-", "=\"1\"></p>"]).unwrap_err();
		assert_eq!(err, MarkupError::SlotInName("data-".into()));
	}

	#[rstest]
	#[case("a &amp; b", "a & b")]
	#[case("&lt;tag&gt;", "<tag>")]
	#[case("&#65;&#x42;", "AB")]
	#[case("&unknown; &", "&unknown; &")]
	fn test_decode_entities(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(decode_entities(input), expected);
	}

	#[rstest]
	fn test_escape_round_trips() {
		let raw = "<a href=\"x\">&</a>";
		assert_eq!(decode_entities(&escape_attr(raw)), raw);
		assert_eq!(decode_entities(&escape_text(raw)), raw);
	}
}
