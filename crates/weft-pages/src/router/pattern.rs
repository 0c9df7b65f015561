//! Path patterns
//!
//! - `/users` matches exactly (a trailing slash is tolerated)
//! - `/users/:id` captures one segment as `id`
//! - `/files/*path` captures the rest of the path as `path`
//! - `/assets/*` matches any rest without capturing
//!
//! Query strings and fragments are ignored when matching. Captured values
//! are percent-decoded.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use super::error::RouterError;

const MAX_PATTERN_LENGTH: usize = 1024;
const MAX_REGEX_SIZE: usize = 1 << 20;

enum Segment {
	Literal(String),
	Param(String),
	Rest(Option<String>),
}

/// A compiled route pattern.
#[derive(Clone)]
pub struct RoutePattern {
	pattern: String,
	regex: Regex,
	params: Vec<String>,
}

impl RoutePattern {
	pub fn new(pattern: &str) -> Result<Self, RouterError> {
		let invalid = |reason: String| RouterError::InvalidPattern {
			pattern: pattern.to_string(),
			reason,
		};
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(invalid(format!(
				"longer than {MAX_PATTERN_LENGTH} bytes"
			)));
		}

		let segments = parse_segments(pattern).map_err(invalid)?;
		let mut source = String::from("^");
		let mut params = Vec::new();
		for segment in &segments {
			match segment {
				Segment::Literal(text) => {
					source.push('/');
					source.push_str(&regex::escape(text));
				}
				Segment::Param(name) => {
					source.push_str(&format!("/(?P<{name}>[^/]+)"));
					params.push(name.clone());
				}
				Segment::Rest(Some(name)) => {
					source.push_str(&format!("(?:/(?P<{name}>.*))?"));
					params.push(name.clone());
				}
				Segment::Rest(None) => source.push_str("(?:/.*)?"),
			}
		}
		source.push_str("/?$");

		let regex = regex::RegexBuilder::new(&source)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|err| invalid(err.to_string()))?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			params,
		})
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn param_names(&self) -> &[String] {
		&self.params
	}

	/// Captured parameters when `url` matches.
	pub fn matches(&self, url: &str) -> Option<BTreeMap<String, String>> {
		let path = strip_query(url);
		let captures = self.regex.captures(path)?;
		Some(
			self.params
				.iter()
				.filter_map(|name| {
					let raw = captures.name(name)?.as_str();
					let value = urlencoding::decode(raw)
						.map(|decoded| decoded.into_owned())
						.unwrap_or_else(|_| raw.to_string());
					Some((name.clone(), value))
				})
				.collect(),
		)
	}

	pub fn is_match(&self, url: &str) -> bool {
		self.regex.is_match(strip_query(url))
	}

	/// Builds a path from this pattern. Segment parameters are
	/// percent-encoded; rest parameters are inserted as given.
	pub fn reverse(&self, params: &BTreeMap<String, String>) -> Option<String> {
		let mut path = String::new();
		for segment in parse_segments(&self.pattern).ok()? {
			match segment {
				Segment::Literal(text) => {
					path.push('/');
					path.push_str(&text);
				}
				Segment::Param(name) => {
					path.push('/');
					path.push_str(&urlencoding::encode(params.get(&name)?));
				}
				Segment::Rest(Some(name)) => {
					let rest = params.get(&name)?;
					if !rest.is_empty() {
						path.push('/');
						path.push_str(rest.trim_start_matches('/'));
					}
				}
				Segment::Rest(None) => {}
			}
		}
		if path.is_empty() || self.pattern.ends_with('/') && !path.ends_with('/') {
			path.push('/');
		}
		Some(path)
	}
}

impl fmt::Debug for RoutePattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RoutePattern")
			.field("pattern", &self.pattern)
			.field("params", &self.params)
			.finish()
	}
}

impl fmt::Display for RoutePattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.pattern)
	}
}

impl PartialEq for RoutePattern {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern
	}
}

fn strip_query(url: &str) -> &str {
	let end = url.find(['?', '#']).unwrap_or(url.len());
	&url[..end]
}

fn parse_segments(pattern: &str) -> Result<Vec<Segment>, String> {
	if !pattern.starts_with('/') {
		return Err("must start with `/`".to_string());
	}
	let parts: Vec<&str> = pattern
		.split('/')
		.skip(1)
		.filter(|part| !part.is_empty())
		.collect();

	let mut segments = Vec::with_capacity(parts.len());
	for (index, part) in parts.iter().enumerate() {
		let segment = if let Some(name) = part.strip_prefix(':') {
			Segment::Param(param_name(name)?)
		} else if let Some(name) = part.strip_prefix('*') {
			if index + 1 != parts.len() {
				return Err("`*` is only allowed in the last segment".to_string());
			}
			Segment::Rest((!name.is_empty()).then(|| param_name(name)).transpose()?)
		} else {
			Segment::Literal((*part).to_string())
		};
		segments.push(segment);
	}
	Ok(segments)
}

fn param_name(name: &str) -> Result<String, String> {
	let valid = name
		.chars()
		.next()
		.is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
		&& name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
	if valid {
		Ok(name.to_string())
	} else {
		Err(format!("`{name}` is not a valid parameter name"))
	}
}
