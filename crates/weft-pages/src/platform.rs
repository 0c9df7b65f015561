//! Where the runtime executes

use serde::{Deserialize, Serialize};

/// The side of the server/browser split a runtime renders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
	Browser,
	Server,
}

impl Platform {
	pub fn is_browser(self) -> bool {
		self == Platform::Browser
	}

	pub fn is_server(self) -> bool {
		self == Platform::Server
	}

	/// Runs the closure matching this platform.
	pub fn strategy<T>(self, browser: impl FnOnce() -> T, server: impl FnOnce() -> T) -> T {
		match self {
			Platform::Browser => browser(),
			Platform::Server => server(),
		}
	}
}
