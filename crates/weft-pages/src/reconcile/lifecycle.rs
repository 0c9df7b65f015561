//! Connect and disconnect signalling

use tracing::trace;

use super::hooks::HookTable;
use crate::dom::{Document, NodeId};

/// Fires `connected` for every hooked node of `root`'s subtree that is
/// attached to the document.
///
/// The subtree is snapshotted first; nodes added by the callbacks
/// themselves are signalled by the passes that add them.
pub fn connect_subtree(doc: &Document, hooks: &HookTable, root: NodeId) {
	for node in doc.descendants(root) {
		if !doc.is_connected(node) {
			continue;
		}
		if let Some(entry) = hooks.get(node) {
			trace!(%node, "connected");
			entry.connected(node);
		}
	}
}

/// Detaches `root`, flagging its hooked nodes as disconnecting first and
/// signalling `disconnected` once they are off the document. The subtree is
/// released afterwards, hooks included.
pub fn remove_subtree(doc: &Document, hooks: &HookTable, root: NodeId) {
	let was_connected = doc.is_connected(root);
	let nodes = doc.descendants(root);

	if was_connected {
		for node in &nodes {
			if let Some(entry) = hooks.get(*node) {
				entry.disconnecting(*node);
			}
		}
	}

	doc.remove(root);

	if was_connected {
		for node in &nodes {
			if doc.is_connected(*node) {
				continue;
			}
			if let Some(entry) = hooks.get(*node) {
				trace!(node = %*node, "disconnected");
				entry.disconnected(*node);
			}
		}
	}

	discard_subtree(doc, hooks, root);
}

/// Drops the hook entries of `root`'s subtree and releases its nodes without
/// signalling anything.
pub fn discard_subtree(doc: &Document, hooks: &HookTable, root: NodeId) {
	for node in doc.descendants(root) {
		hooks.remove(node);
	}
	doc.release(root);
}
