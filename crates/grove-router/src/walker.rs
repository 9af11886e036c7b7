//! Namespace walking.
//!
//! Traverses a [`Namespace`] depth-first in sorted name order, classifying
//! every child name. Private names are dropped before the provider is asked
//! for their markers or children, so nothing beneath them is ever seen.

use std::collections::HashMap;

use grove_namespace::{Namespace, join_path};

use crate::error::ConfigurationError;
use crate::segment::{Segment, SegmentDescriptor, classify};
use crate::tree::{NamespaceNode, NamespaceTree, NodeId};

/// Walk `namespace` from its root into a [`NamespaceTree`].
///
/// # Errors
///
/// Returns [`ConfigurationError`] on invalid names, on siblings that
/// normalize to the same segment, on two differently named parameter
/// siblings, and on provider failures.
pub fn walk(namespace: &dyn Namespace) -> Result<NamespaceTree, ConfigurationError> {
    let mut tree = NamespaceTree::with_root(namespace.markers("")?);
    visit(namespace, &mut tree, 0)?;
    Ok(tree)
}

fn visit(
    namespace: &dyn Namespace,
    tree: &mut NamespaceTree,
    id: NodeId,
) -> Result<(), ConfigurationError> {
    let parent_path = tree.node(id).path.clone();
    let mut names = namespace.children(&parent_path)?;
    names.sort();

    let routable = classify_siblings(&parent_path, &names)?;

    for (name, descriptor) in routable {
        let path = join_path(&parent_path, name);
        let mut segments = tree.node(id).segments.clone();
        segments.push(descriptor);
        let markers = namespace.markers(&path)?;

        let child = tree.push(
            NamespaceNode {
                path,
                segments,
                markers,
            },
            Some(id),
        );
        visit(namespace, tree, child)?;
    }

    Ok(())
}

/// Classify sibling names, dropping private ones.
///
/// A literal and a parameter may be siblings; the literal takes precedence
/// at match time.
fn classify_siblings<'a>(
    parent: &str,
    names: &'a [String],
) -> Result<Vec<(&'a str, SegmentDescriptor)>, ConfigurationError> {
    let mut routable = Vec::with_capacity(names.len());
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut param: Option<&str> = None;

    for name in names.iter().map(String::as_str) {
        let descriptor = match classify(name) {
            Ok(Segment::Routable(descriptor)) => descriptor,
            Ok(Segment::Private) => {
                tracing::debug!(
                    path = %join_path(parent, name),
                    "Pruned private subtree"
                );
                continue;
            }
            Err(source) => {
                return Err(ConfigurationError::InvalidSegment {
                    parent: parent.to_owned(),
                    name: name.to_owned(),
                    source,
                });
            }
        };

        let normalized = descriptor.to_string();
        if let Some(first) = seen.insert(normalized.clone(), name) {
            return Err(ConfigurationError::SiblingCollision {
                parent: parent.to_owned(),
                first: first.to_owned(),
                second: name.to_owned(),
                normalized,
            });
        }

        if descriptor.is_param() {
            if let Some(first) = param {
                return Err(ConfigurationError::AmbiguousParams {
                    parent: parent.to_owned(),
                    first: first.to_owned(),
                    second: name.to_owned(),
                });
            }
            param = Some(name);
        }

        routable.push((name, descriptor));
    }

    Ok(routable)
}
