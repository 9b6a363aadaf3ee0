// crates/drawio-vsdx/src/assemble.rs
//
// Merges the XML parts of a package into one logical tree. Every `<Rel r:id="..">` under a
// part is looked up in that part's `_rels/<file>.rels`; when the target is an XML part, the
// children of the target's root element replace the reference and are resolved in turn
// against the target's own relationships.

use crate::package::{Relationships, relationships};
use crate::xml::{Element, Node};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Attribute added to a `Rel` whose target is not an XML part (media), holding the
/// normalized target path so later stages can fetch the bytes.
pub const RESOLVED_TARGET_ATTR: &str = "resolvedTarget";

enum Resolved {
    Imported(Vec<Node>),
    External(String),
    Unresolved,
}

/// Returns a copy of the part at `path` with all relationship references expanded, or
/// `None` when the part does not exist.
pub fn assemble(
    parts: &BTreeMap<String, Element>,
    path: &str,
    max_depth: usize,
) -> Option<Element> {
    let root = parts.get(path)?;
    let mut merged = root.clone();
    let mut chain = vec![path.to_string()];
    let ctx = RelContext {
        parts,
        max_depth,
    };
    match relationships(parts, path) {
        Some(rels) => ctx.resolve_children(&mut merged, &rels, 0, &mut chain),
        None => debug!(part = path, "no relationships part"),
    }
    Some(merged)
}

struct RelContext<'a> {
    parts: &'a BTreeMap<String, Element>,
    max_depth: usize,
}

impl RelContext<'_> {
    fn resolve_children(
        &self,
        element: &mut Element,
        rels: &Relationships,
        depth: usize,
        chain: &mut Vec<String>,
    ) {
        let children = std::mem::take(&mut element.children);
        for node in children {
            match node {
                Node::Element(mut child) if child.is("Rel") => {
                    match self.import_reference(&child, rels, depth, chain) {
                        Resolved::Imported(imported) => element.children.extend(imported),
                        Resolved::External(target) => {
                            child.attributes.push((RESOLVED_TARGET_ATTR.to_string(), target));
                            element.children.push(Node::Element(child));
                        }
                        Resolved::Unresolved => element.children.push(Node::Element(child)),
                    }
                }
                Node::Element(mut child) => {
                    self.resolve_children(&mut child, rels, depth, chain);
                    element.children.push(Node::Element(child));
                }
                text => element.children.push(text),
            }
        }
    }

    fn import_reference(
        &self,
        rel: &Element,
        rels: &Relationships,
        depth: usize,
        chain: &mut Vec<String>,
    ) -> Resolved {
        let Some(id) = rel.attr("r:id") else {
            return Resolved::Unresolved;
        };
        let Some(target) = rels.target(id) else {
            debug!(rel_id = id, "relationship id not found");
            return Resolved::Unresolved;
        };
        let Some(part) = self.parts.get(target) else {
            return Resolved::External(target.to_string());
        };
        if chain.iter().any(|p| p == target) {
            warn!(part = target, "cyclic relationship reference ignored");
            return Resolved::Unresolved;
        }
        if depth >= self.max_depth {
            warn!(part = target, depth, "relationship nesting limit reached");
            return Resolved::Unresolved;
        }

        let mut holder = Element::new(part.name.clone());
        holder.children = part
            .children
            .iter()
            .filter(|n| matches!(n, Node::Element(_)))
            .cloned()
            .collect();

        if let Some(target_rels) = relationships(self.parts, target) {
            chain.push(target.to_string());
            self.resolve_children(&mut holder, &target_rels, depth + 1, chain);
            chain.pop();
        }
        Resolved::Imported(holder.children)
    }
}
