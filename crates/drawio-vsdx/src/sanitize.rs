// crates/drawio-vsdx/src/sanitize.rs
//
// Removes invisible placeholder vertices: no children, no label, and a style that
// neither fills, strokes nor shows an image. Runs post-order, so a group emptied by the
// pass is itself considered.

use crate::graph::{CellId, CellKind, CellTree};
use tracing::trace;

/// Removes invisible vertices and returns how many were dropped. Running it again on
/// its own output removes nothing.
pub fn sanitize(tree: &mut CellTree) -> usize {
    let root = tree.root();
    visit(tree, root)
}

fn visit(tree: &mut CellTree, id: CellId) -> usize {
    let mut removed = 0;
    for child in tree.children(id).to_vec() {
        removed += visit(tree, child);
    }
    if is_invisible(tree, id) {
        trace!(cell = %tree.get(id).id, "removing invisible vertex");
        tree.remove(id);
        removed += 1;
    }
    removed
}

fn is_invisible(tree: &CellTree, id: CellId) -> bool {
    let cell = tree.get(id);
    if cell.kind != CellKind::Vertex || !cell.children.is_empty() {
        return false;
    }
    if cell.value.as_deref().is_some_and(|v| !v.is_empty()) {
        return false;
    }
    let Some(style) = cell.style.as_deref() else {
        return false;
    };
    style.contains("fillColor=none") && style.contains("strokeColor=none") && !style.contains("image=")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Geometry;

    const HIDDEN: &str = "fillColor=none;strokeColor=none;";

    #[test]
    fn removes_bottom_up_and_is_idempotent() {
        let mut tree = CellTree::new();
        let layer = tree.default_layer();
        let group = tree.insert_vertex(layer, None, Some(HIDDEN.into()), Geometry::default());
        tree.insert_vertex(group, Some(String::new()), Some(HIDDEN.into()), Geometry::default());
        let anchor = tree.insert_vertex(layer, None, None, Geometry::default());
        let picture = tree.insert_vertex(
            layer,
            None,
            Some(format!("{HIDDEN}image=data:image/png,AAAA;")),
            Geometry::default(),
        );

        assert_eq!(sanitize(&mut tree), 2);
        assert!(tree.is_removed(group));
        assert_eq!(tree.children(layer), &[anchor, picture]);
        assert_eq!(sanitize(&mut tree), 0);
    }
}
