// crates/drawio-vsdx/src/graph.rs
//
// Mutable output tree for one page: root, layers, vertices and edges with geometry and a
// flat style string. Converted into the serializable `MxGraphModel` once the page is done.

use crate::model::{MxCell, MxGeometry, MxGraphModel, MxPoint, Root};
use crate::placement::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(usize);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub relative: bool,
    pub source_point: Option<Point>,
    pub target_point: Option<Point>,
    pub offset: Option<Point>,
    pub points: Vec<Point>,
}

impl Geometry {
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    fn scale(&mut self, factor: f64) {
        let s = |p: &mut Point| {
            p.x *= factor;
            p.y *= factor;
        };
        self.x *= factor;
        self.y *= factor;
        self.width *= factor;
        self.height *= factor;
        self.source_point.iter_mut().for_each(s);
        self.target_point.iter_mut().for_each(s);
        self.offset.iter_mut().for_each(s);
        self.points.iter_mut().for_each(s);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Root,
    Layer,
    Vertex,
    Edge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: String,
    pub kind: CellKind,
    pub parent: Option<CellId>,
    pub children: Vec<CellId>,
    pub value: Option<String>,
    pub style: Option<String>,
    pub geometry: Option<Geometry>,
    pub source: Option<CellId>,
    pub target: Option<CellId>,
    removed: bool,
}

#[derive(Debug, Clone)]
pub struct CellTree {
    cells: Vec<Cell>,
    next_id: usize,
}

impl Default for CellTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CellTree {
    /// A tree holding the root (`"0"`) and the default layer (`"1"`).
    pub fn new() -> Self {
        let mut tree = Self {
            cells: Vec::new(),
            next_id: 0,
        };
        let root = tree.push(CellKind::Root, None, None, None, None);
        tree.push(CellKind::Layer, Some(root), None, None, None);
        tree
    }

    pub fn root(&self) -> CellId {
        CellId(0)
    }

    pub fn default_layer(&self) -> CellId {
        CellId(1)
    }

    pub fn add_layer(&mut self, name: Option<&str>) -> CellId {
        let root = self.root();
        self.push(
            CellKind::Layer,
            Some(root),
            name.map(str::to_string),
            None,
            None,
        )
    }

    pub fn insert_vertex(
        &mut self,
        parent: CellId,
        value: Option<String>,
        style: Option<String>,
        geometry: Geometry,
    ) -> CellId {
        self.push(CellKind::Vertex, Some(parent), value, style, Some(geometry))
    }

    /// Inserts an edge as the `index`-th child of `parent` (appended when out of range).
    pub fn insert_edge(
        &mut self,
        parent: CellId,
        index: usize,
        value: Option<String>,
        style: Option<String>,
        geometry: Geometry,
    ) -> CellId {
        let id = self.push(CellKind::Edge, None, value, style, Some(geometry));
        self.cells[id.0].parent = Some(parent);
        let children = &mut self.cells[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, id);
        id
    }

    pub fn set_terminals(&mut self, edge: CellId, source: Option<CellId>, target: Option<CellId>) {
        let cell = &mut self.cells[edge.0];
        cell.source = source;
        cell.target = target;
    }

    fn push(
        &mut self,
        kind: CellKind,
        parent: Option<CellId>,
        value: Option<String>,
        style: Option<String>,
        geometry: Option<Geometry>,
    ) -> CellId {
        let id = CellId(self.cells.len());
        self.cells.push(Cell {
            id: self.next_id.to_string(),
            kind,
            parent,
            children: Vec::new(),
            value,
            style,
            geometry,
            source: None,
            target: None,
            removed: false,
        });
        self.next_id += 1;
        if let Some(parent) = parent {
            self.cells[parent.0].children.push(id);
        }
        id
    }

    pub fn get(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    pub fn get_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.0]
    }

    pub fn children(&self, id: CellId) -> &[CellId] {
        &self.cells[id.0].children
    }

    pub fn child_count(&self, id: CellId) -> usize {
        self.cells[id.0].children.len()
    }

    /// Detaches a cell and its subtree; ids of other cells are unchanged.
    pub fn remove(&mut self, id: CellId) {
        if let Some(parent) = self.cells[id.0].parent {
            self.cells[parent.0].children.retain(|c| *c != id);
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            self.cells[next.0].removed = true;
            stack.extend(self.cells[next.0].children.iter().copied());
        }
    }

    pub fn is_removed(&self, id: CellId) -> bool {
        self.cells[id.0].removed
    }

    /// Cells in depth-first document order, root first.
    pub fn walk(&self) -> Vec<CellId> {
        let mut out = Vec::with_capacity(self.cells.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.cells[id.0].children.iter().rev().copied());
        }
        out
    }

    /// Multiplies every coordinate, size, waypoint and offset by `factor`.
    pub fn scale(&mut self, factor: f64) {
        if factor == 1.0 {
            return;
        }
        for cell in &mut self.cells {
            if let Some(geometry) = cell.geometry.as_mut() {
                geometry.scale(factor);
            }
        }
    }

    pub fn into_model(self, page_width: f64, page_height: f64) -> MxGraphModel {
        let order = self.walk();
        let mut cells = Vec::with_capacity(order.len());
        for (position, id) in order.into_iter().enumerate() {
            let cell = &self.cells[id.0];
            let id_of = |c: Option<CellId>| {
                c.filter(|c| !self.cells[c.0].removed)
                    .map(|c| self.cells[c.0].id.clone())
            };
            cells.push(MxCell {
                id: cell.id.clone(),
                parent: id_of(cell.parent),
                source: id_of(cell.source),
                target: id_of(cell.target),
                value: match cell.kind {
                    CellKind::Vertex | CellKind::Edge => {
                        Some(cell.value.clone().unwrap_or_default())
                    }
                    CellKind::Root | CellKind::Layer => cell.value.clone(),
                },
                style: cell.style.clone(),
                vertex: (cell.kind == CellKind::Vertex).then_some(true),
                edge: (cell.kind == CellKind::Edge).then_some(true),
                geometry: cell.geometry.as_ref().map(to_mx_geometry),
                order: position,
            });
        }
        MxGraphModel {
            page_width: Some(page_width),
            page_height: Some(page_height),
            grid: Some(true),
            grid_size: Some(10),
            guides: Some(true),
            page: Some(true),
            page_scale: Some(1.0),
            root: Root { cells },
        }
    }
}

fn to_mx_point(p: Point, as_attr: Option<&str>) -> MxPoint {
    MxPoint {
        x: Some(p.x),
        y: Some(p.y),
        as_attr: as_attr.map(str::to_string),
    }
}

fn to_mx_geometry(g: &Geometry) -> MxGeometry {
    let opt = |v: f64| (v != 0.0).then_some(v);
    MxGeometry {
        x: opt(g.x),
        y: opt(g.y),
        width: opt(g.width),
        height: opt(g.height),
        relative: g.relative.then_some(true),
        as_attr: Some("geometry".to_string()),
        source_point: g.source_point.map(|p| to_mx_point(p, Some("sourcePoint"))),
        target_point: g.target_point.map(|p| to_mx_point(p, Some("targetPoint"))),
        offset_point: g.offset.map(|p| to_mx_point(p, Some("offset"))),
        points: g.points.iter().map(|p| to_mx_point(*p, None)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_walk_is_depth_first() {
        let mut tree = CellTree::new();
        let layer = tree.default_layer();
        let a = tree.insert_vertex(layer, None, None, Geometry::rect(0.0, 0.0, 10.0, 10.0));
        let b = tree.insert_vertex(layer, None, None, Geometry::default());
        let inner = tree.insert_vertex(a, None, None, Geometry::default());
        let e = tree.insert_edge(layer, 1, None, None, Geometry::default());
        tree.set_terminals(e, Some(a), Some(b));
        assert_eq!(tree.get(a).id, "2");
        assert_eq!(tree.get(e).id, "5");
        let order: Vec<&str> = tree.walk().iter().map(|c| tree.get(*c).id.as_str()).collect();
        assert_eq!(order, vec!["0", "1", "2", "4", "5", "3"]);
        tree.remove(a);
        assert!(tree.is_removed(inner));
        assert_eq!(tree.children(layer), &[e, b]);
    }
}
