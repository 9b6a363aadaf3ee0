// crates/drawio-vsdx/src/edges.rs
//
// Connector shapes become edges once the page's connects are known. A connect names the
// connector and the shapes glued to its ends; ends without a placed shape get a zero-size
// anchor vertex so every connected edge has two terminals.

use crate::cascade::Resolver;
use crate::cells::CONVERSION_FACTOR;
use crate::document::{PageIdx, ShapeKey};
use crate::geometry;
use crate::graph::{CellId, Geometry};
use crate::import::{PageBuilder, PendingEdge, shape_transform};
use crate::placement::{self, Point};
use crate::style::Styler;
use crate::text;
use tracing::{debug, warn};

/// Offsets beyond this come from degenerate text transforms and are dropped.
const MAX_LABEL_OFFSET: f64 = 1e11;

/// Route of a connector in its parent's frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Route {
    pub begin: Point,
    pub end: Point,
    pub points: Vec<Point>,
    pub curved: bool,
}

impl<'d> PageBuilder<'d> {
    /// Turns every connect group of the page into an edge. The first group naming a
    /// connector consumes it; later ones are ignored.
    pub(crate) fn connect_page(&mut self, page: PageIdx) {
        let doc = self.doc;
        for group in &doc.page(page).connects {
            let key = ShapeKey {
                page,
                id: group.from_sheet,
            };
            let Some(pending) = self.pending.remove(&key) else {
                debug!(shape = group.from_sheet, "connect does not name a pending connector");
                continue;
            };
            let route = self.route(&pending);
            let source = self.terminal(page, group.source, &pending, route.begin);
            let target = self.terminal(page, group.target, &pending, route.end);
            let edge = self.insert_edge(&pending, route);
            self.tree.set_terminals(edge, Some(source), Some(target));
        }
    }

    /// Connectors no connect consumed are kept as free-standing edges.
    pub(crate) fn insert_unconnected(&mut self, page: PageIdx) {
        let order = std::mem::take(&mut self.pending_order);
        for key in order {
            if key.page != page {
                self.pending_order.push(key);
                continue;
            }
            if let Some(pending) = self.pending.remove(&key) {
                let route = self.route(&pending);
                self.insert_edge(&pending, route);
            }
        }
    }

    fn terminal(
        &mut self,
        page: PageIdx,
        shape: Option<u32>,
        pending: &PendingEdge,
        at: Point,
    ) -> CellId {
        if let Some(id) = shape
            && let Some(cell) = self.vertices.get(&ShapeKey { page, id })
        {
            return *cell;
        }
        debug!(shape = ?shape, x = at.x, y = at.y, "adding anchor for unplaced terminal");
        let at = at.round2();
        self.tree
            .insert_vertex(pending.parent, None, None, Geometry::rect(at.x, at.y, 0.0, 0.0))
    }

    pub(crate) fn route(&self, pending: &PendingEdge) -> Route {
        let resolver = Resolver::new(self.doc, Some(pending.page));
        let shape = pending.shape;
        let n = |name: &str| resolver.own_number(shape, name).unwrap_or(0.0);
        let to_screen = |x: f64, y: f64| {
            Point::new(x * CONVERSION_FACTOR, pending.frame.height - y * CONVERSION_FACTOR)
        };
        let begin = to_screen(n("BeginX"), n("BeginY"));
        let end = to_screen(n("EndX"), n("EndY"));

        let sections = geometry::evaluate(
            &geometry::merged_sections(self.doc, shape),
            n("Width"),
            n("Height"),
        );
        let curved = resolver.number(shape, "ConLineRouteExt") == Some(2.0);
        let offsets = if curved {
            geometry::curve_offsets(&sections)
        } else {
            geometry::routing_offsets(&sections)
        };
        // Offsets are in the connector's local frame: flip, then turn by its own angle.
        let flip_x = if resolver.number(shape, "FlipX") == Some(1.0) { -1.0 } else { 1.0 };
        let flip_y = if resolver.number(shape, "FlipY") == Some(1.0) { -1.0 } else { 1.0 };
        let (sin, cos) = n("Angle").sin_cos();
        let points = offsets
            .iter()
            .map(|o| {
                let (x, y) = (o.x * flip_x, o.y * flip_y);
                let (x, y) = (x * cos - y * sin, x * sin + y * cos);
                Point::new(
                    begin.x + x * CONVERSION_FACTOR,
                    begin.y - y * CONVERSION_FACTOR,
                )
                .round2()
            })
            .collect();

        let mut route = Route {
            begin,
            end,
            points,
            curved,
        };
        let rotation = pending.frame.rotation;
        if rotation != 0.0 {
            let pivot = pending.frame.center();
            route.begin = route.begin.rotate_about(pivot, rotation);
            route.end = route.end.rotate_about(pivot, rotation);
            for p in &mut route.points {
                *p = p.rotate_about(pivot, rotation);
            }
        }
        route
    }

    /// Inserts the edge at its document position among the parent's children. Edges are
    /// inserted after all vertices, so earlier edges in the same parent shift the slot.
    fn insert_edge(&mut self, pending: &PendingEdge, route: Route) -> CellId {
        let resolver = Resolver::new(self.doc, Some(pending.page));
        let styler = Styler {
            resolver: &resolver,
            shape: pending.shape,
            connector: true,
        };
        let style = styler.edge_style(route.curved);
        let label = text::html_label(&resolver, pending.shape, true);
        let text_rotation = placement::screen_rotation(
            resolver.own_number(pending.shape, "TxtAngle").unwrap_or(0.0),
        );
        let label_rotation = placement::accumulate(text_rotation, pending.frame.rotation);
        let offset = if label.is_empty() {
            None
        } else {
            self.label_offset(&resolver, pending, &route)
        };

        // Connects arrive in any order; ties on the captured slot fall back to document order.
        let key = (pending.z_index, pending.doc_pos);
        let slots = self.edge_slots.entry(pending.parent).or_default();
        let shift = slots.iter().filter(|slot| **slot < key).count();
        slots.push(key);
        let index = pending.z_index + shift;

        let inline_label = label_rotation == 0.0;
        let geometry = Geometry {
            relative: true,
            source_point: Some(route.begin),
            target_point: Some(route.end),
            offset: offset.filter(|_| inline_label),
            points: route.points,
            ..Geometry::default()
        };
        let value = if inline_label { label.clone() } else { String::new() };
        let edge = self
            .tree
            .insert_edge(pending.parent, index, Some(value), Some(style.to_string()), geometry);

        if !inline_label && !label.is_empty() {
            // Upside-down parents get the label turned back for legibility.
            let rotation = if (60.0..=240.0).contains(&pending.frame.rotation) {
                (label_rotation + 180.0) % 360.0
            } else {
                label_rotation
            };
            let size = self.label_size(&resolver, pending);
            let center = offset.unwrap_or_default();
            let geometry = Geometry {
                width: size.x,
                height: size.y,
                relative: true,
                offset: Some(Point::new(center.x - size.x / 2.0, center.y - size.y / 2.0).round2()),
                ..Geometry::default()
            };
            self.tree.insert_vertex(
                edge,
                Some(label),
                Some(styler.label_style(rotation).to_string()),
                geometry,
            );
        }
        edge
    }

    fn label_size(&self, resolver: &Resolver<'_>, pending: &PendingEdge) -> Point {
        let n = |name: &str| resolver.own_number(pending.shape, name).unwrap_or(0.0);
        let t = shape_transform(resolver, pending.shape, n("Width"), n("Height"), "Txt");
        Point::new(t.width, t.height)
    }

    /// Offset of the text block center from the route's midpoint.
    fn label_offset(
        &self,
        resolver: &Resolver<'_>,
        pending: &PendingEdge,
        route: &Route,
    ) -> Option<Point> {
        let shape = pending.shape;
        let txt_x = resolver.own_number(shape, "TxtPinX")?;
        let txt_y = resolver.own_number(shape, "TxtPinY")?;
        let n = |name: &str| resolver.own_number(shape, name).unwrap_or(0.0);

        let local = Point::new(txt_x - n("LocPinX"), txt_y - n("LocPinY"));
        // Page frame is y-up, so a counter-clockwise angle is the usual rotation.
        let (sin, cos) = n("Angle").sin_cos();
        let center = Point::new(
            n("PinX") + local.x * cos - local.y * sin,
            n("PinY") + local.x * sin + local.y * cos,
        );
        let mut center = Point::new(
            center.x * CONVERSION_FACTOR,
            pending.frame.height - center.y * CONVERSION_FACTOR,
        );
        if pending.frame.rotation != 0.0 {
            center = center.rotate_about(pending.frame.center(), pending.frame.rotation);
        }

        let mut path = Vec::with_capacity(route.points.len() + 2);
        path.push(route.begin);
        path.extend(route.points.iter().copied());
        path.push(route.end);
        let mid = polyline_midpoint(&path);
        let offset = Point::new(center.x - mid.x, center.y - mid.y);
        if !offset.x.is_finite()
            || !offset.y.is_finite()
            || offset.x.abs() > MAX_LABEL_OFFSET
            || offset.y.abs() > MAX_LABEL_OFFSET
        {
            warn!(shape = self.doc.shape(shape).id, "dropping out-of-range label offset");
            return None;
        }
        Some(offset.round2())
    }
}

/// Point halfway along the polyline by length; the first point for a degenerate path.
pub(crate) fn polyline_midpoint(path: &[Point]) -> Point {
    let Some(first) = path.first().copied() else {
        return Point::default();
    };
    let total: f64 = path.windows(2).map(|w| w[0].distance(w[1])).sum();
    if total == 0.0 {
        return first;
    }
    let mut remaining = total / 2.0;
    for w in path.windows(2) {
        let len = w[0].distance(w[1]);
        if len >= remaining && len > 0.0 {
            let t = remaining / len;
            return Point::new(
                w[0].x + (w[1].x - w[0].x) * t,
                w[0].y + (w[1].y - w[0].y) * t,
            );
        }
        remaining -= len;
    }
    path.last().copied().unwrap_or(first)
}
