// crates/drawio-vsdx/src/geometry.rs
//
// Geometry sections of a shape: row inheritance from the master, evaluation into absolute
// path commands, and the derived outputs (stencil XML, simple form detection, connector
// routing and curve points, implied size).

use crate::cells::{Row, Section};
use crate::codec;
use crate::document::{Document, ShapeIdx};
use crate::placement::{Point, round2};
use std::collections::BTreeMap;
use std::fmt::Write as _;

const GEOMETRY: &str = "Geometry";
const MAX_MASTER_DEPTH: usize = 32;
const CURVE_SAMPLES: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    /// Arc from the current point through `via` to `to`, on an ellipse whose major axis is
    /// turned by `angle` (radians) and whose axis ratio is `ratio`.
    ArcTo {
        via: Point,
        to: Point,
        angle: f64,
        ratio: f64,
    },
    QuadTo {
        control: Point,
        to: Point,
    },
    CubicTo {
        c1: Point,
        c2: Point,
        to: Point,
    },
    /// Sampled curve (NURBS, polyline, spline), the last point being the end point.
    Polyline(Vec<Point>),
    Ellipse {
        center: Point,
        rx: f64,
        ry: f64,
    },
}

impl PathCommand {
    pub fn end_point(&self) -> Option<Point> {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
            PathCommand::ArcTo { to, .. }
            | PathCommand::QuadTo { to, .. }
            | PathCommand::CubicTo { to, .. } => Some(*to),
            PathCommand::Polyline(points) => points.last().copied(),
            PathCommand::Ellipse { .. } => None,
        }
    }
}

/// One evaluated geometry section, in inches in the shape's local frame (y up).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoSection {
    pub index: u32,
    pub no_fill: bool,
    pub no_line: bool,
    pub no_show: bool,
    pub commands: Vec<PathCommand>,
}

impl GeoSection {
    pub fn is_visible(&self) -> bool {
        !self.no_show && !self.commands.is_empty()
    }
}

/// Geometry sections of a shape with rows inherited from its master shape chain.
pub fn merged_sections(doc: &Document, shape: ShapeIdx) -> Vec<Section> {
    merged_at_depth(doc, shape, 0)
}

fn merged_at_depth(doc: &Document, shape: ShapeIdx, depth: usize) -> Vec<Section> {
    let node = doc.shape(shape);
    let inherited = match node.master_shape {
        Some(master) if depth < MAX_MASTER_DEPTH => merged_at_depth(doc, master, depth + 1),
        _ => Vec::new(),
    };
    let own: Vec<&Section> = node.sheet.sections_named(GEOMETRY).collect();

    let mut by_index: BTreeMap<u32, Section> = BTreeMap::new();
    for (pos, section) in inherited.into_iter().enumerate() {
        by_index.insert(section.index.unwrap_or(pos as u32), section);
    }
    for (pos, section) in own.into_iter().enumerate() {
        let ix = section.index.unwrap_or(pos as u32);
        match by_index.remove(&ix) {
            Some(base) => {
                by_index.insert(ix, overlay_section(base, section));
            }
            None => {
                by_index.insert(ix, section.clone());
            }
        }
    }
    by_index
        .into_iter()
        .filter(|(_, s)| !s.deleted)
        .map(|(ix, mut s)| {
            s.index = Some(ix);
            s.rows.retain(|r| !r.deleted);
            s
        })
        .collect()
}

fn overlay_section(mut base: Section, own: &Section) -> Section {
    if own.deleted {
        base.deleted = true;
        return base;
    }
    for (name, cell) in &own.cells {
        base.cells.insert(name.clone(), cell.clone());
    }
    let mut rows: BTreeMap<u32, Row> = base
        .rows
        .into_iter()
        .enumerate()
        .map(|(pos, r)| (r.index.unwrap_or(pos as u32), r))
        .collect();
    for (pos, row) in own.rows.iter().enumerate() {
        let ix = row.index.unwrap_or(pos as u32);
        let merged = match rows.remove(&ix) {
            Some(mut inherited) if !row.deleted => {
                for (name, cell) in &row.cells {
                    inherited.cells.insert(name.clone(), cell.clone());
                }
                if row.kind.is_some() {
                    inherited.kind = row.kind.clone();
                }
                inherited
            }
            _ => row.clone(),
        };
        rows.insert(ix, merged);
    }
    base.rows = rows
        .into_iter()
        .map(|(ix, mut r)| {
            r.index = Some(ix);
            r
        })
        .collect();
    base
}

/// Evaluates sections into path commands for a shape of `width` x `height` inches.
pub fn evaluate(sections: &[Section], width: f64, height: f64) -> Vec<GeoSection> {
    sections
        .iter()
        .map(|section| {
            let mut current = Point::default();
            let mut commands = Vec::new();
            for row in &section.rows {
                let Some(command) = evaluate_row(row, current, width, height) else {
                    continue;
                };
                if let Some(end) = command.end_point() {
                    current = end;
                }
                commands.push(command);
            }
            GeoSection {
                index: section.index.unwrap_or(0),
                no_fill: section.flag("NoFill").unwrap_or(false),
                no_line: section.flag("NoLine").unwrap_or(false),
                no_show: section.flag("NoShow").unwrap_or(false),
                commands,
            }
        })
        .collect()
}

fn evaluate_row(row: &Row, current: Point, w: f64, h: f64) -> Option<PathCommand> {
    let n = |name: &str| row.number(name).unwrap_or(0.0);
    let xy = || Point::new(n("X"), n("Y"));
    let rel = |x: f64, y: f64| Point::new(x * w, y * h);
    let kind = row.kind.as_deref().unwrap_or_default();

    Some(match kind {
        "MoveTo" => PathCommand::MoveTo(xy()),
        "RelMoveTo" => PathCommand::MoveTo(rel(n("X"), n("Y"))),
        "LineTo" => PathCommand::LineTo(xy()),
        "RelLineTo" => PathCommand::LineTo(rel(n("X"), n("Y"))),
        "ArcTo" => {
            let to = xy();
            // Bulge: signed distance from the chord midpoint to the arc midpoint.
            let bulge = n("A");
            let mid = Point::new((current.x + to.x) / 2.0, (current.y + to.y) / 2.0);
            let len = current.distance(to);
            if bulge.abs() < 1e-9 || len < 1e-9 {
                PathCommand::LineTo(to)
            } else {
                let nx = -(to.y - current.y) / len;
                let ny = (to.x - current.x) / len;
                PathCommand::ArcTo {
                    via: Point::new(mid.x - nx * bulge, mid.y - ny * bulge),
                    to,
                    angle: 0.0,
                    ratio: 1.0,
                }
            }
        }
        "EllipticalArcTo" => PathCommand::ArcTo {
            via: Point::new(n("A"), n("B")),
            to: xy(),
            angle: n("C"),
            ratio: row.number("D").unwrap_or(1.0),
        },
        "RelEllipticalArcTo" => PathCommand::ArcTo {
            via: rel(n("A"), n("B")),
            to: rel(n("X"), n("Y")),
            angle: n("C"),
            ratio: row.number("D").unwrap_or(1.0),
        },
        "RelCubBezTo" => PathCommand::CubicTo {
            c1: rel(n("A"), n("B")),
            c2: rel(n("C"), n("D")),
            to: rel(n("X"), n("Y")),
        },
        "RelQuadBezTo" => PathCommand::QuadTo {
            control: rel(n("A"), n("B")),
            to: rel(n("X"), n("Y")),
        },
        "NURBSTo" => {
            let to = xy();
            let formula = row.cell("E").map(|c| c.formula()).unwrap_or_default();
            match NurbsSpec::parse(formula, current, to, row, w, h) {
                Some(spec) => PathCommand::Polyline(spec.sample(CURVE_SAMPLES)),
                None => PathCommand::LineTo(to),
            }
        }
        "PolylineTo" => {
            let to = xy();
            let formula = row.cell("A").map(|c| c.formula()).unwrap_or_default();
            let mut points = polyline_points(formula, w, h).unwrap_or_default();
            points.push(to);
            PathCommand::Polyline(points)
        }
        // Splines are approximated by the polyline through their knots.
        "SplineStart" | "SplineKnot" => PathCommand::LineTo(xy()),
        "Ellipse" => {
            let center = xy();
            PathCommand::Ellipse {
                center,
                rx: center.distance(Point::new(n("A"), n("B"))),
                ry: center.distance(Point::new(n("C"), n("D"))),
            }
        }
        _ => return None,
    })
}

/// Arguments of a `NURBS(knotLast, degree, xType, yType, x1, y1, knot1, weight1, ...)`
/// formula together with the row's end point and the current point.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsSpec {
    pub degree: usize,
    pub knots: Vec<f64>,
    /// Control points with weights.
    pub control: Vec<(Point, f64)>,
}

impl NurbsSpec {
    fn parse(formula: &str, start: Point, end: Point, row: &Row, w: f64, h: f64) -> Option<Self> {
        let args = formula_args(formula, "NURBS")?;
        if args.len() < 4 {
            return None;
        }
        let knot_last = args[0];
        let degree = (args[1].round() as usize).clamp(1, 10);
        let x_abs = args[2] != 0.0;
        let y_abs = args[3] != 0.0;
        let knot_end = row.number("A").unwrap_or(knot_last);
        let weight_end = row.number("B").unwrap_or(1.0);
        let knot_start = row.number("C").unwrap_or(0.0);
        let weight_start = row.number("D").unwrap_or(1.0);

        let mut control = vec![(start, weight_start)];
        let mut knots = vec![knot_start];
        for chunk in args[4..].chunks_exact(4) {
            let x = if x_abs { chunk[0] } else { chunk[0] * w };
            let y = if y_abs { chunk[1] } else { chunk[1] * h };
            control.push((Point::new(x, y), chunk[3]));
            knots.push(chunk[2]);
        }
        control.push((end, weight_end));
        knots.push(knot_end);
        knots.push(knot_last);

        // Clamp the start, then pad or trim the end to `n + degree + 1` knots.
        let mut full = vec![knot_start; degree];
        full.extend(knots);
        let wanted = control.len() + degree + 1;
        while full.len() < wanted {
            full.push(knot_last);
        }
        full.truncate(wanted);
        Some(Self {
            degree: degree.min(control.len() - 1),
            knots: full,
            control,
        })
    }

    /// Points along the curve, excluding the start point and including the end point.
    pub fn sample(&self, steps: usize) -> Vec<Point> {
        let n = self.control.len();
        let p = self.degree;
        if n < 2 || p == 0 {
            return self.control.iter().skip(1).map(|(pt, _)| *pt).collect();
        }
        let u0 = self.knots[p];
        let u1 = self.knots[n];
        if u1 <= u0 {
            return self.control.iter().skip(1).map(|(pt, _)| *pt).collect();
        }
        let mut out = Vec::with_capacity(steps);
        for i in 1..=steps {
            let u = u0 + (u1 - u0) * i as f64 / steps as f64;
            out.push(self.evaluate(u));
        }
        if let Some(last) = out.last_mut() {
            *last = self.control[n - 1].0;
        }
        out
    }

    /// Rational de Boor evaluation at parameter `u`.
    pub fn evaluate(&self, u: f64) -> Point {
        let n = self.control.len();
        let p = self.degree;
        let mut k = p;
        while k + 1 < n && self.knots[k + 1] <= u {
            k += 1;
        }
        let mut d: Vec<(f64, f64, f64)> = (0..=p)
            .map(|j| {
                let (pt, w) = self.control[j + k - p];
                (pt.x * w, pt.y * w, w)
            })
            .collect();
        for r in 1..=p {
            for j in (r..=p).rev() {
                let i = j + k - p;
                let denom = self.knots[i + p + 1 - r] - self.knots[i];
                let alpha = if denom.abs() < 1e-12 {
                    0.0
                } else {
                    (u - self.knots[i]) / denom
                };
                d[j] = (
                    (1.0 - alpha) * d[j - 1].0 + alpha * d[j].0,
                    (1.0 - alpha) * d[j - 1].1 + alpha * d[j].1,
                    (1.0 - alpha) * d[j - 1].2 + alpha * d[j].2,
                );
            }
        }
        let (x, y, w) = d[p];
        if w.abs() < 1e-12 {
            Point::new(x, y)
        } else {
            Point::new(x / w, y / w)
        }
    }
}

fn polyline_points(formula: &str, w: f64, h: f64) -> Option<Vec<Point>> {
    let args = formula_args(formula, "POLYLINE")?;
    if args.len() < 2 {
        return None;
    }
    let x_abs = args[0] != 0.0;
    let y_abs = args[1] != 0.0;
    Some(
        args[2..]
            .chunks_exact(2)
            .map(|c| {
                Point::new(
                    if x_abs { c[0] } else { c[0] * w },
                    if y_abs { c[1] } else { c[1] * h },
                )
            })
            .collect(),
    )
}

/// Numeric arguments of `NAME(a, b, ...)`; any non-numeric argument rejects the formula.
fn formula_args(formula: &str, name: &str) -> Option<Vec<f64>> {
    let f = formula.trim().trim_start_matches('=');
    let open = f.find('(')?;
    if !f[..open].trim().eq_ignore_ascii_case(name) {
        return None;
    }
    let close = f.rfind(')')?;
    f[open + 1..close]
        .split(',')
        .map(|a| a.trim().parse::<f64>().ok())
        .collect()
}

/// A shape is drawn as a filled region when one of its visible sections can be filled.
pub fn is_fillable(sections: &[GeoSection]) -> bool {
    sections.iter().any(|s| s.is_visible() && !s.no_fill)
}

/// Extent of the absolute path coordinates, used when a shape declares no size.
pub fn implied_size(sections: &[GeoSection]) -> Option<(f64, f64)> {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut any = false;
    for section in sections {
        for command in &section.commands {
            let points: Vec<Point> = match command {
                PathCommand::Ellipse { center, rx, ry } => vec![
                    Point::new(center.x - rx, center.y - ry),
                    Point::new(center.x + rx, center.y + ry),
                ],
                PathCommand::Polyline(points) => points.clone(),
                other => other.end_point().into_iter().collect(),
            };
            for p in points {
                any = true;
                min = Point::new(min.x.min(p.x), min.y.min(p.y));
                max = Point::new(max.x.max(p.x), max.y.max(p.y));
            }
        }
    }
    any.then(|| (max.x - min.x.min(0.0), max.y - min.y.min(0.0)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

/// Output form of a vertex derived from its geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    /// No geometry, or a plain rectangle: the renderer's default shape.
    Default,
    Ellipse,
    Triangle(Direction),
    Stencil(String),
}

pub fn classify_form(sections: &[GeoSection], w: f64, h: f64) -> Form {
    let visible: Vec<&GeoSection> = sections.iter().filter(|s| s.is_visible()).collect();
    if visible.is_empty() {
        return Form::Default;
    }
    if let [single] = visible.as_slice() {
        if let [PathCommand::Ellipse { .. }] = single.commands.as_slice() {
            return Form::Ellipse;
        }
        if !single.no_fill && !single.no_line {
            let corners = polygon_corners(&single.commands);
            if let Some(corners) = corners {
                if is_rectangle(&corners, w, h) {
                    return Form::Default;
                }
                if let Some(direction) = triangle_direction(&corners, w, h) {
                    return Form::Triangle(direction);
                }
            }
        }
    }
    Form::Stencil(stencil_payload(sections, w, h))
}

/// Distinct vertices of a closed straight-line path.
fn polygon_corners(commands: &[PathCommand]) -> Option<Vec<Point>> {
    let mut points = Vec::new();
    for (i, command) in commands.iter().enumerate() {
        match (i, command) {
            (0, PathCommand::MoveTo(p)) => points.push(*p),
            (i, PathCommand::LineTo(p)) if i > 0 => points.push(*p),
            _ => return None,
        }
    }
    let first = *points.first()?;
    let last = *points.last()?;
    if first.distance(last) > 1e-6 {
        return None;
    }
    points.pop();
    Some(points)
}

fn near(a: Point, b: Point, w: f64, h: f64) -> bool {
    let tol = 1e-3 * w.max(h).max(1e-3);
    (a.x - b.x).abs() <= tol && (a.y - b.y).abs() <= tol
}

fn same_set(points: &[Point], expected: &[Point], w: f64, h: f64) -> bool {
    points.len() == expected.len()
        && expected
            .iter()
            .all(|e| points.iter().any(|p| near(*p, *e, w, h)))
}

fn is_rectangle(points: &[Point], w: f64, h: f64) -> bool {
    same_set(
        points,
        &[
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ],
        w,
        h,
    )
}

fn triangle_direction(points: &[Point], w: f64, h: f64) -> Option<Direction> {
    let candidates = [
        (
            Direction::North,
            [Point::new(0.0, 0.0), Point::new(w, 0.0), Point::new(w / 2.0, h)],
        ),
        (
            Direction::South,
            [Point::new(0.0, h), Point::new(w, h), Point::new(w / 2.0, 0.0)],
        ),
        (
            Direction::East,
            [Point::new(0.0, 0.0), Point::new(0.0, h), Point::new(w, h / 2.0)],
        ),
        (
            Direction::West,
            [Point::new(w, 0.0), Point::new(w, h), Point::new(0.0, h / 2.0)],
        ),
    ];
    candidates
        .into_iter()
        .find(|(_, expected)| same_set(points, expected, w, h))
        .map(|(d, _)| d)
}

/// Stencil XML for the sections on a 100 x 100 canvas (y flipped), encoded with the
/// diagram payload codec.
pub fn stencil_payload(sections: &[GeoSection], w: f64, h: f64) -> String {
    codec::encode_payload(&stencil_xml(sections, w, h))
}

pub fn stencil_xml(sections: &[GeoSection], w: f64, h: f64) -> String {
    let sx = if w.abs() > 1e-9 { 100.0 / w } else { 100.0 };
    let sy = if h.abs() > 1e-9 { 100.0 / h } else { 100.0 };
    let map = |p: Point| Point::new(p.x * sx, 100.0 - p.y * sy);

    let mut xml = String::from(
        r#"<shape w="100" h="100" aspect="variable" strokewidth="inherit"><connections/><foreground>"#,
    );
    for section in sections.iter().filter(|s| s.is_visible()) {
        let paint = match (section.no_fill, section.no_line) {
            (true, true) => continue,
            (true, false) => "<stroke/>",
            (false, true) => "<fill/>",
            (false, false) => "<fillstroke/>",
        };
        let mut path = String::new();
        let mut current = Point::default();
        let mut start = Point::default();
        let mut ellipses = String::new();
        for command in &section.commands {
            match command {
                PathCommand::MoveTo(p) => {
                    let m = map(*p);
                    let _ = write!(path, r#"<move x="{}" y="{}"/>"#, num(m.x), num(m.y));
                    start = *p;
                }
                PathCommand::LineTo(p) => {
                    let m = map(*p);
                    let _ = write!(path, r#"<line x="{}" y="{}"/>"#, num(m.x), num(m.y));
                }
                PathCommand::QuadTo { control, to } => {
                    let (c, t) = (map(*control), map(*to));
                    let _ = write!(
                        path,
                        r#"<quad x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
                        num(c.x),
                        num(c.y),
                        num(t.x),
                        num(t.y)
                    );
                }
                PathCommand::CubicTo { c1, c2, to } => {
                    let (a, b, t) = (map(*c1), map(*c2), map(*to));
                    let _ = write!(
                        path,
                        r#"<curve x1="{}" y1="{}" x2="{}" y2="{}" x3="{}" y3="{}"/>"#,
                        num(a.x),
                        num(a.y),
                        num(b.x),
                        num(b.y),
                        num(t.x),
                        num(t.y)
                    );
                }
                PathCommand::ArcTo {
                    via,
                    to,
                    angle,
                    ratio,
                } => {
                    let (p0, p1, p2) = (map(current), map(*via), map(*to));
                    // Scaling the canvas distorts the ellipse; compensate the axis ratio.
                    let ratio = ratio * (sx / sy);
                    match svg_arc(p0, p1, p2, -angle.to_degrees(), ratio) {
                        Some(arc) => {
                            let _ = write!(
                                path,
                                r#"<arc rx="{}" ry="{}" x-axis-rotation="{}" large-arc-flag="{}" sweep-flag="{}" x="{}" y="{}"/>"#,
                                num(arc.rx),
                                num(arc.ry),
                                num(arc.rotation),
                                u8::from(arc.large),
                                u8::from(arc.sweep),
                                num(p2.x),
                                num(p2.y)
                            );
                        }
                        None => {
                            let _ = write!(path, r#"<line x="{}" y="{}"/>"#, num(p2.x), num(p2.y));
                        }
                    }
                }
                PathCommand::Polyline(points) => {
                    for p in points {
                        let m = map(*p);
                        let _ = write!(path, r#"<line x="{}" y="{}"/>"#, num(m.x), num(m.y));
                    }
                }
                PathCommand::Ellipse { center, rx, ry } => {
                    let tl = map(Point::new(center.x - rx, center.y + ry));
                    let _ = write!(
                        ellipses,
                        r#"<ellipse x="{}" y="{}" w="{}" h="{}"/>{paint}"#,
                        num(tl.x),
                        num(tl.y),
                        num(2.0 * rx * sx),
                        num(2.0 * ry * sy)
                    );
                }
            }
            if let Some(end) = command.end_point() {
                current = end;
            }
        }
        if !path.is_empty() {
            if current.distance(start) < 1e-9 && !section.no_fill {
                path.push_str("<close/>");
            }
            let _ = write!(xml, "<path>{path}</path>{paint}");
        }
        xml.push_str(&ellipses);
    }
    xml.push_str("</foreground></shape>");
    xml
}

struct SvgArc {
    rx: f64,
    ry: f64,
    rotation: f64,
    large: bool,
    sweep: bool,
}

/// Arc parameters for the ellipse arc from `p0` through `p1` to `p2` (screen frame).
/// `rotation` is the major axis angle in degrees, `ratio` the major/minor axis ratio.
fn svg_arc(p0: Point, p1: Point, p2: Point, rotation: f64, ratio: f64) -> Option<SvgArc> {
    let ratio = if ratio.abs() < 1e-9 { 1.0 } else { ratio.abs() };
    // Map the ellipse onto a circle: undo the rotation, then squeeze the major axis.
    let to_circle = |p: Point| {
        let r = p.rotate_about(Point::default(), -rotation);
        Point::new(r.x / ratio, r.y)
    };
    let (a, b, c) = (to_circle(p0), to_circle(p1), to_circle(p2));
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        return None;
    }
    let sq = |p: Point| p.x * p.x + p.y * p.y;
    let center = Point::new(
        (sq(a) * (b.y - c.y) + sq(b) * (c.y - a.y) + sq(c) * (a.y - b.y)) / d,
        (sq(a) * (c.x - b.x) + sq(b) * (a.x - c.x) + sq(c) * (b.x - a.x)) / d,
    );
    let radius = center.distance(a);
    let cross = |o: Point, p: Point, q: Point| (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x);
    // Travel a -> b -> c; positive orientation is clockwise on screen.
    let sweep = cross(a, b, c) > 0.0;
    let large = cross(a, c, b).signum() == cross(a, c, center).signum();
    Some(SvgArc {
        rx: radius * ratio,
        ry: radius,
        rotation,
        large,
        sweep,
    })
}

/// Connector routing: the end points of the straight segments after the first `MoveTo`
/// of the first section, relative to that `MoveTo`, excluding the final end point.
pub fn routing_offsets(sections: &[GeoSection]) -> Vec<Point> {
    let Some(section) = sections.iter().find(|s| !s.commands.is_empty()) else {
        return Vec::new();
    };
    let mut origin: Option<Point> = None;
    let mut out = Vec::new();
    for command in &section.commands {
        match (origin, command) {
            (None, PathCommand::MoveTo(p)) => origin = Some(*p),
            (Some(o), PathCommand::LineTo(p)) => out.push(Point::new(p.x - o.x, p.y - o.y)),
            _ => {}
        }
    }
    out.pop();
    out
}

/// Sampled interior points of the first curve of a connector, relative to its `MoveTo`.
pub fn curve_offsets(sections: &[GeoSection]) -> Vec<Point> {
    let Some(section) = sections.iter().find(|s| !s.commands.is_empty()) else {
        return Vec::new();
    };
    let origin = section
        .commands
        .iter()
        .find_map(|c| match c {
            PathCommand::MoveTo(p) => Some(*p),
            _ => None,
        })
        .unwrap_or_default();
    let mut out: Vec<Point> = section
        .commands
        .iter()
        .find_map(|c| match c {
            PathCommand::Polyline(points) => Some(points.clone()),
            PathCommand::CubicTo { c1, c2, to } => Some(vec![*c1, *c2, *to]),
            _ => None,
        })
        .unwrap_or_default()
        .into_iter()
        .map(|p| Point::new(p.x - origin.x, p.y - origin.y))
        .collect();
    out.pop();
    out
}

fn num(v: f64) -> String {
    let r = round2(v);
    if r.fract() == 0.0 {
        format!("{}", r as i64)
    } else {
        format!("{r}")
    }
}
