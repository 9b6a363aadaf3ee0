// crates/drawio-vsdx/src/cascade.rs
//
// Property resolution: shape cell, then master shape, then the stylesheet chain selected by
// the property's category, with `THEMEVAL()` placeholders either handed back for theme
// resolution or redirected to the "no style" sheet.

use crate::cells::{Cell, CellKey, CellState};
use crate::document::{Document, PageIdx, ShapeIdx};
use crate::tables::{self, StyleCategory};
use crate::theme::{QuickStyle, Rgb, Theme, VARIANT_COUNT};
use tracing::{trace, warn};

/// Stylesheet every chain ends in.
pub const NO_STYLE_ID: u32 = 0;

/// Upper bound on stylesheet or master hops for one lookup.
const MAX_CHAIN: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct Resolver<'d> {
    pub doc: &'d Document,
    pub page: Option<PageIdx>,
}

impl<'d> Resolver<'d> {
    pub fn new(doc: &'d Document, page: Option<PageIdx>) -> Self {
        Self { doc, page }
    }

    /// Resolves a flat cell. The result is concrete, or a `THEMEVAL()` cell for one of the
    /// theme-resolved keys.
    pub fn cell(&self, shape: ShapeIdx, name: &str) -> Option<&'d Cell> {
        self.lookup(shape, CellKey::Flat(name))
    }

    pub fn indexed(
        &self,
        shape: ShapeIdx,
        section: &str,
        index: u32,
        name: &str,
    ) -> Option<&'d Cell> {
        self.lookup(
            shape,
            CellKey::Indexed {
                section,
                index,
                name,
            },
        )
    }

    pub fn lookup(&self, shape: ShapeIdx, key: CellKey<'_>) -> Option<&'d Cell> {
        let mut visited = Vec::new();
        self.resolve_shape(shape, key, &mut visited)
    }

    /// Value only: themed placeholders are treated as absent.
    pub fn value(&self, shape: ShapeIdx, name: &str) -> Option<&'d str> {
        self.cell(shape, name)
            .filter(|c| c.state() == CellState::Concrete)
            .map(Cell::value)
    }

    pub fn number(&self, shape: ShapeIdx, name: &str) -> Option<f64> {
        self.cell(shape, name)
            .filter(|c| c.state() == CellState::Concrete)
            .and_then(Cell::number)
    }

    pub fn number_or(&self, shape: ShapeIdx, name: &str, default: f64) -> f64 {
        self.number(shape, name).unwrap_or(default)
    }

    /// Cell of the shape or its master shape only, without consulting stylesheets.
    /// Used for geometry cells (pins, sizes, text transform) that stylesheets never carry.
    pub fn own_cell(&self, shape: ShapeIdx, name: &str) -> Option<&'d Cell> {
        let mut current = Some(shape);
        let mut hops = 0;
        while let Some(idx) = current {
            if let Some(cell) = self.doc.shape(idx).sheet.cell(name) {
                return Some(cell);
            }
            hops += 1;
            if hops > MAX_CHAIN {
                warn!(cell = name, "master chain limit reached");
                return None;
            }
            current = self.doc.shape(idx).master_shape;
        }
        None
    }

    pub fn own_number(&self, shape: ShapeIdx, name: &str) -> Option<f64> {
        self.own_cell(shape, name).and_then(Cell::number)
    }

    /// Formula of a geometry cell, taken from the master when the instance leaves it
    /// empty or inherits it.
    pub fn own_formula(&self, shape: ShapeIdx, name: &str) -> String {
        let mut current = Some(shape);
        let mut hops = 0;
        while let Some(idx) = current {
            if let Some(f) = self.doc.shape(idx).sheet.cell(name).map(Cell::formula)
                && !f.is_empty()
                && f != crate::cells::INHERIT
            {
                return f.to_string();
            }
            hops += 1;
            if hops > MAX_CHAIN {
                break;
            }
            current = self.doc.shape(idx).master_shape;
        }
        String::new()
    }

    fn resolve_shape(
        &self,
        shape: ShapeIdx,
        key: CellKey<'_>,
        visited: &mut Vec<ShapeIdx>,
    ) -> Option<&'d Cell> {
        if visited.contains(&shape) || visited.len() > MAX_CHAIN {
            warn!(shape = shape.0, cell = key.name(), "cyclic master reference");
            return None;
        }
        visited.push(shape);
        let node = self.doc.shape(shape);
        let category = tables::style_category(key.name());
        let style_ref = |c: StyleCategory| match c {
            StyleCategory::Fill => node.fill_style,
            StyleCategory::Line => node.line_style,
            StyleCategory::Text => node.text_style,
        };

        match node.sheet.lookup(&key) {
            Some(cell) => match cell.state() {
                CellState::Concrete => Some(cell),
                CellState::Inherited => {
                    let parent = category.and_then(style_ref)?;
                    self.resolve_style(parent, key, category?)
                }
                CellState::ThemeValue => self.theme_value(cell, key, category),
            },
            None => {
                if let Some(master) = node.master_shape
                    && let Some(cell) = self.resolve_shape(master, key, visited)
                {
                    return Some(cell);
                }
                let category = category?;
                let parent = style_ref(category)?;
                self.resolve_style(parent, key, category)
            }
        }
    }

    fn theme_value(
        &self,
        cell: &'d Cell,
        key: CellKey<'_>,
        category: Option<StyleCategory>,
    ) -> Option<&'d Cell> {
        if tables::is_theme_resolved_key(key.name()) {
            return Some(cell);
        }
        self.resolve_style(NO_STYLE_ID, key, category?)
    }

    /// Walks a stylesheet chain from `start`.
    pub fn resolve_style(
        &self,
        start: u32,
        key: CellKey<'_>,
        category: StyleCategory,
    ) -> Option<&'d Cell> {
        let mut visited: Vec<u32> = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if visited.contains(&id) || visited.len() > MAX_CHAIN {
                warn!(stylesheet = id, cell = key.name(), "cyclic stylesheet reference");
                return None;
            }
            visited.push(id);
            let Some(style) = self.doc.stylesheets.get(&id) else {
                trace!(stylesheet = id, "unknown stylesheet");
                return None;
            };
            match style.sheet.lookup(&key) {
                Some(cell) => match cell.state() {
                    CellState::Concrete => return Some(cell),
                    CellState::Inherited => {}
                    CellState::ThemeValue => {
                        if tables::is_theme_resolved_key(key.name()) {
                            return Some(cell);
                        }
                        if id == NO_STYLE_ID {
                            return None;
                        }
                        current = Some(NO_STYLE_ID);
                        continue;
                    }
                },
                None => {}
            }
            current = match category {
                StyleCategory::Fill => style.fill_parent,
                StyleCategory::Line => style.line_parent,
                StyleCategory::Text => style.text_parent,
            };
        }
        None
    }

    fn page_integer(&self, name: &str) -> Option<i64> {
        self.doc
            .page(self.page?)
            .sheet
            .cell(name)
            .and_then(Cell::integer)
    }

    fn integer(&self, shape: ShapeIdx, name: &str) -> Option<i64> {
        self.number(shape, name).map(|n| n.round() as i64)
    }

    /// Theme that applies to the shape (its own `ThemeIndex`, else the page's).
    pub fn theme(&self, shape: ShapeIdx) -> Option<&'d Theme> {
        let index = self
            .integer(shape, "ThemeIndex")
            .filter(|ix| *ix > 0 && *ix < 65_000)
            .or_else(|| self.page_integer("ThemeIndex"));
        self.doc.theme(index)
    }

    pub fn quick_style(&self, shape: ShapeIdx, connector: bool) -> QuickStyle {
        let int = |name: &str| self.integer(shape, name).unwrap_or(0);
        let variant = |name: &str| {
            self.integer(shape, name)
                .filter(|v| (0..VARIANT_COUNT as i64).contains(v))
                .or_else(|| self.page_integer(name))
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v < VARIANT_COUNT)
                .unwrap_or(0)
        };
        QuickStyle {
            fill_color: int("QuickStyleFillColor"),
            fill_matrix: int("QuickStyleFillMatrix"),
            line_color: int("QuickStyleLineColor"),
            line_matrix: int("QuickStyleLineMatrix"),
            font_color: int("QuickStyleFontColor"),
            font_matrix: int("QuickStyleFontMatrix"),
            effects_matrix: int("QuickStyleEffectsMatrix"),
            shadow_color: int("QuickStyleShadowColor"),
            variation: int("QuickStyleVariation"),
            color_variant: variant("VariationColorIndex"),
            style_variant: variant("VariationStyleIndex"),
            connector,
        }
    }

    /// Resolves a color property to RGB, going through the theme for `THEMEVAL()` cells.
    pub fn color(&self, shape: ShapeIdx, key: CellKey<'_>, connector: bool) -> Option<Rgb> {
        let cell = self.lookup(shape, key)?;
        match cell.state() {
            CellState::Concrete => self.doc.color(cell.value()),
            CellState::Inherited => None,
            CellState::ThemeValue => {
                let theme = self.theme(shape)?;
                let qs = self.quick_style(shape, connector);
                match key.name() {
                    "FillForegnd" => theme.fill_color(&qs),
                    "FillBkgnd" => theme.gradient_color(&qs).or_else(|| theme.fill_color(&qs)),
                    "LineColor" => theme.line_color(&qs),
                    "Color" => theme.font_color(&qs),
                    _ => None,
                }
            }
        }
    }

    /// Integer property, resolving `THEMEVAL()` line pattern, arrow and size cells
    /// through the theme.
    pub fn themed_integer(&self, shape: ShapeIdx, name: &str, connector: bool) -> Option<i64> {
        let cell = self.cell(shape, name)?;
        if cell.state() != CellState::ThemeValue {
            return cell.integer();
        }
        let qs = self.quick_style(shape, connector);
        let Some(theme) = self.theme(shape) else {
            return Some(theme_default(name));
        };
        Some(match name {
            "LinePattern" => theme.line_pattern(&qs),
            "BeginArrow" => theme.start_arrow(&qs),
            "EndArrow" => theme.end_arrow(&qs),
            "BeginArrowSize" => theme.start_arrow_size(&qs),
            "EndArrowSize" => theme.end_arrow_size(&qs),
            other => theme_default(other),
        })
    }

    /// `LineWeight` in inches.
    pub fn line_weight(&self, shape: ShapeIdx, connector: bool) -> Option<f64> {
        let cell = self.cell(shape, "LineWeight")?;
        match cell.state() {
            CellState::Concrete => cell.number(),
            CellState::Inherited => None,
            CellState::ThemeValue => {
                let qs = self.quick_style(shape, connector);
                self.theme(shape).map(|t| t.line_width(&qs))
            }
        }
    }
}

fn theme_default(name: &str) -> i64 {
    match name {
        "BeginArrowSize" | "EndArrowSize" => 4,
        "LinePattern" => 1,
        _ => 0,
    }
}
