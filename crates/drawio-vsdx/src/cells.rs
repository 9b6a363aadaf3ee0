// crates/drawio-vsdx/src/cells.rs
//
// ShapeSheet records: flat `<Cell>`s plus `<Section>`s of indexed `<Row>`s.

use crate::xml::Element;
use std::collections::BTreeMap;

pub const THEMED: &str = "Themed";
pub const INHERIT: &str = "Inh";
pub const THEME_VAL: &str = "THEMEVAL()";

/// Inches to screen units (40 units per centimetre).
pub const CONVERSION_FACTOR: f64 = 40.0 * 2.54;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: Option<String>,
    pub formula: Option<String>,
    pub unit: Option<String>,
}

/// How a cell takes part in style resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Concrete,
    /// `F="Inh"` with a themed value: ask the parent stylesheet.
    Inherited,
    /// `F="THEMEVAL()"` (or another theme formula) with a themed value.
    ThemeValue,
}

impl Cell {
    pub fn new(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            formula: None,
            unit: None,
        }
    }

    pub fn with_formula(value: &str, formula: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            formula: Some(formula.to_string()),
            unit: None,
        }
    }

    fn from_element(e: &Element) -> Self {
        Self {
            value: e.attr("V").map(str::to_string),
            formula: e.attr("F").map(str::to_string),
            unit: e.attr("U").map(str::to_string),
        }
    }

    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    pub fn formula(&self) -> &str {
        self.formula.as_deref().unwrap_or("")
    }

    pub fn is_themed(&self) -> bool {
        self.value() == THEMED
    }

    pub fn state(&self) -> CellState {
        if !self.is_themed() {
            CellState::Concrete
        } else if self.formula() == INHERIT || self.formula().is_empty() {
            CellState::Inherited
        } else {
            CellState::ThemeValue
        }
    }

    pub fn number(&self) -> Option<f64> {
        let v = self.value.as_deref()?.trim();
        v.parse::<f64>().ok().filter(|n| n.is_finite())
    }

    pub fn integer(&self) -> Option<i64> {
        let n = self.number()?;
        Some(n.round() as i64)
    }

    /// Length cell converted from inches to screen units.
    pub fn screen(&self) -> Option<f64> {
        self.number().map(|n| n * CONVERSION_FACTOR)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub index: Option<u32>,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub deleted: bool,
    pub cells: BTreeMap<String, Cell>,
}

impl Row {
    fn from_element(e: &Element) -> Self {
        Self {
            index: e.attr("IX").and_then(|v| v.trim().parse().ok()),
            name: e.attr("N").map(str::to_string),
            kind: e.attr("T").map(str::to_string),
            deleted: e.attr("Del") == Some("1"),
            cells: collect_cells(e),
        }
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.cell(name).and_then(Cell::number)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub name: String,
    pub index: Option<u32>,
    pub deleted: bool,
    pub cells: BTreeMap<String, Cell>,
    pub rows: Vec<Row>,
}

impl Section {
    fn from_element(e: &Element) -> Self {
        Self {
            name: e.attr("N").unwrap_or_default().to_string(),
            index: e.attr("IX").and_then(|v| v.trim().parse().ok()),
            deleted: e.attr("Del") == Some("1"),
            cells: collect_cells(e),
            rows: e.children_named("Row").map(Row::from_element).collect(),
        }
    }

    /// Row by `IX`, falling back to document position for rows written without one.
    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows
            .iter()
            .find(|r| r.index == Some(index))
            .or_else(|| {
                self.rows
                    .get(index as usize)
                    .filter(|r| r.index.is_none())
            })
    }

    pub fn row_named(&self, name: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.name.as_deref() == Some(name))
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.cells.get(name).map(|c| c.value() == "1")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub cells: BTreeMap<String, Cell>,
    pub sections: Vec<Section>,
}

impl Sheet {
    pub fn from_element(e: &Element) -> Self {
        Self {
            cells: collect_cells(e),
            sections: e.children_named("Section").map(Section::from_element).collect(),
        }
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.cell(name).and_then(Cell::number)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn sections_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Section> {
        self.sections.iter().filter(move |s| s.name == name)
    }

    pub fn indexed_cell(&self, section: &str, index: u32, name: &str) -> Option<&Cell> {
        self.section(section)?.row(index)?.cell(name)
    }

    pub fn lookup(&self, key: &CellKey<'_>) -> Option<&Cell> {
        match *key {
            CellKey::Flat(name) => self.cell(name),
            CellKey::Indexed {
                section,
                index,
                name,
            } => self.indexed_cell(section, index, name),
        }
    }

    pub fn insert(&mut self, name: &str, cell: Cell) {
        self.cells.insert(name.to_string(), cell);
    }
}

/// Address of a property: a flat cell, or a cell in an indexed section row
/// (per-character and per-paragraph data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKey<'a> {
    Flat(&'a str),
    Indexed {
        section: &'a str,
        index: u32,
        name: &'a str,
    },
}

impl<'a> CellKey<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            CellKey::Flat(name) => name,
            CellKey::Indexed { name, .. } => name,
        }
    }
}

fn collect_cells(e: &Element) -> BTreeMap<String, Cell> {
    let mut out = BTreeMap::new();
    for cell in e.children_named("Cell") {
        if let Some(name) = cell.attr("N") {
            out.insert(name.to_string(), Cell::from_element(cell));
        }
    }
    out
}
