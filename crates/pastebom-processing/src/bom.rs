//! BOM tables: grouping components into rows the viewer lists.

use crate::config::GenerationConfig;
use crate::parser::{Component, Side};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// `(reference, component index)`
pub type BomRef = (String, usize);
pub type BomRow = Vec<BomRef>;

/// Grouped BOM as embedded in the board data under `bom`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BomSummary {
    pub both: Vec<BomRow>,
    #[serde(rename = "F")]
    pub front: Vec<BomRow>,
    #[serde(rename = "B")]
    pub back: Vec<BomRow>,
    /// Indices of components left out of every table
    pub skipped: Vec<usize>,
    /// Displayed column values per component index, in `show_fields` order
    pub fields: BTreeMap<usize, Vec<Value>>,
}

const SORT_FALLBACK: &str = "~";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Number(u64),
    Text(String),
}

/// Sort key that orders `R2` before `R10`.
fn natural_key(reference: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    let mut flush = |current: &mut String, digits: bool| {
        if current.is_empty() {
            return;
        }
        let chunk = if digits {
            current
                .parse()
                .map(Chunk::Number)
                .unwrap_or_else(|_| Chunk::Text(current.clone()))
        } else {
            Chunk::Text(current.to_lowercase())
        };
        chunks.push(chunk);
        current.clear();
    };

    for c in reference.chars() {
        let digit = c.is_ascii_digit();
        if digit != in_digits {
            flush(&mut current, in_digits);
            in_digits = digit;
        }
        current.push(c);
    }
    flush(&mut current, in_digits);
    chunks
}

/// Leading run of uppercase ASCII letters, used for `PREFIX*` blacklist entries.
fn blacklist_prefix(reference: &str) -> &str {
    let end = reference
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(reference.len());
    &reference[..end]
}

/// Everything before the first digit, used for row ordering.
fn sort_prefix(reference: &str) -> &str {
    let end = reference
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(reference.len());
    &reference[..end]
}

fn is_skipped(component: &Component, config: &GenerationConfig) -> bool {
    let blacklist = &config.component_blacklist;
    if blacklist.contains(&component.reference) {
        return true;
    }

    let wildcard = format!("{}*", blacklist_prefix(&component.reference));
    if blacklist.contains(&wildcard) {
        return true;
    }

    if config.blacklist_empty_val && (component.val.is_empty() || component.val == "~") {
        return true;
    }

    if config.blacklist_virtual && component.attr.as_deref() == Some("Virtual") {
        return true;
    }

    !config.dnp_field.is_empty() && !extra_field(component, &config.dnp_field, config).is_empty()
}

/// Extra field lookup. With `normalize_field_case` the name matches board keys in any case.
fn extra_field<'a>(component: &'a Component, name: &str, config: &GenerationConfig) -> &'a str {
    let value = if config.normalize_field_case {
        component
            .extra_fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    } else {
        component.extra_fields.get(name)
    };
    value.map(String::as_str).unwrap_or("")
}

/// Only fields that are also displayed take part in grouping.
fn group_key(component: &Component, config: &GenerationConfig) -> Vec<String> {
    let mut key = Vec::new();
    for field in config
        .group_fields
        .iter()
        .filter(|field| config.show_fields.contains(*field))
    {
        match field.as_str() {
            "Value" => key.push(component.val.clone()),
            "Footprint" => {
                key.push(component.footprint.clone());
                key.push(component.attr.clone().unwrap_or_default());
            }
            other => key.push(extra_field(component, other, config).to_string()),
        }
    }
    key
}

fn display_fields(component: &Component, config: &GenerationConfig) -> Vec<String> {
    config
        .show_fields
        .iter()
        .map(|field| match field.as_str() {
            "Value" => component.val.clone(),
            "Footprint" => component.footprint.clone(),
            other => extra_field(component, other, config).to_string(),
        })
        .collect()
}

fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Columns other than Value and Footprint whose non-blank cells are all digits
/// become integer columns, so the viewer sorts them numerically.
fn typed_fields(
    raw: BTreeMap<usize, Vec<String>>,
    config: &GenerationConfig,
) -> BTreeMap<usize, Vec<Value>> {
    let numeric: Vec<bool> = config
        .show_fields
        .iter()
        .enumerate()
        .map(|(column, field)| {
            field != "Value"
                && field != "Footprint"
                && raw
                    .values()
                    .all(|row| is_all_digits(&row[column]) || row[column].trim().is_empty())
        })
        .collect();

    raw.into_iter()
        .map(|(index, row)| {
            let row = row
                .into_iter()
                .zip(&numeric)
                .map(|(cell, &numeric)| match cell.parse::<u64>() {
                    Ok(n) if numeric && is_all_digits(&cell) => Value::from(n),
                    _ => Value::String(cell),
                })
                .collect();
            (index, row)
        })
        .collect()
}

struct RowOrder<'a> {
    sort_order: &'a [String],
    fallback: usize,
}

impl<'a> RowOrder<'a> {
    fn new(sort_order: &'a [String]) -> Self {
        let fallback = sort_order
            .iter()
            .position(|p| p == SORT_FALLBACK)
            .unwrap_or(sort_order.len());
        RowOrder {
            sort_order,
            fallback,
        }
    }

    fn rank(&self, reference: &str) -> usize {
        let prefix = sort_prefix(reference);
        self.sort_order
            .iter()
            .position(|p| p == prefix)
            .unwrap_or(self.fallback)
    }

    fn compare(&self, a: &BomRow, b: &BomRow) -> Ordering {
        let (Some(first_a), Some(first_b)) = (a.first(), b.first()) else {
            return b.len().cmp(&a.len());
        };
        self.rank(&first_a.0)
            .cmp(&self.rank(&first_b.0))
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| natural_key(&first_a.0).cmp(&natural_key(&first_b.0)))
    }

    fn sort(&self, rows: &mut [BomRow]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }
}

fn sort_refs(refs: &mut BomRow) {
    refs.sort_by(|a, b| {
        natural_key(&a.0)
            .cmp(&natural_key(&b.0))
            .then_with(|| a.1.cmp(&b.1))
    });
}

/// Build the grouped BOM for `components` under `config`.
pub fn generate_bom(components: &[Component], config: &GenerationConfig) -> BomSummary {
    let mut skipped = Vec::new();
    let mut raw_fields = BTreeMap::new();
    let mut group_index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<BomRow> = Vec::new();

    for (index, component) in components.iter().enumerate() {
        if is_skipped(component, config) {
            skipped.push(index);
            continue;
        }

        raw_fields.insert(index, display_fields(component, config));

        let key = group_key(component, config);
        let slot = *group_index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push((component.reference.clone(), index));
    }

    for refs in &mut groups {
        sort_refs(refs);
    }

    let order = RowOrder::new(&config.component_sort_order);
    order.sort(&mut groups);

    let side_table = |side: Side| {
        let mut rows: Vec<BomRow> = groups
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|(_, index)| components[*index].layer == side)
                    .cloned()
                    .collect::<BomRow>()
            })
            .filter(|row| !row.is_empty())
            .collect();
        order.sort(&mut rows);
        rows
    };
    let front = side_table(Side::Front);
    let back = side_table(Side::Back);

    BomSummary {
        both: groups,
        front,
        back,
        skipped,
        fields: typed_fields(raw_fields, config),
    }
}
