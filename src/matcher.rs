//! Photo-presence matching
//!
//! Report pages list inspected items down the left margin and, for each
//! item, a block of captioned photo slots ("Foto inspeção", "Foto execução",
//! ...). A slot counts as filled when an image sits directly below its
//! caption, inside a tolerance window. There is no structural link between
//! captions and images in the PDF, so both the caption/image pairing and the
//! caption/item grouping are positional heuristics.

use crate::layout::{DocumentLayout, ImageBlock, LayoutPrimitive, PageLayout, TextSpan};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Tolerances for the presence test
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Maximum horizontal offset between caption and image origins (default: 100)
    pub horizontal_tolerance: f32,
    /// Maximum distance from caption down to image origin (default: 400)
    pub vertical_tolerance: f32,
    /// Item codes must start left of this x position (default: 50)
    pub margin_threshold: f32,
    /// Photo captions per inspected item (default: 4)
    pub labels_per_item: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            horizontal_tolerance: 100.0,
            vertical_tolerance: 400.0,
            margin_threshold: 50.0,
            labels_per_item: 4,
        }
    }
}

/// The four photo slots each inspected item requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoCategory {
    Inspection,
    Execution,
    BeforeCollection,
    AfterCollection,
}

static PROMPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)foto inspeção|foto execução|foto antes da recolha|foto depois da recolha").unwrap()
});

impl PhotoCategory {
    pub const ALL: [PhotoCategory; 4] = [
        PhotoCategory::Inspection,
        PhotoCategory::Execution,
        PhotoCategory::BeforeCollection,
        PhotoCategory::AfterCollection,
    ];

    /// Caption text, lowercase
    pub fn prompt(self) -> &'static str {
        match self {
            PhotoCategory::Inspection => "foto inspeção",
            PhotoCategory::Execution => "foto execução",
            PhotoCategory::BeforeCollection => "foto antes da recolha",
            PhotoCategory::AfterCollection => "foto depois da recolha",
        }
    }

    /// Caption without the "foto " prefix, capitalized
    pub fn display_name(self) -> &'static str {
        match self {
            PhotoCategory::Inspection => "Inspeção",
            PhotoCategory::Execution => "Execução",
            PhotoCategory::BeforeCollection => "Antes da recolha",
            PhotoCategory::AfterCollection => "Depois da recolha",
        }
    }

    /// The category whose caption occurs first in `text`, if any
    pub fn detect(text: &str) -> Option<Self> {
        let found = PROMPT_RE.find(text)?.as_str().to_lowercase();
        Self::ALL.into_iter().find(|c| c.prompt() == found)
    }
}

impl Ord for PhotoCategory {
    fn cmp(&self, other: &Self) -> Ordering {
        self.display_name().cmp(other.display_name())
    }
}

impl PartialOrd for PhotoCategory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PhotoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Identifier of an inspected item; empty when a caption has no item
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemCode(pub String);

impl ItemCode {
    pub fn unassigned() -> Self {
        Self::default()
    }

    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_numeric(&self) -> bool {
        is_digits(&self.0)
    }
}

impl From<&str> for ItemCode {
    fn from(code: &str) -> Self {
        ItemCode(code.to_string())
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unassigned() {
            f.write_str("(código não informado)")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// A recognized photo caption
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoLabel {
    pub category: PhotoCategory,
    pub x: f32,
    pub y: f32,
}

/// Outcome of the presence test for one caption
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVerdict {
    pub label: PhotoLabel,
    pub code: ItemCode,
    pub present: bool,
}

/// Per-page matching result
#[derive(Debug, Clone, Default)]
pub struct PageFindings {
    pub codes: Vec<ItemCode>,
    pub verdicts: Vec<LabelVerdict>,
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Item codes from the left margin, top to bottom, first occurrence wins
pub fn collect_item_codes(primitives: &[LayoutPrimitive], margin_threshold: f32) -> Vec<ItemCode> {
    let mut candidates: Vec<&TextSpan> = primitives
        .iter()
        .filter_map(LayoutPrimitive::as_text)
        .filter(|span| span.x < margin_threshold && is_digits(span.text.trim()))
        .collect();
    // Stable, so spans on the same row keep stream order
    candidates.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal));

    let mut codes: Vec<ItemCode> = Vec::new();
    for span in candidates {
        let code = ItemCode::from(span.text.trim());
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

/// Photo captions in document order
pub fn collect_labels(primitives: &[LayoutPrimitive]) -> Vec<PhotoLabel> {
    primitives
        .iter()
        .filter_map(LayoutPrimitive::as_text)
        .filter_map(|span| {
            PhotoCategory::detect(span.text.trim()).map(|category| PhotoLabel {
                category,
                x: span.x,
                y: span.y,
            })
        })
        .collect()
}

pub fn collect_images(primitives: &[LayoutPrimitive]) -> Vec<&ImageBlock> {
    primitives.iter().filter_map(LayoutPrimitive::as_image).collect()
}

/// Item code owning the caption at `index`.
///
/// Assumes every item has exactly `labels_per_item` captions laid out in
/// order; this is a layout convention of the reports, not something the PDF
/// encodes. Captions past the last code map to the unassigned code.
pub fn code_for_label(index: usize, codes: &[ItemCode], labels_per_item: usize) -> ItemCode {
    codes
        .get(index / labels_per_item.max(1))
        .cloned()
        .unwrap_or_default()
}

/// Whether any image lies below the caption inside the tolerance window
pub fn is_satisfied(label: &PhotoLabel, images: &[&ImageBlock], config: &MatchConfig) -> bool {
    images.iter().any(|image| {
        let dy = image.y - label.y;
        (image.x - label.x).abs() <= config.horizontal_tolerance && dy > 0.0 && dy <= config.vertical_tolerance
    })
}

/// Run the presence test over one page's primitives
pub fn match_primitives(primitives: &[LayoutPrimitive], config: &MatchConfig) -> PageFindings {
    let codes = collect_item_codes(primitives, config.margin_threshold);
    let images = collect_images(primitives);

    let verdicts = collect_labels(primitives)
        .into_iter()
        .enumerate()
        .map(|(idx, label)| LabelVerdict {
            code: code_for_label(idx, &codes, config.labels_per_item),
            present: is_satisfied(&label, &images, config),
            label,
        })
        .collect();

    PageFindings { codes, verdicts }
}

pub fn match_page(page: &PageLayout, config: &MatchConfig) -> PageFindings {
    let findings = match_primitives(&page.primitives, config);
    debug!(
        "page {}: {} codes, {} captions, {} unfilled",
        page.number,
        findings.codes.len(),
        findings.verdicts.len(),
        findings.verdicts.iter().filter(|v| !v.present).count()
    );
    findings
}

/// Missing photo categories grouped by item code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingPhotos {
    by_code: HashMap<ItemCode, BTreeSet<PhotoCategory>>,
}

impl MissingPhotos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, code: ItemCode, category: PhotoCategory) {
        self.by_code.entry(code).or_default().insert(category);
    }

    /// Record every unfilled caption of a page
    pub fn absorb(&mut self, findings: &PageFindings) {
        for verdict in findings.verdicts.iter().filter(|v| !v.present) {
            self.record(verdict.code.clone(), verdict.label.category);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Number of item codes with at least one missing photo
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn get(&self, code: &ItemCode) -> Option<&BTreeSet<PhotoCategory>> {
        self.by_code.get(code)
    }

    /// Entries with numeric codes first (highest value first), then the
    /// remaining codes in descending order; categories stay alphabetical
    pub fn sorted_entries(&self) -> Vec<(&ItemCode, &BTreeSet<PhotoCategory>)> {
        let mut entries: Vec<_> = self.by_code.iter().collect();
        entries.sort_by(|(a, _), (b, _)| compare_codes(a, b));
        entries
    }

    /// One display line per affected item
    pub fn lines(&self) -> Vec<String> {
        self.sorted_entries()
            .into_iter()
            .map(|(code, categories)| {
                let names: Vec<&str> = categories.iter().map(|c| c.display_name()).collect();
                format!("codigo {} : {}", code, names.join(", "))
            })
            .collect()
    }
}

/// Listing order for item codes
fn compare_codes(a: &ItemCode, b: &ItemCode) -> Ordering {
    match (a.is_numeric(), b.is_numeric()) {
        (true, true) => numeric_key(b.as_str())
            .cmp(&numeric_key(a.as_str()))
            .then_with(|| b.as_str().cmp(a.as_str())),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => b.as_str().cmp(a.as_str()),
    }
}

/// Orders digit strings by value without overflowing
fn numeric_key(digits: &str) -> (usize, &str) {
    let trimmed = digits.trim_start_matches('0');
    (trimmed.len(), trimmed)
}

/// Match every page of a document and collect the missing photos
pub fn audit_layout(layout: &DocumentLayout, config: &MatchConfig) -> MissingPhotos {
    let mut missing = MissingPhotos::new();
    for page in &layout.pages {
        missing.absorb(&match_page(page, config));
    }
    missing
}
