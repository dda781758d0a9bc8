//! Page layout extraction using lopdf
//!
//! Interprets each page's content stream and produces positioned text spans
//! and image blocks. Coordinates are converted from PDF space (origin at the
//! bottom-left of the MediaBox) to a top-left origin with y growing downward,
//! so "below" on the rendered page means a larger `y`.

use crate::tounicode::ToUnicodeCMap;
use crate::AuditError;
use log::{debug, warn};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Fallback page size (US Letter) when no MediaBox can be resolved
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Limit for walking the page tree when resolving inherited attributes
const MAX_INHERIT_DEPTH: usize = 32;

/// Limit for nested form XObjects
const MAX_FORM_DEPTH: usize = 8;

/// Kerning (in thousandths of an em) wide enough to read as a word gap
const TJ_SPACE_THRESHOLD: f32 = 250.0;

/// Glyph width (thousandths of an em) assumed when the font gives none
const DEFAULT_GLYPH_WIDTH: f32 = 500.0;

/// Vertical distance under which consecutive spans share a text line
const LINE_Y_TOLERANCE: f32 = 3.0;

/// A text span with its bounding-box origin
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The decoded text
    pub text: String,
    /// Left edge, from the page's left side
    pub x: f32,
    /// Top edge, from the page's top side
    pub y: f32,
    /// Rendered font size
    pub font_size: f32,
}

/// A placed image with its bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    /// Left edge, from the page's left side
    pub x: f32,
    /// Top edge, from the page's top side
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One layout element on a page
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutPrimitive {
    Text(TextSpan),
    Image(ImageBlock),
}

impl LayoutPrimitive {
    /// Origin of the bounding box
    pub fn origin(&self) -> (f32, f32) {
        match self {
            LayoutPrimitive::Text(span) => (span.x, span.y),
            LayoutPrimitive::Image(image) => (image.x, image.y),
        }
    }

    pub fn as_text(&self) -> Option<&TextSpan> {
        match self {
            LayoutPrimitive::Text(span) => Some(span),
            LayoutPrimitive::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageBlock> {
        match self {
            LayoutPrimitive::Image(image) => Some(image),
            LayoutPrimitive::Text(_) => None,
        }
    }
}

/// Layout of a single page
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    /// Page number (1-indexed)
    pub number: u32,
    pub width: f32,
    pub height: f32,
    /// Primitives in content-stream order
    pub primitives: Vec<LayoutPrimitive>,
}

impl PageLayout {
    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.primitives.iter().filter_map(LayoutPrimitive::as_text)
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageBlock> {
        self.primitives.iter().filter_map(LayoutPrimitive::as_image)
    }

    /// Raw page text: consecutive spans on the same baseline joined by a
    /// space, lines joined by newlines
    pub fn text(&self) -> String {
        let mut lines: Vec<Vec<&TextSpan>> = Vec::new();

        for span in self.spans() {
            // Only the most recent line is a merge candidate, to keep stream order
            match lines.last_mut() {
                Some(line) if (line[0].y - span.y).abs() < LINE_Y_TOLERANCE => line.push(span),
                _ => lines.push(vec![span]),
            }
        }

        lines
            .into_iter()
            .map(|mut line| {
                line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
                line.iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Layout of a whole document
#[derive(Debug, Clone, Default)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    /// Whitespace-normalized text of all pages
    pub fn full_text(&self) -> String {
        let joined = self
            .pages
            .iter()
            .map(PageLayout::text)
            .collect::<Vec<_>>()
            .join(" ");
        crate::fields::clean(&joined)
    }
}

/// Extract the layout of a PDF file
pub fn extract_layout<P: AsRef<Path>>(path: P) -> Result<DocumentLayout, AuditError> {
    let doc = Document::load(path)?;
    Ok(layout_from_document(&doc))
}

/// Extract the layout of a PDF held in memory
pub fn extract_layout_mem(buffer: &[u8]) -> Result<DocumentLayout, AuditError> {
    let doc = Document::load_mem(buffer)?;
    Ok(layout_from_document(&doc))
}

/// Build the layout of a loaded document; undecodable pages come out empty
pub fn layout_from_document(doc: &Document) -> DocumentLayout {
    let mut pages = Vec::new();

    for (&page_num, &page_id) in doc.get_pages().iter() {
        let page = match extract_page(doc, page_id, page_num) {
            Ok(page) => page,
            Err(e) => {
                warn!("page {}: content not readable ({}), treating as empty", page_num, e);
                let media_box = media_box(doc, page_id);
                PageLayout {
                    number: page_num,
                    width: media_box[2] - media_box[0],
                    height: media_box[3] - media_box[1],
                    primitives: Vec::new(),
                }
            }
        };
        debug!(
            "page {}: {} spans, {} images",
            page.number,
            page.spans().count(),
            page.images().count()
        );
        pages.push(page);
    }

    DocumentLayout { pages }
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Resolve a page attribute, following `/Parent` links for inherited keys
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Ok(obj) = dict.get(key) {
            return doc.dereference(obj).ok().map(|(_, o)| o);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let Some(Ok(array)) = inherited(doc, page_id, b"MediaBox").map(Object::as_array) else {
        return DEFAULT_MEDIA_BOX;
    };
    let values: Vec<f32> = array.iter().filter_map(get_number).collect();
    match values.as_slice() {
        [x0, y0, x1, y1] => [x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)],
        _ => DEFAULT_MEDIA_BOX,
    }
}

/// Resolve a dictionary entry that may be an indirect reference
fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    doc.dereference(obj).ok()?.1.as_dict().ok()
}

/// Fonts declared in a resource dictionary, keyed by resource name
fn font_table<'a>(doc: &'a Document, resources: Option<&'a Dictionary>) -> BTreeMap<Vec<u8>, &'a Dictionary> {
    let mut fonts = BTreeMap::new();
    let Some(font_dict) = resources
        .and_then(|r| r.get(b"Font").ok())
        .and_then(|f| resolve_dict(doc, f))
    else {
        return fonts;
    };
    for (name, value) in font_dict.iter() {
        if let Some(font) = resolve_dict(doc, value) {
            fonts.insert(name.clone(), font);
        }
    }
    fonts
}

/// Extract the layout of a single page
fn extract_page(doc: &Document, page_id: ObjectId, page_num: u32) -> Result<PageLayout, AuditError> {
    let media_box = media_box(doc, page_id);
    let resources = inherited(doc, page_id, b"Resources").and_then(|r| r.as_dict().ok());

    let content_data = doc.get_page_content(page_id)?;
    let content = Content::decode(&content_data)?;

    let mut interpreter = Interpreter {
        doc,
        media_box,
        primitives: Vec::new(),
        cmaps: HashMap::new(),
    };
    interpreter.run(&content, resources, IDENTITY, 0);

    Ok(PageLayout {
        number: page_num,
        width: media_box[2] - media_box[0],
        height: media_box[3] - media_box[1],
        primitives: interpreter.primitives,
    })
}

/// Content-stream interpreter collecting primitives for one page
struct Interpreter<'a> {
    doc: &'a Document,
    media_box: [f32; 4],
    primitives: Vec<LayoutPrimitive>,
    /// ToUnicode maps per font dictionary, `None` when the font has none
    cmaps: HashMap<*const Dictionary, Option<ToUnicodeCMap>>,
}

impl<'a> Interpreter<'a> {
    fn run(&mut self, content: &Content, resources: Option<&'a Dictionary>, base_ctm: [f32; 6], depth: usize) {
        let fonts = font_table(self.doc, resources);

        // Graphics state tracking
        let mut ctm = base_ctm;
        let mut ctm_stack: Vec<[f32; 6]> = Vec::new();

        // Text state tracking
        let mut current_font: Option<&'a Dictionary> = None;
        let mut current_font_size: f32 = 12.0;
        let mut leading: f32 = 0.0;
        let mut text_matrix = IDENTITY;
        let mut line_matrix = IDENTITY;
        let mut in_text_block = false;
        // The last span is still open for the next show in this text object
        let mut chained = false;

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => ctm_stack.push(ctm),
                "Q" => {
                    if let Some(saved) = ctm_stack.pop() {
                        ctm = saved;
                    }
                    chained = false;
                }
                "cm" => {
                    if let Some(matrix) = matrix_from(operands) {
                        ctm = multiply_matrices(&matrix, &ctm);
                    }
                    chained = false;
                }
                "BT" => {
                    in_text_block = true;
                    chained = false;
                    text_matrix = IDENTITY;
                    line_matrix = IDENTITY;
                }
                "ET" => {
                    in_text_block = false;
                    chained = false;
                }
                "Tf" => {
                    chained = false;
                    if operands.len() >= 2 {
                        current_font = operands[0]
                            .as_name()
                            .ok()
                            .and_then(|name| fonts.get(name).copied());
                        if let Some(size) = get_number(&operands[1]) {
                            current_font_size = size;
                        }
                    }
                }
                "TL" => {
                    if let Some(l) = operands.first().and_then(get_number) {
                        leading = l;
                    }
                }
                "Td" | "TD" => {
                    chained = false;
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            leading = -ty;
                        }
                        line_matrix = multiply_matrices(&[1.0, 0.0, 0.0, 1.0, tx, ty], &line_matrix);
                        text_matrix = line_matrix;
                    }
                }
                "Tm" => {
                    chained = false;
                    if let Some(matrix) = matrix_from(operands) {
                        text_matrix = matrix;
                        line_matrix = matrix;
                    }
                }
                "T*" => {
                    chained = false;
                    line_matrix = next_line(&line_matrix, leading, current_font_size);
                    text_matrix = line_matrix;
                }
                "Tj" | "'" | "\"" => {
                    if op.operator != "Tj" {
                        line_matrix = next_line(&line_matrix, leading, current_font_size);
                        text_matrix = line_matrix;
                        chained = false;
                    }
                    if in_text_block {
                        if let Some(operand) = operands.last() {
                            if let Some(text) = self.decode(operand, current_font) {
                                chained = self.show_text(text, chained, current_font_size, &text_matrix, &ctm);
                                let advance = self.string_advance(current_font, operand);
                                text_matrix = advance_text(&text_matrix, advance * current_font_size);
                            }
                        }
                    }
                }
                "TJ" => {
                    if in_text_block {
                        if let Some(Ok(array)) = operands.first().map(Object::as_array) {
                            let mut combined = String::new();
                            let mut advance = 0.0;
                            for item in array {
                                if let Some(text) = self.decode(item, current_font) {
                                    combined.push_str(&text);
                                    advance += self.string_advance(current_font, item);
                                } else if let Some(k) = get_number(item) {
                                    advance -= k / 1000.0;
                                    if -k > TJ_SPACE_THRESHOLD && !combined.ends_with(' ') {
                                        combined.push(' ');
                                    }
                                }
                            }
                            chained = self.show_text(combined, chained, current_font_size, &text_matrix, &ctm);
                            text_matrix = advance_text(&text_matrix, advance * current_font_size);
                        }
                    }
                }
                "Do" => {
                    chained = false;
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        self.place_xobject(name, resources, &ctm, depth);
                    }
                }
                _ => {}
            }
        }
    }

    /// Emit shown text, extending the open span when the show continues it.
    /// Returns whether a span is open afterwards.
    fn show_text(
        &mut self,
        text: String,
        continues: bool,
        font_size: f32,
        text_matrix: &[f32; 6],
        ctm: &[f32; 6],
    ) -> bool {
        if continues {
            if let Some(LayoutPrimitive::Text(span)) = self.primitives.last_mut() {
                span.text.push_str(&text);
                return true;
            }
        }
        self.push_span(text, font_size, text_matrix, ctm)
    }

    fn push_span(&mut self, text: String, font_size: f32, text_matrix: &[f32; 6], ctm: &[f32; 6]) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let rendered_size = effective_font_size(font_size, text_matrix);
        let combined = multiply_matrices(text_matrix, ctm);
        let (x, baseline) = (combined[4], combined[5]);
        self.primitives.push(LayoutPrimitive::Text(TextSpan {
            text,
            x: x - self.media_box[0],
            y: self.media_box[3] - (baseline + rendered_size),
            font_size: rendered_size,
        }));
        true
    }

    /// Horizontal advance of a string operand in em units, from the font's
    /// `/Widths` when present
    fn string_advance(&self, font: Option<&Dictionary>, obj: &Object) -> f32 {
        let Object::String(bytes, _) = obj else {
            return 0.0;
        };
        let Some(font) = font else {
            return bytes.len() as f32 * DEFAULT_GLYPH_WIDTH / 1000.0;
        };
        if matches!(font.get(b"Subtype").and_then(Object::as_name), Ok(b"Type0")) {
            return (bytes.len() / 2) as f32 * DEFAULT_GLYPH_WIDTH / 1000.0;
        }

        let first_char = font.get(b"FirstChar").ok().and_then(get_number).unwrap_or(0.0) as usize;
        let widths: Vec<f32> = font
            .get(b"Widths")
            .ok()
            .and_then(|w| self.doc.dereference(w).ok())
            .and_then(|(_, w)| w.as_array().ok())
            .map(|array| array.iter().filter_map(get_number).collect())
            .unwrap_or_default();

        let total: f32 = bytes
            .iter()
            .map(|&code| {
                (code as usize)
                    .checked_sub(first_char)
                    .and_then(|i| widths.get(i))
                    .copied()
                    .unwrap_or(DEFAULT_GLYPH_WIDTH)
            })
            .sum();
        total / 1000.0
    }

    /// Handle a `Do` operator: record images, descend into form XObjects
    fn place_xobject(&mut self, name: &[u8], resources: Option<&'a Dictionary>, ctm: &[f32; 6], depth: usize) {
        let doc = self.doc;
        let Some(stream) = resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|x| resolve_dict(doc, x))
            .and_then(|x| x.get(name).ok())
            .and_then(|obj| doc.dereference(obj).ok())
            .and_then(|(_, obj)| obj.as_stream().ok())
        else {
            debug!("XObject /{} not found in resources", String::from_utf8_lossy(name));
            return;
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => {
                let image = self.image_bbox(ctm);
                self.primitives.push(LayoutPrimitive::Image(image));
            }
            Ok(b"Form") if depth < MAX_FORM_DEPTH => {
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                let content = match Content::decode(&content) {
                    Ok(content) => content,
                    Err(e) => {
                        warn!("form XObject /{} not decodable: {}", String::from_utf8_lossy(name), e);
                        return;
                    }
                };
                let matrix = stream
                    .dict
                    .get(b"Matrix")
                    .and_then(Object::as_array)
                    .ok()
                    .and_then(|m| matrix_from(m))
                    .unwrap_or(IDENTITY);
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve_dict(doc, r))
                    .or(resources);
                self.run(&content, form_resources, multiply_matrices(&matrix, ctm), depth + 1);
            }
            _ => {}
        }
    }

    /// Bounding box of the unit square mapped through the CTM
    fn image_bbox(&self, ctm: &[f32; 6]) -> ImageBlock {
        let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
        let (mut x_min, mut x_max) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut y_min, mut y_max) = (f32::INFINITY, f32::NEG_INFINITY);
        for (u, v) in corners {
            let x = u * ctm[0] + v * ctm[2] + ctm[4];
            let y = u * ctm[1] + v * ctm[3] + ctm[5];
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        ImageBlock {
            x: x_min - self.media_box[0],
            y: self.media_box[3] - y_max,
            width: x_max - x_min,
            height: y_max - y_min,
        }
    }

    /// Decode a string operand, preferring the font's ToUnicode map
    fn decode(&mut self, obj: &Object, font: Option<&'a Dictionary>) -> Option<String> {
        let Object::String(bytes, _) = obj else {
            return None;
        };

        if let Some(font) = font {
            let doc = self.doc;
            let cmap = self
                .cmaps
                .entry(font as *const Dictionary)
                .or_insert_with(|| ToUnicodeCMap::for_font(doc, font));
            if let Some(cmap) = cmap {
                return Some(cmap.decode(bytes));
            }
            if let Ok(encoding) = font.get_font_encoding(doc) {
                if let Ok(text) = Document::decode_text(&encoding, bytes) {
                    return Some(text);
                }
            }
        }

        // Fallback: try UTF-16BE then Latin-1
        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            let utf16: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                .collect();
            return Some(String::from_utf16_lossy(&utf16));
        }

        Some(bytes.iter().map(|&b| b as char).collect())
    }
}

/// Move the text matrix right by `tx` unscaled text-space units
fn advance_text(text_matrix: &[f32; 6], tx: f32) -> [f32; 6] {
    multiply_matrices(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], text_matrix)
}

/// Move the line matrix down one line
fn next_line(line_matrix: &[f32; 6], leading: f32, font_size: f32) -> [f32; 6] {
    // Without an explicit TL, approximate the leading from the font size
    let leading = if leading != 0.0 { leading } else { font_size * 1.2 };
    multiply_matrices(&[1.0, 0.0, 0.0, 1.0, 0.0, -leading], line_matrix)
}

/// Read six numeric operands as a matrix
fn matrix_from(operands: &[Object]) -> Option<[f32; 6]> {
    if operands.len() < 6 {
        return None;
    }
    let mut matrix = IDENTITY;
    for (slot, operand) in matrix.iter_mut().zip(operands) {
        *slot = get_number(operand)?;
    }
    Some(matrix)
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Compute effective font size from base size and text matrix
fn effective_font_size(base_size: f32, text_matrix: &[f32; 6]) -> f32 {
    let scale_x = (text_matrix[0].powi(2) + text_matrix[1].powi(2)).sqrt();
    let scale_y = (text_matrix[2].powi(2) + text_matrix[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32) -> LayoutPrimitive {
        LayoutPrimitive::Text(TextSpan {
            text: text.into(),
            x,
            y,
            font_size: 10.0,
        })
    }

    #[test]
    fn test_page_text_groups_lines() {
        let page = PageLayout {
            number: 1,
            width: 595.0,
            height: 842.0,
            primitives: vec![
                span("World", 160.0, 100.0),
                span("Hello", 100.0, 101.0),
                LayoutPrimitive::Image(ImageBlock {
                    x: 0.0,
                    y: 120.0,
                    width: 10.0,
                    height: 10.0,
                }),
                span("Next", 100.0, 140.0),
            ],
        };
        assert_eq!(page.text(), "Hello World\nNext");
    }

    #[test]
    fn test_full_text_is_cleaned() {
        let layout = DocumentLayout {
            pages: vec![
                PageLayout {
                    number: 1,
                    primitives: vec![span("Projeto:  A1", 10.0, 10.0)],
                    ..Default::default()
                },
                PageLayout {
                    number: 2,
                    primitives: vec![span("Nota: 9", 10.0, 10.0), span("fim", 10.0, 40.0)],
                    ..Default::default()
                },
            ],
        };
        assert_eq!(layout.full_text(), "Projeto: A1 Nota: 9 fim");
    }

    #[test]
    fn test_multiply_matrices_translation() {
        let scaled = [2.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let moved = [1.0, 0.0, 0.0, 1.0, 10.0, 20.0];
        assert_eq!(multiply_matrices(&moved, &scaled), [2.0, 0.0, 0.0, 2.0, 20.0, 40.0]);
    }

    #[test]
    fn test_image_bbox_flips_to_top_origin() {
        let doc = Document::with_version("1.5");
        let interpreter = Interpreter {
            doc: &doc,
            media_box: [0.0, 0.0, 600.0, 800.0],
            primitives: Vec::new(),
            cmaps: HashMap::new(),
        };
        let image = interpreter.image_bbox(&[200.0, 0.0, 0.0, 100.0, 50.0, 500.0]);
        assert_eq!(
            image,
            ImageBlock {
                x: 50.0,
                y: 200.0,
                width: 200.0,
                height: 100.0
            }
        );
    }

    #[test]
    fn test_string_advance_uses_font_widths() {
        let doc = Document::with_version("1.5");
        let interpreter = Interpreter {
            doc: &doc,
            media_box: [0.0, 0.0, 600.0, 800.0],
            primitives: Vec::new(),
            cmaps: HashMap::new(),
        };
        let mut font = Dictionary::new();
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("FirstChar", Object::Integer(65));
        font.set("Widths", Object::Array(vec![Object::Integer(600), Object::Integer(400)]));

        let shown = Object::string_literal("ABZ");
        // Z lies outside the table and takes the default width
        assert!((interpreter.string_advance(Some(&font), &shown) - 1.5).abs() < 1e-6);
        assert!((interpreter.string_advance(None, &shown) - 1.5).abs() < 1e-6);
        assert_eq!(advance_text(&IDENTITY, 15.0), [1.0, 0.0, 0.0, 1.0, 15.0, 0.0]);
    }

    #[test]
    fn test_matrix_from_requires_six_numbers() {
        let ops = vec![Object::Integer(1), Object::Integer(0)];
        assert!(matrix_from(&ops).is_none());
        let ops: Vec<Object> = (0..6).map(|i| Object::Integer(i)).collect();
        assert_eq!(matrix_from(&ops), Some([0.0, 1.0, 2.0, 3.0, 4.0, 5.0]));
    }
}
