//! Positioned text extraction from PDF using lopdf
//!
//! Walks each page content stream, tracking the CTM and text matrix, and
//! records every shown string with its page-space position. Table detection
//! works on these items; nothing downstream reads PDF structure.

use crate::BomError;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// US Letter, used when a page has no readable MediaBox
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Approximate glyph advance as a fraction of font size
const AVG_CHAR_WIDTH: f32 = 0.5;

/// A text item with position information
#[derive(Debug, Clone)]
pub struct TextItem {
    /// The text content
    pub text: String,
    /// X position on the displayed page
    pub x: f32,
    /// Y position on the displayed page (origin at bottom-left)
    pub y: f32,
    /// Estimated width of text
    pub width: f32,
    /// Height (approximated from font size)
    pub height: f32,
    /// Font name
    pub font: String,
    /// Font size
    pub font_size: f32,
    /// Page number (1-indexed)
    pub page: u32,
}

/// Text of one page together with its dimensions
#[derive(Debug, Clone, Default)]
pub struct PageText {
    /// Position in the document (0-based)
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub items: Vec<TextItem>,
}

/// Load a PDF file and extract positioned text per page
pub fn extract_pages<P: AsRef<Path>>(path: P) -> Result<Vec<PageText>, BomError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(BomError::NotFound(path.to_path_buf()));
    }
    let doc = Document::load(path)?;
    extract_pages_from_doc(&doc)
}

/// Extract positioned text per page from a memory buffer
pub fn extract_pages_mem(buffer: &[u8]) -> Result<Vec<PageText>, BomError> {
    let doc = Document::load_mem(buffer)?;
    extract_pages_from_doc(&doc)
}

/// Extract positioned text per page from a loaded document.
///
/// Pages carrying a `/Rotate` entry are reported in their displayed
/// orientation: width and height are swapped for quarter turns and item
/// positions are mapped accordingly.
pub fn extract_pages_from_doc(doc: &Document) -> Result<Vec<PageText>, BomError> {
    if doc.is_encrypted() {
        return Err(BomError::Encrypted);
    }

    doc.get_pages()
        .iter()
        .enumerate()
        .map(|(index, (&page_num, &page_id))| {
            let (width, height) = page_size(doc, page_id);
            let rotation = page_rotation(doc, page_id);
            let mut items = extract_page_text_items(doc, page_id, page_num)?;
            for item in &mut items {
                (item.x, item.y) = rotate_point(item.x, item.y, width, height, rotation);
            }
            let (width, height) = match rotation {
                90 | 270 => (height, width),
                _ => (width, height),
            };
            Ok(PageText {
                index,
                width,
                height,
                items,
            })
        })
        .collect()
}

/// Look up a page attribute, following inherited values up the page tree
fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = Some(page_id);
    let mut depth = 0;

    while let Some(id) = current {
        let dict = doc.get_object(id).and_then(Object::as_dict).ok()?;

        if let Ok(value) = dict.get(key) {
            return match value {
                Object::Reference(r) => doc.get_object(*r).ok(),
                other => Some(other),
            };
        }

        // Page trees are shallow; the cap guards against cyclic Parent links
        depth += 1;
        if depth > 32 {
            break;
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

/// Unrotated page width and height from the MediaBox
fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|media_box| media_box.as_array().ok())
        .map(|values| values.iter().filter_map(get_number).collect::<Vec<f32>>())
        .filter(|nums| nums.len() >= 4)
        .map(|nums| ((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs()))
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Clockwise display rotation in degrees: 0, 90, 180 or 270
fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    let degrees = inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|value| value.as_i64().ok())
        .unwrap_or(0);
    let normalized = degrees.rem_euclid(360);
    if normalized % 90 != 0 {
        log::warn!("ignoring invalid page rotation {}", degrees);
        return 0;
    }
    normalized
}

/// Map a point from unrotated page space into the displayed page,
/// both with bottom-left origin
fn rotate_point(x: f32, y: f32, width: f32, height: f32, rotation: i64) -> (f32, f32) {
    match rotation {
        90 => (y, width - x),
        180 => (width - x, height - y),
        270 => (height - y, x),
        _ => (x, y),
    }
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

/// Text state while walking a content stream
struct TextState {
    ctm: [f32; 6],
    text_matrix: [f32; 6],
    font: String,
    font_size: f32,
    page: u32,
}

impl TextState {
    /// Record a shown string at the current text position
    fn emit(&self, text: String, items: &mut Vec<TextItem>) {
        if text.trim().is_empty() {
            return;
        }
        let rendered_size = effective_font_size(self.font_size, &self.text_matrix);
        let combined = multiply_matrices(&self.text_matrix, &self.ctm);
        let width = text.trim().chars().count() as f32 * rendered_size * AVG_CHAR_WIDTH;
        items.push(TextItem {
            text,
            x: combined[4],
            y: combined[5],
            width,
            height: rendered_size,
            font: self.font.clone(),
            font_size: rendered_size,
            page: self.page,
        });
    }
}

/// Extract text items from a single page
fn extract_page_text_items(
    doc: &Document,
    page_id: ObjectId,
    page_num: u32,
) -> Result<Vec<TextItem>, BomError> {
    use lopdf::content::Content;

    let mut items = Vec::new();

    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| BomError::Parse(e.to_string()))?;

    let content = Content::decode(&content_data).map_err(|e| BomError::Parse(e.to_string()))?;

    let identity = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut state = TextState {
        ctm: identity,
        text_matrix: identity,
        font: String::new(),
        font_size: 12.0,
        page: page_num,
    };
    let mut ctm_stack: Vec<[f32; 6]> = Vec::new();
    let mut line_matrix = identity;
    let mut in_text_block = false;

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(saved) = ctm_stack.pop() {
                    state.ctm = saved;
                }
            }
            "cm" => {
                if op.operands.len() >= 6 {
                    let mut m = identity;
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        m[i] = get_number(operand).unwrap_or(identity[i]);
                    }
                    state.ctm = multiply_matrices(&m, &state.ctm);
                }
            }
            "BT" => {
                in_text_block = true;
                state.text_matrix = identity;
                line_matrix = identity;
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        state.font = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = get_number(&op.operands[1]) {
                        state.font_size = size;
                    }
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    line_matrix[4] += get_number(&op.operands[0]).unwrap_or(0.0);
                    line_matrix[5] += get_number(&op.operands[1]).unwrap_or(0.0);
                    state.text_matrix = line_matrix;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        state.text_matrix[i] = get_number(operand).unwrap_or(identity[i]);
                    }
                    line_matrix = state.text_matrix;
                }
            }
            "T*" => {
                line_matrix[5] -= state.font_size * 1.2;
                state.text_matrix = line_matrix;
            }
            "Tj" if in_text_block => {
                if let Some(text) = op
                    .operands
                    .first()
                    .and_then(|o| decode_operand(o, doc, &fonts, &state.font))
                {
                    state.emit(text, &mut items);
                }
            }
            "TJ" if in_text_block => {
                if let Some(Ok(array)) = op.operands.first().map(Object::as_array) {
                    let text: String = array
                        .iter()
                        .filter_map(|o| decode_operand(o, doc, &fonts, &state.font))
                        .collect();
                    state.emit(text, &mut items);
                }
            }
            "'" => {
                line_matrix[5] -= state.font_size * 1.2;
                state.text_matrix = line_matrix;
                if let Some(text) = op
                    .operands
                    .first()
                    .and_then(|o| decode_operand(o, doc, &fonts, &state.font))
                {
                    state.emit(text, &mut items);
                }
            }
            _ => {}
        }
    }

    Ok(items)
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

/// Decode a string operand using the current font's encoding
fn decode_operand(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    current_font: &str,
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    // Latin-1
    Some(bytes.iter().map(|&b| b as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_identity() {
        let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let m = [2.0, 0.0, 0.0, 2.0, 10.0, 20.0];
        assert_eq!(multiply_matrices(&m, &identity), m);
        assert_eq!(multiply_matrices(&identity, &m), m);
    }

    #[test]
    fn test_multiply_translation_then_scale() {
        let translate = [1.0, 0.0, 0.0, 1.0, 5.0, 7.0];
        let scale = [2.0, 0.0, 0.0, 3.0, 0.0, 0.0];
        let m = multiply_matrices(&translate, &scale);
        assert_eq!(m[4], 10.0);
        assert_eq!(m[5], 21.0);
    }

    #[test]
    fn test_effective_font_size() {
        assert_eq!(effective_font_size(10.0, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]), 10.0);
        assert_eq!(effective_font_size(1.0, &[8.0, 0.0, 0.0, 8.0, 0.0, 0.0]), 8.0);
    }

    #[test]
    fn test_get_number() {
        assert_eq!(get_number(&Object::Integer(3)), Some(3.0));
        assert_eq!(get_number(&Object::Real(1.5)), Some(1.5));
        assert_eq!(get_number(&Object::Null), None);
    }

    #[test]
    fn test_emit_skips_blank_text() {
        let state = TextState {
            ctm: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            text_matrix: [1.0, 0.0, 0.0, 1.0, 100.0, 700.0],
            font: "F1".into(),
            font_size: 10.0,
            page: 1,
        };
        let mut items = Vec::new();
        state.emit("   ".into(), &mut items);
        assert!(items.is_empty());

        state.emit("ABC-1".into(), &mut items);
        assert_eq!(items.len(), 1);
        assert_eq!((items[0].x, items[0].y), (100.0, 700.0));
        assert_eq!(items[0].width, 25.0);
    }

    #[test]
    fn test_rotate_point_quarter_turns() {
        // Letter portrait: 612 x 792
        assert_eq!(rotate_point(0.0, 0.0, 612.0, 792.0, 0), (0.0, 0.0));
        // Bottom-left corner ends up top-left on a clockwise turn
        assert_eq!(rotate_point(0.0, 0.0, 612.0, 792.0, 90), (0.0, 612.0));
        assert_eq!(rotate_point(0.0, 792.0, 612.0, 792.0, 90), (792.0, 612.0));
        assert_eq!(rotate_point(100.0, 50.0, 612.0, 792.0, 180), (512.0, 742.0));
        assert_eq!(rotate_point(0.0, 0.0, 612.0, 792.0, 270), (792.0, 0.0));
    }

    fn rotated_doc(rotate_on_parent: bool, degrees: i64) -> (Document, ObjectId) {
        use lopdf::dictionary;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };
        let mut pages = dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        if rotate_on_parent {
            pages.set("Rotate", degrees);
        } else {
            page.set("Rotate", degrees);
        }
        let page_id = doc.add_object(page);
        pages.set("Kids", vec![Object::Reference(page_id)]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        (doc, page_id)
    }

    #[test]
    fn test_page_rotation_inherited() {
        let (doc, page_id) = rotated_doc(true, 90);
        assert_eq!(page_rotation(&doc, page_id), 90);
        assert_eq!(page_size(&doc, page_id), (612.0, 792.0));

        let (doc, page_id) = rotated_doc(false, -90);
        assert_eq!(page_rotation(&doc, page_id), 270);

        let (doc, page_id) = rotated_doc(false, 45);
        assert_eq!(page_rotation(&doc, page_id), 0);
    }

    #[test]
    fn test_extract_pages_missing_file() {
        let result = extract_pages("/nonexistent/drawing.pdf");
        assert!(matches!(result, Err(BomError::NotFound(_))));
    }

    #[test]
    fn test_extract_pages_mem_garbage() {
        let result = extract_pages_mem(b"definitely not a pdf");
        assert!(matches!(result, Err(BomError::Parse(_))));
    }
}
