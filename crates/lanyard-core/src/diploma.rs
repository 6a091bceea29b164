use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use thiserror::Error;

const FONT_SIZE: f32 = 32.0;
/// Rough advance width of Helvetica relative to the font size. Good
/// enough to centre a name without embedding font metrics.
const AVG_GLYPH_WIDTH: f32 = 0.5;
/// Vertical position of the name as a fraction of the page height,
/// measured from the bottom.
const NAME_BASELINE: f32 = 0.45;

/// US Letter, the fallback when a template hides its MediaBox in an
/// inherited attribute.
const DEFAULT_PAGE: (f32, f32) = (612.0, 792.0);

const FONT_RESOURCE: &str = "FDiploma";

#[derive(Debug, Error)]
pub enum DiplomaError {
    #[error("invalid template: {0}")]
    Template(String),
    #[error("render failed: {0}")]
    Render(String),
}

impl From<lopdf::Error> for DiplomaError {
    fn from(e: lopdf::Error) -> Self {
        DiplomaError::Render(e.to_string())
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn page_size(doc: &Document, page_id: lopdf::ObjectId) -> (f32, f32) {
    let media_box = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .and_then(|dict| dict.get(b"MediaBox"))
        .and_then(Object::as_array);
    if let Ok(values) = media_box {
        let coords: Vec<f32> = values.iter().filter_map(number).collect();
        if let [x0, y0, x1, y1] = coords[..] {
            return (x1 - x0, y1 - y0);
        }
    }
    DEFAULT_PAGE
}

/// Latin-1 bytes for a PDF literal string; anything outside the repertoire
/// degrades to '?'. Helvetica with the standard encoding covers the names
/// we actually see.
fn encode_text(name: &str) -> Vec<u8> {
    name.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

/// Load a diploma template and overlay `name` horizontally centred on the
/// first page. Returns the finished PDF bytes; the template is untouched.
pub fn render_diploma(template: &[u8], name: &str) -> Result<Vec<u8>, DiplomaError> {
    let mut doc = Document::load_mem(template)
        .map_err(|e| DiplomaError::Template(e.to_string()))?;

    let page_id = *doc
        .get_pages()
        .values()
        .next()
        .ok_or_else(|| DiplomaError::Template("template has no pages".into()))?;
    let (page_width, page_height) = page_size(&doc, page_id);

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let text = encode_text(name.trim());
    let text_width = text.len() as f32 * FONT_SIZE * AVG_GLYPH_WIDTH;
    let x = ((page_width - text_width) / 2.0).max(0.0);
    let y = page_height * NAME_BASELINE;

    let overlay = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE.into()), FONT_SIZE.into()],
            ),
            Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::String(text, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    };
    let overlay_id = doc.add_object(Stream::new(
        dictionary! {},
        overlay.encode().map_err(|e| DiplomaError::Render(e.to_string()))?,
    ));

    attach_overlay(&mut doc, page_id, overlay_id, font_id)?;

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| DiplomaError::Render(e.to_string()))?;
    Ok(out)
}

/// Register the overlay stream and font on the page, preserving whatever
/// content and resources the template already has.
fn attach_overlay(
    doc: &mut Document,
    page_id: lopdf::ObjectId,
    overlay_id: lopdf::ObjectId,
    font_id: lopdf::ObjectId,
) -> Result<(), DiplomaError> {
    // Resources may live behind a reference; materialise a direct dict we
    // can extend.
    let resources = {
        let page = doc.get_object(page_id)?.as_dict()?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => doc.get_object(*id)?.as_dict()?.clone(),
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => dictionary! {},
        }
    };
    let mut resources = resources;
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_object(*id)?.as_dict()?.clone(),
        _ => dictionary! {},
    };
    fonts.set(FONT_RESOURCE, font_id);
    resources.set("Font", Object::Dictionary(fonts));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));

    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(existing)) => {
            vec![Object::Reference(*existing), Object::Reference(overlay_id)]
        }
        Ok(Object::Array(existing)) => {
            let mut all = existing.clone();
            all.push(Object::Reference(overlay_id));
            all
        }
        _ => vec![Object::Reference(overlay_id)],
    };
    page.set("Contents", Object::Array(contents));
    Ok(())
}

/// Single blank page of the given size. Handy as a stand-in template.
#[cfg(test)]
pub(crate) fn blank_template(width: f32, height: f32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("blank template");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_diploma_contains_the_name() {
        let template = blank_template(612.0, 792.0);
        let pdf = render_diploma(&template, "Ana Silva").unwrap();
        assert_eq!(&pdf[..5], b"%PDF-");

        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("Ana Silva"), "overlay missing: {text}");
    }

    #[test]
    fn template_content_is_preserved() {
        let template = blank_template(612.0, 792.0);
        let pdf = render_diploma(&template, "Ana").unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        // Original stream plus the overlay.
        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 2);
    }

    #[test]
    fn garbage_template_is_rejected() {
        let err = render_diploma(b"not a pdf", "Ana").unwrap_err();
        assert!(matches!(err, DiplomaError::Template(_)));
    }

    #[test]
    fn non_latin_characters_degrade_gracefully() {
        let template = blank_template(612.0, 792.0);
        // Must not panic or error; CJK falls back to '?'.
        let pdf = render_diploma(&template, "安娜").unwrap();
        assert_eq!(&pdf[..5], b"%PDF-");
    }

    #[test]
    fn name_is_horizontally_centred() {
        let text = encode_text("Ana");
        let width = text.len() as f32 * FONT_SIZE * AVG_GLYPH_WIDTH;
        let x = (612.0 - width) / 2.0;
        assert!(x > 0.0 && x < 612.0 / 2.0 + 1.0);
    }
}
