//! Single-page A4 invoice PDF.
//!
//! The invoice is laid out on a fixed-width canvas, then the whole canvas is
//! scaled to fit one page: full page width, or full page height when the
//! content is too tall. Nothing is ever split across pages.

use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, StringFormat,
};
use rust_decimal::Decimal;

use super::{format_date_id, InvoiceView};
use crate::models::format_idr;

/// A4 in PDF points.
pub const A4: Size = Size {
    width: 595.0,
    height: 842.0,
};

const CANVAS_WIDTH: f64 = 800.0;
const PADDING: f64 = 48.0;
const HEADER_HEIGHT: f64 = 120.0;

const BLACK: f64 = 0.0;
const WHITE: f64 = 1.0;
const MUTED: f64 = 0.45;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("invoice content has no printable area")]
    EmptyLayout,
    #[error("failed to write pdf: {0}")]
    Write(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Where scaled content lands on the page, measured from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Scale `content` to the page width, or to the page height if that would
/// overflow, keeping the aspect ratio. Centred horizontally, top-aligned.
pub fn fit_to_page(content: Size, page: Size) -> Option<Placement> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !(valid(content.width) && valid(content.height) && valid(page.width) && valid(page.height))
    {
        return None;
    }

    let ratio = content.width / content.height;
    let mut width = page.width;
    let mut height = width / ratio;
    if height > page.height {
        height = page.height;
        width = height * ratio;
    }

    Some(Placement {
        x: (page.width - width) / 2.0,
        y: 0.0,
        width,
        height,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
enum Element {
    Text {
        x: f64,
        y: f64,
        size: f64,
        bold: bool,
        gray: f64,
        align: Align,
        text: String,
    },
    Rule {
        y: f64,
        x1: f64,
        x2: f64,
    },
    Fill {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        gray: f64,
    },
}

/// Approximate Helvetica advance width in canvas units.
fn text_width(text: &str, size: f64) -> f64 {
    text.chars()
        .map(|c| match c {
            ' ' | '.' | ',' | ':' | 'i' | 'l' | 'j' | 't' | 'f' | 'I' => 0.278,
            '0'..='9' => 0.556,
            'm' | 'w' | 'M' | 'W' => 0.833,
            'A'..='Z' => 0.667,
            _ => 0.52,
        })
        .sum::<f64>()
        * size
}

/// Greedy word wrap honouring explicit line breaks.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > max_chars {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

/// Map text to WinAnsiEncoding bytes; unmapped characters become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn quantity(q: Decimal) -> String {
    q.normalize().to_string()
}

struct Canvas {
    elements: Vec<Element>,
}

impl Canvas {
    fn text(&mut self, x: f64, y: f64, size: f64, text: impl Into<String>) -> &mut Element {
        let index = self.elements.len();
        self.elements.push(Element::Text {
            x,
            y,
            size,
            bold: false,
            gray: BLACK,
            align: Align::Left,
            text: text.into(),
        });
        &mut self.elements[index]
    }

    fn rule(&mut self, y: f64) {
        self.elements.push(Element::Rule {
            y,
            x1: PADDING,
            x2: CANVAS_WIDTH - PADDING,
        });
    }
}

impl Element {
    fn bold(&mut self) -> &mut Self {
        if let Element::Text { bold, .. } = self {
            *bold = true;
        }
        self
    }

    fn gray(&mut self, value: f64) -> &mut Self {
        if let Element::Text { gray, .. } = self {
            *gray = value;
        }
        self
    }

    fn align(&mut self, value: Align) -> &mut Self {
        if let Element::Text { align, .. } = self {
            *align = value;
        }
        self
    }
}

/// Lay the invoice out on the canvas. Returns the elements and the canvas
/// height the content needs.
fn layout(view: &InvoiceView) -> (Vec<Element>, f64) {
    let invoice = &view.invoice;
    let totals = &view.totals;
    let right = CANVAS_WIDTH - PADDING;
    let mut c = Canvas {
        elements: Vec::new(),
    };

    c.elements.push(Element::Fill {
        x: 0.0,
        y: 0.0,
        width: CANVAS_WIDTH,
        height: HEADER_HEIGHT,
        gray: BLACK,
    });
    c.text(PADDING, 56.0, 24.0, &view.business.name).bold().gray(WHITE);
    c.text(PADDING, 80.0, 11.0, &view.business.website).gray(0.8);
    c.text(right, 56.0, 18.0, &invoice.invoice_number)
        .bold()
        .gray(WHITE)
        .align(Align::Right);
    c.text(right, 80.0, 11.0, invoice.payment_status.label())
        .gray(WHITE)
        .align(Align::Right);

    // Billed-to column on the left, dates on the right.
    let top = HEADER_HEIGHT + 50.0;
    let mut left_y = top;
    c.text(PADDING, left_y, 11.0, "DITERBITKAN UNTUK:").bold().gray(MUTED);
    left_y += 20.0;
    c.text(PADDING, left_y, 13.0, &invoice.client_name).bold();
    for line in [&invoice.client_email, &invoice.client_whatsapp]
        .into_iter()
        .flatten()
    {
        left_y += 17.0;
        c.text(PADDING, left_y, 12.0, line);
    }
    if let Some(address) = &invoice.client_address {
        left_y += 6.0;
        for line in wrap(address, 45) {
            left_y += 17.0;
            c.text(PADDING, left_y, 12.0, line);
        }
    }

    let mut right_y = top;
    for (label, date) in [
        ("Tanggal Terbit:", invoice.issue_date),
        ("Jatuh Tempo:", invoice.due_date),
    ] {
        c.text(right, right_y, 11.0, label)
            .bold()
            .gray(MUTED)
            .align(Align::Right);
        right_y += 18.0;
        c.text(right, right_y, 12.0, format_date_id(date))
            .align(Align::Right);
        right_y += 28.0;
    }

    // Line items.
    let col_qty = 470.0;
    let col_price = 610.0;
    let mut y = left_y.max(right_y) + 30.0;
    c.text(PADDING, y, 11.0, "Deskripsi").bold().gray(MUTED);
    c.text(col_qty, y, 11.0, "Jumlah")
        .bold()
        .gray(MUTED)
        .align(Align::Center);
    c.text(col_price, y, 11.0, "Harga Satuan")
        .bold()
        .gray(MUTED)
        .align(Align::Right);
    c.text(right, y, 11.0, "Total")
        .bold()
        .gray(MUTED)
        .align(Align::Right);
    y += 10.0;
    c.rule(y);

    for item in &invoice.items {
        y += 22.0;
        c.text(col_qty, y, 12.0, quantity(item.quantity))
            .align(Align::Center);
        c.text(col_price, y, 12.0, format_idr(item.price))
            .align(Align::Right);
        c.text(right, y, 12.0, format_idr(item.line_total()))
            .align(Align::Right);
        for (i, line) in wrap(&item.description, 48).into_iter().enumerate() {
            if i > 0 {
                y += 16.0;
            }
            c.text(PADDING, y, 12.0, line).bold();
        }
        for sub in &item.sub_items {
            y += 15.0;
            c.text(PADDING + 16.0, y, 10.0, format!("• {}", sub.description))
                .gray(MUTED);
        }
        y += 10.0;
        c.rule(y);
    }

    // Totals, right-aligned block.
    let label_x = 480.0;
    y += 28.0;
    c.text(label_x, y, 12.0, "Subtotal").gray(MUTED);
    c.text(right, y, 12.0, format_idr(totals.subtotal))
        .align(Align::Right);
    if totals.down_payment > Decimal::ZERO {
        y += 20.0;
        c.text(label_x, y, 12.0, "Uang Muka (DP)").gray(MUTED);
        c.text(right, y, 12.0, format!("- {}", format_idr(totals.down_payment)))
            .align(Align::Right);
    }
    y += 12.0;
    c.elements.push(Element::Rule {
        y,
        x1: label_x,
        x2: right,
    });
    y += 22.0;
    c.text(label_x, y, 14.0, "SISA TAGIHAN").bold();
    c.text(right, y, 14.0, format_idr(totals.remaining))
        .bold()
        .align(Align::Right);

    if let Some(notes) = &invoice.notes {
        y += 40.0;
        c.rule(y);
        y += 24.0;
        c.text(PADDING, y, 12.0, "Catatan:").bold();
        for line in wrap(notes, 95) {
            y += 16.0;
            c.text(PADDING, y, 11.0, line).gray(MUTED);
        }
    }

    // Footer.
    y += 40.0;
    c.rule(y);
    y += 22.0;
    let footer_top = y;
    c.text(PADDING, y, 10.0, &view.business.name).bold().gray(MUTED);
    if let Some(tagline) = &view.business.tagline {
        y += 14.0;
        c.text(PADDING, y, 10.0, tagline).gray(MUTED);
    }
    let mut contact_y = footer_top;
    if let Some(contact) = &invoice.my_contact_info {
        for (i, line) in contact.lines().enumerate() {
            if i > 0 {
                contact_y += 14.0;
            }
            c.text(right, contact_y, 10.0, line)
                .gray(MUTED)
                .align(Align::Right);
        }
    }

    let height = y.max(contact_y) + PADDING;
    (c.elements, height)
}

fn num(v: f64) -> Object {
    Object::from(v as f32)
}

fn operations(elements: &[Element], placement: Placement, scale: f64, page: Size) -> Vec<Operation> {
    let px = |x: f64| placement.x + x * scale;
    let py = |y: f64| page.height - (placement.y + y * scale);
    let mut ops = Vec::new();

    for element in elements {
        match element {
            Element::Fill {
                x,
                y,
                width,
                height,
                gray,
            } => {
                ops.push(Operation::new("g", vec![num(*gray)]));
                ops.push(Operation::new(
                    "re",
                    vec![
                        num(px(*x)),
                        num(py(y + height)),
                        num(width * scale),
                        num(height * scale),
                    ],
                ));
                ops.push(Operation::new("f", vec![]));
            }
            Element::Rule { y, x1, x2 } => {
                ops.push(Operation::new("G", vec![num(0.85)]));
                ops.push(Operation::new("w", vec![num(0.8 * scale)]));
                ops.push(Operation::new("m", vec![num(px(*x1)), num(py(*y))]));
                ops.push(Operation::new("l", vec![num(px(*x2)), num(py(*y))]));
                ops.push(Operation::new("S", vec![]));
            }
            Element::Text {
                x,
                y,
                size,
                bold,
                gray,
                align,
                text,
            } => {
                let offset = match align {
                    Align::Left => 0.0,
                    Align::Center => text_width(text, *size) / 2.0,
                    Align::Right => text_width(text, *size),
                };
                let font = if *bold { "F2" } else { "F1" };
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.as_bytes().to_vec()), num(size * scale)],
                ));
                ops.push(Operation::new("g", vec![num(*gray)]));
                ops.push(Operation::new(
                    "Tm",
                    vec![
                        num(1.0),
                        num(0.0),
                        num(0.0),
                        num(1.0),
                        num(px(x - offset)),
                        num(py(*y)),
                    ],
                ));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(win_ansi(text), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
        }
    }
    ops
}

/// Render the invoice to PDF bytes: one A4 page, content scaled to fit.
pub fn render_invoice_pdf(view: &InvoiceView) -> Result<Vec<u8>, PdfError> {
    let (elements, height) = layout(view);
    let placement = fit_to_page(
        Size {
            width: CANVAS_WIDTH,
            height,
        },
        A4,
    )
    .ok_or(PdfError::EmptyLayout)?;
    let scale = placement.width / CANVAS_WIDTH;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let content = Content {
        operations: operations(&elements, placement, scale, A4),
    };
    let encoded = content
        .encode()
        .map_err(|e| PdfError::Write(e.to_string()))?;
    let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(A4.width as i64),
            Object::Integer(A4.height as i64),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(win_ansi(&format!("Faktur {}", view.invoice.invoice_number))),
        "Producer" => Object::string_literal("ningrat-backend"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(bytes)
}
