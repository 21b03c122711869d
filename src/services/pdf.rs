use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

// US Letter, 1 point = 1/72 inch
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 54.0;
const LINE_SPACING: f32 = 1.35;

/// One laid-out text line. Blank lines carry empty text and only consume
/// vertical space.
struct Line {
    text: String,
    size: f32,
    bold: bool,
    gap_before: f32,
}

/// Renders markdown as a paginated PDF. This is a formatting function only:
/// headings and bullets get visual treatment, everything else is wrapped
/// body text. Markdown in, bytes out, no state.
pub fn render_markdown(markdown: &str, title: &str) -> Result<Vec<u8>> {
    let mut lines = vec![Line {
        text: sanitize(title),
        size: 20.0,
        bold: true,
        gap_before: 0.0,
    }];
    lines.extend(layout(markdown));

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    let mut operations: Vec<Operation> = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    let flush_page =
        |doc: &mut Document, kids: &mut Vec<Object>, operations: Vec<Operation>| -> Result<()> {
            let content = Content { operations };
            let stream = Stream::new(
                dictionary! {},
                content.encode().context("failed to encode page content")?,
            );
            let content_id = doc.add_object(stream);
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
            Ok(())
        };

    for line in lines {
        let advance = line.gap_before + line.size * LINE_SPACING;
        if y - advance < MARGIN {
            flush_page(&mut doc, &mut kids, std::mem::take(&mut operations))?;
            y = PAGE_HEIGHT - MARGIN;
        }
        y -= advance;

        if line.text.is_empty() {
            continue;
        }
        let font = if line.bold { "F2" } else { "F1" };
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec![font.into(), line.size.into()]));
        operations.push(Operation::new("Td", vec![MARGIN.into(), y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(line.text)],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    if !operations.is_empty() || kids.is_empty() {
        flush_page(&mut doc, &mut kids, operations)?;
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).context("failed to serialize PDF")?;
    Ok(buffer)
}

/// Turns markdown source into wrapped, styled lines.
fn layout(markdown: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in markdown.lines() {
        let trimmed = raw.trim_end();

        if trimmed.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block {
            push_wrapped(&mut lines, trimmed, 10.0, false, 0.0);
            continue;
        }

        if trimmed.is_empty() {
            lines.push(Line {
                text: String::new(),
                size: 5.0,
                bold: false,
                gap_before: 0.0,
            });
        } else if let Some(rest) = trimmed.strip_prefix("# ") {
            push_wrapped(&mut lines, rest, 17.0, true, 10.0);
        } else if let Some(rest) = trimmed.strip_prefix("## ") {
            push_wrapped(&mut lines, rest, 14.0, true, 8.0);
        } else if let Some(rest) = heading3_or_deeper(trimmed) {
            push_wrapped(&mut lines, rest, 12.0, true, 6.0);
        } else if let Some(rest) = trimmed
            .trim_start()
            .strip_prefix("- ")
            .or_else(|| trimmed.trim_start().strip_prefix("* "))
        {
            push_wrapped(&mut lines, &format!("-  {}", rest), 11.0, false, 1.0);
        } else {
            push_wrapped(&mut lines, trimmed, 11.0, false, 1.0);
        }
    }

    lines
}

fn heading3_or_deeper(line: &str) -> Option<&str> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if (3..=6).contains(&hashes) {
        line[hashes..].strip_prefix(' ')
    } else {
        None
    }
}

fn push_wrapped(lines: &mut Vec<Line>, text: &str, size: f32, bold: bool, gap_before: f32) {
    let cleaned = sanitize(text);
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    // Helvetica averages roughly half an em per glyph
    let max_chars = ((usable / (size * 0.5)) as usize).max(16);

    let mut first = true;
    let mut current = String::new();
    for word in cleaned.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(Line {
                text: std::mem::take(&mut current),
                size,
                bold,
                gap_before: if first { gap_before } else { 0.0 },
            });
            first = false;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || first {
        lines.push(Line {
            text: current,
            size,
            bold,
            gap_before: if first { gap_before } else { 0.0 },
        });
    }
}

/// Strips inline emphasis markers and non-ASCII glyphs the base fonts cannot
/// encode.
fn sanitize(text: &str) -> String {
    text.replace("**", "")
        .replace('`', "")
        .chars()
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}
