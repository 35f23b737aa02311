//! Page layout for the PDF reports.
//!
//! Documents are a sequence of [`Block`]s. [`paginate`] places their lines on
//! A4 pages top to bottom, moving a keep-together block to a fresh page when
//! it does not fit the current one but would fit an empty page. Blocks taller
//! than a page are split line by line. Every page gets a "Strona N z M" footer.

use crate::reports::text::{text_width, transliterate, wrap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Title,
    Heading,
    Body,
    Small,
}

impl TextStyle {
    /// Font size in points.
    pub fn font_size(&self) -> f32 {
        match self {
            TextStyle::Title => 18.0,
            TextStyle::Heading => 13.0,
            TextStyle::Body => 10.0,
            TextStyle::Small => 8.0,
        }
    }

    /// Line advance in millimetres.
    pub fn line_height(&self) -> f32 {
        match self {
            TextStyle::Title => 9.0,
            TextStyle::Heading => 7.0,
            TextStyle::Body => 5.0,
            TextStyle::Small => 4.0,
        }
    }

    pub fn bold(&self) -> bool {
        matches!(self, TextStyle::Title | TextStyle::Heading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Space above the bottom margin reserved for the footer.
    pub footer_height: f32,
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin: 20.0,
            footer_height: 8.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.margin - self.footer_height
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub style: TextStyle,
    pub indent: f32,
}

/// A group of lines laid out together.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub lines: Vec<Line>,
    pub keep_together: bool,
    pub space_after: f32,
}

impl Block {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            keep_together: true,
            space_after: 4.0,
        }
    }

    /// Allow the block to be split across pages.
    pub fn splittable(mut self) -> Self {
        self.keep_together = false;
        self
    }

    pub fn space_after(mut self, space: f32) -> Self {
        self.space_after = space;
        self
    }

    pub fn text(self, style: TextStyle, text: &str) -> Self {
        self.indented_text(style, 0.0, text)
    }

    pub fn indented_text(mut self, style: TextStyle, indent: f32, text: &str) -> Self {
        let width = PageGeometry::a4().content_width() - indent;
        for wrapped in wrap(&transliterate(text), width, style.font_size()) {
            self.lines.push(Line {
                text: wrapped,
                style,
                indent,
            });
        }
        self
    }

    /// `label: value` body line; absent values are skipped.
    pub fn field(self, label: &str, value: Option<String>) -> Self {
        match value {
            Some(value) => self.text(TextStyle::Body, &format!("{label}: {value}")),
            None => self,
        }
    }

    pub fn height(&self) -> f32 {
        self.lines.iter().map(|line| line.style.line_height()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

/// A line at its final position; `y` is the baseline measured from the page bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub style: TextStyle,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

struct Cursor {
    geometry: PageGeometry,
    pages: Vec<Page>,
    /// Distance already used from the top of the content area.
    used: f32,
}

impl Cursor {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            used: 0.0,
        }
    }

    fn remaining(&self) -> f32 {
        self.geometry.content_height() - self.used
    }

    fn at_page_top(&self) -> bool {
        self.used == 0.0
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.used = 0.0;
    }

    fn place(&mut self, line: &Line) {
        let height = line.style.line_height();
        if height > self.remaining() && !self.at_page_top() {
            self.new_page();
        }

        self.used += height;
        let y = self.geometry.height - self.geometry.margin - self.used;
        let x = self.geometry.margin + line.indent;
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(PlacedLine {
                text: line.text.clone(),
                style: line.style,
                x,
                y,
            });
        }
    }
}

pub fn paginate(blocks: &[Block], geometry: PageGeometry) -> Vec<Page> {
    let mut cursor = Cursor::new(geometry);

    for block in blocks.iter().filter(|block| !block.is_empty()) {
        let height = block.height();
        if block.keep_together
            && height > cursor.remaining()
            && height <= geometry.content_height()
            && !cursor.at_page_top()
        {
            cursor.new_page();
        }

        for line in &block.lines {
            cursor.place(line);
        }
        cursor.used = (cursor.used + block.space_after).min(geometry.content_height());
    }

    let mut pages = cursor.pages;
    let total = pages.len();
    for (index, page) in pages.iter_mut().enumerate() {
        let footer = format!("Strona {} z {}", index + 1, total);
        let style = TextStyle::Small;
        page.lines.push(PlacedLine {
            x: (geometry.width - text_width(&footer, style.font_size())) / 2.0,
            y: geometry.margin,
            text: footer,
            style,
        });
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body_block(lines: usize) -> Block {
        (0..lines).fold(Block::new(), |block, i| {
            block.text(TextStyle::Body, &format!("Linia {i}"))
        })
    }

    fn footers(pages: &[Page]) -> Vec<String> {
        pages
            .iter()
            .filter_map(|page| page.lines.last())
            .map(|line| line.text.clone())
            .collect()
    }

    #[test]
    fn test_empty_document_has_one_page_with_footer() {
        let pages = paginate(&[], PageGeometry::a4());
        assert_eq!(footers(&pages), vec!["Strona 1 z 1"]);
    }

    #[test]
    fn test_keep_together_block_moves_to_next_page() {
        let geometry = PageGeometry::a4();
        // 249 mm of content: 40 body lines fill 200 mm.
        let first = body_block(40).space_after(0.0);
        let second = body_block(12);

        let pages = paginate(&[first, second], geometry);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].lines.len(), 40 + 1);
        assert_eq!(pages[1].lines.len(), 12 + 1);
        assert_eq!(pages[1].lines[0].text, "Linia 0");
    }

    #[test]
    fn test_splittable_block_fills_page_first() {
        let geometry = PageGeometry::a4();
        let first = body_block(40).space_after(0.0);
        let second = body_block(12).splittable();

        let pages = paginate(&[first, second], geometry);

        assert_eq!(pages.len(), 2);
        // 49 mm remain, so 9 lines of 5 mm fit on the first page.
        assert_eq!(pages[0].lines.len(), 40 + 9 + 1);
        assert_eq!(pages[1].lines.len(), 3 + 1);
    }

    #[test]
    fn test_block_taller_than_page_is_split() {
        let pages = paginate(&[body_block(120)], PageGeometry::a4());

        assert_eq!(pages.len(), 3);
        assert_eq!(
            footers(&pages),
            vec!["Strona 1 z 3", "Strona 2 z 3", "Strona 3 z 3"]
        );
    }

    #[test]
    fn test_lines_stay_inside_margins() {
        let geometry = PageGeometry::a4();
        let blocks: Vec<Block> = (0..30)
            .map(|i| {
                Block::new()
                    .text(TextStyle::Heading, &format!("Trening {i}"))
                    .text(TextStyle::Body, &"Długi opis treningu ".repeat(12))
            })
            .collect();

        for page in paginate(&blocks, geometry) {
            for line in &page.lines {
                assert!(line.y >= geometry.margin, "line below bottom margin: {:?}", line);
                assert!(line.y <= geometry.height - geometry.margin);
                assert!(line.x >= geometry.margin - 0.01 || line.text.starts_with("Strona"));
            }
        }
    }

    #[test]
    fn test_block_text_is_transliterated_and_wrapped() {
        let block = Block::new().text(TextStyle::Body, &"Rozciąganie ".repeat(30));
        assert!(block.lines.len() > 1);
        assert!(block.lines.iter().all(|line| line.text.is_ascii()));
    }
}
