//! Text width measurement used by the layout engine.

const MM_PER_POINT: f64 = 25.4 / 72.0;

/// Measures the rendered width of a run of text, in layout units.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> f64;
}

/// Helvetica (PDF standard font) measured in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helvetica {
    pub font_size_pt: f64,
}

impl Helvetica {
    pub fn new(font_size_pt: f64) -> Self {
        Self { font_size_pt }
    }
}

impl TextMeasure for Helvetica {
    fn text_width(&self, text: &str) -> f64 {
        let units: u32 = text.chars().map(helvetica_advance).sum();
        f64::from(units) / 1000.0 * self.font_size_pt * MM_PER_POINT
    }
}

/// Every character has the same advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Monospace {
    pub advance: f64,
}

impl TextMeasure for Monospace {
    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.advance
    }
}

// Advance widths (1/1000 em) for U+0020..=U+007E from the Helvetica AFM.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

fn helvetica_advance(c: char) -> u32 {
    match c {
        ' '..='~' => u32::from(HELVETICA_ASCII[c as usize - 0x20]),
        '±' => 584,
        '²' | '³' | '¹' => 333,
        '°' => 400,
        _ => 556,
    }
}
