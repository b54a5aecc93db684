//! Custom characters for the HD44780 CGRAM.
//!
//! The CGRAM has room for 8 glyphs of 5x8 pixels. Each glyph is 8 rows, top to bottom, and each row
//! uses the low 5 bits, the most significant of them being the leftmost pixel. After loading, glyph
//! `n` is displayed by writing the byte `n` as data.
use thiserror::Error;

/// Number of glyph slots in CGRAM.
pub const GLYPH_SLOTS: usize = 8;
/// Number of pixel rows in a glyph.
pub const GLYPH_ROWS: usize = 8;
/// Widest row value, all 5 pixels lit.
pub const MAX_ROW: u8 = 0b00011111;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GlyphError {
    #[error("{0} glyphs given, but CGRAM only holds 8")]
    TooManyGlyphs(usize),
    #[error("a glyph needs exactly 8 rows, got {0}")]
    WrongRowCount(usize),
    #[error("row {row} is {value:#010b}, wider than 5 pixels")]
    RowOutOfRange { row: usize, value: u8 },
}

/// A validated 5x8 glyph.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Glyph([u8; GLYPH_ROWS]);

impl Glyph {
    /// Creates a glyph from its rows.
    ///
    /// # Errors
    /// - `GlyphError::RowOutOfRange` if any row has bits set above the 5 pixel columns.
    pub fn new(rows: [u8; GLYPH_ROWS]) -> Result<Self, GlyphError> {
        if let Some((row, &value)) = rows.iter().enumerate().find(|&(_, &value)| value > MAX_ROW) {
            return Err(GlyphError::RowOutOfRange { row, value });
        }
        Ok(Glyph(rows))
    }

    /// Gets the rows of the glyph, top to bottom.
    pub fn rows(&self) -> &[u8; GLYPH_ROWS] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Glyph {
    type Error = GlyphError;

    fn try_from(rows: &[u8]) -> Result<Self, Self::Error> {
        let rows: [u8; GLYPH_ROWS] = rows
            .try_into()
            .map_err(|_| GlyphError::WrongRowCount(rows.len()))?;
        Glyph::new(rows)
    }
}

/// Up to 8 glyphs, loaded into consecutive CGRAM slots starting at slot 0.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct GlyphSet(Vec<Glyph>);

impl GlyphSet {
    /// # Errors
    /// - `GlyphError::TooManyGlyphs` if more than 8 glyphs are given.
    pub fn new(glyphs: Vec<Glyph>) -> Result<Self, GlyphError> {
        if glyphs.len() > GLYPH_SLOTS {
            return Err(GlyphError::TooManyGlyphs(glyphs.len()));
        }
        Ok(GlyphSet(glyphs))
    }

    /// Validates raw rows into a set, rejecting the whole set on the first bad glyph.
    pub fn from_rows<R: AsRef<[u8]>>(glyphs: &[R]) -> Result<Self, GlyphError> {
        if glyphs.len() > GLYPH_SLOTS {
            return Err(GlyphError::TooManyGlyphs(glyphs.len()));
        }
        glyphs
            .iter()
            .map(|rows| Glyph::try_from(rows.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(GlyphSet)
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARROW: [u8; 8] = [0b00100, 0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110, 0b00100];

    #[test]
    fn glyph_accepts_five_pixel_rows() {
        let glyph = Glyph::new([MAX_ROW; 8]).unwrap();
        assert_eq!(glyph.rows(), &[MAX_ROW; 8]);
    }

    #[test]
    fn glyph_rejects_sixth_pixel() {
        let mut rows = ARROW;
        rows[5] = 0b00100000;
        assert_eq!(
            Glyph::new(rows),
            Err(GlyphError::RowOutOfRange { row: 5, value: 32 })
        );
    }

    #[test]
    fn glyph_needs_exactly_eight_rows() {
        assert_eq!(Glyph::try_from(&ARROW[..7]), Err(GlyphError::WrongRowCount(7)));
        assert_eq!(Glyph::try_from(&[0u8; 9][..]), Err(GlyphError::WrongRowCount(9)));
        assert!(Glyph::try_from(&ARROW[..]).is_ok());
    }

    #[test]
    fn set_holds_at_most_eight_glyphs() {
        let glyph = Glyph::new(ARROW).unwrap();
        assert_eq!(GlyphSet::new(vec![glyph; 8]).map(|set| set.len()), Ok(8));
        assert_eq!(GlyphSet::new(vec![glyph; 9]), Err(GlyphError::TooManyGlyphs(9)));
    }

    #[test]
    fn set_from_rows_reports_the_first_bad_glyph() {
        let rows: Vec<Vec<u8>> = vec![ARROW.to_vec(), vec![0; 3], vec![0xFF; 8]];
        assert_eq!(GlyphSet::from_rows(&rows), Err(GlyphError::WrongRowCount(3)));
        assert!(GlyphSet::from_rows::<[u8; 8]>(&[]).unwrap().is_empty());
    }
}
