/*!
Span of UTF-8 source text
*/

pub type TextLen = usize;
pub type TextPos = usize;

/// Span of source text in range `[lo, hi)` referred to as `sp`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ByteSpan {
    pub lo: TextPos,
    pub hi: TextPos,
}

impl From<rowan::TextRange> for ByteSpan {
    fn from(rng: rowan::TextRange) -> Self {
        Self {
            lo: rng.start().into(),
            hi: rng.end().into(),
        }
    }
}

impl ByteSpan {
    /// One-byte span
    pub fn at(pos: TextPos) -> Self {
        Self {
            lo: pos,
            hi: pos + 1,
        }
    }

    pub fn slice<'a>(&self, src: &'a str) -> &'a str {
        &src[self.lo..self.hi]
    }

    pub fn len(&self) -> TextLen {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.lo == self.hi
    }
}

/// Zero-based line/column position, columns counted in bytes
///
/// The parser only ever compares columns of tokens in the same file, so byte
/// columns are enough for the layout rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LineColumn {
    pub line: usize,
    pub col: usize,
}

/// Byte offsets of line heads, for position → line/column lookup
#[derive(Debug, Clone)]
pub struct LineTable {
    starts: Vec<TextPos>,
}

impl LineTable {
    pub fn new(src: &str) -> Self {
        Self {
            starts: self::line_starts(src).collect(),
        }
    }

    pub fn location(&self, pos: TextPos) -> LineColumn {
        let line = match self.starts.binary_search(&pos) {
            Ok(line) => line,
            Err(next_line) => next_line - 1,
        };

        LineColumn {
            line,
            col: pos - self.starts[line],
        }
    }
}

fn line_starts(source: &str) -> impl Iterator<Item = TextPos> + '_ {
    std::iter::once(0).chain(source.match_indices('\n').map(|(i, _pat)| i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_table_locations() {
        let src = "ab\ncd\n\nef";
        let table = LineTable::new(src);

        assert_eq!(table.location(0), LineColumn { line: 0, col: 0 });
        assert_eq!(table.location(1), LineColumn { line: 0, col: 1 });
        assert_eq!(table.location(3), LineColumn { line: 1, col: 0 });
        assert_eq!(table.location(6), LineColumn { line: 2, col: 0 });
        assert_eq!(table.location(8), LineColumn { line: 3, col: 1 });
    }
}
