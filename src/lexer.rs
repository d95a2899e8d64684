/// Marks a comment line in an option file.
pub const COMMENT_MARKER: &str = "***";

/// One physical line of an option file, without its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub text: &'a str,
    /// Byte offset of the first character in the source text.
    pub offset: usize,
}

impl Line<'_> {
    /// Blank lines and comment lines separate blocks and are otherwise ignored.
    pub fn is_blank(&self) -> bool {
        is_blank(self.text)
    }

    pub fn span(&self) -> (usize, usize) {
        (self.offset, self.text.len())
    }
}

pub fn is_blank(text: &str) -> bool {
    text.is_empty() || text.starts_with(COMMENT_MARKER)
}

/// Splits option file text into lines. `\n`, `\r\n` and a lone `\r` all end
/// a line; a final line without terminator is still returned.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// The next raw line, blank or not. `None` at end of input.
    pub fn read_line(&mut self) -> Option<Line<'a>> {
        if self.position >= self.source.len() {
            return None;
        }
        let start = self.position;
        let rest = &self.source[start..];
        let (text, consumed) = match rest.find(['\r', '\n']) {
            Some(end) => {
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                (&rest[..end], end + terminator)
            }
            None => (rest, rest.len()),
        };
        self.position += consumed;
        Some(Line {
            text,
            offset: start,
        })
    }

    /// The next line that is neither blank nor a comment.
    pub fn next_line(&mut self) -> Option<Line<'a>> {
        while let Some(line) = self.read_line() {
            if !line.is_blank() {
                return Some(line);
            }
        }
        None
    }
}
