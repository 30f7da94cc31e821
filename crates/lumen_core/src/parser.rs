//! Line lexer for the scene description format.
//!
//! Scene files are ASCII, one directive or property per line, with blocks
//! separated by blank lines:
//!
//! ```text
//! MATERIAL 0
//! RGB         .98 .98 .98
//! EMITTANCE   5
//!
//! OBJECT 0
//! cube
//! materialid 0
//! TRANS       0 10 0
//! SCALE       3 .3 3
//! ```
//!
//! The whole file is tokenized up front; builders pull lines through an
//! explicit cursor instead of sharing a file handle. Numeric tokens are
//! permissive: anything malformed or missing reads as zero.

use std::collections::VecDeque;

use lumen_math::Vec3;

/// One tokenized scene-file line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// 1-based line number in the source
    pub number: usize,

    /// The line with surrounding whitespace removed
    pub text: String,

    /// Whitespace-separated tokens
    pub tokens: Vec<String>,
}

impl Line {
    fn new(number: usize, raw: &str) -> Self {
        let text = raw.trim().to_string();
        let tokens = text.split_whitespace().map(str::to_string).collect();
        Self {
            number,
            text,
            tokens,
        }
    }

    /// True for an empty or whitespace-only line (a block separator).
    pub fn is_blank(&self) -> bool {
        self.tokens.is_empty()
    }

    /// First token, or `""` for a blank line.
    pub fn keyword(&self) -> &str {
        self.token(0)
    }

    /// Token at `index`, or `""` if the line is shorter.
    pub fn token(&self, index: usize) -> &str {
        self.tokens.get(index).map(String::as_str).unwrap_or("")
    }

    /// Token at `index` as a float; zero if missing or malformed.
    pub fn float(&self, index: usize) -> f32 {
        parse_f32(self.token(index))
    }

    /// Token at `index` as an integer; zero if missing or malformed.
    pub fn int(&self, index: usize) -> i64 {
        parse_i64(self.token(index))
    }

    /// Token at `index` as an unsigned integer; negative values read as zero.
    pub fn uint(&self, index: usize) -> u32 {
        u32::try_from(self.int(index)).unwrap_or(0)
    }

    /// Token at `index` as an index; negative values read as zero.
    pub fn index(&self, index: usize) -> usize {
        usize::try_from(self.int(index)).unwrap_or(0)
    }

    /// Three consecutive float tokens starting at `start`.
    pub fn vec3(&self, start: usize) -> Vec3 {
        Vec3::new(self.float(start), self.float(start + 1), self.float(start + 2))
    }
}

/// Permissive float parse: malformed input is zero.
pub fn parse_f32(token: &str) -> f32 {
    token.parse().unwrap_or(0.0)
}

/// Permissive integer parse: accepts `3` and `3.7` (truncated), else zero.
pub fn parse_i64(token: &str) -> i64 {
    token
        .parse::<i64>()
        .ok()
        .or_else(|| token.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
        .unwrap_or(0)
}

/// Pull-based cursor over the tokenized lines of a scene file.
pub struct SceneLexer {
    lines: VecDeque<Line>,
    current_line: usize,
    in_block: bool,
}

impl SceneLexer {
    /// Create a new lexer from file contents.
    pub fn new(content: &str) -> Self {
        let lines = content
            .lines()
            .enumerate()
            .map(|(i, raw)| Line::new(i + 1, raw))
            .collect();

        Self {
            lines,
            current_line: 0,
            in_block: false,
        }
    }

    /// Line number of the most recently consumed line.
    pub fn current_line(&self) -> usize {
        self.current_line
    }

    /// Skip blank lines and return the next non-blank line, which opens a
    /// new block.
    pub fn next_directive(&mut self) -> Option<Line> {
        while let Some(line) = self.pop() {
            if !line.is_blank() {
                self.in_block = true;
                return Some(line);
            }
        }
        None
    }

    /// Next line of the current block.
    ///
    /// Returns `None` at the blank separator (which is consumed) or at end
    /// of input. Once the separator is reached this keeps returning `None`
    /// until [`next_directive`](Self::next_directive) opens a new block.
    pub fn next_block_line(&mut self) -> Option<Line> {
        if !self.in_block {
            return None;
        }
        match self.pop() {
            Some(line) if !line.is_blank() => Some(line),
            _ => {
                self.in_block = false;
                None
            }
        }
    }

    /// Look at the next line of the current block without consuming it.
    pub fn peek_block_line(&self) -> Option<&Line> {
        if !self.in_block {
            return None;
        }
        self.lines.front().filter(|line| !line.is_blank())
    }

    /// Discard the rest of the current block, including its separator.
    ///
    /// Returns the number of non-blank lines skipped.
    pub fn skip_block(&mut self) -> usize {
        let mut skipped = 0;
        while self.next_block_line().is_some() {
            skipped += 1;
        }
        skipped
    }

    fn pop(&mut self) -> Option<Line> {
        let line = self.lines.pop_front()?;
        self.current_line = line.number;
        Some(line)
    }
}
