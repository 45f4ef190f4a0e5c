//! Core location types
//!
//! Copyright (c) 2025 Posit, PBC

/// A unique identifier for a registered source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

/// A location in source text (0-indexed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    /// Byte offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed, in characters not bytes)
    pub column: usize,
}

impl Location {
    pub fn new(offset: usize, row: usize, column: usize) -> Self {
        Self {
            offset,
            row,
            column,
        }
    }

    /// 1-based line number, as shown in diagnostics and line comments.
    pub fn line(&self) -> usize {
        self.row + 1
    }
}

/// A range in source text from start to end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    /// Start location (inclusive)
    pub start: Location,
    /// End location (exclusive)
    pub end: Location,
}

impl Range {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// Smallest range covering both `self` and `other`.
    pub fn cover(&self, other: &Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A range inside one registered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub file: FileId,
    pub range: Range,
}

impl SourceSpan {
    pub fn new(file: FileId, range: Range) -> Self {
        Self { file, range }
    }

    /// 1-based line of the first character.
    pub fn line(&self) -> usize {
        self.range.start.line()
    }

    /// 1-based column of the first character.
    pub fn column(&self) -> usize {
        self.range.start.column + 1
    }

    /// Extend this span to the end of `other`. Spans in different files are
    /// left untouched.
    pub fn to(&self, other: &SourceSpan) -> SourceSpan {
        if self.file != other.file {
            return *self;
        }
        SourceSpan {
            file: self.file,
            range: self.range.cover(&other.range),
        }
    }
}
