//! Minimal CSV reader
//!
//! Comma separated, optional double-quoted fields with `""` escapes,
//! LF or CRLF line endings. Blank lines are skipped.

use crate::error::{IngestionError, Result};

/// One data row with its 1-based source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Parsed CSV document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDocument {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
    /// Blank lines skipped while reading
    pub skipped_blank: usize,
}

/// Parse a whole CSV document; the first non-blank record is the header.
pub fn parse_document(text: &str, source_name: &str) -> Result<CsvDocument> {
    let mut records = Records::new(text, source_name);

    let headers = loop {
        match records.next_record()? {
            Some((_, fields)) if is_blank(&fields) => records.skipped_blank += 1,
            Some((_, fields)) => {
                break fields
                    .into_iter()
                    .map(|h| h.trim().to_string())
                    .collect::<Vec<_>>()
            }
            None => {
                return Err(IngestionError::Empty {
                    source_name: source_name.to_string(),
                })
            }
        }
    };

    let mut rows = Vec::new();
    while let Some((line, fields)) = records.next_record()? {
        if is_blank(&fields) {
            records.skipped_blank += 1;
            continue;
        }
        if fields.len() != headers.len() {
            return Err(IngestionError::RowLength {
                source_name: source_name.to_string(),
                line,
                expected: headers.len(),
                actual: fields.len(),
            });
        }
        rows.push(CsvRow { line, fields });
    }

    Ok(CsvDocument {
        headers,
        rows,
        skipped_blank: records.skipped_blank,
    })
}

fn is_blank(fields: &[String]) -> bool {
    fields.len() == 1 && fields[0].trim().is_empty()
}

struct Records<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    source_name: &'a str,
    line: usize,
    skipped_blank: usize,
}

impl<'a> Records<'a> {
    fn new(text: &'a str, source_name: &'a str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self {
            chars: text.chars().peekable(),
            source_name,
            line: 1,
            skipped_blank: 0,
        }
    }

    /// Next record and the line it started on, or `None` at end of input.
    fn next_record(&mut self) -> Result<Option<(usize, Vec<String>)>> {
        if self.chars.peek().is_none() {
            return Ok(None);
        }

        let start_line = self.line;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;

        loop {
            match self.chars.next() {
                None => {
                    if in_quotes {
                        return Err(IngestionError::Malformed {
                            source_name: self.source_name.to_string(),
                            line: start_line,
                            message: "unterminated quoted field".to_string(),
                        });
                    }
                    fields.push(field);
                    return Ok(Some((start_line, fields)));
                }
                Some('"') if in_quotes => {
                    if self.chars.peek() == Some(&'"') {
                        self.chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                Some('"') if field.is_empty() => in_quotes = true,
                Some('\n') if in_quotes => {
                    self.line += 1;
                    field.push('\n');
                }
                Some(',') if !in_quotes => fields.push(std::mem::take(&mut field)),
                Some('\r') if !in_quotes && self.chars.peek() == Some(&'\n') => {}
                Some('\n') => {
                    self.line += 1;
                    fields.push(field);
                    return Ok(Some((start_line, fields)));
                }
                Some(c) => field.push(c),
            }
        }
    }
}
