//! Delimiter-aware CSV reader and writer.
//!
//! Fields are separated by comma, semicolon or tab; the delimiter of a
//! document is detected from its header row. Quoting follows RFC 4180:
//! a quoted field may contain delimiters, line breaks and doubled quotes.

use std::borrow::Cow;

use crate::core::error::CsvError;

/// Delimiters recognized by [`detect_delimiter`], in order of preference.
pub const DELIMITERS: [char; 3] = [',', ';', '\t'];

/// A parsed document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvDocument {
    pub delimiter: char,
    pub rows: Vec<Vec<String>>,
}

impl CsvDocument {
    /// Parse `input`, detecting the delimiter from the first line.
    pub fn parse(input: &str) -> Result<Self, CsvError> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        if input.trim().is_empty() {
            return Err(CsvError::Empty);
        }
        let delimiter = detect_delimiter(input);
        let rows = Reader::new(input, delimiter).read_all()?;
        Ok(Self { delimiter, rows })
    }

    pub fn to_csv(&self) -> String {
        write_rows(&self.rows, self.delimiter)
    }
}

/// The delimiter occurring most often (outside quotes) in the first line.
/// Ties and lines without any delimiter resolve to comma.
pub fn detect_delimiter(input: &str) -> char {
    let mut counts = [0usize; DELIMITERS.len()];
    let mut quoted = false;
    for c in input.chars() {
        match c {
            '"' => quoted = !quoted,
            '\n' | '\r' if !quoted => break,
            _ if !quoted => {
                if let Some(i) = DELIMITERS.iter().position(|d| *d == c) {
                    counts[i] += 1;
                }
            }
            _ => {}
        }
    }
    let mut best = 0;
    for (i, count) in counts.iter().enumerate() {
        if *count > counts[best] {
            best = i;
        }
    }
    DELIMITERS[best]
}

// =============================================================================
// Reader
// =============================================================================

struct Reader<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    delimiter: char,
}

enum FieldEnd {
    Delimiter,
    Record,
    Eof,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str, delimiter: char) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            delimiter,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
    }

    fn read_all(mut self) -> Result<Vec<Vec<String>>, CsvError> {
        let mut rows = Vec::new();
        let mut record = Vec::new();
        loop {
            let (field, end) = self.read_field()?;
            record.push(field);
            match end {
                FieldEnd::Delimiter => continue,
                FieldEnd::Record | FieldEnd::Eof => {
                    let blank = record.len() == 1 && record[0].is_empty();
                    if !blank {
                        rows.push(std::mem::take(&mut record));
                    }
                    record.clear();
                    if matches!(end, FieldEnd::Eof) {
                        return Ok(rows);
                    }
                }
            }
        }
    }

    fn read_field(&mut self) -> Result<(String, FieldEnd), CsvError> {
        let mut value = String::new();
        if self.current_char() == Some('"') {
            self.read_quoted(&mut value)?;
        }
        while let Some(c) = self.current_char() {
            self.bump(c);
            match c {
                c if c == self.delimiter => return Ok((value, FieldEnd::Delimiter)),
                '\n' => return Ok((value, FieldEnd::Record)),
                '\r' => {
                    if self.current_char() == Some('\n') {
                        self.bump('\n');
                    }
                    return Ok((value, FieldEnd::Record));
                }
                c => value.push(c),
            }
        }
        Ok((value, FieldEnd::Eof))
    }

    fn read_quoted(&mut self, value: &mut String) -> Result<(), CsvError> {
        let start_line = self.line;
        self.bump('"');
        while let Some(c) = self.current_char() {
            self.bump(c);
            if c == '"' {
                if self.current_char() == Some('"') {
                    self.bump('"');
                    value.push('"');
                } else {
                    return Ok(());
                }
            } else {
                value.push(c);
            }
        }
        Err(CsvError::UnterminatedQuote { line: start_line })
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Quote `value` when it contains the delimiter, a quote or a line break.
pub fn encode_field(value: &str, delimiter: char) -> Cow<'_, str> {
    let needs_quotes = value
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\n' || c == '\r');
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn write_rows(rows: &[Vec<String>], delimiter: char) -> String {
    let mut out = String::new();
    for row in rows {
        let mut first = true;
        for field in row {
            if !first {
                out.push(delimiter);
            }
            first = false;
            out.push_str(&encode_field(field, delimiter));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_detection() {
        assert_eq!(detect_delimiter("a,b,c\n1;2;3;4;5"), ',');
        assert_eq!(detect_delimiter("a;b;c"), ';');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("\"x;y;z\",b"), ',');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_parse_quoted_fields() {
        let doc = CsvDocument::parse("name;note\r\nbob;\"a;b\"\r\n\"eve\";\"say \"\"hi\"\"\"\n").unwrap();
        assert_eq!(doc.delimiter, ';');
        assert_eq!(
            doc.rows,
            vec![
                vec!["name".to_string(), "note".to_string()],
                vec!["bob".to_string(), "a;b".to_string()],
                vec!["eve".to_string(), "say \"hi\"".to_string()],
            ]
        );
    }

    #[test]
    fn test_multiline_field_and_blank_lines() {
        let doc = CsvDocument::parse("a,b\n\n\"line1\nline2\",x\n\n").unwrap();
        assert_eq!(doc.rows.len(), 2);
        assert_eq!(doc.rows[1][0], "line1\nline2");
    }

    #[test]
    fn test_value_with_delimiter_survives_round_trip() {
        for delimiter in DELIMITERS {
            let value = format!("left{delimiter}right \"quoted\"");
            let rows = vec![
                vec!["username".to_string(), "note".to_string()],
                vec!["alice".to_string(), value.clone()],
            ];
            let text = write_rows(&rows, delimiter);
            let doc = CsvDocument::parse(&text).unwrap();
            assert_eq!(doc.delimiter, delimiter);
            assert_eq!(doc.rows[1][1], value);
        }
    }

    #[test]
    fn test_errors() {
        assert_eq!(CsvDocument::parse("  \n"), Err(CsvError::Empty));
        assert_eq!(
            CsvDocument::parse("a,b\nx,\"open\n"),
            Err(CsvError::UnterminatedQuote { line: 2 })
        );
    }

    #[test]
    fn test_bom_is_ignored() {
        let doc = CsvDocument::parse("\u{feff}username,groups\n").unwrap();
        assert_eq!(doc.rows[0][0], "username");
    }
}
