// Copyright 2021 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The [`Reader`] structure.
//!
//! See the [`zone_file` module-level documentation](`super`) for
//! details about how the [`Reader`] is used.

use std::io::BufRead;
use std::str;

use super::{Error, ErrorKind, Result};

////////////////////////////////////////////////////////////////////////
// STRUCTURES                                                         //
////////////////////////////////////////////////////////////////////////

/// Splits a zone file into logical lines of whitespace-separated
/// fields.
///
/// The [`Reader`] processes comments, quoted strings, and parentheses
/// for line extension. Escape sequences are *not* interpreted; a
/// backslash and the octet after it are kept in the field, since only
/// the caller knows whether the field is a domain name or something
/// else.
pub(super) struct Reader<S> {
    stream: S,
    buf: Vec<u8>,
    line: usize,
}

/// A logical line of a zone file.
#[derive(Debug, Eq, PartialEq)]
pub(super) struct Entry {
    /// The (physical) line on which the entry started.
    pub line: usize,

    /// Whether the entry started with whitespace, meaning that the
    /// owner was left blank.
    pub blank_owner: bool,

    /// The fields of the entry. Quoted strings keep their quotes.
    pub fields: Vec<String>,
}

/// Tokenizer state carried from one physical line to the next.
#[derive(Default)]
struct Lexer {
    fields: Vec<String>,
    field: Vec<u8>,
    in_field: bool,
    in_parens: bool,
}

////////////////////////////////////////////////////////////////////////
// READER IMPLEMENTATION                                              //
////////////////////////////////////////////////////////////////////////

impl<S: BufRead> Reader<S> {
    /// Constructs a new [`Reader`] from the given stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: Vec::new(),
            line: 0,
        }
    }

    /// Reads the next non-empty logical line, or returns `None` at
    /// end-of-file.
    pub fn next_entry(&mut self) -> Result<Option<Entry>> {
        let mut lexer = Lexer::default();
        let mut start = None;

        loop {
            self.buf.clear();
            if self.stream.read_until(b'\n', &mut self.buf)? == 0 {
                return if lexer.in_parens {
                    Err(Error::new(self.line, ErrorKind::EofBeforeCloseParen))
                } else {
                    Ok(None)
                };
            }
            self.line += 1;

            let (line, blank_owner) = *start.get_or_insert((
                self.line,
                matches!(self.buf.first(), Some(b' ' | b'\t')),
            ));
            lexer
                .lex(&self.buf)
                .map_err(|kind| Error::new(self.line, kind))?;

            if !lexer.in_parens {
                if lexer.fields.is_empty() {
                    // Blank or comment-only line.
                    start = None;
                    continue;
                }
                return Ok(Some(Entry {
                    line,
                    blank_owner,
                    fields: lexer.fields,
                }));
            }
        }
    }
}

impl Lexer {
    /// Tokenizes one physical line, appending to the current entry.
    fn lex(&mut self, line: &[u8]) -> std::result::Result<(), ErrorKind> {
        let mut in_quotes = false;
        let mut octets = line.iter().copied();

        while let Some(octet) = octets.next() {
            if in_quotes {
                self.field.push(octet);
                match octet {
                    b'\\' => self.push_escaped(octets.next())?,
                    b'"' => {
                        in_quotes = false;
                        self.end_field()?;
                    }
                    _ => (),
                }
                continue;
            }

            match octet {
                b' ' | b'\t' | b'\r' | b'\n' => self.end_field()?,
                b';' => break,
                b'(' => {
                    self.end_field()?;
                    if self.in_parens {
                        return Err(ErrorKind::NestedParens);
                    }
                    self.in_parens = true;
                }
                b')' => {
                    self.end_field()?;
                    if !self.in_parens {
                        return Err(ErrorKind::UnmatchedCloseParen);
                    }
                    self.in_parens = false;
                }
                b'"' => {
                    self.end_field()?;
                    self.in_field = true;
                    self.field.push(octet);
                    in_quotes = true;
                }
                b'\\' => {
                    self.in_field = true;
                    self.field.push(octet);
                    self.push_escaped(octets.next())?;
                }
                _ => {
                    self.in_field = true;
                    self.field.push(octet);
                }
            }
        }

        if in_quotes {
            Err(ErrorKind::UnterminatedQuote)
        } else {
            self.end_field()
        }
    }

    fn push_escaped(&mut self, octet: Option<u8>) -> std::result::Result<(), ErrorKind> {
        match octet {
            Some(b'\r' | b'\n') | None => Err(ErrorKind::EscapeAtEndOfLine),
            Some(octet) => {
                self.field.push(octet);
                Ok(())
            }
        }
    }

    fn end_field(&mut self) -> std::result::Result<(), ErrorKind> {
        if self.in_field {
            let field = str::from_utf8(&self.field).map_err(ErrorKind::BadUtf8)?;
            self.fields.push(field.to_owned());
            self.field.clear();
            self.in_field = false;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn entries(text: &str) -> Result<Vec<Entry>> {
        let mut reader = Reader::new(Cursor::new(text.as_bytes()));
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }

    fn fields(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reader_splits_fields_and_skips_comments() {
        let entries = entries("a. IN NS b. ; comment\n\n; only a comment\n  NS c.\n").unwrap();
        assert_eq!(
            entries,
            vec![
                Entry {
                    line: 1,
                    blank_owner: false,
                    fields: fields(&["a.", "IN", "NS", "b."]),
                },
                Entry {
                    line: 4,
                    blank_owner: true,
                    fields: fields(&["NS", "c."]),
                },
            ]
        );
    }

    #[test]
    fn reader_joins_parenthesized_lines() {
        let entries = entries(". SOA a. b. (\n 1 ; serial\n 2 3 4 5 )\nx. A 1.2.3.4\n").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line, 1);
        assert_eq!(
            entries[0].fields,
            fields(&[".", "SOA", "a.", "b.", "1", "2", "3", "4", "5"])
        );
        assert_eq!(entries[1].line, 4);
    }

    #[test]
    fn reader_keeps_escapes_and_quotes() {
        let entries = entries("a\\ b. TXT \"x ; (y)\" c\\;d\n").unwrap();
        assert_eq!(
            entries[0].fields,
            fields(&["a\\ b.", "TXT", "\"x ; (y)\"", "c\\;d"])
        );
    }

    #[test]
    fn reader_rejects_bad_parentheses() {
        for (text, kind) in [
            ("a. ( ( NS b.\n", ErrorKind::NestedParens),
            ("a. NS b. )\n", ErrorKind::UnmatchedCloseParen),
            ("a. NS ( b.\n", ErrorKind::EofBeforeCloseParen),
            ("a. TXT \"b\n", ErrorKind::UnterminatedQuote),
            ("a. TXT b\\\n", ErrorKind::EscapeAtEndOfLine),
        ] {
            match entries(text) {
                Err(Error::Syntax(details)) => assert_eq!(details.kind(), &kind),
                other => panic!("unexpected result for {:?}: {:?}", text, other),
            }
        }
    }
}
