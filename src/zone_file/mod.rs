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

//! Parsing of the [RFC 1035 § 5] zone file format.
//!
//! This module provides the [`Parser`] structure, which accepts a
//! stream implementing the [`BufRead`] trait. It can subsequently be
//! iterated over to read DNS records stored in [RFC 1035 § 5] format.
//! The `$ORIGIN` and `$TTL` directives are processed; `$INCLUDE` is
//! reported as an error.
//!
//! The parser only understands the *framing* of records: owner, TTL,
//! class, and type. The RDATA is returned as a list of raw fields (with
//! escape sequences and quotes intact), since the simulator only needs
//! to interpret the RDATA of a handful of types. See
//! [`crate::zone`] for that.
//!
//! Errors (which may be I/O errors or syntax errors) are reported
//! through the [`Error`] type. Iteration ends and parsing cannot be
//! continued after an error is returned.
//!
//! ```
//! use std::io::Cursor;
//! use negsim::rr::Type;
//! use negsim::zone_file::Parser;
//!
//! const ZONE_FILE: &[u8] = br#"
//! $TTL 86400
//! .   IN SOA a.root-servers.net. nstld.verisign-grs.com. (
//!     2023010100  ; SERIAL
//!     1800        ; REFRESH
//!     900         ; RETRY
//!     604800      ; EXPIRE
//!     86400       ; MINIMUM
//! )
//!     IN NS a.root-servers.net.
//! com. 172800 NS a.gtld-servers.net.
//! "#;
//!
//! let mut parser = Parser::new(Cursor::new(ZONE_FILE));
//! assert_eq!(parser.next().unwrap().unwrap().rr_type, Type::SOA);
//! assert_eq!(parser.next().unwrap().unwrap().rr_type, Type::NS);
//! assert_eq!(parser.next().unwrap().unwrap().rr_type, Type::NS);
//! assert!(parser.next().is_none());
//! ```
//!
//! [RFC 1035 § 5]: https://datatracker.ietf.org/doc/html/rfc1035#section-5

use std::io::BufRead;
use std::rc::Rc;

use crate::class::Class;
use crate::name::{Name, NameBuilder};
use crate::rr::{Ttl, Type};
use crate::util::Caseless;

mod error;
mod reader;
pub use error::{Error, ErrorDetails, ErrorKind, Result};
use reader::{Entry, Reader};

////////////////////////////////////////////////////////////////////////
// PARSER                                                             //
////////////////////////////////////////////////////////////////////////

/// A zone file parser.
///
/// See the [module-level documentation](`self`) for details.
pub struct Parser<S> {
    reader: Reader<S>,
    origin: Option<Rc<Name>>,
    default_ttl: Option<Ttl>,
    previous_owner: Option<Rc<Name>>,
    previous_ttl: Option<Ttl>,
    previous_class: Option<Class>,
    failed: bool,
}

/// A record read by the [`Parser`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedRr {
    /// The line on which the record started.
    pub line: usize,
    pub owner: Rc<Name>,
    pub ttl: Ttl,
    pub class: Class,
    pub rr_type: Type,

    /// The RDATA fields, exactly as they appeared in the file.
    pub rdata: Vec<String>,

    /// The origin in effect for the record, against which relative
    /// names in the RDATA are completed.
    pub origin: Option<Rc<Name>>,
}

impl<S: BufRead> Parser<S> {
    /// Creates a new [`Parser`] to parse a zone file from the provided
    /// stream. No origin is set; relative names are an error until a
    /// `$ORIGIN` directive is seen.
    pub fn new(stream: S) -> Self {
        Self {
            reader: Reader::new(stream),
            origin: None,
            default_ttl: None,
            previous_owner: None,
            previous_ttl: None,
            previous_class: None,
            failed: false,
        }
    }

    /// Creates a new [`Parser`] with an initial origin.
    pub fn with_origin(stream: S, origin: Name) -> Self {
        let mut parser = Self::new(stream);
        parser.origin = Some(Rc::new(origin));
        parser
    }

    /// Reads entries until the next record, processing any directives
    /// along the way.
    fn next_record(&mut self) -> Result<Option<ParsedRr>> {
        while let Some(entry) = self.reader.next_entry()? {
            if entry.fields[0].starts_with('$') {
                self.process_directive(entry)?;
            } else {
                return self.process_record(entry).map(Some);
            }
        }
        Ok(None)
    }

    fn process_directive(&mut self, entry: Entry) -> Result<()> {
        let line = entry.line;
        let mut fields = entry.fields.into_iter();
        let directive = fields.next().unwrap_or_default();
        let directive = Caseless(&directive);

        if directive == Caseless("$ORIGIN") {
            let text = fields
                .next()
                .ok_or_else(|| Error::new(line, ErrorKind::ExpectedName))?;
            let origin = self.parse_name(&text, line)?;
            self.origin = Some(Rc::new(origin));
            Ok(())
        } else if directive == Caseless("$TTL") {
            let text = fields
                .next()
                .ok_or_else(|| Error::new(line, ErrorKind::ExpectedTtl))?;
            let ttl = text
                .parse()
                .map_err(|e| Error::new(line, ErrorKind::InvalidTtl(e)))?;
            self.default_ttl = Some(ttl);
            Ok(())
        } else if directive == Caseless("$INCLUDE") {
            Err(Error::new(line, ErrorKind::IncludeNotSupported))
        } else {
            Err(Error::new(line, ErrorKind::UnknownDirective))
        }
    }

    fn process_record(&mut self, entry: Entry) -> Result<ParsedRr> {
        let line = entry.line;
        let mut fields = entry.fields.into_iter().peekable();

        let owner = if entry.blank_owner {
            self.previous_owner
                .clone()
                .ok_or_else(|| Error::new(line, ErrorKind::EmptyOwnerWithNoPrevious))?
        } else {
            let text = fields
                .next()
                .ok_or_else(|| Error::new(line, ErrorKind::ExpectedName))?;
            Rc::new(self.parse_name(&text, line)?)
        };

        // The TTL and class may appear in either order, and either may
        // be omitted.
        let mut ttl = None;
        let mut class = None;
        while let Some(field) = fields.peek() {
            if ttl.is_none() && field.starts_with(|c: char| c.is_ascii_digit()) {
                ttl = Some(
                    field
                        .parse::<Ttl>()
                        .map_err(|e| Error::new(line, ErrorKind::InvalidTtl(e)))?,
                );
            } else if let (None, Ok(parsed)) = (class, field.parse::<Class>()) {
                class = Some(parsed);
            } else {
                break;
            }
            fields.next();
        }

        let rr_type = fields
            .next()
            .ok_or_else(|| Error::new(line, ErrorKind::ExpectedType))?
            .parse::<Type>()
            .map_err(|e| Error::new(line, ErrorKind::InvalidType(e)))?;

        let ttl = ttl
            .or(self.default_ttl)
            .or(self.previous_ttl)
            .ok_or_else(|| Error::new(line, ErrorKind::OmittedTtlWithNoDefaultOrPrevious))?;
        let class = class
            .or(self.previous_class)
            .ok_or_else(|| Error::new(line, ErrorKind::OmittedClassWithNoPrevious))?;

        self.previous_owner = Some(owner.clone());
        self.previous_ttl = Some(ttl);
        self.previous_class = Some(class);

        Ok(ParsedRr {
            line,
            owner,
            ttl,
            class,
            rr_type,
            rdata: fields.collect(),
            origin: self.origin.clone(),
        })
    }

    /// Parses a domain name field, resolving `@` and relative names
    /// against the current origin.
    fn parse_name(&self, text: &str, line: usize) -> Result<Name> {
        if text == "@" {
            return self
                .origin
                .as_deref()
                .cloned()
                .ok_or_else(|| Error::new(line, ErrorKind::AtWhenOriginNotSet));
        }
        parse_name_field(text, self.origin.as_deref())
            .map_err(|kind| Error::new(line, kind))
    }
}

impl<S: BufRead> Iterator for Parser<S> {
    type Item = Result<ParsedRr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.next_record().transpose();
        if let Some(Err(_)) = result {
            self.failed = true;
        }
        result
    }
}

/// Parses a domain name in presentation format. A name without a
/// trailing period is completed with `origin`.
pub fn parse_name_field(text: &str, origin: Option<&Name>) -> std::result::Result<Name, ErrorKind> {
    if text == "." {
        return Ok(Name::root());
    }
    let mut builder = NameBuilder::new();
    builder.push_text(text).map_err(ErrorKind::InvalidName)?;
    if builder.is_fully_qualified() {
        builder.finish().map_err(ErrorKind::InvalidName)
    } else {
        let origin = origin.ok_or(ErrorKind::PqdnWhenOriginNotSet)?;
        builder
            .finish_with_suffix(origin)
            .map_err(ErrorKind::InvalidName)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn parse_all(text: &str) -> Result<Vec<ParsedRr>> {
        Parser::new(Cursor::new(text.as_bytes())).collect()
    }

    fn error_kind(text: &str) -> ErrorKind {
        match parse_all(text) {
            Err(Error::Syntax(details)) => details.kind().clone(),
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn parser_resolves_origin_and_relative_names() {
        let records = parse_all(
            "$ORIGIN example.\n\
             @ 60 IN NS ns\n\
             www IN 30 A 192.0.2.1\n\
             \tAAAA 2001:db8::1\n",
        )
        .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(*records[0].owner, "example.".parse::<Name>().unwrap());
        assert_eq!(records[0].rdata, vec!["ns".to_string()]);
        assert_eq!(*records[1].owner, "www.example.".parse::<Name>().unwrap());
        assert_eq!(records[1].ttl, Ttl::from(30));
        assert_eq!(records[2].owner, records[1].owner);
        assert_eq!(records[2].ttl, Ttl::from(30));
        assert_eq!(records[2].class, Class::IN);
        assert_eq!(records[2].rr_type, Type::AAAA);
        assert_eq!(records[2].line, 4);
    }

    #[test]
    fn parser_prefers_default_ttl() {
        let records = parse_all("$TTL 1h\na. 5 IN A 192.0.2.1\nb. A 192.0.2.2\n").unwrap();
        assert_eq!(records[0].ttl, Ttl::from(5));
        assert_eq!(records[1].ttl, Ttl::from(3600));
    }

    #[test]
    fn parser_accepts_generic_types() {
        let records = parse_all(". 10 IN TYPE47 \\# 0\n").unwrap();
        assert_eq!(records[0].rr_type, Type::NSEC);
        assert_eq!(records[0].rdata, vec!["\\#".to_string(), "0".to_string()]);
    }

    #[test]
    fn parser_reports_errors() {
        assert_eq!(error_kind("a NS b.\n"), ErrorKind::PqdnWhenOriginNotSet);
        assert_eq!(error_kind("@ 1 IN NS b.\n"), ErrorKind::AtWhenOriginNotSet);
        assert_eq!(error_kind("  1 IN NS b.\n"), ErrorKind::EmptyOwnerWithNoPrevious);
        assert_eq!(error_kind("a. IN NS b.\n"), ErrorKind::OmittedTtlWithNoDefaultOrPrevious);
        assert_eq!(error_kind("a. 1 NS b.\n"), ErrorKind::OmittedClassWithNoPrevious);
        assert_eq!(error_kind("a. 1 IN\n"), ErrorKind::ExpectedType);
        assert_eq!(error_kind("$INCLUDE other.zone\n"), ErrorKind::IncludeNotSupported);
        assert_eq!(error_kind("$BOGUS\n"), ErrorKind::UnknownDirective);
        assert!(matches!(
            error_kind("a. 1 IN BOGUS b.\n"),
            ErrorKind::InvalidType(_)
        ));
    }

    #[test]
    fn parser_stops_after_error() {
        let mut parser = Parser::new(Cursor::new(&b"$BOGUS\na. 1 IN A 192.0.2.1\n"[..]));
        assert!(matches!(parser.next(), Some(Err(_))));
        assert!(parser.next().is_none());
    }
}
