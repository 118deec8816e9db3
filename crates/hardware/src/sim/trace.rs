//! Trace input.
//!
//! A trace is a text file with one memory reference per line:
//!
//! ```text
//! <processor> <r|w> <address>
//! ```
//!
//! The processor id is decimal, the operation is a single character, and the
//! address is hexadecimal with an optional `0x` prefix. Blank lines are
//! skipped. The reader is a lazy iterator: records are parsed one at a time
//! as the simulation consumes them, so traces far larger than memory replay
//! fine.
//!
//! Parsing is strict. A record that is not exactly three fields, an
//! operation other than `r`/`w`, or a non-numeric field is reported as a
//! [`TraceError`] carrying the 1-based line number; nothing is silently
//! skipped or coerced.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::MemOp;
use crate::common::error::TraceError;

/// One memory reference from the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// Id of the issuing processor.
    pub processor: usize,
    /// Read or write.
    pub op: MemOp,
    /// Byte address of the reference, treated as an opaque unsigned value.
    pub addr: u64,
}

/// Lazy reader yielding [`TraceRecord`]s from any buffered source.
#[derive(Debug)]
pub struct TraceReader<R> {
    reader: R,
    line_no: u64,
}

impl TraceReader<BufReader<File>> {
    /// Opens a trace file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Io`] when the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> TraceReader<R> {
    /// Wraps an already-buffered source.
    pub const fn new(reader: R) -> Self {
        Self { reader, line_no: 0 }
    }

    fn parse(&self, line: &str) -> Result<TraceRecord, TraceError> {
        let mut fields = line.split_whitespace();
        let (Some(proc_field), Some(op_field), Some(addr_field), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(TraceError::Malformed {
                line: self.line_no,
                record: line.to_string(),
            });
        };

        let processor = proc_field
            .parse::<usize>()
            .map_err(|_| TraceError::BadProcessor {
                line: self.line_no,
                field: proc_field.to_string(),
            })?;

        let op = MemOp::from_symbol(op_field).ok_or_else(|| TraceError::UnknownOp {
            line: self.line_no,
            op: op_field.to_string(),
        })?;

        let digits = addr_field
            .strip_prefix("0x")
            .or_else(|| addr_field.strip_prefix("0X"))
            .unwrap_or(addr_field);
        let addr = u64::from_str_radix(digits, 16).map_err(|_| TraceError::BadAddress {
            line: self.line_no,
            field: addr_field.to_string(),
        })?;

        Ok(TraceRecord {
            processor,
            op,
            addr,
        })
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = String::new();
        loop {
            buf.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(TraceError::Io(e))),
            }

            let line = buf.trim();
            if line.is_empty() {
                continue;
            }
            return Some(self.parse(line));
        }
    }
}
