// [libs/domain/src/lib.rs]
//! Shared domain model for the CNAB ingest pipeline.
//!
//! Every type here is plain data: no I/O, no async, no database or HTTP
//! dependency. Components downstream (parsers, validator, extractor,
//! persistence, orchestrator) all build on these shapes so that the
//! hierarchy they describe — file -> batches -> segments, barcode,
//! operation — has exactly one definition in the workspace.

pub mod barcode;
pub mod cnab240;
pub mod cnab400;
pub mod diagnostics;
pub mod file_print;
pub mod operation;
pub mod options;
pub mod parsed_tree;

pub use barcode::{Barcode, BarcodeSegmento, BarcodeStatus, BarcodeTipo};
pub use cnab240::{
    Batch, Cnab240BatchHeader, Cnab240BatchTrailer, Cnab240File, Cnab240FileHeader,
    Cnab240FileTrailer, Detail, RawSegment, SegmentA, SegmentB, SegmentJ, SegmentO, SegmentPayload,
};
pub use cnab400::{Cnab400File, Cnab400Header, Cnab400Record, Cnab400Trailer};
pub use diagnostics::{Diagnostic, Severity};
pub use file_print::{content_preview, FilePrint, FileType, ValidationStatus};
pub use operation::{Operation, OperationStatus, OperationType};
pub use options::{Dialect, IngestOptions};
pub use parsed_tree::{ParseOutcome, ParsedTree};
