use thiserror::Error;

/// Field-scope failures. `spec.md` §7 mandates these never propagate past
/// the record that produced them — callers catch `CodecError` and attach a
/// `Diagnostic` to the enclosing record instead of aborting the parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("CAMPO_NAO_NUMERICO: expected digits only, got {0:?}")]
    NotNumeric(String),

    #[error("CAMPO_FORA_DE_FAIXA: requested [{start}, {end}) exceeds line length {line_len}")]
    OutOfRange {
        start: usize,
        end: usize,
        line_len: usize,
    },
}
