use thiserror::Error;

/// Mirrors `cnab_parser_240::Cnab240ParseError`: reserved for content a
/// human couldn't fix by reading a diagnostic. Everything else, including a
/// trailer that never shows up, is a [`cnab_domain::Diagnostic`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Cnab400ParseError {
    #[error("CONTEUDO_OBRIGATORIO: no non-empty lines in input")]
    EmptyInput,

    #[error("CABECALHO_AUSENTE: the first line is not a header ('0' record)")]
    NoFileHeader,
}
