use thiserror::Error;

/// Reserved for the cases §7 calls "structurally unparseable": no lines at
/// all, or a file that never produces a single file header. Every other
/// irregularity is absorbed into a [`cnab_domain::Diagnostic`] instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Cnab240ParseError {
    #[error("CONTEUDO_OBRIGATORIO: no non-empty lines in input")]
    EmptyInput,

    #[error("CABECALHO_AUSENTE: no file header ('0' record) was ever seen")]
    NoFileHeader,
}
