use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("CONTEUDO_OBRIGATORIO: input has no non-empty lines")]
    EmptyContent,

    #[error("FORMATO_NAO_DETECTADO: modal line length {modal_length} matches neither CNAB dialect")]
    UnknownFormat { modal_length: usize },
}
