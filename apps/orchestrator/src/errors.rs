// [apps/orchestrator/src/errors.rs]
//! Orchestrator-level error type: wraps every component error `process()`
//! can surface and attaches the stable `codigo` each one already carries in
//! its `Display` impl (§7). `anyhow` is reserved for the CLI boundary,
//! where this type is the thing `anyhow::Error` ultimately wraps.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Detection(#[from] cnab_detector::DetectionError),

    #[error(transparent)]
    Parse240(#[from] cnab_parser_240::Cnab240ParseError),

    #[error(transparent)]
    Parse400(#[from] cnab_parser_400::Cnab400ParseError),

    #[error(transparent)]
    Persistence(#[from] cnab_persistence::PersistenceError),

    #[error(transparent)]
    Settlement(#[from] cnab_settlement_client::SettlementError),

    #[error("FORMATO_FORCADO_AUSENTE: detectar_formato is false but no formato was supplied")]
    MissingForcedDialect,

    #[error("LIQUIDACAO_NAO_CONFIGURADA: settlement client was not wired into this orchestrator instance")]
    SettlementNotConfigured,
}

impl IngestError {
    /// Stable error code for the response envelope (§7: "every response
    /// includes ... a stable error codigo").
    pub fn codigo(&self) -> &'static str {
        match self {
            IngestError::Detection(cnab_detector::DetectionError::EmptyContent) => "CONTEUDO_OBRIGATORIO",
            IngestError::Detection(cnab_detector::DetectionError::UnknownFormat { .. }) => "FORMATO_NAO_DETECTADO",
            IngestError::Parse240(cnab_parser_240::Cnab240ParseError::EmptyInput) => "CONTEUDO_OBRIGATORIO",
            IngestError::Parse240(cnab_parser_240::Cnab240ParseError::NoFileHeader) => "CABECALHO_AUSENTE",
            IngestError::Parse400(cnab_parser_400::Cnab400ParseError::EmptyInput) => "CONTEUDO_OBRIGATORIO",
            IngestError::Parse400(cnab_parser_400::Cnab400ParseError::NoFileHeader) => "CABECALHO_AUSENTE",
            IngestError::Persistence(_) => "PERSISTENCIA_FALHOU",
            IngestError::Settlement(cnab_settlement_client::SettlementError::InvalidFormat) => "FORMATO_INVALIDO",
            IngestError::Settlement(cnab_settlement_client::SettlementError::CircuitOpen) => "CIRCUITO_ABERTO",
            IngestError::Settlement(_) => "LIQUIDACAO_FALHOU",
            IngestError::MissingForcedDialect => "FORMATO_FORCADO_AUSENTE",
            IngestError::SettlementNotConfigured => "LIQUIDACAO_NAO_CONFIGURADA",
        }
    }
}
