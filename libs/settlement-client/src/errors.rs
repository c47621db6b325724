// [libs/settlement-client/src/errors.rs]
use thiserror::Error;

/// Stable string codes embedded in `Display`, matching §7's error
/// taxonomy for the settlement boundary.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("FORMATO_INVALIDO: codigo de barras deve ter 47 ou 48 digitos numericos")]
    InvalidFormat,

    #[error("RESPOSTA_VAZIA: upstream retornou corpo vazio")]
    EmptyResponse,

    #[error("ID_AUSENTE: checkBoleto nao retornou um identificador de pagamento")]
    MissingPaymentId,

    #[error("CIRCUITO_ABERTO: disjuntor aberto, requisicao recusada sem chamar a rede")]
    CircuitOpen,

    #[error("AUTENTICACAO_FALHOU: {0}")]
    Authentication(String),

    #[error("UPSTREAM_ERRO: HTTP {0}")]
    Upstream(u16),

    /// A non-401 4xx response. Per §4.H/§7 only 5xx and network errors
    /// count toward the circuit breaker; a client error is the caller's
    /// fault and fails immediately without tripping it.
    #[error("REQUISICAO_INVALIDA: HTTP {0}")]
    ClientError(u16),

    #[error("REQUISICAO_FALHOU: {0}")]
    Request(#[from] reqwest::Error),

    #[error("DESERIALIZACAO_FALHOU: {0}")]
    Deserialization(#[from] serde_json::Error),
}
