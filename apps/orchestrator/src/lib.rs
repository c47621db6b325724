// [apps/orchestrator/src/lib.rs]
//! `process(bytes, opts) -> Result<IngestReport, IngestError>` (§4.J): the
//! end-to-end pipeline wiring every other crate in this workspace behind
//! one call — hash/dedup, Operation/File bookkeeping, format detection,
//! parse, validate, persist, and an out-of-transaction webhook dispatch.

pub mod barcode_cache;
pub mod config;
pub mod errors;

pub use config::{ConfigError, OrchestratorConfig};
pub use errors::IngestError;

use barcode_cache::BarcodeVerificationCache;
use cnab_domain::{
    content_preview, Barcode, Dialect, Diagnostic, FilePrint, FileType, IngestOptions, Operation, OperationType,
    ParsedTree, ValidationStatus,
};
use cnab_persistence::{files::sha256_hex, FileRecordResult, Persister};
use cnab_settlement_client::{BoletoCheck, PaymentResult, SettlementClient};
use cnab_validator::{validate, RecordCountConvention, ValidationReport};
use cnab_webhook::{DeliveryReport, WebhookClient};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Default freshness window for a cached `checkBoleto` result (§5 leaves
/// the TTL to the implementation).
const DEFAULT_BARCODE_CACHE_TTL: Duration = Duration::from_secs(300);

/// The response envelope §7 requires for every ingest: `operationId`, the
/// detected format, the validation report, the extracted barcodes, and —
/// filled in after the transaction commits — the webhook delivery outcome.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub operation_id: Uuid,
    pub file_id: Uuid,
    pub detected_format: Dialect,
    /// `Some(existing_file_id)` when this ingest short-circuited on a
    /// `file_hash` already on record; `barcodes` is empty in that case,
    /// since nothing new was parsed into the database.
    pub duplicate_of: Option<Uuid>,
    pub diagnostics: Vec<Diagnostic>,
    pub validation: ValidationReport,
    pub barcodes: Vec<Barcode>,
    /// The tree as parsed, independent of whether it was a duplicate and
    /// skipped persistence — carried so the webhook payload can include
    /// `cabecalho`/`registros` (§6) without re-parsing.
    pub tree: ParsedTree,
    pub webhook: Option<DeliveryReport>,
}

impl IngestReport {
    pub fn total_valor(&self) -> rust_decimal::Decimal {
        self.barcodes.iter().map(|b| b.valor).sum()
    }

    pub fn total_pagos(&self) -> usize {
        self.barcodes.iter().filter(|b| b.data_pagamento.is_some()).count()
    }
}

pub struct Orchestrator {
    persister: Persister,
    webhook: WebhookClient,
    /// Component H (§4.H), composed here so the orchestrator can verify and
    /// pay boletos alongside the ingest pipeline it also runs. `None` when
    /// no settlement credentials were configured — callers get
    /// `IngestError::SettlementNotConfigured` rather than a panic.
    settlement: Option<SettlementClient>,
    /// `COMPANY_CNPJ` (§6): the fallback document `pay_boleto` supplies
    /// when the caller doesn't have one of its own.
    company_cnpj: Option<String>,
    barcode_cache: BarcodeVerificationCache,
}

impl Orchestrator {
    pub fn new(persister: Persister, webhook: WebhookClient) -> Self {
        Self {
            persister,
            webhook,
            settlement: None,
            company_cnpj: None,
            barcode_cache: BarcodeVerificationCache::new(DEFAULT_BARCODE_CACHE_TTL),
        }
    }

    /// Wires component H into this orchestrator instance (§2: "Orchestrator
    /// ... composes A-I"). `company_cnpj` becomes `pay_boleto`'s fallback
    /// document (§6); `barcode_cache_ttl` overrides the default freshness
    /// window of the §5 verification cache.
    pub fn with_settlement(mut self, settlement: SettlementClient, company_cnpj: Option<String>, barcode_cache_ttl: Duration) -> Self {
        self.settlement = Some(settlement);
        self.company_cnpj = company_cnpj;
        self.barcode_cache = BarcodeVerificationCache::new(barcode_cache_ttl);
        self
    }

    #[instrument(skip(self, bytes))]
    pub async fn process(&self, bytes: &[u8], file_name: &str, opts: IngestOptions) -> Result<IngestReport, IngestError> {
        let operation_type = match opts.formato {
            Some(Dialect::Cnab240) => OperationType::Cnab240,
            Some(Dialect::Cnab400) => OperationType::Cnab400,
            None => OperationType::Auto,
        };
        let mut operation = Operation::start(operation_type, json!({"fileName": file_name, "fileSize": bytes.len()}));
        operation.mark_processing();
        self.persister.record_ingest(&operation, operation.request_data.clone()).await?;

        match self.run_pipeline(bytes, file_name, &opts, &operation).await {
            Ok(mut report) => {
                operation.mark_success(success_summary(&report));
                self.persister.mark_success(&operation).await?;
                report.operation_id = operation.operation_id;
                report.webhook = Some(
                    self.dispatch_webhook(&report, file_name, operation.operation_id, opts.webhook_url.as_deref())
                        .await,
                );
                info!(operation_id = %operation.operation_id, barcode_count = report.barcodes.len(), "cnab-orchestrator: ingest complete");
                Ok(report)
            }
            Err(err) => {
                operation.mark_error(json!({"codigo": err.codigo(), "mensagem": err.to_string()}));
                if let Err(mark_err) = self.persister.mark_error(&operation).await {
                    tracing::warn!(operation_id = %operation.operation_id, %mark_err, "cnab-orchestrator: failed to record error status");
                }
                Err(err)
            }
        }
    }

    /// Steps 4-9 of §4.J: detect, parse, validate, persist. Runs entirely
    /// inside [`Persister::record_file`]'s own transaction once the tree is
    /// ready; duplicate bytes short-circuit before any tree is written.
    async fn run_pipeline(
        &self,
        bytes: &[u8],
        file_name: &str,
        opts: &IngestOptions,
        operation: &Operation,
    ) -> Result<IngestReport, IngestError> {
        let file_hash = sha256_hex(bytes);
        let normalized = cnab_detector::normalize_lines(bytes);
        let preview = content_preview(&normalized, 5);

        let dialect = if opts.detectar_formato {
            cnab_detector::detect(bytes)?.format
        } else {
            opts.formato.ok_or(IngestError::MissingForcedDialect)?
        };

        let (tree, diagnostics) = match dialect {
            Dialect::Cnab240 => {
                let outcome = cnab_parser_240::parse(bytes)?;
                (ParsedTree::Cnab240(outcome.tree), outcome.diagnostics)
            }
            Dialect::Cnab400 => {
                let outcome = cnab_parser_400::parse(bytes)?;
                (ParsedTree::Cnab400(outcome.tree), outcome.diagnostics)
            }
        };

        let validation = validate(&tree, RecordCountConvention::default());
        let validation_status = if !validation.errors.is_empty() {
            ValidationStatus::Invalid
        } else if !validation.warnings.is_empty() || !diagnostics.is_empty() {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Valid
        };

        let file_type = match dialect {
            Dialect::Cnab240 => FileType::Cnab240,
            Dialect::Cnab400 => FileType::Cnab400,
        };
        let print = FilePrint {
            file_hash,
            operation_id: operation.operation_id,
            file_name: file_name.to_string(),
            file_size: bytes.len() as u64,
            file_type,
            content_preview: preview,
            validation_status,
            validation_details: serde_json::to_value(&validation).ok(),
        };

        let file_id = Uuid::new_v4();
        let (file_id, barcodes, duplicate_of) = match self
            .persister
            .record_file(file_id, &print, &tree, opts.force_reprocess)
            .await?
        {
            FileRecordResult::Inserted { barcodes } => (file_id, barcodes, None),
            FileRecordResult::Duplicate { existing_file_id } => (existing_file_id, Vec::new(), Some(existing_file_id)),
        };

        Ok(IngestReport {
            operation_id: operation.operation_id,
            file_id,
            detected_format: dialect,
            duplicate_of,
            diagnostics,
            validation,
            barcodes,
            tree,
            webhook: None,
        })
    }

    /// `checkBoleto` (§4.H) through the §5 per-barcode verification cache:
    /// a hit within the TTL skips the network entirely; a miss makes
    /// exactly one upstream call even under concurrent callers asking for
    /// the same barcode.
    #[instrument(skip(self))]
    pub async fn verify_boleto(&self, barcode: &str) -> Result<BoletoCheck, IngestError> {
        let settlement = self.settlement.as_ref().ok_or(IngestError::SettlementNotConfigured)?;
        Ok(self.barcode_cache.get_or_check(barcode, settlement).await?)
    }

    /// `payBoleto` (§4.H). `document` falls back to `COMPANY_CNPJ` (§6)
    /// when the caller supplies none.
    #[instrument(skip(self, document))]
    pub async fn pay_boleto(&self, barcode: &str, document: Option<String>) -> Result<PaymentResult, IngestError> {
        let settlement = self.settlement.as_ref().ok_or(IngestError::SettlementNotConfigured)?;
        let document = document.or_else(|| self.company_cnpj.clone());
        Ok(settlement.pay_boleto(barcode, document.as_deref()).await?)
    }

    /// §6's outgoing body: `metadados`, `arquivo`, `cabecalho`, `registros`,
    /// `resumo`. Dispatched after commit (§4.J step 12) — its outcome never
    /// rolls anything back. `webhook_url_override` is the per-ingest
    /// `opts.webhookUrl` (§6), which replaces the configured default
    /// destination for this call only. The per-attempt `metadados.webhook`
    /// sub-object is stamped on by `WebhookClient` itself, once per retry.
    async fn dispatch_webhook(
        &self,
        report: &IngestReport,
        file_name: &str,
        operation_id: Uuid,
        webhook_url_override: Option<&str>,
    ) -> DeliveryReport {
        let (cabecalho, registros) = cabecalho_e_registros(&report.tree);
        let payload = json!({
            "metadados": {
                "fonte": "cnab-ingest-core",
                "versao": env!("CARGO_PKG_VERSION"),
                "dataProcessamento": chrono::Utc::now().to_rfc3339(),
            },
            "arquivo": {
                "fileId": report.file_id,
                "fileName": file_name,
                "formatoDetectado": report.detected_format.as_str(),
                "duplicado": report.duplicate_of.is_some(),
            },
            "cabecalho": cabecalho,
            "registros": registros,
            "resumo": {
                "totalRegistros": report.validation.statistics.total_records,
                "totalValor": report.total_valor().to_string(),
                "totalComCodigoBarras": report.barcodes.len(),
                "totalPagos": report.total_pagos(),
                "totalPendentes": report.barcodes.len().saturating_sub(report.total_pagos()),
            },
        });
        self.webhook.send(&payload, operation_id, webhook_url_override).await
    }
}

/// Splits a parsed tree into the webhook payload's `cabecalho` (the file's
/// own header, dialect-specific shape) and `registros` (the flat list of
/// detail/record rows) — §6's contract names both verbatim but leaves
/// their internal shape to the implementation, since it mirrors whatever
/// the parser already produced.
fn cabecalho_e_registros(tree: &ParsedTree) -> (Value, Value) {
    match tree {
        ParsedTree::Cnab240(file) => (
            serde_json::to_value(&file.header).unwrap_or(Value::Null),
            serde_json::to_value(file.batches.iter().flat_map(|b| &b.details).collect::<Vec<_>>()).unwrap_or(Value::Null),
        ),
        ParsedTree::Cnab400(file) => (
            serde_json::to_value(&file.header).unwrap_or(Value::Null),
            serde_json::to_value(&file.records).unwrap_or(Value::Null),
        ),
    }
}

fn success_summary(report: &IngestReport) -> Value {
    json!({
        "fileId": report.file_id,
        "formatoDetectado": report.detected_format.as_str(),
        "duplicado": report.duplicate_of.is_some(),
        "totalRegistros": report.validation.statistics.total_records,
        "totalComCodigoBarras": report.barcodes.len(),
        "valido": report.validation.valid,
    })
}
