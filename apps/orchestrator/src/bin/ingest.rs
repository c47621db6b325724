// [apps/orchestrator/src/bin/ingest.rs]
//! Local CLI entry point: reads a CNAB file from disk and runs it through
//! the full pipeline against a configured database, printing the resulting
//! report. Stands in for the HTTP controller `spec.md` places out of scope
//! (§10) — a debugging/ops tool, not the product surface.

use clap::Parser;
use cnab_domain::IngestOptions;
use cnab_orchestrator::{IngestError, Orchestrator, OrchestratorConfig};
use cnab_persistence::{PersistenceClient, Persister};
use cnab_settlement_client::SettlementClient;
use cnab_webhook::WebhookClient;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ingest", about = "Run a CNAB 240/400 file through the ingest pipeline")]
struct Cli {
    /// Path to the CNAB file to ingest.
    file: PathBuf,

    /// Bypass auto-detection and force a dialect.
    #[arg(long, value_enum)]
    formato: Option<CliDialect>,

    /// Skip validation reporting in the printed output (it still runs).
    #[arg(long, default_value_t = false)]
    sem_validacao: bool,

    /// After ingest, check every extracted barcode against the settlement
    /// API (component H) and print `canPayToday`/`isInPaymentWindow`.
    #[arg(long, default_value_t = false)]
    verificar_boletos: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CliDialect {
    Cnab240,
    Cnab400,
}

impl From<CliDialect> for cnab_domain::Dialect {
    fn from(value: CliDialect) -> Self {
        match value {
            CliDialect::Cnab240 => cnab_domain::Dialect::Cnab240,
            CliDialect::Cnab400 => cnab_domain::Dialect::Cnab400,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "cnab_orchestrator=info,cnab_persistence=info".into());
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = OrchestratorConfig::from_env()?;

    let client = PersistenceClient::connect(&config.database_dsn, config.database_auth_token.clone()).await?;
    let persister = Persister::new(client);
    let webhook = WebhookClient::new(config.webhook.clone());
    // The settlement client is not on the ingest pipeline's critical path
    // (§4.J never calls it) but is composed into the orchestrator (§2:
    // component H) so operators can check/pay boletos against the same
    // configuration right after an ingest, via --verificar-boletos.
    let settlement = SettlementClient::new(config.settlement);
    let company_cnpj = config.company_cnpj.clone();

    let orchestrator = Orchestrator::new(persister, webhook).with_settlement(settlement, company_cnpj, config.barcode_cache_ttl);

    let bytes = tokio::fs::read(&cli.file).await?;
    let file_name = cli
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("arquivo.txt")
        .to_string();

    let opts = IngestOptions {
        detectar_formato: cli.formato.is_none(),
        formato: cli.formato.map(Into::into),
        include_validation: !cli.sem_validacao,
        ..IngestOptions::default()
    };

    match orchestrator.process(&bytes, &file_name, opts).await {
        Ok(report) => {
            println!("operationId: {}", report.operation_id);
            println!("fileId: {}", report.file_id);
            println!("formatoDetectado: {}", report.detected_format.as_str());
            if let Some(existing) = report.duplicate_of {
                println!("duplicado: true (fileId original {existing})");
            }
            println!("valido: {}", report.validation.valid);
            println!("score: {}", report.validation.score);
            println!("erros: {}", report.validation.errors.len());
            println!("avisos: {}", report.validation.warnings.len());
            println!("codigosBarras: {}", report.barcodes.len());
            println!("totalValor: {}", report.total_valor());
            if let Some(webhook) = &report.webhook {
                println!("webhook.delivered: {}", webhook.delivered);
                println!("webhook.attempts: {}", webhook.attempts);
            }
            if cli.verificar_boletos {
                for barcode in &report.barcodes {
                    match orchestrator.verify_boleto(&barcode.codigo_barras).await {
                        Ok(check) => println!(
                            "boleto {}: canPayToday={} isInPaymentWindow={}",
                            barcode.codigo_barras, check.can_pay_today, check.is_in_payment_window
                        ),
                        Err(err) => eprintln!("boleto {} check failed [{}]: {err}", barcode.codigo_barras, err.codigo()),
                    }
                }
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("ingest failed [{}]: {err}", err.codigo());
            std::process::exit(1);
        }
    }
}
