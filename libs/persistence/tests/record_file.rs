// [libs/persistence/tests/record_file.rs]
//! Exercises `Persister::record_file` against an in-memory libsql database:
//! dedup by `file_hash`, and that a payable CNAB-400 record's barcode lands
//! in the `barcodes` table alongside the detail row.

use cnab_domain::{
    Cnab400Header, Cnab400Record, Cnab400Trailer, FilePrint, FileType, Operation, OperationType, ParsedTree, ValidationStatus,
};
use cnab_persistence::{files::sha256_hex, FileRecordResult, Persister};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn sample_tree(codigo_barras: &str) -> ParsedTree {
    ParsedTree::Cnab400(cnab_domain::Cnab400File {
        header: Cnab400Header {
            banco_codigo: "341".into(),
            banco_nome: "ITAU".into(),
            empresa_codigo: String::new(),
            empresa_nome: String::new(),
            arquivo_sequencia: 1,
            data_arquivo: None,
            versao_layout: String::new(),
        },
        records: vec![Cnab400Record {
            line_number: 2,
            nosso_numero: "123".into(),
            seu_numero: "456".into(),
            codigo_barras: codigo_barras.to_string(),
            linha_digitavel: String::new(),
            valor_titulo: dec!(100.00),
            valor_pago: rust_decimal::Decimal::ZERO,
            data_vencimento: None,
            data_pagamento: None,
            pagador_nome: "FULANO".into(),
            pagador_documento: String::new(),
            codigo_ocorrencia: String::new(),
            codigo_banco: String::new(),
            agencia: String::new(),
            conta: String::new(),
            dados_completos: String::new(),
        }],
        trailer: Cnab400Trailer {
            total_registros: 1,
            valor_total: dec!(100.00),
            sequencial: 1,
        },
    })
}

fn sample_print(file_hash: String, operation_id: Uuid) -> FilePrint {
    FilePrint {
        file_hash,
        operation_id,
        file_name: "remessa.txt".into(),
        file_size: 400,
        file_type: FileType::Cnab400,
        content_preview: "linha 1\nlinha 2".into(),
        validation_status: ValidationStatus::Valid,
        validation_details: None,
    }
}

#[tokio::test]
async fn duplicate_file_hash_is_skipped_without_writing_a_second_tree() {
    let client = cnab_persistence::PersistenceClient::connect(":memory:", None).await.unwrap();
    let persister = Persister::new(client);

    let operation = Operation::start(OperationType::Cnab400, serde_json::json!({"fileName": "remessa.txt"}));
    persister.record_ingest(&operation, serde_json::Value::Null).await.unwrap();

    let bytes = b"conteudo de teste do arquivo remessa";
    let hash = sha256_hex(bytes);
    let tree = sample_tree("34191790010104351004791020150008291070026000");
    let print = sample_print(hash.clone(), operation.operation_id);

    let first = persister.record_file(Uuid::new_v4(), &print, &tree, false).await.unwrap();
    let first_barcodes = match first {
        FileRecordResult::Inserted { barcodes } => barcodes,
        FileRecordResult::Duplicate { .. } => panic!("first insert must not be a duplicate"),
    };
    assert_eq!(first_barcodes.len(), 1);

    let second_print = sample_print(hash, operation.operation_id);
    let second = persister.record_file(Uuid::new_v4(), &second_print, &tree, false).await.unwrap();
    match second {
        FileRecordResult::Duplicate { .. } => {}
        FileRecordResult::Inserted { .. } => panic!("second insert with identical hash must be reported as a duplicate"),
    }
}

#[tokio::test]
async fn force_reprocess_replaces_the_prior_row_instead_of_short_circuiting() {
    let client = cnab_persistence::PersistenceClient::connect(":memory:", None).await.unwrap();
    let persister = Persister::new(client);

    let operation = Operation::start(OperationType::Cnab400, serde_json::json!({"fileName": "remessa.txt"}));
    persister.record_ingest(&operation, serde_json::Value::Null).await.unwrap();

    let bytes = b"conteudo reprocessado";
    let hash = sha256_hex(bytes);
    let tree = sample_tree("34191790010104351004791020150008291070026000");
    let print = sample_print(hash.clone(), operation.operation_id);

    let first_id = Uuid::new_v4();
    let first = persister.record_file(first_id, &print, &tree, false).await.unwrap();
    assert!(matches!(first, FileRecordResult::Inserted { .. }));

    let second_id = Uuid::new_v4();
    let second_print = sample_print(hash, operation.operation_id);
    let second = persister.record_file(second_id, &second_print, &tree, true).await.unwrap();
    let barcodes = match second {
        FileRecordResult::Inserted { barcodes } => barcodes,
        FileRecordResult::Duplicate { .. } => panic!("forceReprocess must not short-circuit as a duplicate"),
    };
    assert_eq!(barcodes.len(), 1);
}

#[tokio::test]
async fn distinct_file_hashes_each_record_their_own_tree() {
    let client = cnab_persistence::PersistenceClient::connect(":memory:", None).await.unwrap();
    let persister = Persister::new(client);

    let operation = Operation::start(OperationType::Cnab400, serde_json::json!({"fileName": "remessa.txt"}));
    persister.record_ingest(&operation, serde_json::Value::Null).await.unwrap();

    let tree_a = sample_tree("34191790010104351004791020150008291070026000");
    let tree_b = sample_tree("34191790010104351004791020150008291070026001");

    let print_a = sample_print(sha256_hex(b"arquivo A"), operation.operation_id);
    let print_b = sample_print(sha256_hex(b"arquivo B"), operation.operation_id);

    let result_a = persister.record_file(Uuid::new_v4(), &print_a, &tree_a, false).await.unwrap();
    let result_b = persister.record_file(Uuid::new_v4(), &print_b, &tree_b, false).await.unwrap();

    assert!(matches!(result_a, FileRecordResult::Inserted { .. }));
    assert!(matches!(result_b, FileRecordResult::Inserted { .. }));
}

#[tokio::test]
async fn mark_success_updates_operation_status() {
    let client = cnab_persistence::PersistenceClient::connect(":memory:", None).await.unwrap();
    let persister = Persister::new(client);

    let mut operation = Operation::start(OperationType::Cnab400, serde_json::json!({}));
    persister.record_ingest(&operation, serde_json::Value::Null).await.unwrap();

    operation.mark_success(serde_json::json!({"totalRegistros": 1}));
    persister.mark_success(&operation).await.unwrap();

    let summary = persister.find_operation(operation.operation_id).await.unwrap();
    assert_eq!(summary.status, cnab_domain::OperationStatus::Success);
}
