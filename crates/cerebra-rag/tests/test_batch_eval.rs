//! The XLSX round-trip: test set in, answered and scored workbook out.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;

use cerebra_ingestion::{BrainCatalog, IngestFile, IngestionPipeline};
use cerebra_rag::{BatchEvaluator, Evaluator, RagOrchestrator, Retriever};
use cerebra_test_utils::{
    FakeEmbeddings, InMemoryVectorStore, OverlapReranker, ScriptedLlm, ScriptedReward,
    StaticChunker,
};

const DIM: usize = 48;

async fn batch_world(reward: ScriptedReward) -> (BatchEvaluator, String) {
    let store = Arc::new(InMemoryVectorStore::new());
    let catalog = Arc::new(BrainCatalog::new(store.clone(), "data_registry".to_string(), DIM));
    catalog.ensure_registry().await.unwrap();
    let brain_id = catalog.create_brain("eval-brain").await.unwrap();

    let embedder = Arc::new(FakeEmbeddings::new());
    let pipeline = IngestionPipeline::new(
        catalog.clone(),
        store.clone(),
        embedder.clone(),
        Arc::new(StaticChunker::new()),
    );
    pipeline
        .ingest(
            &brain_id,
            vec![IngestFile {
                file_name: "atlantis.pdf".to_string(),
                bytes: b"The capital of Atlantis is Orichalcum.".to_vec(),
            }],
        )
        .await
        .unwrap();

    let answer_llm: Arc<ScriptedLlm> =
        Arc::new(ScriptedLlm::unsure().with_rule("Orichalcum", "It is Orichalcum."));
    let retriever = Arc::new(Retriever::new(
        store,
        embedder,
        Arc::new(OverlapReranker::new()),
        Arc::new(ScriptedLlm::unsure()),
        4,
        20,
    ));
    let orchestrator =
        Arc::new(RagOrchestrator::new(retriever, answer_llm, Duration::from_secs(5)));
    let evaluator = Arc::new(Evaluator::new(
        Arc::new(ScriptedLlm::new("A: Orichalcum is the capital.")),
        Arc::new(reward),
    ));

    (BatchEvaluator::new(orchestrator, evaluator), brain_id)
}

fn test_set(rows: &[(&str, &str)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for sheet in ["LLM Eval", "Retriever Eval"] {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet).unwrap();
        ws.write_string(0, 0, "Question").unwrap();
        ws.write_string(0, 1, "Ground Truth").unwrap();
        for (i, (q, gt)) in rows.iter().enumerate() {
            ws.write_string((i + 1) as u32, 0, *q).unwrap();
            ws.write_string((i + 1) as u32, 1, *gt).unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

fn sheet_rows(bytes: &[u8], sheet: &str) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec())).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|c| match c {
                    Data::String(s) => s.clone(),
                    Data::Float(f) => f.to_string(),
                    _ => String::new(),
                })
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn batch_eval_fills_metric_columns_for_both_sheets() {
    let (batch, brain_id) = batch_world(ScriptedReward::typical()).await;
    let input = test_set(&[("What is the capital of Atlantis?", "Orichalcum")]);

    let output = batch.evaluate_batch(&brain_id, &[], &input).await.unwrap();

    let llm = sheet_rows(&output, "LLM Eval");
    assert_eq!(llm[0][2], "LLM Response");
    assert_eq!(llm[0][3], "Helpfulness");
    assert_eq!(llm[1][0], "What is the capital of Atlantis?");
    assert!(llm[1][2].contains("Orichalcum"));
    assert_eq!(llm[1][3], "3.5");

    let retriever = sheet_rows(&output, "Retriever Eval");
    assert_eq!(retriever[0][2], "Retriever Response");
    assert!(retriever[1][2].contains("Orichalcum"));
    assert_eq!(retriever[1][7], "1.9");
}

#[tokio::test]
async fn reward_failures_leave_metric_cells_empty_but_keep_the_row() {
    let (batch, brain_id) = batch_world(ScriptedReward::failing()).await;
    let input = test_set(&[("What is the capital of Atlantis?", "Orichalcum")]);

    let output = batch.evaluate_batch(&brain_id, &[], &input).await.unwrap();
    let llm = sheet_rows(&output, "LLM Eval");

    // The answer is still recorded; only the scores are missing.
    assert!(llm[1][2].contains("Orichalcum"));
    assert!(llm[1].get(3).map(|s| s.is_empty()).unwrap_or(true));
}

#[tokio::test]
async fn invalid_upload_is_rejected() {
    let (batch, brain_id) = batch_world(ScriptedReward::typical()).await;
    let err = batch.evaluate_batch(&brain_id, &[], b"junk").await.unwrap_err();
    assert!(matches!(err, cerebra_common::CerebraError::Invalid(_)));
}
