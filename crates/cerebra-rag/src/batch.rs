//! Spreadsheet-driven batch evaluation.
//!
//! Input: an XLSX with `LLM Eval` and `Retriever Eval` sheets carrying
//! `Question` / `Ground Truth` columns. Every row is answered with the
//! hybrid strategy, scored by the reward model, and written back with
//! per-metric columns. Rows that cannot be scored are marked skipped and
//! the run continues.

use std::io::Cursor;
use std::sync::Arc;
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use tracing::{info, instrument, warn};

use cerebra_common::{CerebraError, QueryRequest, Result, SelectedPdf};

use crate::evaluator::{parse_scores, Evaluator};
use crate::orchestrator::RagOrchestrator;
use crate::retriever::Strategy;

pub const LLM_SHEET: &str = "LLM Eval";
pub const RETRIEVER_SHEET: &str = "Retriever Eval";
pub const SKIPPED: &str = "Skipped - Missing Data";

const METRICS: [&str; 5] = ["Helpfulness", "Correctness", "Coherence", "Complexity", "Verbosity"];

pub struct BatchEvaluator {
    orchestrator: Arc<RagOrchestrator>,
    evaluator: Arc<Evaluator>,
}

struct EvaluatedRow {
    question: String,
    ground_truth: String,
    llm_response: String,
    retriever_response: String,
    llm_scores: Option<String>,
    retriever_scores: Option<String>,
}

impl BatchEvaluator {
    pub fn new(orchestrator: Arc<RagOrchestrator>, evaluator: Arc<Evaluator>) -> Self {
        Self { orchestrator, evaluator }
    }

    /// Run the full round-trip: parse the test set, answer and score every
    /// row, and return the evaluated workbook as bytes.
    #[instrument(skip_all, fields(brain_id))]
    pub async fn evaluate_batch(
        &self,
        brain_id: &str,
        selected_pdfs: &[String],
        xlsx: &[u8],
    ) -> Result<Vec<u8>> {
        let rows = parse_test_set(xlsx)?;
        info!(n_rows = rows.len(), "Test set parsed");

        let request_pdfs: Vec<SelectedPdf> = selected_pdfs
            .iter()
            .map(|id| SelectedPdf { file_id: id.clone(), file_name: String::new() })
            .collect();

        let mut evaluated = Vec::with_capacity(rows.len());
        for (question, ground_truth) in rows {
            if question.trim().is_empty() {
                continue;
            }
            let req = QueryRequest { query: question.clone(), selected_pdfs: request_pdfs.clone() };

            let answer = match self.orchestrator.answer(brain_id, Strategy::Hybrid, &req).await {
                Ok(a) => a,
                Err(e) => {
                    warn!(question = %question, error = %e, "Row answering failed, skipping");
                    evaluated.push(EvaluatedRow {
                        question,
                        ground_truth,
                        llm_response: SKIPPED.to_string(),
                        retriever_response: SKIPPED.to_string(),
                        llm_scores: None,
                        retriever_scores: None,
                    });
                    continue;
                }
            };

            let gt = (!ground_truth.trim().is_empty()).then_some(ground_truth.as_str());
            let scores = self
                .evaluator
                .evaluate(&answer.retrieved_context, &question, &answer.response, gt)
                .await;

            evaluated.push(EvaluatedRow {
                question,
                ground_truth,
                llm_response: answer.response,
                retriever_response: answer.retrieved_context,
                llm_scores: scores.llm,
                retriever_scores: scores.retriever,
            });
        }

        write_workbook(&evaluated)
    }
}

/// Extract `(question, ground_truth)` pairs from the `LLM Eval` sheet.
/// Both required sheets must exist; columns are located by header name.
fn parse_test_set(xlsx: &[u8]) -> Result<Vec<(String, String)>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(xlsx))
        .map_err(|e| CerebraError::Invalid(format!("invalid xlsx file: {e}")))?;

    // The retriever sheet must be present even though rows are driven from
    // the LLM sheet, so a malformed test set fails fast.
    workbook
        .worksheet_range(RETRIEVER_SHEET)
        .map_err(|e| CerebraError::Invalid(format!("missing sheet '{RETRIEVER_SHEET}': {e}")))?;
    let range = workbook
        .worksheet_range(LLM_SHEET)
        .map_err(|e| CerebraError::Invalid(format!("missing sheet '{LLM_SHEET}': {e}")))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| CerebraError::Invalid("empty test set".to_string()))?;
    let question_col = find_column(header, "Question")?;
    let ground_truth_col = find_column(header, "Ground Truth")?;

    Ok(rows
        .map(|row| {
            (
                row.get(question_col).map(cell_str).unwrap_or_default(),
                row.get(ground_truth_col).map(cell_str).unwrap_or_default(),
            )
        })
        .filter(|(q, _)| !q.trim().is_empty())
        .collect())
}

fn find_column(header: &[Data], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|cell| cell_str(cell).trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| CerebraError::Invalid(format!("missing column '{name}'")))
}

fn cell_str(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Write both evaluation sheets. Metric cells default to 0.0 when the
/// score line lacks a metric; skipped rows keep empty metric cells.
fn write_workbook(rows: &[EvaluatedRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    for (sheet_name, response_header) in
        [(LLM_SHEET, "LLM Response"), (RETRIEVER_SHEET, "Retriever Response")]
    {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet_name)
            .map_err(|e| CerebraError::Internal(format!("xlsx write: {e}")))?;

        let base_headers = ["Question", "Ground Truth", response_header];
        let headers = base_headers.iter().copied().chain(METRICS);
        for (col, header) in headers.enumerate() {
            worksheet
                .write_string(0, col as u16, header)
                .map_err(|e| CerebraError::Internal(format!("xlsx write: {e}")))?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            let (response, raw_scores) = if sheet_name == LLM_SHEET {
                (&row.llm_response, &row.llm_scores)
            } else {
                (&row.retriever_response, &row.retriever_scores)
            };

            write_cell(worksheet, r, 0, &row.question)?;
            write_cell(worksheet, r, 1, &row.ground_truth)?;
            write_cell(worksheet, r, 2, response)?;

            if let Some(raw) = raw_scores {
                let scores = parse_scores(raw);
                for (j, metric) in METRICS.iter().enumerate() {
                    let value = scores.get(&metric.to_lowercase()).copied().unwrap_or(0.0);
                    worksheet
                        .write_number(r, (3 + j) as u16, value as f64)
                        .map_err(|e| CerebraError::Internal(format!("xlsx write: {e}")))?;
                }
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| CerebraError::Internal(format!("xlsx save: {e}")))
}

fn write_cell(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    col: u16,
    value: &str,
) -> Result<()> {
    worksheet
        .write_string(row, col, value)
        .map(|_| ())
        .map_err(|e| CerebraError::Internal(format!("xlsx write: {e}")))
}
