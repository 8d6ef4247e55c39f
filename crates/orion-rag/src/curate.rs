//! Documentation curation from freshly ingested documents.
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use orion_core::error::Result;
use orion_core::traits::{CurationModel, DocumentationSink};
use orion_core::types::RawDocument;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatementOutcome {
    pub statement: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CurationReport { pub outcomes: Vec<StatementOutcome> }

impl CurationReport {
    pub fn succeeded(&self) -> usize { self.outcomes.iter().filter(|o| o.error.is_none()).count() }
    pub fn failed(&self) -> usize { self.outcomes.len() - self.succeeded() }
}

pub struct Curator {
    model: Arc<dyn CurationModel>,
    sink: Arc<dyn DocumentationSink>,
}

impl Curator {
    pub fn new(model: Arc<dyn CurationModel>, sink: Arc<dyn DocumentationSink>) -> Self { Self { model, sink } }

    /// Asks the model for statements and hands each one to the sink. A failing
    /// statement is recorded and does not stop the rest.
    pub async fn curate(&self, new_documents: &[RawDocument]) -> Result<CurationReport> {
        if new_documents.is_empty() { return Ok(CurationReport::default()); }
        let structure = self.sink.structure().await?;
        if structure.trim().is_empty() {
            warn!("documentation structure is empty, skipping curation");
            return Ok(CurationReport::default());
        }
        let statements = self.model.suggest(&structure, new_documents).await?;
        let mut report = CurationReport::default();
        for statement in statements {
            let error = match self.sink.execute(&statement).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(error = %e, %statement, "statement failed");
                    Some(e.to_string())
                }
            };
            report.outcomes.push(StatementOutcome { statement, error });
        }
        info!(succeeded = report.succeeded(), failed = report.failed(), "curation finished");
        Ok(report)
    }
}
