//! Mode dispatch: one entry point for every kind of workspace query.

use crate::decision::ManagerDecision;
use crate::loop_runner::ManagerLoop;
use crate::modes;
use labdesk_config::AppConfig;
use labdesk_core::error::Result;
use labdesk_core::fragment::{ContextFragment, DraftAnswer};
use labdesk_core::generate::TextGenerator;
use labdesk_core::run::{RunState, TraceEntry};
use labdesk_core::tool::{ChatHead, Retriever, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// How a query should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Retrieve fragments, summarise them
    RagOnly,

    /// Retrieval view + one grounded-chat call
    #[default]
    Copilot,

    /// The bounded manager loop chooses the tools
    ManagerAuto,

    /// Generate and persist a markdown study guide
    StudyGuide,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RagOnly => "rag_only",
            Self::Copilot => "copilot",
            Self::ManagerAuto => "manager_auto",
            Self::StudyGuide => "study_guide",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rag_only" => Ok(Self::RagOnly),
            "copilot" => Ok(Self::Copilot),
            "manager_auto" => Ok(Self::ManagerAuto),
            "study_guide" => Ok(Self::StudyGuide),
            other => Err(format!(
                "unknown mode '{other}' (expected rag_only, copilot, manager_auto, or study_guide)"
            )),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a query produced, in one serialisable envelope.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub mode: Mode,
    pub question: String,
    pub top_k: usize,
    pub answer: String,

    /// The latest retrieval view (what the question matched)
    pub fragments: Vec<ContextFragment>,

    /// The grounded chat draft, when one was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<DraftAnswer>,

    /// Terminal state of the manager loop (manager mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<RunState>,

    /// One entry per internal step
    pub agent_trace: Vec<TraceEntry>,

    /// Download URL of a saved study guide
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_url: Option<String>,
}

impl QueryOutcome {
    fn empty(mode: Mode, top_k: usize) -> Self {
        Self {
            mode,
            question: String::new(),
            top_k,
            answer: String::new(),
            fragments: Vec::new(),
            draft: None,
            state: None,
            agent_trace: Vec::new(),
            markdown_url: None,
        }
    }
}

/// The workspace's front door: owns the upstream clients and dispatches
/// each question to the requested mode.
pub struct WorkspaceService {
    retriever: Arc<dyn Retriever>,
    chat: Arc<dyn ChatHead>,
    generator: Arc<dyn TextGenerator>,
    chat_model: String,
    manager_model: String,
    study_model: String,
    budget: u32,
    default_top_k: usize,
    guides_dir: PathBuf,
}

impl WorkspaceService {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        chat: Arc<dyn ChatHead>,
        generator: Arc<dyn TextGenerator>,
        config: &AppConfig,
    ) -> Self {
        Self {
            retriever,
            chat,
            generator,
            chat_model: config.models.chat.clone(),
            manager_model: config.models.manager_model().to_string(),
            study_model: config.models.study_model().to_string(),
            budget: config.agent.budget,
            default_top_k: config.agent.top_k,
            guides_dir: config.agent.guides_dir.clone(),
        }
    }

    /// Answer one question in the given mode.
    ///
    /// A blank question short-circuits to an empty outcome without
    /// touching any upstream.
    pub async fn ask(&self, question: &str, top_k: Option<usize>, mode: Mode) -> Result<QueryOutcome> {
        let question = question.trim();
        let top_k = top_k.unwrap_or(self.default_top_k);

        if question.is_empty() {
            return Ok(QueryOutcome::empty(mode, top_k));
        }

        info!(%mode, top_k, "Dispatching workspace query");
        match mode {
            Mode::RagOnly => self.rag_only(question, top_k).await,
            Mode::Copilot => self.copilot(question, top_k).await,
            Mode::StudyGuide => self.study_guide(question, top_k, Mode::StudyGuide).await,
            Mode::ManagerAuto => self.manager_auto(question, top_k).await,
        }
    }

    async fn rag_only(&self, question: &str, top_k: usize) -> Result<QueryOutcome> {
        let (answer, fragments) = modes::rag_only::run(
            self.retriever.as_ref(),
            self.generator.as_ref(),
            &self.chat_model,
            question,
            top_k,
        )
        .await?;

        Ok(QueryOutcome {
            mode: Mode::RagOnly,
            question: question.to_string(),
            top_k,
            answer,
            fragments,
            draft: None,
            state: None,
            agent_trace: Vec::new(),
            markdown_url: None,
        })
    }

    async fn copilot(&self, question: &str, top_k: usize) -> Result<QueryOutcome> {
        let (answer, fragments, draft) = modes::copilot::run(
            self.retriever.as_ref(),
            self.chat.as_ref(),
            self.generator.as_ref(),
            &self.chat_model,
            question,
            top_k,
        )
        .await?;

        Ok(QueryOutcome {
            mode: Mode::Copilot,
            question: question.to_string(),
            top_k,
            answer,
            fragments,
            draft: Some(draft),
            state: None,
            agent_trace: Vec::new(),
            markdown_url: None,
        })
    }

    async fn study_guide(&self, question: &str, top_k: usize, mode: Mode) -> Result<QueryOutcome> {
        let outcome = modes::study_guide::run(
            self.retriever.as_ref(),
            self.generator.as_ref(),
            &self.study_model,
            question,
            top_k,
            &self.guides_dir,
        )
        .await?;

        Ok(QueryOutcome {
            mode,
            question: question.to_string(),
            top_k,
            answer: outcome.guide,
            fragments: outcome.fragments,
            draft: None,
            state: None,
            agent_trace: outcome.trace,
            markdown_url: Some(outcome.markdown_url),
        })
    }

    async fn manager_auto(&self, question: &str, top_k: usize) -> Result<QueryOutcome> {
        // Hard routing rule: a question explicitly asking for a study
        // guide or plan skips the manager and goes straight to the
        // study-guide tool, with the routing visible in the trace.
        if asks_for_study_guide(question) {
            info!("Manager delegated directly to the study_guide tool");
            let mut outcome = self.study_guide(question, top_k, Mode::ManagerAuto).await?;
            for entry in &mut outcome.agent_trace {
                entry.step += 1;
            }
            outcome.agent_trace.insert(
                0,
                TraceEntry::new(
                    1,
                    "study_guide (direct)",
                    "The question explicitly asked for a study guide or plan, \
                     so the manager delegated directly to the study_guide tool.",
                ),
            );
            return Ok(outcome);
        }

        let decider = ManagerDecision::new(self.generator.clone(), self.manager_model.clone());
        let tools = Arc::new(ToolRegistry::new(self.retriever.clone(), self.chat.clone()));
        let result = ManagerLoop::new(Arc::new(decider), tools)
            .with_budget(self.budget)
            .run(question, top_k)
            .await;

        let draft = if result.draft_fragments.is_empty() {
            None
        } else {
            Some(DraftAnswer {
                text: result.answer.clone(),
                fragments_used: result.draft_fragments,
            })
        };

        Ok(QueryOutcome {
            mode: Mode::ManagerAuto,
            question: question.to_string(),
            top_k,
            answer: result.answer,
            fragments: result.fragments,
            draft,
            state: Some(result.state),
            agent_trace: result.trace,
            markdown_url: None,
        })
    }
}

fn asks_for_study_guide(question: &str) -> bool {
    let lower = question.to_lowercase();
    ["study guide", "study plan", "learning plan"]
        .iter()
        .any(|phrase| lower.contains(phrase))
}
