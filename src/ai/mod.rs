//! AI text processing
//!
//! Task templates for summarize/enrich, the `TextModel` provider seam, and a
//! priority-ordered fallback chain over configured models.

pub mod gemini;

pub use gemini::GeminiModel;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

/// Fixed message returned when the model blocks the output on safety
/// grounds. This is a normal successful result, not an error.
pub const SAFETY_FILTERED_MESSAGE: &str =
    "O conteúdo da transcrição foi bloqueado pelas políticas de segurança do modelo de IA.";

/// The closed set of AI tasks the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Summarize,
    Enrich,
}

impl Task {
    /// System instruction sent alongside every prompt for this task.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            Task::Summarize => {
                "Você é um especialista em resumir conteúdo de vídeos do YouTube. \
                 Crie resumos claros, estruturados e informativos em português brasileiro."
            }
            Task::Enrich => {
                "Você é um especialista em aprimorar e enriquecer conteúdo. \
                 Adicione insights, organize melhor as informações e forneça \
                 contexto adicional valioso em português brasileiro."
            }
        }
    }

    /// Prompt template with the input text embedded verbatim.
    pub fn prompt(&self, text: &str) -> String {
        match self {
            Task::Summarize => format!(
                "Analise o seguinte texto de um vídeo do YouTube e crie um resumo estruturado:\n\n\
                 **TEXTO:**\n{text}\n\n\
                 **INSTRUÇÕES:**\n\
                 - Crie um resumo em português brasileiro\n\
                 - Use tópicos organizados com bullet points\n\
                 - Destaque os pontos principais\n\
                 - Mantenha entre 200-500 palavras\n\
                 - Use formatação markdown\n\n\
                 **ESTRUTURA ESPERADA:**\n\
                 ## Resumo Executivo\n## Pontos Principais\n## Insights Importantes\n## Conclusão\n"
            ),
            Task::Enrich => format!(
                "Analise o seguinte texto e crie uma versão aprimorada e enriquecida:\n\n\
                 **TEXTO:**\n{text}\n\n\
                 **INSTRUÇÕES:**\n\
                 - Organize o conteúdo de forma mais estruturada\n\
                 - Adicione insights e contexto relevante\n\
                 - Inclua possíveis aplicações práticas\n\
                 - Use formatação markdown\n\
                 - Responda em português brasileiro\n\
                 - Expanda conceitos importantes\n\n\
                 **ESTRUTURA ESPERADA:**\n\
                 ## Conteúdo Aprimorado\n## Análise Detalhada\n## Aplicações Práticas\n\
                 ## Conceitos Chave\n## Próximos Passos\n"
            ),
        }
    }
}

/// Successful model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutput {
    Text(String),
    /// The provider produced output but withheld it on safety grounds.
    SafetyFiltered,
}

/// Provider-level failures.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid key or exhausted provider quota.
    #[error("provider rejected the call ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    Parse(String),

    /// Every model in the chain failed.
    #[error("all AI providers failed, last error: {last}")]
    AllProvidersFailed { last: String },
}

/// A text-generation provider.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Model identifier used in logs.
    fn name(&self) -> &str;

    async fn generate(&self, task: Task, text: &str) -> Result<ModelOutput, ModelError>;
}

/// Priority-ordered provider fallback chain.
///
/// Each model receives the same task template; the first to respond wins.
/// A safety-filtered response counts as success and yields the fixed
/// placeholder message.
pub struct ModelChain {
    models: Vec<Box<dyn TextModel>>,
}

impl ModelChain {
    pub fn new(models: Vec<Box<dyn TextModel>>) -> Self {
        ModelChain { models }
    }

    pub async fn generate_text(&self, text: &str, task: Task) -> Result<String, ModelError> {
        let mut last = String::from("no models configured");

        for model in &self.models {
            match model.generate(task, text).await {
                Ok(ModelOutput::Text(output)) => {
                    info!(model = %model.name(), task = ?task, "AI generation succeeded");
                    return Ok(output);
                }
                Ok(ModelOutput::SafetyFiltered) => {
                    warn!(model = %model.name(), task = ?task, "output blocked by safety filter");
                    return Ok(SAFETY_FILTERED_MESSAGE.to_string());
                }
                Err(e) => {
                    warn!(model = %model.name(), task = ?task, error = %e, "model failed, trying next");
                    last = e.to_string();
                }
            }
        }

        Err(ModelError::AllProvidersFailed { last })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct FixedModel {
        name: &'static str,
        result: fn() -> Result<ModelOutput, ModelError>,
        calls: Mutex<u32>,
    }

    impl FixedModel {
        fn new(name: &'static str, result: fn() -> Result<ModelOutput, ModelError>) -> Self {
            FixedModel {
                name,
                result,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl TextModel for FixedModel {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _task: Task, _text: &str) -> Result<ModelOutput, ModelError> {
            *self.calls.lock() += 1;
            (self.result)()
        }
    }

    #[test]
    fn prompt_embeds_text_verbatim() {
        let text = "conteúdo do vídeo <tags> & símbolos";
        assert!(Task::Summarize.prompt(text).contains(text));
        assert!(Task::Enrich.prompt(text).contains(text));
    }

    #[test]
    fn tasks_have_distinct_instructions() {
        assert_ne!(
            Task::Summarize.system_instruction(),
            Task::Enrich.system_instruction()
        );
        assert_ne!(Task::Summarize.prompt("x"), Task::Enrich.prompt("x"));
    }

    #[tokio::test]
    async fn first_successful_model_wins() {
        let chain = ModelChain::new(vec![
            Box::new(FixedModel::new("a", || Ok(ModelOutput::Text("from a".into())))),
            Box::new(FixedModel::new("b", || Ok(ModelOutput::Text("from b".into())))),
        ]);
        assert_eq!(
            chain.generate_text("t", Task::Summarize).await.unwrap(),
            "from a"
        );
    }

    #[tokio::test]
    async fn chain_falls_through_on_failure() {
        let chain = ModelChain::new(vec![
            Box::new(FixedModel::new("a", || {
                Err(ModelError::Rejected {
                    status: 429,
                    message: "quota".into(),
                })
            })),
            Box::new(FixedModel::new("b", || Ok(ModelOutput::Text("from b".into())))),
        ]);
        assert_eq!(
            chain.generate_text("t", Task::Enrich).await.unwrap(),
            "from b"
        );
    }

    #[tokio::test]
    async fn safety_filter_yields_placeholder_not_error() {
        let fallback = FixedModel::new("b", || Ok(ModelOutput::Text("unused".into())));
        let chain = ModelChain::new(vec![
            Box::new(FixedModel::new("a", || Ok(ModelOutput::SafetyFiltered))),
            Box::new(fallback),
        ]);
        let output = chain.generate_text("t", Task::Summarize).await.unwrap();
        assert_eq!(output, SAFETY_FILTERED_MESSAGE);
    }

    #[tokio::test]
    async fn all_failures_produce_combined_error() {
        let chain = ModelChain::new(vec![
            Box::new(FixedModel::new("a", || {
                Err(ModelError::Rejected {
                    status: 401,
                    message: "bad key".into(),
                })
            })),
            Box::new(FixedModel::new("b", || {
                Err(ModelError::Parse("garbage".into()))
            })),
        ]);
        let err = chain.generate_text("t", Task::Summarize).await.unwrap_err();
        match err {
            ModelError::AllProvidersFailed { last } => assert!(last.contains("garbage")),
            other => panic!("expected AllProvidersFailed, got {other:?}"),
        }
    }
}
