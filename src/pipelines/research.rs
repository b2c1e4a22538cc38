//! Research pipeline: researcher -> editor

use crate::{
    core::{
        ExpectedOutput, PipelineError, PipelineInput, PipelineSpec, PipelineStepSpec, SpecError,
        StepError,
    },
    execution::{PipelineRun, PipelineRunner},
    pipelines::PipelineSettings,
    search::{format_results, WebSearchClient},
};
use std::sync::Arc;
use tracing::{info, warn};

pub const PIPELINE_NAME: &str = "research";
pub const RESEARCHER: &str = "researcher";
pub const EDITOR: &str = "editor";

pub const SUMMARY_HEADING: &str = "Resumen Ejecutivo";
pub const ACTIONS_HEADING: &str = "Vías de Acción Sugeridas";

const RESEARCHER_ROLE: &str = "Eres un Investigador y Analista Estratégico Senior. \
Combinas búsqueda web y análisis de contenido para producir informes estratégicos.";

const RESEARCHER_TEMPLATE: &str = "Tema de investigación: '{{ topic }}'

1. Analiza los resultados de la búsqueda web:
{{ search_results | (No hay resultados de búsqueda web; apóyate en el contenido adicional.) }}

2. Integra y analiza el CONTENIDO ADICIONAL:
{{ content_to_analyze | (Sin contenido adicional proporcionado.) }}

3. Genera un borrador de informe en Markdown con '## Resumen Ejecutivo' y \
'## Vías de Acción Sugeridas' (entre 3 y 5 vías de acción concretas).";

const EDITOR_ROLE: &str = "Eres un Editor Profesional Senior, experto en comunicación escrita \
con ojo para el detalle.";

const EDITOR_TEMPLATE: &str = "Borrador del informe de investigación:

{{ steps.researcher.output }}

1. Revisa CUIDADOSAMENTE el borrador.
2. Edítalo para mejorar la claridad, la fluidez, la gramática y el estilo.
3. Asegúrate de que el formato Markdown sea impecable y de que las secciones \
'## Resumen Ejecutivo' y '## Vías de Acción Sugeridas' estén bien definidas.
4. NO añadas nueva información ni cambies las conclusiones o las vías de acción, \
solo mejora la presentación y el lenguaje.
5. Devuelve el informe final pulido y listo para presentar.";

fn report_sections(description: &str) -> ExpectedOutput {
    ExpectedOutput::Sections {
        description: description.to_string(),
        headings: vec![SUMMARY_HEADING.to_string(), ACTIONS_HEADING.to_string()],
    }
}

/// Build the two-step research spec
pub fn research_spec(settings: &PipelineSettings) -> Result<PipelineSpec, SpecError> {
    let model = settings.model_id.as_str();
    let tuning = &settings.research;

    PipelineSpec::new(
        PIPELINE_NAME,
        vec![
            PipelineStepSpec::new(
                RESEARCHER,
                RESEARCHER_ROLE,
                RESEARCHER_TEMPLATE,
                tuning.researcher.params(model),
            )
            .expecting(report_sections(
                "Un borrador de informe bien investigado y estructurado en Markdown.",
            )),
            PipelineStepSpec::new(EDITOR, EDITOR_ROLE, EDITOR_TEMPLATE, tuning.editor.params(model))
                .depends_on([RESEARCHER])
                .expecting(report_sections(
                    "El informe final de investigación, editado profesionalmente y en Markdown.",
                )),
        ],
    )
}

/// Inputs of one research run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchRequest {
    pub topic: String,
    pub content_to_analyze: Option<String>,
}

impl ResearchRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            content_to_analyze: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content_to_analyze = Some(content.into());
        self
    }

    fn content(&self) -> Option<&str> {
        self.content_to_analyze
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }
}

/// The research pipeline with its optional search collaborator
#[derive(Clone)]
pub struct ResearchPipeline {
    spec: PipelineSpec,
    search: Option<Arc<dyn WebSearchClient>>,
    max_search_results: usize,
}

impl ResearchPipeline {
    pub fn new(settings: &PipelineSettings) -> Result<Self, SpecError> {
        Ok(Self {
            spec: research_spec(settings)?,
            search: None,
            max_search_results: settings.research.max_search_results,
        })
    }

    pub fn with_search(mut self, search: Arc<dyn WebSearchClient>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }

    /// Run the pipeline and return the edited report
    pub async fn run(
        &self,
        runner: &PipelineRunner,
        request: &ResearchRequest,
    ) -> Result<String, PipelineError> {
        self.execute(runner, request).await?.into_result()
    }

    /// Run the pipeline and return the full outcome
    ///
    /// Fails before any model call when neither content nor search is
    /// available, or when search fails and there is no content to fall
    /// back on.
    pub async fn execute(
        &self,
        runner: &PipelineRunner,
        request: &ResearchRequest,
    ) -> Result<PipelineRun, PipelineError> {
        let inputs = self.prepare_inputs(request).await?;
        Ok(runner.execute(&self.spec, &inputs).await)
    }

    async fn prepare_inputs(&self, request: &ResearchRequest) -> Result<PipelineInput, PipelineError> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(PipelineError::new(
                RESEARCHER,
                StepError::MissingInput("topic".to_string()),
            ));
        }

        let content = request.content();
        let mut inputs = PipelineInput::new()
            .with("topic", topic)
            .with_optional("content_to_analyze", content);

        let search = match (&self.search, content) {
            (Some(search), _) => search,
            (None, Some(_)) => {
                info!("No search client configured; researching from content only");
                return Ok(inputs);
            }
            (None, None) => {
                return Err(PipelineError::new(
                    RESEARCHER,
                    StepError::MissingInput(
                        "content_to_analyze is required when web search is unavailable".to_string(),
                    ),
                ));
            }
        };

        match search.search(topic, self.max_search_results).await {
            Ok(results) => {
                info!("Web search returned {} results", results.len());
                inputs = inputs.with("search_results", format_results(&results));
                Ok(inputs)
            }
            Err(e) if content.is_some() => {
                warn!("Web search failed, continuing with content only: {}", e);
                Ok(inputs)
            }
            Err(e) => Err(PipelineError::new(RESEARCHER, StepError::Search(e))),
        }
    }
}
