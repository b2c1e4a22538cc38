//! Marketing pipeline: ideas -> post -> image prompt (-> image)

use crate::{
    core::{
        ExpectedOutput, Invocation, ModelParams, OutputFilter, PipelineError, PipelineInput,
        PipelineSpec, PipelineStepSpec, RunState, SpecError, StepError,
    },
    execution::PipelineRunner,
    pipelines::PipelineSettings,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

pub const PIPELINE_NAME: &str = "marketing";
pub const IDEAS: &str = "ideas";
pub const POST: &str = "post";
pub const IMAGE_PROMPT: &str = "image_prompt";
pub const IMAGE_GENERATION: &str = "image_generation";

/// Supported social platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Instagram,
    LinkedIn,
    TwitterX,
    Facebook,
    General,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Instagram,
        Platform::LinkedIn,
        Platform::TwitterX,
        Platform::Facebook,
        Platform::General,
    ];

    /// Case-insensitive lookup; `twitter` and `x` are aliases
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "instagram" => Some(Platform::Instagram),
            "linkedin" => Some(Platform::LinkedIn),
            "twitter/x" | "twitter" | "x" => Some(Platform::TwitterX),
            "facebook" => Some(Platform::Facebook),
            "general" => Some(Platform::General),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::LinkedIn => "LinkedIn",
            Platform::TwitterX => "Twitter/X",
            Platform::Facebook => "Facebook",
            Platform::General => "General",
        }
    }

    /// Suggested tone for posts on this platform
    pub fn tone_hint(&self) -> &'static str {
        match self {
            Platform::Instagram => "casual/visual",
            Platform::LinkedIn => "profesional",
            _ => "conciso",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Platform {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::parse(s).ok_or_else(|| {
            let valid: Vec<_> = Platform::ALL.iter().map(Platform::label).collect();
            StepError::InvalidInput(format!(
                "platform '{}' is not supported (use one of: {})",
                s,
                valid.join(", ")
            ))
        })
    }
}

const MARKETER_ROLE: &str = "Eres un Especialista en Marketing de Contenidos, experto creativo \
en copywriting y visuales para redes sociales.";

const IDEAS_TEMPLATE: &str = "Genera ideas de marketing CONCRETAS y ATRACTIVAS para: '{{ topic }}'.
Objetivos: interés, educación, interacción, conversión.
Contexto adicional: {{ context | No se proporcionó contexto adicional. }}

Proporciona al menos 5 ideas distintas. Cada una debe incluir:
1. Ángulo/Concepto principal.
2. Tipo de contenido sugerido (post de Instagram, vídeo corto, artículo de blog...).
3. Hashtags propuestos (#relevante #nicho).
4. CTA sugerido (visita el enlace, comenta...).";

const POST_TEMPLATE: &str = "Ideas de marketing disponibles:
{{ steps.ideas.output }}

Usando estas ideas y el tema original ('{{ topic }}'), redacta un post efectivo para '{{ platform }}'.
Adapta longitud, tono (ej: {{ tone }}), emojis y formato a '{{ platform }}'.
Contexto adicional: {{ context | No se proporcionó contexto adicional. }}
Incluye hashtags relevantes si aplica. Añade un CTA si encaja. DEVUELVE SÓLO EL TEXTO DEL POST FINAL.";

const IMAGE_PROMPT_ROLE: &str = "Eres un Director de Arte experto en prompts para IA de imágenes.";

const IMAGE_PROMPT_TEMPLATE: &str = "Crea un prompt para una imagen basada en este post:
{{ steps.post.output }}

Describe sujeto, acción, entorno, estilo, luz, color y composición. Sé detallado y evocador.
Escribe SÓLO el prompt, sin comillas ni texto adicional.";

/// Build the marketing spec, with or without the image generation step
pub fn marketing_spec(
    settings: &PipelineSettings,
    include_image: bool,
) -> Result<PipelineSpec, SpecError> {
    let model = settings.model_id.as_str();
    let tuning = &settings.marketing;

    let mut steps = vec![
        PipelineStepSpec::new(IDEAS, MARKETER_ROLE, IDEAS_TEMPLATE, tuning.ideas.params(model))
            .expecting(ExpectedOutput::FreeText(
                "Una lista con al menos 5 ideas de marketing, cada una con ángulo, tipo de \
                 contenido, hashtags y CTA."
                    .to_string(),
            )),
        PipelineStepSpec::new(POST, MARKETER_ROLE, POST_TEMPLATE, tuning.post.params(model))
            .depends_on([IDEAS]),
        PipelineStepSpec::new(
            IMAGE_PROMPT,
            IMAGE_PROMPT_ROLE,
            IMAGE_PROMPT_TEMPLATE,
            tuning.image_prompt.params(model),
        )
        .depends_on([POST])
        .with_filter(OutputFilter::StripQuotes),
    ];

    if include_image {
        // Token limit is unused by image generation but must stay positive
        steps.push(
            PipelineStepSpec::new(
                IMAGE_GENERATION,
                IMAGE_PROMPT_ROLE,
                "{{ steps.image_prompt.output }}",
                ModelParams::new(model, 0.0, 1),
            )
            .depends_on([IMAGE_PROMPT])
            .with_invocation(Invocation::Image),
        );
    }

    PipelineSpec::new(PIPELINE_NAME, steps)
}

/// Inputs of one marketing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketingRequest {
    pub topic: String,
    pub platform: String,
    pub context: Option<String>,
    pub generate_image: bool,
}

impl MarketingRequest {
    pub fn new(topic: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            platform: platform.into(),
            context: None,
            generate_image: false,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_image(mut self, generate_image: bool) -> Self {
        self.generate_image = generate_image;
        self
    }
}

/// Generated marketing artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketingContent {
    pub ideas: String,
    pub post_text: String,
    pub image_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// The marketing pipeline
#[derive(Debug, Clone)]
pub struct MarketingPipeline {
    settings: PipelineSettings,
}

impl MarketingPipeline {
    pub fn new(settings: &PipelineSettings) -> Result<Self, SpecError> {
        // Validate both shapes up front so a bad configuration fails here
        marketing_spec(settings, false)?;
        marketing_spec(settings, true)?;
        Ok(Self {
            settings: settings.clone(),
        })
    }

    pub fn spec(&self, include_image: bool) -> Result<PipelineSpec, SpecError> {
        marketing_spec(&self.settings, include_image)
    }

    /// Run the pipeline
    ///
    /// An unsupported platform fails before any model call. A requested
    /// image is skipped when the runner has no image generator, and a
    /// failed or cancelled image generation leaves `image_url` empty.
    pub async fn run(
        &self,
        runner: &PipelineRunner,
        request: &MarketingRequest,
    ) -> Result<MarketingContent, PipelineError> {
        let platform: Platform = request
            .platform
            .parse()
            .map_err(|e| PipelineError::new(POST, e))?;

        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(PipelineError::new(
                IDEAS,
                StepError::MissingInput("topic".to_string()),
            ));
        }

        let include_image = request.generate_image && runner.executor().has_image_generator();
        if request.generate_image && !include_image {
            warn!("Image requested but no image generator is configured; skipping image");
        }

        let spec = self
            .spec(include_image)
            .map_err(|e| PipelineError::new(PIPELINE_NAME, StepError::InvalidInput(e.to_string())))?;

        let inputs = PipelineInput::new()
            .with("topic", topic)
            .with("platform", platform.label())
            .with("tone", platform.tone_hint())
            .with_optional("context", request.context.as_deref());

        let run = runner.execute(&spec, &inputs).await;

        // The image step is optional: losing it keeps the text content
        let image_lost = include_image
            && matches!(
                run.state,
                RunState::Failed(i) | RunState::Cancelled(i) if i == spec.len() - 1
            );
        if !run.state.is_completed() && !image_lost {
            return Err(run
                .into_result()
                .err()
                .unwrap_or_else(|| PipelineError::new(PIPELINE_NAME, StepError::Cancelled)));
        }
        if image_lost {
            if let Some(error) = run.error() {
                warn!("Image generation did not finish, returning text content only: {}", error);
            }
        }

        let output = |step: &str| run.step_output(step).unwrap_or_default().to_string();
        let content = MarketingContent {
            ideas: output(IDEAS),
            post_text: output(POST),
            image_prompt: output(IMAGE_PROMPT),
            image_url: run.step_output(IMAGE_GENERATION).map(str::to_string),
        };

        info!(
            "Marketing content ready for {} (image: {})",
            platform,
            content.image_url.is_some()
        );
        Ok(content)
    }
}
