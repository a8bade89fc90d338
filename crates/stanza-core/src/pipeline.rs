//! The engine that drives a request through four stages to become a PNG

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    compose::{encode_png, CanvasComposer},
    context::RenderContext,
    error::{RenderError, Result, StanzaError},
    registry::Registry,
    traits::{Renderer, Stage},
    wrap::wrap,
    LayoutParams, RenderRequest,
};

/// Pipeline for poem rendering: Resolve → Wrap → Compose → Encode
///
/// Runs each stage in order on a [`RenderContext`]. A panic anywhere inside
/// the stages fails this render with [`RenderError::Panicked`] instead of
/// taking the worker down. With a deadline set, the clock is checked after
/// every stage.
///
/// ```ignore
/// use stanza_core::RenderPipeline;
///
/// let pipeline = RenderPipeline::builder(registry)
///     .layout(LayoutParams { padding: 80, ..Default::default() })
///     .deadline(Duration::from_secs(2))
///     .build()?;
///
/// let png = pipeline.render(&request)?;
/// ```
pub struct RenderPipeline {
    stages: Vec<Box<dyn Stage>>,
    registry: Arc<Registry>,
    deadline: Option<Duration>,
}

impl RenderPipeline {
    /// The four standard stages, no deadline
    pub fn new(registry: Arc<Registry>, layout: LayoutParams) -> Self {
        Self {
            stages: default_stages(&registry, layout),
            registry,
            deadline: None,
        }
    }

    pub fn builder(registry: Arc<Registry>) -> RenderPipelineBuilder {
        RenderPipelineBuilder::new(registry)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Run every stage over `context`
    pub fn execute(&self, mut context: RenderContext) -> Result<RenderContext> {
        let started = Instant::now();

        for stage in &self.stages {
            log::debug!("Executing stage: {}", stage.name());
            context = stage.process(context)?;

            if let Some(limit) = self.deadline {
                if started.elapsed() > limit {
                    return Err(RenderError::DeadlineExceeded {
                        stage: stage.name().to_string(),
                        limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    }
                    .into());
                }
            }
        }

        log::debug!("Pipeline finished in {:?}", started.elapsed());
        Ok(context)
    }
}

impl Renderer for RenderPipeline {
    fn name(&self) -> &'static str {
        "stanza-pipeline"
    }

    fn validate(&self, request: &RenderRequest) -> Result<()> {
        self.registry.font(request.font())?;
        self.registry.background(request.background())?;
        Ok(())
    }

    fn render(&self, request: &RenderRequest) -> Result<Vec<u8>> {
        let context = RenderContext::new(request.normalized()?);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(context)));
        let context = match outcome {
            Ok(result) => result?,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Render panicked: {message}");
                return Err(RenderError::Panicked(message).into());
            },
        };

        context
            .into_encoded()
            .ok_or_else(|| RenderError::Backend("pipeline produced no image".into()).into())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Assemble a pipeline piece by piece
///
/// ```ignore
/// // Standard stages with a time limit
/// let pipeline = RenderPipeline::builder(registry)
///     .deadline(Duration::from_millis(500))
///     .build()?;
///
/// // Full control with custom stages
/// let pipeline = RenderPipeline::builder(registry)
///     .stage(Box::new(MyResolveStage))
///     .stage(Box::new(MyEncodeStage))
///     .build()?;
/// ```
pub struct RenderPipelineBuilder {
    registry: Arc<Registry>,
    layout: LayoutParams,
    deadline: Option<Duration>,
    stages: Vec<Box<dyn Stage>>,
}

impl RenderPipelineBuilder {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            layout: LayoutParams::default(),
            deadline: None,
            stages: Vec::new(),
        }
    }

    pub fn layout(mut self, layout: LayoutParams) -> Self {
        self.layout = layout;
        self
    }

    /// Fail renders that are still running after `deadline`
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Add your own stage; any custom stage replaces the standard four
    pub fn stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Result<RenderPipeline> {
        if self.deadline == Some(Duration::ZERO) {
            return Err(StanzaError::Config("render deadline must be positive".into()));
        }

        let stages = if self.stages.is_empty() {
            default_stages(&self.registry, self.layout)
        } else {
            self.stages
        };

        Ok(RenderPipeline {
            stages,
            registry: self.registry,
            deadline: self.deadline,
        })
    }
}

fn default_stages(registry: &Arc<Registry>, layout: LayoutParams) -> Vec<Box<dyn Stage>> {
    let composer = CanvasComposer::new(layout);
    vec![
        Box::new(ResolveStage {
            registry: registry.clone(),
        }) as Box<dyn Stage>,
        Box::new(WrapStage { composer }) as Box<dyn Stage>,
        Box::new(ComposeStage { composer }) as Box<dyn Stage>,
        Box::new(EncodeStage) as Box<dyn Stage>,
    ]
}

fn missing(stage: &str, what: &str) -> StanzaError {
    StanzaError::RenderFailed(RenderError::Backend(format!(
        "{stage} stage ran before {what} was available"
    )))
}

/// Turns font and background ids into loaded assets
struct ResolveStage {
    registry: Arc<Registry>,
}

impl Stage for ResolveStage {
    fn name(&self) -> &'static str {
        "Resolve"
    }

    fn process(&self, mut context: RenderContext) -> Result<RenderContext> {
        let font = self.registry.font(context.request().font())?.clone();
        let background = self
            .registry
            .background(context.request().background())?
            .clone();
        context.set_font(font);
        context.set_background(background);
        Ok(context)
    }
}

/// Breaks the text into lines that fit between the paddings
struct WrapStage {
    composer: CanvasComposer,
}

impl Stage for WrapStage {
    fn name(&self) -> &'static str {
        "Wrap"
    }

    fn process(&self, mut context: RenderContext) -> Result<RenderContext> {
        let font = context.font().ok_or_else(|| missing("Wrap", "a font"))?;
        let background = context
            .background()
            .ok_or_else(|| missing("Wrap", "a background"))?;

        let max_width = self.composer.wrap_width(background);
        let wrapped = wrap(context.request().text(), font.face.as_ref(), max_width)?;
        log::trace!("Wrap: {} lines at {}px", wrapped.len(), max_width);

        context.set_wrapped(wrapped);
        Ok(context)
    }
}

/// Draws the lines onto a copy of the background
struct ComposeStage {
    composer: CanvasComposer,
}

impl Stage for ComposeStage {
    fn name(&self) -> &'static str {
        "Compose"
    }

    fn process(&self, mut context: RenderContext) -> Result<RenderContext> {
        let wrapped = context
            .wrapped()
            .ok_or_else(|| missing("Compose", "wrapped text"))?;
        let font = context.font().ok_or_else(|| missing("Compose", "a font"))?;
        let background = context
            .background()
            .ok_or_else(|| missing("Compose", "a background"))?;

        let canvas = self.composer.compose(wrapped, font, background)?;
        context.set_canvas(canvas);
        Ok(context)
    }
}

/// Packs the canvas into PNG bytes
struct EncodeStage;

impl Stage for EncodeStage {
    fn name(&self) -> &'static str {
        "Encode"
    }

    fn process(&self, mut context: RenderContext) -> Result<RenderContext> {
        let canvas = context
            .take_canvas()
            .ok_or_else(|| missing("Encode", "a canvas"))?;
        context.set_encoded(encode_png(&canvas)?);
        Ok(context)
    }
}
