//! One object that owns everything needed to turn poems into pictures

use std::sync::Arc;

use stanza_core::{
    error::Result, Background, ContentCache, Fingerprint, FontSpec, ImageBytes, Registry,
    RenderPipeline, RenderRequest, RenderService, RenderTicket, StanzaError,
};
use stanza_fontdb::FontDatabase;
use stanza_render_skia::SkiaFace;

use crate::config::StanzaConfig;

/// Loaded assets plus the render service that uses them
///
/// ```ignore
/// let studio = Studio::from_config(StanzaConfig::from_file("stanza.toml")?.with_env_overrides())?;
/// let (fingerprint, png) = studio.render("roses are red", None, Some("y1"))?;
/// std::fs::write(format!("{fingerprint}.png"), png.as_slice())?;
/// ```
pub struct Studio {
    config: StanzaConfig,
    registry: Arc<Registry>,
    service: RenderService,
}

impl Studio {
    /// Load every font and background, then start the workers
    pub fn from_config(config: StanzaConfig) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(load_registry(&config)?);
        Self::with_registry(config, registry)
    }

    /// Use assets that were loaded elsewhere
    pub fn with_registry(config: StanzaConfig, registry: Arc<Registry>) -> Result<Self> {
        let mut pipeline = RenderPipeline::builder(registry.clone()).layout(config.layout()?);
        if let Some(deadline) = config.render_deadline() {
            pipeline = pipeline.deadline(deadline);
        }

        let service = RenderService::new(
            Arc::new(pipeline.build()?),
            ContentCache::new(config.cache_config()),
            config.worker_count(),
        )?;

        Ok(Self {
            config,
            registry,
            service,
        })
    }

    pub fn config(&self) -> &StanzaConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn service(&self) -> &RenderService {
        &self.service
    }

    /// Build a request the way callers expect ids to behave
    ///
    /// See [`resolve_request`].
    pub fn request(
        &self,
        text: &str,
        font: Option<&str>,
        background: Option<&str>,
    ) -> Result<RenderRequest> {
        resolve_request(&self.registry, text, font, background)
    }

    pub fn submit(&self, request: RenderRequest) -> Result<RenderTicket> {
        self.service.submit(request)
    }

    /// Render with boundary defaults applied, waiting for the result
    pub fn render(
        &self,
        text: &str,
        font: Option<&str>,
        background: Option<&str>,
    ) -> Result<(Fingerprint, ImageBytes)> {
        let ticket = self.submit(self.request(text, font, background)?)?;
        let fingerprint = ticket.fingerprint();
        Ok((fingerprint, ticket.wait()?))
    }
}

/// Apply the public defaults to a raw request
///
/// - A missing or blank font id means the default font
/// - An unknown font id is an error naming the valid ones
/// - A missing or unknown background id quietly means the default background
/// - Text is normalized, so blank text fails here
pub fn resolve_request(
    registry: &Registry,
    text: &str,
    font: Option<&str>,
    background: Option<&str>,
) -> Result<RenderRequest> {
    let font = match font.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => registry.font(id)?.id.as_str(),
        None => registry.default_font(),
    };

    let background = match background.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) if registry.has_background(id) => id,
        Some(id) => {
            log::warn!(
                "Unknown background '{id}', using '{}'",
                registry.default_background()
            );
            registry.default_background()
        },
        None => registry.default_background(),
    };

    RenderRequest::new(text, font, background).normalized()
}

/// Read every configured asset from disk
pub fn load_registry(config: &StanzaConfig) -> Result<Registry> {
    let mut db = FontDatabase::new();
    let mut builder = Registry::builder()
        .default_font(config.default_font.as_str())
        .default_background(config.default_background.as_str());

    for (id, entry) in &config.fonts {
        let path = config.resolve(&entry.path);
        let face = db.load_face(&path, entry.size).map_err(|e| {
            StanzaError::Config(format!("font '{id}' ({}): {e}", path.display()))
        })?;
        let painter = Arc::new(SkiaFace::new(face));
        builder = builder.font(FontSpec::new(id.as_str(), entry.size, painter));
    }

    for (id, entry) in &config.backgrounds {
        let path = config.resolve(&entry.path);
        let image = image::open(&path)
            .map_err(|e| {
                StanzaError::Config(format!("background '{id}' ({}): {e}", path.display()))
            })?
            .to_rgba8();
        log::debug!(
            "Loaded background '{id}' {}x{} from {}",
            image.width(),
            image.height(),
            path.display()
        );
        builder = builder.background(Background::new(id.as_str(), image));
    }

    log::info!(
        "Loaded {} fonts from {} files and {} backgrounds",
        config.fonts.len(),
        db.font_count(),
        config.backgrounds.len()
    );
    builder.build()
}
