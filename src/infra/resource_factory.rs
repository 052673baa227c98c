use crate::app::ports::ResourceFactory;
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::pipeline::processing::resources::NlpResources;

/// Loads resources from the configured model directory, or the built-in
/// models when none is set
pub struct ModelResourceFactory {
    config: AnalyzerConfig,
}

impl ModelResourceFactory {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }
}

impl ResourceFactory for ModelResourceFactory {
    fn load(&self) -> Result<NlpResources> {
        NlpResources::load(&self.config)
    }
}
