use crate::config::{ModelConfig, ModelType};
use crate::error::ClassifierError;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::feed_forward::FeedForwardNet;
use crate::models::naive_bayes::GaussianNaiveBayes;

/// Build a boxed classifier model from a `ModelConfig`.
pub fn build_model(params: ModelConfig) -> Result<Box<dyn ClassifierModel>, ClassifierError> {
    match params.model_type {
        ModelType::GaussianNb { var_smoothing } => {
            Ok(Box::new(GaussianNaiveBayes::new(var_smoothing)))
        }
        ModelType::FeedForward { .. } => Ok(Box::new(FeedForwardNet::new(params)?)),
    }
}
