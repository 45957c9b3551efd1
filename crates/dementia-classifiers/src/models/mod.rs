pub mod classifier_trait;
pub mod factory;
pub mod feed_forward;
pub mod naive_bayes;
