pub mod input;
pub mod naive_bayes;
pub mod neural;
pub mod output;
pub mod util;
