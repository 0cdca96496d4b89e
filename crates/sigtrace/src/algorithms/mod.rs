pub mod normalize;
pub mod enhancement;
pub mod binarization;
pub mod components;
pub mod morphology;
pub mod extraction;

pub use normalize::*;
pub use enhancement::{ClaheEnhancer, GaussianSmoother};
pub use binarization::*;
pub use components::*;
pub use morphology::*;
pub use extraction::*;
