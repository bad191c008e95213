pub mod classifier;
pub mod feature_extractor;
pub mod label_table;
pub mod model_loader;

pub use classifier::{ClassifierArtifact, GestureClassifier};
pub use feature_extractor::FeatureExtractor;
pub use label_table::{DEFAULT_COMPOUND_LABEL, LabelTable};
pub use model_loader::{
    ArtifactModelLoader, ClassifierStrategy, LoadedModels, ModelLoader, load_classifier,
};
