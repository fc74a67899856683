mod model;

pub use model::ModelMetadata;
