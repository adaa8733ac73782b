pub mod synthesis_error;

pub use synthesis_error::{ProviderFailure, SynthesisError, SynthesisResult};
