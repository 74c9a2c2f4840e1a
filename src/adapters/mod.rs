// Adapters layer: concrete implementations of the domain ports.

pub mod directory;
pub mod resume;
pub mod scorer;

pub use directory::cards::{CardDirectoryAdapter, CardLayout};
pub use directory::renderer::HttpPageRenderer;
pub use directory::AdapterRegistry;
pub use resume::PdfResumeSource;
pub use scorer::{client::ChatClient, LlmMatchScorer};
