pub mod generator;
pub mod interpreter;
pub mod llm;
pub mod prompt;

pub use generator::SignalGenerator;
pub use interpreter::interpret;
pub use llm::OpenAiClient;
pub use prompt::render_prompt;
