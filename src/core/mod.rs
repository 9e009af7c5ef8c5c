pub mod education;
pub mod llm;
pub mod logging;
pub mod typewriter;
pub mod voice;
