//! Narrativa ejecutiva generada por un modelo de lenguaje externo.

pub mod client;
pub mod narrativa;
pub mod prompts;

pub use client::{GeneradorNarrativa, LlmClient};
pub use narrativa::{parsear_narrativa, Narrativa};
pub use prompts::{construir_prompt, ContextoNarrativa};
