pub mod synth_llm;

pub use synth_llm::{OpenAiSynthesizerAdapter, UnavailableSynthesizer};
