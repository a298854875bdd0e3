//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the pipeline core and an
//! external system (time, LLM, filesystem, pacing delays).
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod filesystem;
pub mod llm;
pub mod sleeper;

pub use clock::Clock;
pub use filesystem::FileSystem;
pub use llm::{GenerationFuture, GenerationRequest, GenerationResponse, LlmClient};
pub use sleeper::{SleepFuture, Sleeper};
