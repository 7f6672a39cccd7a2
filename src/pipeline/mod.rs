/*!
 * Chunked, multi-stage text processing.
 *
 * A document flows through an ordered `Pipeline` of stages. Each stage is
 * split into boundary-aware chunks, every chunk costs exactly one generation
 * call, and intermediate results are saved as step artifacts.
 */

pub mod cancel;
pub mod chunker;
pub mod composer;
pub mod dedup;
pub mod events;
pub mod executor;
pub mod gateway;
pub mod orchestrator;
pub mod stage;
pub mod steps;

pub use cancel::CancellationToken;
pub use chunker::{ChunkingPolicy, MaxChars, Segment, TextChunker};
pub use composer::{ComposedPrompt, PromptComposer};
pub use dedup::deduplicate_paragraphs;
pub use events::{EventSink, ProcessingEvent};
pub use gateway::GenerationGateway;
pub use orchestrator::{PipelineOrchestrator, RunOutcome, RunPhase};
pub use stage::{
    Pipeline, RewriteStage, StageConfig, StageKind, TaskDefinition, TranslationPrompts, TranslationStage,
};
