/*!
 * Pipeline orchestration.
 *
 * Two linear flows, each run once per inbound request:
 * 1. **ExtractAndTranslate**: fetch upload, OCR, translate, persist
 * 2. **SynthesizeAudio**: load translation, synthesize, store audio, update
 *
 * Stages never loop back; any stage can end the flow as `Failed(stage)`.
 */

pub mod orchestrator;
pub mod stages;

pub use orchestrator::{
    AUTO_DETECTED_SCRIPT, Chains, OcrChain, Orchestrator, SpeechChain, SynthesisOutcome, TranslationChain,
};
pub use stages::{Flow, Stage, StageMachine, StageState};
