//! Pipeline services for scribe-ingest

pub mod asset_validator;
pub mod conversion;
pub mod header_repairer;
pub mod model_loader;
pub mod progress_observer;
pub mod whisper_cli;

pub use asset_validator::{AssetValidator, AudioInfo, ValidatedAsset};
pub use conversion::{ConversionChain, ConversionRequest, ConversionStrategy};
pub use model_loader::{LoadedModel, ModelLoader, ResourceLoadFallback, Transcriber};
pub use progress_observer::{ObserverState, ProgressObserver, ProgressSink, StderrProgressSink};
pub use whisper_cli::{WhisperCliLoader, WhisperCliModel};
