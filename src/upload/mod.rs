mod engine;
mod extraction;
mod slot;

pub use engine::{DocumentSet, DocumentsSummary, UploadEngine};
pub use extraction::{
    DEFAULT_SUMMARY, ExtractionHandle, ExtractionSource, ExtractionStatus, SimulatedExtraction,
};
pub use slot::{FileRecord, SlotPhase, SlotState, TransferTicket, UploadSlot};
