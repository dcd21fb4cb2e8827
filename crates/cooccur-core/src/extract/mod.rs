mod extractor;
mod normalizer;
mod set;
mod window;

pub use extractor::{
    Document, DocumentContent, ExtractedDocument, ExtractedEntities, ExtractionMode,
    ExtractionResult, Extractor, InputError,
};
pub use normalizer::{normalize_key, TokenCleaner};
pub use set::SetExtractor;
pub use window::{count_within_window, TermFamilies, TermFamily, WindowExtractor};

pub(crate) use window::tokens_of;
