/// Error definitions
pub mod error;
/// Scene → CRTS export pipeline: deduplication, buffer layout, record mapping and writing.
pub mod export;
/// Decoding of written CRTS files.
pub mod reader;
/// Read-only scene description consumed by the exporter.
pub mod scene;

pub use export::{ExportOptions, ExportStatus, export_to_path, write_scene};
pub use reader::CrtsFile;
pub use scene::Scene;
