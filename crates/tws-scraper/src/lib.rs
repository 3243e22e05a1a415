pub mod dom;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod rules;
pub mod sites;
pub mod writer;

pub use pipeline::{scrap_page, Pipeline, PipelineConfig, SiteConfig, GBP_TO_INR};
pub use record::{Field, TenderRecord, Value};
pub use sites::Site;
pub use writer::{export, CsvWriter, CsvWriterConfig, ExportStatus};

pub use anyhow;
pub use tws_render;
