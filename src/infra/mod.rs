pub mod csv_output_adapter;
pub mod ndjson_source_adapter;
pub mod resource_factory;

pub use csv_output_adapter::CsvFileOutputAdapter;
pub use ndjson_source_adapter::{InMemorySource, NdjsonFileSource};
pub use resource_factory::ModelResourceFactory;
