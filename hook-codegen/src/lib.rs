pub mod emitter;
pub mod error;
pub mod generator;
pub mod loader;
pub mod metrics_consts;
pub mod parser;
pub mod schema;
pub mod unifier;

pub use emitter::{emit, EmitError, EmitOptions};
pub use error::GenerateError;
pub use generator::{GeneratedArtifact, HandlerGenerator};
pub use loader::PayloadLoader;
pub use parser::{ParsedSample, SampleValue};
pub use schema::{FieldSlot, FieldType, Kind, ObjectType};
pub use unifier::{SampleTally, UnifiedSchema};
