//! BrAPI Schema Core
//!
//! Reads a directory tree of JSON Schema documents describing the BrAPI
//! domain model and produces a canonical, name-addressable type model
//! consumed by independent code and document generators.
//!
//! ## Pipeline
//!
//! ```text
//! schema root/
//! ├── BrAPI-Core/
//! │   ├── Trial.json
//! │   └── Study.json
//! ├── BrAPI-Germplasm/
//! │   └── Germplasm.json
//! └── ...
//!          │
//!          ▼
//!   SchemaReader ── Response<Vec<BrApiType>>  (every structural error, one pass)
//!          │
//!          ▼
//!   ClassCache ── name-keyed, cycle-safe index over the batch
//!          │
//!          ▼
//!   Backends (GraphQL here) ── read-only over the IR + cache
//! ```
//!
//! ## Error reporting
//!
//! Foundational failures (unreadable directory, unparsable document) abort
//! a read through [`SchemaError`]. Structural problems (bad `$ref`, unknown
//! type set, missing `items`) never abort: they accumulate in a
//! [`Response`] so one run reports every problem across the whole batch.

pub mod cache;
pub mod error;
pub mod graphql;
pub mod model;
pub mod reader;
pub mod response;
pub mod validation;

pub use cache::ClassCache;
pub use error::{Result, SchemaError};
pub use model::{
    AllOfType, ArrayType, BrApiType, EnumType, EnumValue, ObjectType, OneOfType, PrimitiveType,
    Property, ReferenceType,
};
pub use reader::{SchemaReader, SchemaReaderOptions};
pub use response::{ErrorKind, Response, ResponseError};
pub use validation::Validation;
