pub mod error;
pub mod schema;
pub mod source;
pub mod storage;
pub mod types;
pub mod value;

pub use error::{ApiError, ErrorKind};
pub use schema::{FieldSchema, SchemaDescriptor, ValueShape};
pub use source::SourceApi;
pub use storage::{PassthroughParser, RowParser, RowStore, SchemaParser};
pub use types::{Column, ColumnFormat, ColumnKind, Page, Row, RowsRequest, SortBy, TableRef};
pub use value::{
    ExpandedRow, ExpandedRowReference, ImageObject, Person, RawValue, RowReference, Values,
    WebPage, SCHEMA_ORG_CONTEXT,
};
