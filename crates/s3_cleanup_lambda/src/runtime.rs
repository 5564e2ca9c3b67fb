pub use s3_cleanup_core::{
    contract, engine, eraser, error, pagination, properties, stack_status,
};
