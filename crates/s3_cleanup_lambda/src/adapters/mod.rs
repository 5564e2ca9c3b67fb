pub mod cloudformation;
pub mod object_store;
pub mod response;
pub mod sdk_error;
