pub mod schema;

pub use schema::{Column, Schema};
