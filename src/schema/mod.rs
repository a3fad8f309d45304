// mod.rs - Schema selection and backend layout

pub mod layout;
pub mod registry;

pub use layout::BackendLayout;
pub use registry::SchemaMap;
