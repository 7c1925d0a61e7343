pub mod id;

pub use id::IdKind;
