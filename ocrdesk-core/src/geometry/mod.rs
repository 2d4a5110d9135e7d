pub mod bbox;

pub use bbox::Bbox;
