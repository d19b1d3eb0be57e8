pub mod items;
pub mod lookups;
pub mod ops;
