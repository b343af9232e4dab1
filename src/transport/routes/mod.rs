pub mod index;
pub mod info;
pub mod stream;
