pub mod images;

pub use images::ImageStore;
