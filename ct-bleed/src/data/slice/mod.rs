//! CT 扫描切片对象的操作.

mod core;
mod iter;
mod save;

pub use core::ScanSlice;

pub use iter::SliceIter;

pub use save::ImgEncodePng;
