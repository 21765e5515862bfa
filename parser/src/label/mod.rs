pub use label_filter::*;

mod label_filter;
