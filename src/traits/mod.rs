pub mod to_tensor;

pub use to_tensor::{read_floats, ToTensor};
