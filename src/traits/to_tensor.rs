use burn::{
    prelude::*,
    tensor::{backend::Backend, BasicOps, Element, TensorData},
};

use crate::error::A2CError;

/// Host values that can be moved onto a backend device
///
/// Values are converted to the backend's element type on the way, so `f32`
/// returns and states work with any float precision.
///
/// - `Vec<E>` becomes a `[len]` tensor (per-step returns).
/// - `Vec<[E; A]>` becomes a `[batch, A]` tensor, one row per environment state
///   (e.g. [`CartPoleState`](crate::gym::CartPoleState)).
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

impl<B, E, K> ToTensor<B, 1, K> for Vec<E>
where
    B: Backend,
    E: Element,
    K: BasicOps<B>,
{
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 1, K> {
        let len = self.len();
        let data = TensorData::new(self, [len]).convert::<K::Elem>();
        Tensor::from_data(data, device)
    }
}

impl<B, E, K, const A: usize> ToTensor<B, 2, K> for Vec<[E; A]>
where
    B: Backend,
    E: Element,
    K: BasicOps<B>,
{
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, K> {
        let batch_size = self.len();
        let flat: Vec<E> = self.into_iter().flatten().collect();
        let data = TensorData::new(flat, [batch_size, A]).convert::<K::Elem>();
        Tensor::from_data(data, device)
    }
}

/// Copy a float tensor back to host memory as `f32`s
pub fn read_floats<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>, A2CError> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|err| A2CError::TensorData(format!("{err:?}")))
}
