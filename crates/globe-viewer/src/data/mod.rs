//! GPU data handling: buffer layouts and scene upload.

pub mod types;
pub mod upload;

pub use self::types::{
    CloudUniformStd140, PinBatchGpu, PinUniformStd140, PointCloudGpu, PointInstance, SceneGpu,
};
