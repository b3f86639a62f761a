mod backend;
mod backends;
mod landmarks;
pub mod metrics;
mod registry;
mod result;

pub use backend::LandmarkerBackend;
pub use backends::StubLandmarker;
#[cfg(feature = "backend-tract")]
pub use backends::TractLandmarker;
pub use landmarks::{PoseIndex, POSE_CONNECTIONS, POSE_LANDMARK_COUNT};
pub use registry::LandmarkerRegistry;
pub use result::{DetectionResult, Landmark, Pose, SegmentationMask};
