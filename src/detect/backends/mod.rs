pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use stub::StubLandmarker;

#[cfg(feature = "backend-tract")]
pub use tract::TractLandmarker;
