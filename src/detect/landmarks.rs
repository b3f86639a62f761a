//! Fixed 33-point anatomical indexing and skeleton topology.
//!
//! The landmarker contract orders landmarks nose-first, following the
//! BlazePose full-body topology. `POSE_CONNECTIONS` lists the skeleton edges
//! the overlay renderer draws between them.

/// Number of landmarks per detected person.
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Anatomical landmark indices, in the order the landmarker emits them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum PoseIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseIndex {
    pub fn as_usize(self) -> usize {
        self as usize
    }
}

/// Skeleton edges (pairs of landmark indices) connecting the 33 keypoints.
pub const POSE_CONNECTIONS: [(PoseIndex, PoseIndex); 35] = [
    // Face
    (PoseIndex::Nose, PoseIndex::LeftEyeInner),
    (PoseIndex::LeftEyeInner, PoseIndex::LeftEye),
    (PoseIndex::LeftEye, PoseIndex::LeftEyeOuter),
    (PoseIndex::LeftEyeOuter, PoseIndex::LeftEar),
    (PoseIndex::Nose, PoseIndex::RightEyeInner),
    (PoseIndex::RightEyeInner, PoseIndex::RightEye),
    (PoseIndex::RightEye, PoseIndex::RightEyeOuter),
    (PoseIndex::RightEyeOuter, PoseIndex::RightEar),
    (PoseIndex::MouthLeft, PoseIndex::MouthRight),
    // Arms
    (PoseIndex::LeftShoulder, PoseIndex::RightShoulder),
    (PoseIndex::LeftShoulder, PoseIndex::LeftElbow),
    (PoseIndex::LeftElbow, PoseIndex::LeftWrist),
    (PoseIndex::LeftWrist, PoseIndex::LeftPinky),
    (PoseIndex::LeftWrist, PoseIndex::LeftIndex),
    (PoseIndex::LeftWrist, PoseIndex::LeftThumb),
    (PoseIndex::LeftPinky, PoseIndex::LeftIndex),
    (PoseIndex::RightShoulder, PoseIndex::RightElbow),
    (PoseIndex::RightElbow, PoseIndex::RightWrist),
    (PoseIndex::RightWrist, PoseIndex::RightPinky),
    (PoseIndex::RightWrist, PoseIndex::RightIndex),
    (PoseIndex::RightWrist, PoseIndex::RightThumb),
    (PoseIndex::RightPinky, PoseIndex::RightIndex),
    // Torso
    (PoseIndex::LeftShoulder, PoseIndex::LeftHip),
    (PoseIndex::RightShoulder, PoseIndex::RightHip),
    (PoseIndex::LeftHip, PoseIndex::RightHip),
    // Legs
    (PoseIndex::LeftHip, PoseIndex::LeftKnee),
    (PoseIndex::RightHip, PoseIndex::RightKnee),
    (PoseIndex::LeftKnee, PoseIndex::LeftAnkle),
    (PoseIndex::RightKnee, PoseIndex::RightAnkle),
    (PoseIndex::LeftAnkle, PoseIndex::LeftHeel),
    (PoseIndex::RightAnkle, PoseIndex::RightHeel),
    (PoseIndex::LeftHeel, PoseIndex::LeftFootIndex),
    (PoseIndex::RightHeel, PoseIndex::RightFootIndex),
    (PoseIndex::LeftAnkle, PoseIndex::LeftFootIndex),
    (PoseIndex::RightAnkle, PoseIndex::RightFootIndex),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connections_stay_within_landmark_range() {
        for (a, b) in POSE_CONNECTIONS {
            assert!(a.as_usize() < POSE_LANDMARK_COUNT);
            assert!(b.as_usize() < POSE_LANDMARK_COUNT);
        }
    }

    #[test]
    fn no_self_edges() {
        for (a, b) in POSE_CONNECTIONS {
            assert_ne!(a.as_usize(), b.as_usize());
        }
    }
}
