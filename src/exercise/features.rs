use crate::{
    geometry::{checked_angle, Point},
    pose::{Joint, PoseSnapshot},
};

use super::profile::{ExerciseProfile, JointTriple};

/// Angles and progress derived from one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFeatures {
    pub primary_angle: f64,
    pub secondary_angle: f64,
    /// 0 at the extended threshold, 100 at the contracted threshold.
    pub progress: f64,
}

/// Extracts the profile's angles from a snapshot.
///
/// Returns `None` when a required joint is missing, not visible enough, or
/// the geometry is degenerate.
pub fn extract_features(snapshot: &PoseSnapshot, profile: &ExerciseProfile) -> Option<FrameFeatures> {
    let visible = profile.required_joints().into_iter().all(|joint| {
        snapshot
            .get(joint)
            .is_some_and(|sample| sample.visibility > profile.visibility_cutoff)
    });
    if !visible {
        return None;
    }

    let primary_angle = triple_angle(snapshot, &profile.primary)?;
    let secondary_angle = triple_angle(snapshot, &profile.secondary)?;

    Some(FrameFeatures {
        primary_angle,
        secondary_angle,
        progress: progress_percent(
            primary_angle,
            profile.contracted_threshold,
            profile.extended_threshold,
        ),
    })
}

/// Linear map of `angle` from `contracted` (100) to `extended` (0), clamped.
pub fn progress_percent(angle: f64, contracted: f64, extended: f64) -> f64 {
    if angle <= contracted {
        return 100.0;
    }
    if angle >= extended {
        return 0.0;
    }
    100.0 * (extended - angle) / (extended - contracted)
}

fn triple_angle(snapshot: &PoseSnapshot, triple: &JointTriple) -> Option<f64> {
    checked_angle(
        point(snapshot, triple.first)?,
        point(snapshot, triple.vertex)?,
        point(snapshot, triple.last)?,
    )
}

fn point(snapshot: &PoseSnapshot, joint: Joint) -> Option<Point> {
    snapshot.get(joint).map(|sample| sample.point())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::JointSample;
    use crate::testing::pose_with_angles;

    #[test]
    fn squat_angles_come_from_the_profile_joints() {
        let profile = ExerciseProfile::squat();
        let snapshot = pose_with_angles(&profile, 135.0, 150.0);

        let features = extract_features(&snapshot, &profile).unwrap();

        assert!((features.primary_angle - 135.0).abs() < 1e-6);
        assert!((features.secondary_angle - 150.0).abs() < 1e-6);
        assert!((features.progress - 50.0).abs() < 1e-6);
    }

    #[test]
    fn push_up_angles_come_from_the_profile_joints() {
        let profile = ExerciseProfile::push_up();
        let snapshot = pose_with_angles(&profile, 90.0, 170.0);

        let features = extract_features(&snapshot, &profile).unwrap();

        assert!((features.primary_angle - 90.0).abs() < 1e-6);
        assert!((features.secondary_angle - 170.0).abs() < 1e-6);
        assert_eq!(features.progress, 100.0);
    }

    #[test]
    fn visibility_at_cutoff_is_not_enough() {
        let profile = ExerciseProfile::squat();
        let mut snapshot = pose_with_angles(&profile, 120.0, 150.0);
        let knee = *snapshot.get(Joint::LeftKnee).unwrap();
        snapshot.insert(Joint::LeftKnee, JointSample::new(knee.x, knee.y, 0.7));

        assert_eq!(extract_features(&snapshot, &profile), None);
    }

    #[test]
    fn missing_joint_means_no_features() {
        let profile = ExerciseProfile::push_up();
        let full = pose_with_angles(&profile, 120.0, 170.0);
        let mut partial = PoseSnapshot::new();
        for joint in profile.required_joints() {
            if joint != Joint::LeftAnkle {
                partial.insert(joint, *full.get(joint).unwrap());
            }
        }

        assert_eq!(extract_features(&partial, &profile), None);
    }

    #[test]
    fn progress_is_clamped_outside_the_threshold_band() {
        assert_eq!(progress_percent(40.0, 100.0, 170.0), 100.0);
        assert_eq!(progress_percent(100.0, 100.0, 170.0), 100.0);
        assert_eq!(progress_percent(179.0, 100.0, 170.0), 0.0);
        assert!((progress_percent(156.0, 100.0, 170.0) - 20.0).abs() < 1e-9);
    }
}
