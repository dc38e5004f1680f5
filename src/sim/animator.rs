//! Fixed-duration fall reaction timing
//!
//! Five frames of `FRAME_DURATION` each, advanced purely by elapsed time.
//! Rendering reads `current_frame_descriptor()` and never drives timing.

use serde::{Deserialize, Serialize};

use crate::consts::{ANIMATION_TIMEOUT, FRAME_COUNT, FRAME_DURATION, FRAME_REGION_SIZE};

/// Slack on frame boundaries so f32 summation (e.g. 8 x 0.1) lands on 0.8.
/// Applied once per boundary against total elapsed time.
const FRAME_EPSILON: f32 = 1e-4;

/// Reaction sequence state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnimatorState {
    #[default]
    None,
    Frame1,
    Frame2,
    Frame3,
    Frame4,
    Frame5,
    Complete,
}

impl AnimatorState {
    /// The state that follows this one in the linear sequence
    fn next(self) -> Self {
        match self {
            AnimatorState::None => AnimatorState::None,
            AnimatorState::Frame1 => AnimatorState::Frame2,
            AnimatorState::Frame2 => AnimatorState::Frame3,
            AnimatorState::Frame3 => AnimatorState::Frame4,
            AnimatorState::Frame4 => AnimatorState::Frame5,
            AnimatorState::Frame5 | AnimatorState::Complete => AnimatorState::Complete,
        }
    }

    /// Sheet index for the frame states (0..=4)
    pub fn frame_index(self) -> Option<u8> {
        match self {
            AnimatorState::Frame1 => Some(0),
            AnimatorState::Frame2 => Some(1),
            AnimatorState::Frame3 => Some(2),
            AnimatorState::Frame4 => Some(3),
            AnimatorState::Frame5 | AnimatorState::Complete => Some(4),
            AnimatorState::None => None,
        }
    }
}

/// Rectangle within the reaction sheet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FrameRegion {
    /// Square region in column `index` of the single-row sheet
    const fn column(index: usize) -> Self {
        Self {
            x: index as f32 * FRAME_REGION_SIZE,
            y: 0.0,
            width: FRAME_REGION_SIZE,
            height: FRAME_REGION_SIZE,
        }
    }
}

/// Frame index to sheet region, laid out left to right
pub const FRAME_REGIONS: [FrameRegion; FRAME_COUNT] = [
    FrameRegion::column(0),
    FrameRegion::column(1),
    FrameRegion::column(2),
    FrameRegion::column(3),
    FrameRegion::column(4),
];

/// What a renderer needs to draw the current reaction frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameDescriptor {
    pub index: u8,
    pub region: FrameRegion,
    /// How long each frame is held
    pub duration: f32,
}

/// Timing machine for one actor's fall reaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardReactionAnimator {
    state: AnimatorState,
    /// Time since `start()`. Drives frame changes and the timeout guard.
    elapsed: f32,
    frame_duration: f32,
}

impl Default for HazardReactionAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl HazardReactionAnimator {
    pub fn new() -> Self {
        Self {
            state: AnimatorState::None,
            elapsed: 0.0,
            frame_duration: FRAME_DURATION,
        }
    }

    /// Animator with a stretched frame time, for exercising the timeout guard
    #[cfg(test)]
    fn with_frame_duration(frame_duration: f32) -> Self {
        Self {
            frame_duration,
            ..Self::new()
        }
    }

    /// Begin the sequence at frame 1. Only legal from `None` or `Complete`;
    /// returns false (and leaves the running sequence alone) otherwise.
    pub fn start(&mut self) -> bool {
        if self.is_active() {
            log::debug!("Reaction already running in {:?}, start ignored", self.state);
            return false;
        }
        self.state = AnimatorState::Frame1;
        self.elapsed = 0.0;
        true
    }

    /// Advance by `dt` seconds. No-op unless a frame is showing.
    pub fn tick(&mut self, dt: f32) {
        if !self.is_active() {
            return;
        }
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            log::warn!("Reaction tick with invalid dt {}, treating as 0", dt);
            0.0
        };

        self.elapsed += dt;

        // Boundaries are absolute (k * frame_duration), so the slack never compounds
        while let Some(index) = self.state.frame_index().filter(|_| self.is_active()) {
            let frame_end = f32::from(index + 1) * self.frame_duration;
            if self.elapsed + FRAME_EPSILON < frame_end {
                break;
            }
            self.state = self.state.next();
        }

        if self.state != AnimatorState::Complete && self.elapsed >= ANIMATION_TIMEOUT {
            log::warn!(
                "Reaction stuck in {:?} after {:.2}s, forcing completion",
                self.state,
                self.elapsed
            );
            self.state = AnimatorState::Complete;
        }
    }

    /// A frame is showing (anything but `None`/`Complete`)
    pub fn is_active(&self) -> bool {
        !matches!(self.state, AnimatorState::None | AnimatorState::Complete)
    }

    pub fn is_complete(&self) -> bool {
        self.state == AnimatorState::Complete
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    /// Seconds since `start()`
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Frame to draw, `None` when idle. `Complete` holds the last frame.
    pub fn current_frame_descriptor(&self) -> Option<FrameDescriptor> {
        let index = self.state.frame_index()?;
        Some(FrameDescriptor {
            index,
            region: FRAME_REGIONS[index as usize],
            duration: FRAME_DURATION,
        })
    }

    /// Back to `None` from anywhere
    pub fn reset(&mut self) {
        self.state = AnimatorState::None;
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_idle_tick_is_noop() {
        let mut anim = HazardReactionAnimator::new();
        anim.tick(10.0);
        assert_eq!(anim.state(), AnimatorState::None);
        assert!(anim.current_frame_descriptor().is_none());
    }

    #[test]
    fn test_start_only_from_idle_or_complete() {
        let mut anim = HazardReactionAnimator::new();
        assert!(anim.start());
        anim.tick(1.0);
        assert_eq!(anim.state(), AnimatorState::Frame2);

        // Restart while running is refused
        assert!(!anim.start());
        assert_eq!(anim.state(), AnimatorState::Frame2);

        anim.tick(4.0);
        assert!(anim.is_complete());
        assert!(anim.start());
        assert_eq!(anim.state(), AnimatorState::Frame1);
        assert_eq!(anim.elapsed(), 0.0);
    }

    #[test]
    fn test_transitions_at_each_frame_boundary() {
        let mut anim = HazardReactionAnimator::new();
        anim.start();

        let mut transitions = Vec::new();
        let mut last = anim.state();
        for step in 1..=40 {
            anim.tick(0.1);
            if anim.state() != last {
                transitions.push(step);
                last = anim.state();
            }
        }
        // Steps of 0.1: 0.8, 1.6, 2.4, 3.2, 4.0
        assert_eq!(transitions, vec![8, 16, 24, 32, 40]);
        assert!(anim.is_complete());
    }

    #[test]
    fn test_whole_frame_chunks() {
        let mut anim = HazardReactionAnimator::new();
        anim.start();
        let expected = [
            AnimatorState::Frame2,
            AnimatorState::Frame3,
            AnimatorState::Frame4,
            AnimatorState::Frame5,
            AnimatorState::Complete,
        ];
        for state in expected {
            anim.tick(FRAME_DURATION);
            assert_eq!(anim.state(), state);
        }
    }

    #[test]
    fn test_not_complete_just_before_four_seconds() {
        let mut anim = HazardReactionAnimator::new();
        anim.start();
        anim.tick(3.9);
        assert_eq!(anim.state(), AnimatorState::Frame5);
        assert!(anim.is_active());
        anim.tick(0.1);
        assert!(anim.is_complete());
    }

    #[test]
    fn test_remainder_carries_over() {
        let mut anim = HazardReactionAnimator::new();
        anim.start();
        anim.tick(1.0); // Frame2 with 0.2 carried
        anim.tick(0.6); // 0.8 into Frame2 -> Frame3
        assert_eq!(anim.state(), AnimatorState::Frame3);
    }

    #[test]
    fn test_large_single_tick_completes_without_overshoot() {
        let mut anim = HazardReactionAnimator::new();
        anim.start();
        anim.tick(100.0);
        assert!(anim.is_complete());
        assert!(!anim.is_active());
    }

    #[test]
    fn test_timeout_forces_completion() {
        let mut anim = HazardReactionAnimator::with_frame_duration(2.0);
        anim.start();
        anim.tick(4.9);
        assert_eq!(anim.state(), AnimatorState::Frame3);
        anim.tick(0.2);
        assert!(anim.is_complete());
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let mut anim = HazardReactionAnimator::new();
        anim.start();
        anim.tick(f32::NAN);
        anim.tick(-3.0);
        anim.tick(f32::INFINITY);
        assert_eq!(anim.state(), AnimatorState::Frame1);
        assert_eq!(anim.elapsed(), 0.0);
    }

    #[test]
    fn test_frame_descriptor_uses_table() {
        let mut anim = HazardReactionAnimator::new();
        anim.start();
        for i in 0..FRAME_COUNT {
            let desc = anim.current_frame_descriptor().unwrap();
            assert_eq!(desc.index as usize, i);
            assert_eq!(desc.region, FRAME_REGIONS[i]);
            assert_eq!(desc.region.width, 64.0);
            assert_eq!(desc.region.height, 64.0);
            anim.tick(FRAME_DURATION);
        }
        // Complete holds the last frame
        assert_eq!(anim.current_frame_descriptor().unwrap().index, 4);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut anim = HazardReactionAnimator::new();
        anim.reset();
        assert_eq!(anim.state(), AnimatorState::None);

        anim.start();
        anim.tick(2.0);
        anim.reset();
        anim.reset();
        assert_eq!(anim.state(), AnimatorState::None);
        assert_eq!(anim.elapsed(), 0.0);
    }

    #[test]
    fn test_tolerance_does_not_accumulate_across_frames() {
        let mut anim = HazardReactionAnimator::new();
        anim.start();
        // Each chunk is within the boundary slack of a frame, but the
        // total (3.99955s) is still short of the full sequence
        for _ in 0..FRAME_COUNT {
            anim.tick(0.79991);
        }
        assert!(anim.is_active());
        assert_eq!(anim.state(), AnimatorState::Frame5);
        anim.tick(0.001);
        assert!(anim.is_complete());
    }

    #[test]
    fn test_region_columns() {
        assert_eq!(FRAME_REGIONS[0].x, 0.0);
        assert_eq!(FRAME_REGIONS[4].x, 256.0);
        assert!(FRAME_REGIONS.iter().all(|r| r.y == 0.0));
    }

    proptest! {
        #[test]
        fn prop_completes_at_four_seconds_regardless_of_chunking(
            chunks in proptest::collection::vec(0.01f32..0.5, 1..200),
        ) {
            let mut anim = HazardReactionAnimator::new();
            anim.start();
            let mut total = 0.0f32;
            for dt in chunks {
                anim.tick(dt);
                total += dt;
                if total < 4.0 - 0.01 {
                    prop_assert!(anim.is_active());
                }
                if total >= 4.0 + 0.01 {
                    prop_assert!(anim.is_complete());
                }
            }
        }
    }
}
