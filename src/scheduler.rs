use std::time::Duration;

use crate::capabilities::QualityTier;
use crate::config::RenderConfig;
use crate::scene::SceneActivity;

/// Ticks between redraws on the lowest tier
const LOW_TIER_INTERVAL: u64 = 9;
/// Ticks between redraws of changed, non-animated scenes
const DEFAULT_INTERVAL: u64 = 3;

#[derive(Debug, Clone)]
pub struct RenderLoopScheduler {
    tier: QualityTier,
    ticks: u64,
    slow_frames: u32,
    min_fps: f32,
    slow_frame_limit: u32,
    degradations: u32,
    last_fps: Option<f32>,
}

impl RenderLoopScheduler {
    pub fn new(tier: QualityTier, config: &RenderConfig) -> Self {
        Self {
            tier,
            ticks: 0,
            slow_frames: 0,
            min_fps: config.min_fps,
            slow_frame_limit: config.slow_frame_limit.max(1),
            degradations: 0,
            last_fps: None,
        }
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Consecutive slow-frame score, between 0 and the limit
    pub fn slow_frames(&self) -> u32 {
        self.slow_frames
    }

    /// How many times quality reduction has been requested this session
    pub fn degradations(&self) -> u32 {
        self.degradations
    }

    /// Frame rate of the most recent completed frame
    pub fn last_fps(&self) -> Option<f32> {
        self.last_fps
    }

    /// Advance the tick counter and decide whether the scene needs a frame.
    /// Must be called exactly once per tick.
    pub fn should_redraw(&mut self, activity: SceneActivity) -> bool {
        self.ticks = self.ticks.wrapping_add(1);
        if !activity.pending {
            return false;
        }
        match self.tier {
            QualityTier::Low => self.ticks % LOW_TIER_INTERVAL == 0,
            _ if activity.animating => true,
            _ => self.ticks % DEFAULT_INTERVAL == 0,
        }
    }

    /// Account for a completed frame. Returns true when every model should
    /// now reduce its quality.
    pub fn record_frame(&mut self, render_time: Duration) -> bool {
        let seconds = render_time.as_secs_f32();
        let fps = if seconds > 0.0 {
            1.0 / seconds
        } else {
            f32::INFINITY
        };
        self.last_fps = Some(fps);

        if fps >= self.min_fps {
            self.slow_frames = self.slow_frames.saturating_sub(1);
            return false;
        }

        self.slow_frames += 1;
        if self.slow_frames < self.slow_frame_limit {
            return false;
        }
        self.slow_frames = 0;
        self.degradations += 1;
        tracing::info!(
            fps,
            degradations = self.degradations,
            "Sustained low frame rate, reducing quality"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOW: Duration = Duration::from_millis(50);
    const FAST: Duration = Duration::from_millis(5);

    fn scheduler(tier: QualityTier) -> RenderLoopScheduler {
        RenderLoopScheduler::new(tier, &RenderConfig::default())
    }

    fn changed() -> SceneActivity {
        SceneActivity {
            pending: true,
            animating: false,
        }
    }

    fn animating() -> SceneActivity {
        SceneActivity {
            pending: true,
            animating: true,
        }
    }

    fn redraws(scheduler: &mut RenderLoopScheduler, activity: SceneActivity, ticks: usize) -> usize {
        (0..ticks).filter(|_| scheduler.should_redraw(activity)).count()
    }

    #[test]
    fn test_idle_scene_never_redraws() {
        let mut s = scheduler(QualityTier::High);
        assert_eq!(redraws(&mut s, SceneActivity::default(), 90), 0);
        assert_eq!(s.ticks(), 90);
    }

    #[test]
    fn test_frame_skip_by_tier() {
        let mut high = scheduler(QualityTier::High);
        assert_eq!(redraws(&mut high, changed(), 90), 30);
        assert_eq!(redraws(&mut high, animating(), 90), 90);

        let mut low = scheduler(QualityTier::Low);
        assert_eq!(redraws(&mut low, changed(), 90), 10);
        assert_eq!(redraws(&mut low, animating(), 90), 10);
    }

    #[test]
    fn test_degrades_once_per_ten_slow_frames() {
        let mut s = scheduler(QualityTier::High);
        let fired: Vec<bool> = (0..25).map(|_| s.record_frame(SLOW)).collect();
        let positions: Vec<usize> = fired
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.then_some(i))
            .collect();
        assert_eq!(positions, vec![9, 19]);
        assert_eq!(s.degradations(), 2);
        assert_eq!(s.slow_frames(), 5);
    }

    #[test]
    fn test_fast_frames_decay_without_upgrading() {
        let mut s = scheduler(QualityTier::Medium);
        for _ in 0..10 {
            s.record_frame(SLOW);
        }
        assert_eq!(s.degradations(), 1);

        for _ in 0..1000 {
            assert!(!s.record_frame(FAST));
        }
        assert_eq!(s.slow_frames(), 0);
        assert_eq!(s.degradations(), 1);
        assert_eq!(s.tier(), QualityTier::Medium);
    }

    #[test]
    fn test_interleaved_fast_frames_delay_degradation() {
        let mut s = scheduler(QualityTier::High);
        for _ in 0..9 {
            s.record_frame(SLOW);
        }
        s.record_frame(FAST);
        assert_eq!(s.slow_frames(), 8);
        assert!(!s.record_frame(SLOW));
        assert!(s.record_frame(SLOW));
    }

    #[test]
    fn test_zero_duration_is_fast() {
        let mut s = scheduler(QualityTier::High);
        assert!(!s.record_frame(Duration::ZERO));
        assert_eq!(s.last_fps(), Some(f32::INFINITY));
    }
}
