/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct that contains performance metrics
 * and per-frame simulation counts to be displayed in the UI.
 *
 * Includes metrics for:
 * - FPS (frames per second) and frame time
 * - Collisions resolved and creatures expired in the last frame
 * - Frames simulated since start
 */

use std::time::Duration;

use crate::simulation::StepReport;

// Debug information to display
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    pub fps: f32,
    pub frame_time: Duration,
    pub frames: u64,
    pub collisions_last_frame: usize,
    pub expired_last_frame: usize,
}

impl DebugInfo {
    pub fn record_frame(&mut self, fps: f32, frame_time: Duration, report: &StepReport) {
        self.fps = fps;
        self.frame_time = frame_time;
        self.frames += 1;
        self.collisions_last_frame = report.collisions;
        self.expired_last_frame = report.expired.len();
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.frame_time.as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_the_latest_frame() {
        let mut info = DebugInfo::default();
        let report = StepReport {
            expired: vec![],
            collisions: 3,
        };
        info.record_frame(60.0, Duration::from_millis(16), &report);
        info.record_frame(59.0, Duration::from_millis(17), &StepReport::default());

        assert_eq!(info.frames, 2);
        assert_eq!(info.collisions_last_frame, 0);
        assert!((info.frame_time_ms() - 17.0).abs() < 1e-9);
    }
}
