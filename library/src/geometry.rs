use crate::config::EngineConfig;

pub const DEFAULT_ROW_HEIGHT: f32 = 40.0;
pub const DEFAULT_TRACK_SPACING: f32 = 2.0;

/// Time↔pixel mapping for the clip area, bundled with the row layout so the
/// controller and a waveform renderer agree on the same coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineGeometry {
    pixels_per_second: f32,
    min_scale: f32,
    max_scale: f32,
    zoom_step: f32,
    pub row_height: f32,
    pub track_spacing: f32,
    pub min_content_width: f32,
}

impl TimelineGeometry {
    pub fn new(config: &EngineConfig) -> Self {
        let mut geo = Self {
            pixels_per_second: config.default_scale,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            zoom_step: config.zoom_step,
            row_height: DEFAULT_ROW_HEIGHT,
            track_spacing: DEFAULT_TRACK_SPACING,
            min_content_width: config.min_content_width,
        };
        geo.set_scale(config.default_scale);
        geo
    }

    pub fn scale(&self) -> f32 {
        self.pixels_per_second
    }

    /// Sets pixels per second, clamped to the configured zoom range.
    pub fn set_scale(&mut self, pixels_per_second: f32) {
        let scale = if pixels_per_second.is_finite() {
            pixels_per_second
        } else {
            self.min_scale
        };
        self.pixels_per_second = scale.clamp(self.min_scale, self.max_scale);
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.pixels_per_second * self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.pixels_per_second / self.zoom_step);
    }

    pub fn time_to_pixel(&self, time: f64) -> f32 {
        (time * self.pixels_per_second as f64) as f32
    }

    pub fn pixel_to_time(&self, pixel: f32) -> f64 {
        (pixel as f64 / self.pixels_per_second as f64).max(0.0)
    }

    /// Converts a horizontal pointer delta to seconds. Unlike `pixel_to_time`
    /// this is signed.
    pub fn delta_to_time(&self, delta_px: f32) -> f64 {
        delta_px as f64 / self.pixels_per_second as f64
    }

    pub fn content_width(&self, duration: f64) -> f32 {
        self.time_to_pixel(duration).max(self.min_content_width)
    }

    /// Time range visible in a viewport starting at `scroll_x` pixels.
    pub fn visible_range(&self, scroll_x: f32, viewport_width: f32) -> (f64, f64) {
        let start = self.pixel_to_time(scroll_x);
        let end = self.pixel_to_time(scroll_x + viewport_width.max(0.0));
        (start, end)
    }

    pub fn row_at(&self, y: f32) -> Option<usize> {
        if y < 0.0 {
            return None;
        }
        let row = (y / (self.row_height + self.track_spacing)).floor() as usize;
        // The spacing strip below a row belongs to no track.
        let within = y - self.row_top(row);
        (within <= self.row_height).then_some(row)
    }

    pub fn row_top(&self, row: usize) -> f32 {
        row as f32 * (self.row_height + self.track_spacing)
    }
}
