/// Horizontal slide offset of the photo strip, in percent of one slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Carousel {
    translate_pct: i64,
}

impl Carousel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate_pct(&self) -> i64 {
        self.translate_pct
    }

    /// Index of the slide in view.
    pub fn position(&self) -> usize {
        usize::try_from(-self.translate_pct / 100).unwrap_or(0)
    }

    pub fn next(&mut self, slides: usize) {
        let last = i64::try_from(slides.saturating_sub(1)).unwrap_or(i64::MAX / 100);
        let max_translate = -last * 100;
        self.translate_pct = (self.translate_pct - 100).max(max_translate);
    }

    pub fn prev(&mut self) {
        self.translate_pct = (self.translate_pct + 100).min(0);
    }

    pub fn reset(&mut self) {
        self.translate_pct = 0;
    }
}
