use std::ops::AddAssign;

/// Receives every text and image unit the converter emits.
pub trait ImportStats {
    fn add_text(&mut self, text: &str);
    fn add_image(&mut self, src: &str);
}

/// Counts processed units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStat {
    pub texts: usize,
    pub text_chars: usize,
    pub images: usize,
}

impl ImportStats for ImportStat {
    fn add_text(&mut self, text: &str) {
        self.texts += 1;
        self.text_chars += text.chars().count();
    }

    fn add_image(&mut self, _src: &str) {
        self.images += 1;
    }
}

impl AddAssign for ImportStat {
    fn add_assign(&mut self, other: Self) {
        self.texts += other.texts;
        self.text_chars += other.text_chars;
        self.images += other.images;
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStats;

impl ImportStats for NoStats {
    fn add_text(&mut self, _text: &str) {}
    fn add_image(&mut self, _src: &str) {}
}
