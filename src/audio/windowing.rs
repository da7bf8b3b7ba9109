// Windowing - fixed-length slicing of a mono signal
//
// Windows are contiguous, non-overlapping and chronological. A trailing
// remainder shorter than one window is dropped, never zero-padded, so every
// window handed to the feature pipeline has exactly `window_len` samples.

/// Lazy iterator over complete fixed-length windows.
///
/// A clone continues from the same position. Call [`Windows::restart`] to
/// iterate from the first window again.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    samples: &'a [f32],
    window_len: usize,
    position: usize,
}

impl<'a> Windows<'a> {
    pub fn new(samples: &'a [f32], window_len: usize) -> Self {
        Self {
            samples,
            window_len,
            position: 0,
        }
    }

    /// Total number of complete windows, `floor(len / window_len)`
    pub fn count_complete(&self) -> usize {
        if self.window_len == 0 {
            0
        } else {
            self.samples.len() / self.window_len
        }
    }

    /// Rewind to the first window
    pub fn restart(&mut self) {
        self.position = 0;
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = &'a [f32];

    fn next(&mut self) -> Option<Self::Item> {
        if self.window_len == 0 {
            return None;
        }
        let end = self.position.checked_add(self.window_len)?;
        if end > self.samples.len() {
            return None;
        }
        let window = &self.samples[self.position..end];
        self.position = end;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.window_len == 0 {
            0
        } else {
            self.samples.len().saturating_sub(self.position) / self.window_len
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}
