//! Regression test parameters and operations

use imgutil_core::{Palette, PixelBuffer};

/// Regression test parameters
///
/// This structure tracks the state of a regression test, including
/// the test name, current index, and success status.
pub struct RegParams {
    /// Name of the test (e.g., "convert")
    pub test_name: String,
    /// Current test index (incremented before each test)
    index: usize,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// # Arguments
    ///
    /// * `test_name` - Name of the test (e.g., "convert")
    pub fn new(test_name: &str) -> Self {
        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");

        Self {
            test_name: test_name.to_string(),
            index: 0,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    fn fail(&mut self, msg: String) -> bool {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
        false
    }

    /// Compare two floating-point values
    ///
    /// # Arguments
    ///
    /// * `expected` - Expected value
    /// * `actual` - Actual computed value
    /// * `delta` - Maximum allowed difference
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        if diff > delta {
            let msg = format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            );
            self.fail(msg)
        } else {
            true
        }
    }

    /// Compare two byte arrays for exact equality
    pub fn compare_bytes(&mut self, expected: &[u8], actual: &[u8]) -> bool {
        self.index += 1;

        if expected != actual {
            let first = expected
                .iter()
                .zip(actual)
                .position(|(a, b)| a != b)
                .unwrap_or(expected.len().min(actual.len()));
            let msg = format!(
                "Failure in {}_reg: byte comparison for index {}\n\
                 sizes: {} vs {}, first difference at {}",
                self.test_name,
                self.index,
                expected.len(),
                actual.len(),
                first
            );
            self.fail(msg)
        } else {
            true
        }
    }

    /// Compare two buffers pixel by pixel, ignoring stride padding
    ///
    /// Format and dimensions must match exactly.
    pub fn compare_buffers(&mut self, expected: &PixelBuffer, actual: &PixelBuffer) -> bool {
        self.index += 1;

        if expected.width() != actual.width()
            || expected.height() != actual.height()
            || expected.format() != actual.format()
        {
            let msg = format!(
                "Failure in {}_reg: buffer comparison for index {} - layout mismatch: \
                 {}x{} {:?} vs {}x{} {:?}",
                self.test_name,
                self.index,
                expected.width(),
                expected.height(),
                expected.format(),
                actual.width(),
                actual.height(),
                actual.format()
            );
            return self.fail(msg);
        }

        if !expected.same_pixels(actual) {
            let row = (0..expected.height())
                .find(|&y| {
                    let n = expected.format().min_stride(expected.width());
                    expected.row(y)[..n] != actual.row(y)[..n]
                })
                .unwrap_or(0);
            let msg = format!(
                "Failure in {}_reg: buffer comparison for index {} - pixel mismatch in row {}",
                self.test_name, self.index, row
            );
            return self.fail(msg);
        }

        true
    }

    /// Compare two palettes entry by entry
    pub fn compare_palettes(&mut self, expected: &Palette, actual: &Palette) -> bool {
        self.index += 1;

        if expected.colors() != actual.colors() {
            let msg = format!(
                "Failure in {}_reg: palette comparison for index {}\n\
                 expected = {:?}\n\
                 actual = {:?}",
                self.test_name,
                self.index,
                expected.colors(),
                actual.colors()
            );
            self.fail(msg)
        } else {
            true
        }
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all tests passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all tests have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgutil_core::PixelFormat;

    #[test]
    fn test_compare_values() {
        let mut rp = RegParams::new("test");
        assert!(rp.compare_values(1.0, 1.0, 0.0));
        assert!(rp.compare_values(1.0, 1.05, 0.1));
        assert!(!rp.compare_values(1.0, 2.0, 0.5));
        assert_eq!(rp.index(), 3);
        assert!(!rp.is_success());
        assert_eq!(rp.failures().len(), 1);
    }

    #[test]
    fn test_compare_buffers_ignores_padding() {
        let mut rp = RegParams::new("test");
        let a = PixelBuffer::from_raw(2, 1, PixelFormat::Gray8, 4, vec![1, 2, 9, 9]).unwrap();
        let b = PixelBuffer::from_raw(2, 1, PixelFormat::Gray8, 2, vec![1, 2]).unwrap();
        assert!(rp.compare_buffers(&a, &b));
        let c = PixelBuffer::from_raw(2, 1, PixelFormat::Gray8, 2, vec![1, 3]).unwrap();
        assert!(!rp.compare_buffers(&a, &c));
        assert!(!rp.cleanup());
    }

    #[test]
    fn test_compare_bytes() {
        let mut rp = RegParams::new("test");
        assert!(rp.compare_bytes(b"abc", b"abc"));
        assert!(!rp.compare_bytes(b"abc", b"abd"));
    }
}
