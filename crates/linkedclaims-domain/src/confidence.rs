//! Confidence module - extraction certainty in [0, 1]

/// Extraction confidence
///
/// Reflects how certain the model is that the text states the claim, not
/// whether the claim is true.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    /// Create a confidence value
    ///
    /// # Errors
    /// Returns error if the value is NaN or outside [0, 1]
    pub fn new(value: f64) -> Result<Self, String> {
        if value.is_nan() {
            return Err("Confidence cannot be NaN".to_string());
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("Confidence {} is outside [0.0, 1.0]", value));
        }
        Ok(Self(value))
    }

    /// Get the raw value
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether this confidence meets a floor
    pub fn meets(&self, floor: f64) -> bool {
        self.0 >= floor
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}
