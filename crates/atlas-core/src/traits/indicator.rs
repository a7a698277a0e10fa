//! Indicator trait definitions.

/// Streaming indicator that maintains internal state.
///
/// Indicators are fed closed bars (or values derived from them) one at a
/// time and never see the bar that is still forming.
pub trait StreamingIndicator: Send + Sync {
    /// The input consumed per update (a price or a whole bar).
    type Input;
    /// The output type of the indicator.
    type Output;

    /// Update the indicator with a new closed value.
    ///
    /// # Returns
    /// The current indicator value, or None while there is insufficient data
    fn update(&mut self, input: &Self::Input) -> Option<Self::Output>;

    /// Get the current value without adding new data.
    fn current(&self) -> Option<Self::Output>;

    /// Reset the indicator state.
    fn reset(&mut self);

    /// Check if the indicator has enough data to produce values.
    fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    /// Number of inputs required before the first value.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}
