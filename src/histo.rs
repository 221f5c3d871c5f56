//! Named one-dimensional histograms, which are the final product of the
//! analysis, and the interface through which the event loop fills them

use crate::numeric::Float;

use serde::Serialize;

use std::collections::BTreeMap;

/// Destination of the weighted observations made by the event loop
pub trait HistogramSink {
    /// Add `weight` to the bin of histogram `name` which contains `value`
    fn fill(&mut self, name: &str, value: Float, weight: Float);

    /// Add `weight` to the bin of histogram `name` which contains `value`, and
    /// to every bin below it
    ///
    /// Filling the value of an object's pt this way produces a curve whose
    /// bin `i` counts the objects with pt at least as high as bin `i`.
    ///
    fn fill_cumulative(&mut self, name: &str, value: Float, weight: Float);
}

/// Fixed-width one-dimensional histogram
///
/// Bin 0 is the underflow bin, bin `n_bins + 1` is the overflow bin.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram1D {
    name: String,
    title: String,
    n_bins: usize,
    x_min: Float,
    x_max: Float,

    /// Sum of weights in each bin, including under- and overflow
    contents: Vec<Float>,

    /// Sum of squared weights in each bin, including under- and overflow
    sumw2: Vec<Float>,

    /// Number of fill operations
    entries: u64,
}
//
impl Histogram1D {
    /// Book an empty histogram
    pub fn new(name: &str, title: &str, n_bins: usize, x_min: Float, x_max: Float) -> Self {
        assert!(n_bins > 0, "A histogram needs at least one bin");
        assert!(x_max > x_min, "Histogram range must not be empty");
        Self {
            name: name.to_owned(),
            title: title.to_owned(),
            n_bins,
            x_min,
            x_max,
            contents: vec![0.; n_bins + 2],
            sumw2: vec![0.; n_bins + 2],
            entries: 0,
        }
    }

    /// Name of the histogram
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of regular bins
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Index of the bin containing `value`
    ///
    /// NaN lands in the underflow bin, so that it never counts as passing a
    /// threshold on a cumulative curve.
    ///
    pub fn find_bin(&self, value: Float) -> usize {
        if value < self.x_min || value.is_nan() {
            0
        } else if value >= self.x_max {
            self.n_bins + 1
        } else {
            let width = (self.x_max - self.x_min) / (self.n_bins as Float);
            let bin = ((value - self.x_min) / width).floor() as usize + 1;
            bin.min(self.n_bins)
        }
    }

    /// Sum of weights in bin `bin`
    pub fn bin_content(&self, bin: usize) -> Float {
        self.contents[bin]
    }

    /// Number of fill operations
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Sum of weights in the regular bins
    pub fn integral(&self) -> Float {
        self.contents[1..=self.n_bins].iter().sum()
    }

    /// Weighted increment of the bin containing `value`
    pub fn fill(&mut self, value: Float, weight: Float) {
        let bin = self.find_bin(value);
        self.contents[bin] += weight;
        self.sumw2[bin] += weight * weight;
        self.entries += 1;
    }

    /// Weighted increment of the bin containing `value` and of every bin
    /// below it, underflow included
    pub fn fill_cumulative(&mut self, value: Float, weight: Float) {
        let bin = self.find_bin(value);
        for (content, sumw2) in self.contents[..=bin]
            .iter_mut()
            .zip(self.sumw2[..=bin].iter_mut())
        {
            *content += weight;
            *sumw2 += weight * weight;
        }
        self.entries += 1;
    }

    /// Add the contents of another histogram with the same binning
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(
            (self.n_bins, self.x_min, self.x_max),
            (other.n_bins, other.x_min, other.x_max),
            "Cannot merge histograms with different binning"
        );
        for (c1, c2) in self.contents.iter_mut().zip(&other.contents) {
            *c1 += c2;
        }
        for (s1, s2) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *s1 += s2;
        }
        self.entries += other.entries;
    }
}

/// Set of booked histograms, keyed by name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistogramBook(BTreeMap<String, Histogram1D>);
//
impl HistogramBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a histogram to the book, replacing any previous one of that name
    pub fn book(&mut self, histogram: Histogram1D) {
        self.0.insert(histogram.name.clone(), histogram);
    }

    /// Look up a histogram by name
    pub fn get(&self, name: &str) -> Option<&Histogram1D> {
        self.0.get(name)
    }

    /// Iterate over the histograms, by name order
    pub fn iter(&self) -> impl Iterator<Item = &Histogram1D> {
        self.0.values()
    }

    /// Add the contents of another book with the same bookings
    pub fn merge(&mut self, other: &Self) {
        for histogram in other.iter() {
            self.histogram_mut(&histogram.name).merge(histogram);
        }
    }

    /// Access a booked histogram, which must exist
    fn histogram_mut(&mut self, name: &str) -> &mut Histogram1D {
        self.0
            .get_mut(name)
            .unwrap_or_else(|| panic!("Histogram {} was not booked", name))
    }
}
//
impl HistogramSink for HistogramBook {
    fn fill(&mut self, name: &str, value: Float, weight: Float) {
        self.histogram_mut(name).fill(value, weight)
    }

    fn fill_cumulative(&mut self, name: &str, value: Float, weight: Float) {
        self.histogram_mut(name).fill_cumulative(value, weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pt_histogram() -> Histogram1D {
        Histogram1D::new("lead_pt", "Leading pt", 10, 0., 100.)
    }

    #[test]
    fn values_land_in_the_expected_bins() {
        let h = pt_histogram();
        assert_eq!(h.find_bin(-1.), 0);
        assert_eq!(h.find_bin(0.), 1);
        assert_eq!(h.find_bin(9.99), 1);
        assert_eq!(h.find_bin(10.), 2);
        assert_eq!(h.find_bin(99.9), 10);
        assert_eq!(h.find_bin(100.), 11);
        assert_eq!(h.find_bin(Float::NAN), 0);
    }

    #[test]
    fn fill_touches_a_single_bin() {
        let mut h = pt_histogram();
        h.fill(42., 2.);
        h.fill(42., 0.5);
        assert_relative_eq!(h.bin_content(5), 2.5);
        assert_relative_eq!(h.integral(), 2.5);
        assert_eq!(h.entries(), 2);
    }

    #[test]
    fn cumulative_fill_touches_bins_at_and_below() {
        let mut h = pt_histogram();
        h.fill_cumulative(42., 1.5);
        let bin = h.find_bin(42.);
        for b in 0..=bin {
            assert_relative_eq!(h.bin_content(b), 1.5);
        }
        for b in bin + 1..=h.n_bins() + 1 {
            assert_relative_eq!(h.bin_content(b), 0.);
        }
        assert_eq!(h.entries(), 1);

        // Successive fills build a curve which never increases with the bin
        h.fill_cumulative(75., 1.);
        h.fill_cumulative(5., 1.);
        let curve = (1..=h.n_bins()).map(|b| h.bin_content(b)).collect::<Vec<_>>();
        assert!(curve.windows(2).all(|w| w[0] >= w[1]));
        assert_relative_eq!(curve[0], 3.5);
        assert_relative_eq!(curve[7], 1.);
        assert_relative_eq!(curve[8], 0.);
    }

    #[test]
    fn overflow_cumulative_fill_covers_every_bin() {
        let mut h = pt_histogram();
        h.fill_cumulative(250., 1.);
        assert!((0..=h.n_bins() + 1).all(|b| h.bin_content(b) == 1.));
    }

    #[test]
    fn nan_only_fills_the_underflow_bin() {
        let mut h = pt_histogram();
        h.fill_cumulative(Float::NAN, 1.);
        h.fill(Float::NAN, 2.);
        assert_relative_eq!(h.bin_content(0), 3.);
        assert!((1..=h.n_bins() + 1).all(|b| h.bin_content(b) == 0.));
        assert_relative_eq!(h.integral(), 0.);
        assert_eq!(h.entries(), 2);
    }

    #[test]
    fn books_merge_bin_by_bin() {
        let mut b1 = HistogramBook::new();
        b1.book(pt_histogram());
        let mut b2 = b1.clone();
        b1.fill("lead_pt", 15., 1.);
        b2.fill("lead_pt", 15., 2.);
        b2.fill_cumulative("lead_pt", 25., 1.);
        b1.merge(&b2);

        let h = b1.get("lead_pt").unwrap();
        assert_relative_eq!(h.bin_content(2), 4.);
        assert_relative_eq!(h.bin_content(3), 1.);
        assert_eq!(h.entries(), 3);
    }

    #[test]
    #[should_panic(expected = "not booked")]
    fn unbooked_names_are_rejected() {
        HistogramBook::new().fill("nevents", 1., 1.);
    }
}
