//! Legend bundle - label extraction and stable color assignment
//!
//! A `LegendBundle` derives the sorted set of unique labels from a data
//! array via a caller-supplied extraction function and assigns each label
//! exactly one color. All colors are computed once at construction;
//! lookups only read the cached map.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// How colors are assigned to the sorted label set, in priority order.
pub enum ColorScheme<L> {
    /// Call once per label in sorted order: `(label, index) -> color`.
    Generator(Box<dyn Fn(&L, usize) -> String>),
    /// Direct label-to-color association. Labels absent from the map fall
    /// back to a hash-derived HSL color (with a warning).
    Assignments(HashMap<L, String>),
    /// Ordered palette, assigned by `index % palette.len()`.
    Palette(Vec<String>),
}

/// Options for [`LegendBundle::with_options`].
pub struct LegendOptions<L> {
    /// Comparator for label ordering; default ordering when absent.
    pub sort_label: Option<Box<dyn Fn(&L, &L) -> Ordering>>,
    /// Color assignment; the default evenly-spaced HSL ramp when absent.
    pub colors: Option<ColorScheme<L>>,
}

impl<L> Default for LegendOptions<L> {
    fn default() -> Self {
        Self {
            sort_label: None,
            colors: None,
        }
    }
}

pub struct LegendBundle<T, L> {
    name: String,
    labels: Vec<L>,
    colors: HashMap<L, String>,
    extract: Box<dyn Fn(&T) -> L>,
}

impl<T, L> LegendBundle<T, L>
where
    L: Ord + Hash + Clone + Display,
{
    pub fn new(name: impl Into<String>, data: &[T], extract: impl Fn(&T) -> L + 'static) -> Self {
        Self::with_options(name, data, extract, LegendOptions::default())
    }

    pub fn with_options(
        name: impl Into<String>,
        data: &[T],
        extract: impl Fn(&T) -> L + 'static,
        options: LegendOptions<L>,
    ) -> Self {
        let extract: Box<dyn Fn(&T) -> L> = Box::new(extract);

        let mut labels: Vec<L> = Vec::new();
        for datum in data {
            let label = extract(datum);
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        match options.sort_label {
            Some(cmp) => labels.sort_by(|a, b| cmp(a, b)),
            None => labels.sort(),
        }

        let colors = build_color_map(&labels, options.colors);

        Self {
            name: name.into(),
            labels,
            colors,
            extract,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sorted unique labels, in assignment order.
    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    /// Cached color for a label from the source data.
    pub fn label_color(&self, label: &L) -> Option<&str> {
        self.colors.get(label).map(String::as_str)
    }

    /// Label for a datum via the extraction function.
    pub fn label(&self, datum: &T) -> L {
        (self.extract)(datum)
    }

    /// Cached color for a datum; re-derives the label, never the color.
    pub fn data_color(&self, datum: &T) -> Option<&str> {
        self.colors.get(&self.label(datum)).map(String::as_str)
    }

    pub fn data_colors(&self, data: &[T]) -> Vec<Option<&str>> {
        data.iter().map(|d| self.data_color(d)).collect()
    }

    /// Sorted `(label, color)` pairs for rendering a legend panel.
    pub fn label_colors(&self) -> Vec<(&L, &str)> {
        self.labels
            .iter()
            .filter_map(|l| self.colors.get(l).map(|c| (l, c.as_str())))
            .collect()
    }
}

fn build_color_map<L>(labels: &[L], scheme: Option<ColorScheme<L>>) -> HashMap<L, String>
where
    L: Eq + Hash + Clone + Display,
{
    let mut map = HashMap::with_capacity(labels.len());

    match scheme {
        Some(ColorScheme::Generator(generate)) => {
            for (index, label) in labels.iter().enumerate() {
                map.insert(label.clone(), generate(label, index));
            }
        }
        Some(ColorScheme::Assignments(assignments)) => {
            for label in labels {
                match assignments.get(label) {
                    Some(color) => {
                        map.insert(label.clone(), color.clone());
                    }
                    None => {
                        tracing::warn!(label = %label, "no color assigned for label, using hash fallback");
                        map.insert(label.clone(), hash_hsl_color(&label.to_string()));
                    }
                }
            }
        }
        Some(ColorScheme::Palette(palette)) if !palette.is_empty() => {
            for (index, label) in labels.iter().enumerate() {
                map.insert(label.clone(), palette[index % palette.len()].clone());
            }
        }
        // Empty palette falls through to the default ramp.
        Some(ColorScheme::Palette(_)) | None => {
            let total = labels.len();
            for (index, label) in labels.iter().enumerate() {
                // Half-degree hues round away from zero; `{:.0}` alone
                // would round them half-to-even.
                let hue = (320.0 * index as f64 / total as f64).round();
                map.insert(label.clone(), format!("hsl({hue:.0}, 80%, 50%)"));
            }
        }
    }

    map
}

/// Deterministic fallback color derived solely from the label text.
///
/// 32-bit rolling hash over the label's characters; hue is the absolute
/// remainder mod 360 at fixed saturation/lightness.
fn hash_hsl_color(label: &str) -> String {
    let mut hash: i32 = 0;
    for c in label.chars() {
        hash = (c as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    let hue = (hash % 360).abs();
    format!("hsl({hue}, 50%, 60%)")
}
