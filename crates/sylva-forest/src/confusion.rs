//! Confusion matrix and per-class classification metrics over string labels.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::ForestError;

/// A confusion matrix for multi-class classification.
///
/// Classes are the union of actual and predicted labels in ascending order.
/// Entry `[i][j]` counts records whose actual class is `classes[i]` and
/// whose predicted class is `classes[j]`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ConfusionMatrix {
    classes: Vec<String>,
    matrix: Vec<Vec<usize>>,
}

/// Per-class precision, recall, and F1 score.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClassMetrics {
    /// The class label.
    pub class: String,
    /// TP / (TP + FP); 0.0 if the class was never predicted.
    pub precision: f64,
    /// TP / (TP + FN); 0.0 if the class never occurs.
    pub recall: f64,
    /// Harmonic mean of precision and recall; 0.0 if both are zero.
    pub f1: f64,
    /// Number of records whose actual class is this one.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from paired actual and predicted labels.
    ///
    /// Pairs beyond the shorter slice are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::EmptyDataset`] if no labels are provided.
    pub fn from_labels<A, P>(actual: &[A], predicted: &[P]) -> Result<Self, ForestError>
    where
        A: AsRef<str>,
        P: AsRef<str>,
    {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Err(ForestError::EmptyDataset);
        }
        let classes: Vec<String> = actual[..n]
            .iter()
            .map(AsRef::<str>::as_ref)
            .chain(predicted[..n].iter().map(AsRef::<str>::as_ref))
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let position = |label: &str| classes.binary_search_by(|c| c.as_str().cmp(label));
        let mut matrix = vec![vec![0usize; classes.len()]; classes.len()];
        for (a, p) in actual.iter().zip(predicted) {
            if let (Ok(i), Ok(j)) = (position(a.as_ref()), position(p.as_ref())) {
                matrix[i][j] += 1;
            }
        }
        Ok(Self { classes, matrix })
    }

    /// Proportion of records on the diagonal.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.classes.len()).map(|i| self.matrix[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Per-class precision, recall, F1, and support, in class order.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        self.classes
            .iter()
            .enumerate()
            .map(|(c, class)| {
                let tp = self.matrix[c][c];
                let predicted: usize = self.matrix.iter().map(|row| row[c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: class.clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Count of records with actual class `actual` predicted as `predicted`.
    #[must_use]
    pub fn count(&self, actual: &str, predicted: &str) -> usize {
        let i = self.classes.iter().position(|c| c == actual);
        let j = self.classes.iter().position(|c| c == predicted);
        match (i, j) {
            (Some(i), Some(j)) => self.matrix[i][j],
            _ => 0,
        }
    }

    /// Return the class labels in row/column order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of records counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(6);
        write!(f, "{:>width$}", "")?;
        for class in &self.classes {
            write!(f, " {class:>width$}")?;
        }
        writeln!(f)?;
        for (class, row) in self.classes.iter().zip(&self.matrix) {
            write!(f, "{class:>width$}")?;
            for val in row {
                write!(f, " {val:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let labels = ["a", "a", "b", "c"];
        let cm = ConfusionMatrix::from_labels(&labels, &labels).unwrap();
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        assert_eq!(cm.classes(), ["a", "b", "c"]);
        for m in cm.class_metrics() {
            assert!((m.f1 - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn counts_and_metrics() {
        let actual = ["yes", "yes", "yes", "no", "no"];
        let predicted = ["yes", "yes", "no", "no", "yes"];
        let cm = ConfusionMatrix::from_labels(&actual, &predicted).unwrap();
        assert_eq!(cm.count("yes", "no"), 1);
        assert_eq!(cm.count("no", "yes"), 1);
        assert_eq!(cm.count("yes", "yes"), 2);
        assert_eq!(cm.total(), 5);
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);

        let metrics = cm.class_metrics();
        // classes: ["no", "yes"]
        let yes = &metrics[1];
        assert_eq!(yes.class, "yes");
        assert_eq!(yes.support, 3);
        assert!((yes.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((yes.recall - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn predicted_only_class_gets_zero_support() {
        let cm = ConfusionMatrix::from_labels(&["a", "a"], &["a", "z"]).unwrap();
        let z = &cm.class_metrics()[1];
        assert_eq!(z.class, "z");
        assert_eq!(z.support, 0);
        assert!(z.recall.abs() < f64::EPSILON);
        assert!(z.precision.abs() < f64::EPSILON);
    }

    #[test]
    fn empty_is_an_error() {
        let none: [&str; 0] = [];
        assert!(matches!(
            ConfusionMatrix::from_labels(&none, &none),
            Err(ForestError::EmptyDataset)
        ));
    }

    #[test]
    fn display_lists_classes() {
        let cm = ConfusionMatrix::from_labels(&["cat", "dog"], &["cat", "cat"]).unwrap();
        let text = cm.to_string();
        assert!(text.contains("cat"));
        assert!(text.contains("dog"));
        assert_eq!(text.lines().count(), 3);
    }
}
