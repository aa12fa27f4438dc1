use serde::Serialize;

/// One ranked class of a classification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub class_id: usize,
    pub confidence: f64,
    pub class_name: Option<String>,
}

/// The `k` most probable classes, most confident first.
///
/// Ties keep output order. `labels` names classes by index when given.
pub fn rank_predictions(probs: &[f64], k: usize, labels: Option<&[String]>) -> Vec<Prediction> {
    let mut indexed: Vec<(usize, f64)> = probs.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    indexed
        .into_iter()
        .take(k)
        .map(|(class_id, confidence)| Prediction {
            class_id,
            confidence,
            class_name: labels.and_then(|l| l.get(class_id)).cloned(),
        })
        .collect()
}
