use std::collections::HashSet;

use ndarray::ArrayView1;
use shared::{Category, Classifications};

use super::classifier_options::ClassifierOptions;
use crate::engine::model::HeadSpec;
use crate::task::engine::EngineError;

/// Turns the raw scores of one output head into filtered, ranked categories.
pub fn classify_head(
    scores: ArrayView1<'_, f32>,
    head_index: usize,
    head: &HeadSpec,
    options: &ClassifierOptions,
) -> Result<Classifications, EngineError> {
    if !head.labels.is_empty() && head.labels.len() != scores.len() {
        return Err(EngineError::Model(format!(
            "head {} produced {} scores but has {} labels",
            head_index,
            scores.len(),
            head.labels.len()
        )));
    }
    let filters_by_name =
        !options.category_allowlist.is_empty() || !options.category_denylist.is_empty();
    if filters_by_name && head.labels.is_empty() {
        return Err(EngineError::Model(format!(
            "category allowlist/denylist requires labels, head {} has none",
            head_index
        )));
    }

    let allowlist: HashSet<&str> = options
        .category_allowlist
        .iter()
        .map(String::as_str)
        .collect();
    let denylist: HashSet<&str> = options
        .category_denylist
        .iter()
        .map(String::as_str)
        .collect();
    let display_names = head.display_names.get(options.locale());

    let mut categories: Vec<Category> = scores
        .iter()
        .enumerate()
        .filter_map(|(index, &score)| {
            let name = head.labels.get(index).map(String::as_str).unwrap_or("");
            if !allowlist.is_empty() && !allowlist.contains(name) {
                return None;
            }
            if denylist.contains(name) {
                return None;
            }
            if let Some(threshold) = options.score_threshold {
                if score < threshold {
                    return None;
                }
            }
            let display_name = display_names
                .and_then(|names| names.get(index))
                .map(String::as_str)
                .unwrap_or("");
            Some(Category::new(score, index as i32, name, display_name))
        })
        .collect();

    categories.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
    if let Some(max_results) = options.max_results {
        categories.truncate(max_results);
    }

    Ok(Classifications {
        head_index,
        head_name: head.name.clone(),
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::HashMap;

    fn burger_head() -> HeadSpec {
        HeadSpec {
            name: Some("probability".to_string()),
            labels: ["cheeseburger", "bagel", "guacamole", "meat loaf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            display_names: HashMap::new(),
        }
    }

    #[test]
    fn ranks_by_score_and_truncates() {
        let scores = array![0.027329788f32, 0.7952058, 0.006279315, 0.019334773];
        let head = HeadSpec {
            labels: vec![
                "bagel".to_string(),
                "cheeseburger".to_string(),
                "meat loaf".to_string(),
                "guacamole".to_string(),
            ],
            ..burger_head()
        };
        let options = ClassifierOptions::default().with_max_results(3);
        let result = classify_head(scores.view(), 0, &head, &options).unwrap();

        let names: Vec<&str> = result
            .categories
            .iter()
            .map(|c| c.category_name.as_str())
            .collect();
        assert_eq!(names, vec!["cheeseburger", "bagel", "guacamole"]);
        assert_eq!(result.categories[0].index, 1);
        assert_eq!(result.head_name.as_deref(), Some("probability"));
    }

    #[test]
    fn applies_score_threshold() {
        let scores = array![0.7952058f32, 0.027329788, 0.019334773, 0.006279315];
        let options = ClassifierOptions::default().with_score_threshold(0.02);
        let result = classify_head(scores.view(), 0, &burger_head(), &options).unwrap();
        assert_eq!(result.categories.len(), 2);
        assert_eq!(result.categories[1].category_name, "bagel");
    }

    #[test]
    fn allowlist_and_denylist_filter_by_name() {
        let scores = array![0.7952058f32, 0.027329788, 0.019334773, 0.006279315];

        let allow = ClassifierOptions::default().with_allowlist(["guacamole", "meat loaf"]);
        let result = classify_head(scores.view(), 0, &burger_head(), &allow).unwrap();
        assert_eq!(result.categories.len(), 2);
        assert_eq!(result.categories[0].category_name, "guacamole");

        let deny = ClassifierOptions::default().with_denylist(["bagel"]);
        let result = classify_head(scores.view(), 0, &burger_head(), &deny).unwrap();
        assert!(result.categories.iter().all(|c| c.category_name != "bagel"));
        assert_eq!(result.categories.len(), 3);
    }

    #[test]
    fn uses_display_names_for_locale() {
        let mut head = burger_head();
        head.display_names.insert(
            "fr".to_string(),
            vec![
                "cheeseburger".to_string(),
                "bagel".to_string(),
                "guacamole".to_string(),
                "pain de viande".to_string(),
            ],
        );
        let scores = array![0.1f32, 0.2, 0.3, 0.4];
        let options = ClassifierOptions::default()
            .with_display_names_locale("fr")
            .with_max_results(1);
        let result = classify_head(scores.view(), 0, &head, &options).unwrap();
        assert_eq!(result.categories[0].display_name, "pain de viande");

        let english = classify_head(scores.view(), 0, &head, &ClassifierOptions::default()).unwrap();
        assert_eq!(english.categories[0].display_name, "");
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let scores = array![0.5f32, 0.5];
        let err = classify_head(scores.view(), 0, &burger_head(), &ClassifierOptions::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::Model(_)));
    }

    #[test]
    fn nan_scores_sort_without_panicking() {
        let scores = array![0.2f32, f32::NAN, 0.9, 0.2];
        let result =
            classify_head(scores.view(), 0, &burger_head(), &ClassifierOptions::default()).unwrap();
        let indices: Vec<i32> = result.categories.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 0, 3]);
    }
}
