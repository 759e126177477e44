//! VISItem data model: one infographic generation/evaluation task.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::fs::atomic_write;
use crate::naming;

#[derive(Debug, thiserror::Error)]
pub enum VisItemError {
    #[error("item file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid item JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid item in {}: missing required field 'id'", path.display())]
    MissingId { path: PathBuf },

    #[error("invalid question bank {} line {line}: {source}", path.display())]
    QuestionParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VisItemError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Malformed content, as opposed to I/O trouble.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::MissingId { .. } | Self::QuestionParse { .. }
        )
    }
}

/// One evaluating model's verdict on one question for one generated image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    #[serde(default)]
    pub eval_model: String,
    #[serde(default)]
    pub gen_model: String,
    #[serde(default)]
    pub analysis: String,
    /// `"1"` satisfied, `"0"` not satisfied.
    #[serde(default)]
    pub answer: String,
}

impl Judgment {
    pub fn passed(&self) -> bool {
        self.answer.trim() == "1"
    }

    fn matches(&self, gen_model: &str, eval_model: &str) -> bool {
        self.gen_model == gen_model && self.eval_model == eval_model
    }
}

/// A benchmark question with the judgments collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalEntry {
    /// `"prompt"`, `"seed"` or empty.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub ground: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub question_type: String,
    #[serde(default)]
    pub judgments: Vec<Judgment>,
}

impl EvalEntry {
    pub fn has_judgment(&self, gen_model: &str, eval_model: &str) -> bool {
        self.judgment_for(gen_model, eval_model).is_some()
    }

    pub fn judgment_for(&self, gen_model: &str, eval_model: &str) -> Option<&Judgment> {
        self.judgments
            .iter()
            .find(|j| j.matches(gen_model, eval_model))
    }

    pub fn add_judgment(&mut self, judgment: Judgment) {
        self.judgments.push(judgment);
    }
}

/// Pass counts for one (generating model, evaluating model) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationScore {
    pub total: usize,
    pub judged: usize,
    pub passed: usize,
}

impl EvaluationScore {
    /// Fraction of judged questions that passed; `None` before anything is judged.
    pub fn pass_rate(&self) -> Option<f64> {
        (self.judged > 0).then(|| self.passed as f64 / self.judged as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub reference_image_url: Option<String>,
    #[serde(default)]
    pub t2i_prompt: Option<String>,
    #[serde(default)]
    pub chart_type: Option<String>,
    /// Generating model -> image path.
    #[serde(default)]
    pub generation: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub evaluation: Vec<EvalEntry>,
}

impl VisItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Read and parse an item file.
    pub fn from_path(path: &Path) -> Result<Self, VisItemError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VisItemError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                VisItemError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::from_json_str(&text, path)
    }

    fn from_json_str(text: &str, path: &Path) -> Result<Self, VisItemError> {
        let parse_err = |source| VisItemError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let value: Value = serde_json::from_str(text).map_err(parse_err)?;

        let has_id = match value.get("id") {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Number(_)) => true,
            _ => false,
        };
        if !has_id {
            return Err(VisItemError::MissingId {
                path: path.to_path_buf(),
            });
        }

        serde_json::from_value(value).map_err(parse_err)
    }

    pub fn update_generation(&mut self, model: &str, image_path: impl Into<String>) {
        self.generation
            .insert(model.to_string(), Some(image_path.into()));
    }

    /// Generation record for `model` is present and non-empty.
    pub fn has_generation(&self, model: &str) -> bool {
        self.generation_path(model).is_some()
    }

    pub fn generation_path(&self, model: &str) -> Option<&str> {
        self.generation
            .get(model)
            .and_then(|p| p.as_deref())
            .filter(|p| !p.is_empty())
    }

    pub fn entries_by_source(&self, source: &str) -> Vec<&EvalEntry> {
        self.evaluation
            .iter()
            .filter(|e| e.source == source)
            .collect()
    }

    /// False when there are no entries; else every entry is judged for the pair.
    pub fn is_evaluation_complete(&self, gen_model: &str, eval_model: &str) -> bool {
        !self.evaluation.is_empty()
            && self
                .evaluation
                .iter()
                .all(|e| e.has_judgment(gen_model, eval_model))
    }

    pub fn score(&self, gen_model: &str, eval_model: &str) -> EvaluationScore {
        let mut score = EvaluationScore {
            total: self.evaluation.len(),
            ..EvaluationScore::default()
        };
        for judgment in self
            .evaluation
            .iter()
            .filter_map(|e| e.judgment_for(gen_model, eval_model))
        {
            score.judged += 1;
            if judgment.passed() {
                score.passed += 1;
            }
        }
        score
    }

    /// Append bank questions for this item as `seed` entries. Returns how many were added.
    pub fn attach_questions(&mut self, questions: &[Question]) -> usize {
        let mut known: HashSet<String> = self
            .evaluation
            .iter()
            .map(|e| e.question.trim().to_string())
            .collect();

        let mut added = 0;
        for q in questions.iter().filter(|q| q.item_id == self.id) {
            let text = q.q.trim();
            if text.is_empty() || !known.insert(text.to_string()) {
                continue;
            }
            self.evaluation.push(EvalEntry {
                source: "seed".to_string(),
                ground: q.q_ground.clone(),
                question: q.q.clone(),
                question_type: q.q_type.clone(),
                judgments: Vec::new(),
            });
            added += 1;
        }
        added
    }

    pub fn save_dir(&self, output_dir: &Path) -> PathBuf {
        naming::item_dir(&self.id, output_dir)
    }

    pub fn save_path(&self, output_dir: &Path) -> PathBuf {
        naming::resolve_item_json_path(&self.id, output_dir)
    }

    /// Save as pretty JSON. `output` ending in `.json` is the file itself,
    /// anything else is an output directory.
    pub fn save_to(&self, output: &Path) -> Result<PathBuf, VisItemError> {
        let path = if output.extension().is_some_and(|e| e == "json") {
            output.to_path_buf()
        } else {
            self.save_path(output)
        };

        let write_err = |source| VisItemError::Write {
            path: path.clone(),
            source,
        };
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        json.push('\n');
        atomic_write(&path, json.as_bytes()).map_err(write_err)?;

        debug!(item_id = %self.id, path = %path.display(), "saved item");
        Ok(path)
    }
}

/// One line of a JSONL question bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, deserialize_with = "string_or_number")]
    pub item_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub q_id: String,
    #[serde(default)]
    pub q_ground: String,
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub q_type: String,
}

impl Question {
    /// Load every question in a JSONL file. A missing file yields no questions.
    pub fn load_jsonl(path: &Path) -> Result<Vec<Question>, VisItemError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "question bank not found");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(VisItemError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|source| VisItemError::QuestionParse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    source,
                })
            })
            .collect()
    }

    pub fn load_for_item(path: &Path, item_id: &str) -> Result<Vec<Question>, VisItemError> {
        Ok(Self::load_jsonl(path)?
            .into_iter()
            .filter(|q| q.item_id == item_id)
            .collect())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> VisItem {
        serde_json::from_value(json!({
            "id": "12",
            "reference_image_url": "https://example.com/12.png",
            "t2i_prompt": "A bar chart of rainfall by month",
            "chart_type": "bar",
            "generation": {},
            "evaluation": [
                {"source": "prompt", "ground": "title", "question": "Is there a title?", "question_type": "text", "judgments": []},
                {"source": "seed", "ground": "12 bars", "question": "Are there 12 bars?", "question_type": "count", "judgments": []}
            ],
            "unknown_extra": true
        }))
        .unwrap()
    }

    fn judgment(gen: &str, eval: &str, answer: &str) -> Judgment {
        Judgment {
            eval_model: eval.into(),
            gen_model: gen.into(),
            analysis: String::new(),
            answer: answer.into(),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = VisItem::from_path(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn malformed_or_idless_items_are_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(VisItem::from_path(&bad).unwrap_err().is_invalid_input());

        let no_id = dir.path().join("noid.json");
        std::fs::write(&no_id, r#"{"t2i_prompt": "x"}"#).unwrap();
        assert!(matches!(
            VisItem::from_path(&no_id),
            Err(VisItemError::MissingId { .. })
        ));
    }

    #[test]
    fn numeric_ids_and_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("3.json");
        std::fs::write(&path, r#"{"id": 3}"#).unwrap();
        let item = VisItem::from_path(&path).unwrap();
        assert_eq!(item.id, "3");
        assert!(item.t2i_prompt.is_none());
        assert!(item.evaluation.is_empty());
    }

    #[test]
    fn generation_records() {
        let mut item = sample();
        assert!(!item.has_generation("m"));
        item.generation.insert("m".into(), None);
        assert!(!item.has_generation("m"));
        item.update_generation("m", "out/12/12_m.png");
        assert_eq!(item.generation_path("m"), Some("out/12/12_m.png"));
    }

    #[test]
    fn evaluation_completeness_is_per_model_pair() {
        let mut item = sample();
        assert!(!item.is_evaluation_complete("g", "e"));
        for entry in &mut item.evaluation {
            entry.add_judgment(judgment("g", "e", "1"));
        }
        assert!(item.is_evaluation_complete("g", "e"));
        assert!(!item.is_evaluation_complete("g", "other"));
        assert!(!VisItem::new("empty").is_evaluation_complete("g", "e"));
    }

    #[test]
    fn score_counts_pass_and_judged() {
        let mut item = sample();
        item.evaluation[0].add_judgment(judgment("g", "e", " 1 "));
        item.evaluation[1].add_judgment(judgment("g", "e", "0"));
        item.evaluation[1].add_judgment(judgment("g2", "e", "1"));
        let score = item.score("g", "e");
        assert_eq!(
            score,
            EvaluationScore {
                total: 2,
                judged: 2,
                passed: 1
            }
        );
        assert_eq!(score.pass_rate(), Some(0.5));
        assert_eq!(item.score("x", "y").pass_rate(), None);
    }

    #[test]
    fn entries_filtered_by_source() {
        let item = sample();
        assert_eq!(item.entries_by_source("seed").len(), 1);
        assert_eq!(item.entries_by_source("prompt")[0].ground, "title");
    }

    #[test]
    fn save_to_directory_or_file() {
        let dir = tempfile::tempdir().unwrap();
        let item = sample();

        let path = item.save_to(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("12/12.json"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"id\": \"12\""));
        assert!(!text.contains("unknown_extra"));
        assert_eq!(VisItem::from_path(&path).unwrap(), item);

        let explicit = dir.path().join("custom/name.json");
        assert_eq!(item.save_to(&explicit).unwrap(), explicit);
        assert!(explicit.exists());
    }

    #[test]
    fn unicode_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let mut item = VisItem::new("u");
        item.t2i_prompt = Some("降水量 – 月別".to_string());
        let path = item.save_to(dir.path()).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("降水量 – 月別"));
    }

    #[test]
    fn attach_questions_skips_duplicates_and_other_items() {
        let dir = tempfile::tempdir().unwrap();
        let bank = dir.path().join("questions.jsonl");
        std::fs::write(
            &bank,
            concat!(
                r#"{"item_id": 12, "q_id": 1, "q_ground": "title", "q": "Is there a title?", "q_type": "text"}"#,
                "\n",
                r#"{"item_id": "12", "q_id": "2", "q_ground": "legend", "q": "Is there a legend?", "q_type": "text"}"#,
                "\n\n",
                r#"{"item_id": "99", "q_id": "1", "q_ground": "x", "q": "Other item?", "q_type": "text"}"#,
                "\n"
            ),
        )
        .unwrap();

        let questions = Question::load_for_item(&bank, "12").unwrap();
        assert_eq!(questions.len(), 2);

        let mut item = sample();
        assert_eq!(item.attach_questions(&questions), 1);
        let last = item.evaluation.last().unwrap();
        assert_eq!(last.source, "seed");
        assert_eq!(last.ground, "legend");
        assert_eq!(item.attach_questions(&questions), 0);
    }

    #[test]
    fn question_bank_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Question::load_jsonl(&dir.path().join("missing.jsonl"))
            .unwrap()
            .is_empty());

        let bank = dir.path().join("bad.jsonl");
        std::fs::write(&bank, "{\"q\": \"ok\"}\nnot json\n").unwrap();
        assert!(matches!(
            Question::load_jsonl(&bank),
            Err(VisItemError::QuestionParse { line: 2, .. })
        ));
    }
}
