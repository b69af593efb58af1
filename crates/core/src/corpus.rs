use crate::error::CorpusError;
use crate::models::Lecture;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const UNTITLED: &str = "بدون عنوان";
pub const DEFAULT_COLLECTION: &str = "سایر";
pub const DEFAULT_TOPIC: &str = "عمومی";

/// Source of lecture records. The retrieval core only ever calls [`list`].
///
/// [`list`]: LectureRepository::list
pub trait LectureRepository {
    fn list(&self) -> Vec<Lecture>;
    fn get(&self, id: &str) -> Option<Lecture>;
    fn add(&mut self, lecture: Lecture) -> Lecture;
    fn update(&mut self, lecture: Lecture) -> Result<(), CorpusError>;
    fn remove(&mut self, id: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryLectureRepository {
    lectures: Vec<Lecture>,
    next_id: u64,
}

impl InMemoryLectureRepository {
    pub fn new(lectures: Vec<Lecture>) -> Self {
        let next_id = lectures.len() as u64 + 1;
        Self { lectures, next_id }
    }

    pub fn len(&self) -> usize {
        self.lectures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lectures.is_empty()
    }
}

impl LectureRepository for InMemoryLectureRepository {
    fn list(&self) -> Vec<Lecture> {
        self.lectures.clone()
    }

    fn get(&self, id: &str) -> Option<Lecture> {
        self.lectures.iter().find(|lecture| lecture.id == id).cloned()
    }

    /// New lectures go to the front; a blank id is replaced with a fresh one.
    fn add(&mut self, mut lecture: Lecture) -> Lecture {
        if lecture.id.trim().is_empty() {
            loop {
                let candidate = format!("lec-{}", self.next_id);
                self.next_id += 1;
                if self.get(&candidate).is_none() {
                    lecture.id = candidate;
                    break;
                }
            }
        }
        self.lectures.insert(0, lecture.clone());
        lecture
    }

    fn update(&mut self, lecture: Lecture) -> Result<(), CorpusError> {
        let slot = self
            .lectures
            .iter_mut()
            .find(|existing| existing.id == lecture.id)
            .ok_or_else(|| {
                CorpusError::InvalidArgument(format!("no lecture with id {}", lecture.id))
            })?;
        *slot = lecture;
        Ok(())
    }

    fn remove(&mut self, id: &str) -> bool {
        let before = self.lectures.len();
        self.lectures.retain(|lecture| lecture.id != id);
        self.lectures.len() != before
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLecture {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    session_number: Option<Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    collection: Option<String>,
    #[serde(default)]
    topic: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn session_number(value: Option<&Value>) -> Option<u32> {
    let number = match value? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(number).ok().filter(|number| *number > 0)
}

fn fill_defaults(raw: RawLecture, id: String, position: usize) -> Lecture {
    let fallback_session = u32::try_from(position + 1).unwrap_or(u32::MAX);
    Lecture {
        session_number: session_number(raw.session_number.as_ref()).unwrap_or(fallback_session),
        id,
        title: non_blank(raw.title).unwrap_or_else(|| UNTITLED.to_string()),
        text: raw.text.unwrap_or_default(),
        collection: non_blank(raw.collection).unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        topic: non_blank(raw.topic).unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
    }
}

/// Orders by collection, then topic, then session number.
pub fn sort_lectures(lectures: &mut [Lecture]) {
    lectures.sort_by(|left, right| {
        left.collection
            .cmp(&right.collection)
            .then_with(|| left.topic.cmp(&right.topic))
            .then_with(|| left.session_number.cmp(&right.session_number))
    });
}

/// Parses a JSON array of lecture records, filling gaps with defaults.
pub fn parse_lectures_json(json: &str) -> Result<Vec<Lecture>, CorpusError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(CorpusError::InvalidArgument(
            "lecture file must contain a JSON array".to_string(),
        ));
    };

    let mut raws = items
        .into_iter()
        .map(serde_json::from_value::<RawLecture>)
        .collect::<Result<Vec<_>, _>>()?;

    // Generated ids start at `lec-{position + 1}` and skip any id given explicitly.
    let mut taken: HashSet<String> = raws
        .iter_mut()
        .filter_map(|raw| {
            raw.id = non_blank(raw.id.take());
            raw.id.clone()
        })
        .collect();

    let mut lectures = Vec::with_capacity(raws.len());
    for (position, mut raw) in raws.into_iter().enumerate() {
        let id = match raw.id.take() {
            Some(id) => id,
            None => {
                let mut next = position + 1;
                while taken.contains(&format!("lec-{next}")) {
                    next += 1;
                }
                let id = format!("lec-{next}");
                taken.insert(id.clone());
                id
            }
        };
        lectures.push(fill_defaults(raw, id, position));
    }

    sort_lectures(&mut lectures);
    Ok(lectures)
}

pub fn load_lectures_json(path: &Path) -> Result<Vec<Lecture>, CorpusError> {
    let json = fs::read_to_string(path)?;
    parse_lectures_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn lecture(id: &str) -> Lecture {
        Lecture {
            id: id.to_string(),
            title: "عنوان".to_string(),
            session_number: 1,
            text: String::new(),
            collection: DEFAULT_COLLECTION.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
        }
    }

    #[test]
    fn missing_fields_get_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let lectures = parse_lectures_json(
            r#"[{"sessionNumber": "0"}, {"id": "x", "title": " ", "sessionNumber": 5, "text": "متن"}]"#,
        )?;

        assert_eq!(lectures.len(), 2);
        assert_eq!(lectures[0].id, "lec-1");
        assert_eq!(lectures[0].title, UNTITLED);
        assert_eq!(lectures[0].session_number, 1);
        assert!(lectures[0].text.is_empty());
        assert_eq!(lectures[1].session_number, 5);
        assert_eq!(lectures[1].topic, DEFAULT_TOPIC);
        Ok(())
    }

    #[test]
    fn generated_ids_skip_explicit_ones() -> Result<(), Box<dyn std::error::Error>> {
        let paragraph = "این پاراگراف به اندازه کافی طولانی است تا به عنوان یک بخش مستقل نمایه شود.";
        let json = serde_json::json!([
            {"id": "lec-2", "title": "الف", "sessionNumber": 1, "text": paragraph},
            {"title": "ب", "sessionNumber": 2, "text": paragraph},
            {"sessionNumber": 3, "text": paragraph},
        ])
        .to_string();

        let lectures = parse_lectures_json(&json)?;
        let ids: Vec<&str> = lectures.iter().map(|lecture| lecture.id.as_str()).collect();
        assert_eq!(ids, vec!["lec-2", "lec-3", "lec-4"]);

        let index = crate::index::ChunkIndex::build(&lectures, 50);
        let chunk_ids: HashSet<&str> = index.chunks().iter().map(|chunk| chunk.id.as_str()).collect();
        assert_eq!(index.len(), 3);
        assert_eq!(chunk_ids.len(), 3);
        Ok(())
    }

    #[test]
    fn lectures_sort_by_collection_topic_session() -> Result<(), Box<dyn std::error::Error>> {
        let lectures = parse_lectures_json(
            r#"[
                {"id": "c", "collection": "ب", "topic": "الف", "sessionNumber": 1},
                {"id": "b", "collection": "الف", "topic": "الف", "sessionNumber": 2},
                {"id": "a", "collection": "الف", "topic": "الف", "sessionNumber": 1}
            ]"#,
        )?;
        let ids = lectures.iter().map(|lecture| lecture.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c"]);
        Ok(())
    }

    #[test]
    fn non_array_is_rejected() {
        assert!(matches!(
            parse_lectures_json(r#"{"id": "x"}"#),
            Err(CorpusError::InvalidArgument(_))
        ));
        assert!(matches!(parse_lectures_json("not json"), Err(CorpusError::Json(_))));
    }

    #[test]
    fn loads_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("lectures.json");
        fs::write(&path, r#"[{"id": "lec-9", "title": "t", "sessionNumber": 9, "text": "x"}]"#)?;

        let lectures = load_lectures_json(&path)?;
        assert_eq!(lectures[0].id, "lec-9");
        assert!(load_lectures_json(&dir.path().join("missing.json")).is_err());
        Ok(())
    }

    #[test]
    fn repository_crud() {
        let mut repository = InMemoryLectureRepository::new(vec![lecture("lec-1")]);

        let added = repository.add(lecture(""));
        assert_eq!(added.id, "lec-2");
        assert_eq!(repository.list()[0].id, "lec-2");

        let mut changed = lecture("lec-1");
        changed.title = "تازه".to_string();
        assert!(repository.update(changed).is_ok());
        assert_eq!(repository.get("lec-1").map(|lecture| lecture.title), Some("تازه".to_string()));
        assert!(repository.update(lecture("missing")).is_err());

        assert!(repository.remove("lec-1"));
        assert!(!repository.remove("lec-1"));
        assert_eq!(repository.len(), 1);
    }
}
