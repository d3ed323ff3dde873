use serde::{Deserialize, Deserializer, Serialize};

/// One scheduled class occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default)]
    pub id: i32,
    pub day_name: String,
    pub lesson_number: i32,
    pub subject: String,
    #[serde(default)]
    pub time_start: String,
    #[serde(default)]
    pub time_end: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub homework: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub notes: Option<String>,
    #[serde(
        default,
        rename = "files",
        alias = "homework_files",
        deserialize_with = "deserialize_files"
    )]
    pub homework_files: Vec<HomeworkFile>,
    #[serde(default = "default_week")]
    pub week_number: i32,
}

impl Lesson {
    pub fn has_homework(&self) -> bool {
        self.homework.is_some() || !self.homework_files.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeworkFile {
    #[serde(default)]
    pub id: i32,
    pub file_name: String,
    pub file_url: String,
}

impl HomeworkFile {
    /// A not-yet-persisted file pointing at `file_url`, named after its last path segment.
    ///
    /// Inline `data:` URLs carry no name and are called `attachment`.
    pub fn from_url(file_url: impl Into<String>) -> Self {
        let file_url = file_url.into();
        let file_name = if file_url.starts_with("data:") {
            "attachment".to_owned()
        } else {
            file_url
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .unwrap_or(&file_url)
                .to_owned()
        };

        Self {
            id: 0,
            file_name,
            file_url,
        }
    }
}

/// The two wire shapes clients send attachments in.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HomeworkFiles {
    /// Comma-joined URLs in one string
    Inline(String),
    List(Vec<HomeworkFile>),
}

impl HomeworkFiles {
    pub fn into_files(self) -> Vec<HomeworkFile> {
        match self {
            HomeworkFiles::Inline(joined) => split_urls(&joined)
                .into_iter()
                .map(HomeworkFile::from_url)
                .collect(),
            HomeworkFiles::List(files) => files,
        }
    }
}

/// Splits comma-joined URLs. A `data:` URL keeps the one comma between its header and payload.
fn split_urls(joined: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for segment in joined.split(',').map(str::trim) {
        if let Some(last) = urls.last_mut()
            && last.starts_with("data:")
            && !last.contains(',')
        {
            last.push(',');
            last.push_str(segment);
            continue;
        }
        if !segment.is_empty() {
            urls.push(segment.to_owned());
        }
    }
    urls
}

pub fn deserialize_files<'de, D>(deserializer: D) -> Result<Vec<HomeworkFile>, D::Error>
where
    D: Deserializer<'de>,
{
    let files = Option::<HomeworkFiles>::deserialize(deserializer)?;
    Ok(files.map(HomeworkFiles::into_files).unwrap_or_default())
}

pub fn deserialize_optional_files<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<HomeworkFile>>, D::Error>
where
    D: Deserializer<'de>,
{
    let files = Option::<HomeworkFiles>::deserialize(deserializer)?;
    Ok(files.map(HomeworkFiles::into_files))
}

/// Blank text is stored and reported as absent.
pub fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(non_empty(Option::<String>::deserialize(deserializer)?))
}

fn default_week() -> i32 {
    1
}
