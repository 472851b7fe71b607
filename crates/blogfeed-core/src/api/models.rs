use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct IngestQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    pub limit: Option<u32>,
    pub task_name: Option<String>,
}
