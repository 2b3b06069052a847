use serde::Deserialize;

pub const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

/// Collection envelope shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub value: Vec<T>,
}
