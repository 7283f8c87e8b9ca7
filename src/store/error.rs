use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Store request to {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read store response body")]
    ResponseBody(#[source] reqwest::Error),

    #[error("Failed to parse query result CSV")]
    CsvParse(#[from] csv::Error),
}
