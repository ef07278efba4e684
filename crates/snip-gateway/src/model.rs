mod url;

pub use url::{FieldErrors, HealthResponse, ShortenRequest, ShortenResponse, MAX_URL_LENGTH};
