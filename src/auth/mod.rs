mod extractor;

pub use extractor::{CurrentUser, USER_ID_HEADER};
