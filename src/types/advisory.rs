use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-fatal notice that one `(city, year)` combination of an otherwise
/// satisfiable request has no data in the catalog and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Advisory {
    pub city: String,
    pub year: i32,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data not available for {} in {}", self.city, self.year)
    }
}
