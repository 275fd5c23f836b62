//! Input column layouts
//!
//! Upstream exports arrive in a small closed set of column layouts. Each
//! layout has an explicit membership predicate over the column set and a
//! converter to tidy records; detection walks [`decoders`] in a fixed
//! priority order and the first claiming layout wins.

mod blob;
mod daily;
mod date_time;
mod tidy;

pub use blob::BlobPayload;
pub use daily::CombinedDateTime;
pub use date_time::DateTimeSplit;
pub use tidy::Tidy;

use crate::batch::RawBatch;
use crate::error::SchemaError;
use crate::types::TidyRecord;

/// One recognized input layout.
pub trait LayoutDecoder {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this layout claims the batch, judged on column names only.
    fn matches(&self, batch: &RawBatch) -> bool;

    /// Convert the batch to tidy records. Ordering is not guaranteed here;
    /// the normalizer sorts.
    fn decode(&self, batch: &RawBatch) -> Result<Vec<TidyRecord>, SchemaError>;
}

/// All layouts in detection priority order.
pub fn decoders() -> &'static [&'static dyn LayoutDecoder] {
    &[&Tidy, &DateTimeSplit, &CombinedDateTime, &BlobPayload]
}
