//! Record sources: lazy, finite, one-shot streams of records.

use crate::error::IterationError;
use crate::record::Record;

/// Produces records until exhausted.
///
/// `Ok(None)` marks the end of the stream. An `Err` aborts consumption; a
/// source is not restartable and must be read by a single consumer.
pub trait RecordSource {
    fn next_record(&mut self) -> Result<Option<Record>, IterationError>;
}

impl<I, E> RecordSource for I
where
    I: Iterator<Item = Result<Record, E>>,
    E: Into<IterationError>,
{
    fn next_record(&mut self) -> Result<Option<Record>, IterationError> {
        self.next().transpose().map_err(Into::into)
    }
}

/// Wrap infallible records as a source.
pub fn infallible<I>(records: I) -> impl RecordSource
where
    I: IntoIterator<Item = Record>,
{
    records.into_iter().map(Ok::<_, IterationError>)
}
