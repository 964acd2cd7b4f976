//! Change stream trait.

use futures_core::Stream;

use crate::Result;
use crate::record::ChangeEvent;

/// Stream of change notifications from a Record Store, in delivery order.
pub trait ChangeStream: Stream<Item = Result<ChangeEvent>> + Send + Unpin + 'static {}

impl<T> ChangeStream for T where T: Stream<Item = Result<ChangeEvent>> + Send + Unpin + 'static {}
