use super::StreamError;

/// Signal queued for delivery to a subscriber.
pub(crate) enum Signal<T> {
  Next(T),
  Complete,
  Error(StreamError),
}

impl<T> Signal<T> {
  pub(crate) const fn is_terminal(&self) -> bool {
    !matches!(self, Self::Next(_))
  }
}
