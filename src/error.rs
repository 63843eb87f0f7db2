/// Turns a failed resolution step into a logged `None`, so the caller can move on to the next
/// fallback.
pub trait ResultOkLogExt<T, E> {
    /// Logs the error at `ERROR` level.
    fn ok_log(self) -> Option<T>;
    /// Logs the error at `WARNING` level.
    fn ok_warn(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }

    fn ok_warn(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }
}
