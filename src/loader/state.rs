use crate::error::ErrorInfo;

/// Where a [`Resource`](super::Resource) is in its current invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Success(T),
    Failure(ErrorInfo),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// `true` once an invocation has produced a value or an error.
    pub fn is_settled(&self) -> bool {
        matches!(self, LoadState::Success(_) | LoadState::Failure(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            LoadState::Failure(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<Result<T, ErrorInfo>> for LoadState<T> {
    fn from(outcome: Result<T, ErrorInfo>) -> Self {
        match outcome {
            Ok(value) => LoadState::Success(value),
            Err(err) => LoadState::Failure(err),
        }
    }
}

/// Flattened `{data, loading, error}` view of a [`LoadState`], the shape
/// consumers render from.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
}

impl<T: Clone> From<&LoadState<T>> for Snapshot<T> {
    fn from(state: &LoadState<T>) -> Self {
        Snapshot {
            data: state.data().cloned(),
            loading: state.is_loading(),
            error: state.error().cloned(),
        }
    }
}

/// How a [`Resource::refetch`](super::Resource::refetch) call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The result was published.
    Published,
    /// A newer invocation started first; the result was dropped.
    Superseded,
    /// The resource was torn down; nothing was published.
    TornDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_of_each_state() {
        let idle: Snapshot<u32> = (&LoadState::Idle).into();
        assert_eq!(
            idle,
            Snapshot {
                data: None,
                loading: false,
                error: None
            }
        );

        let loading: Snapshot<u32> = (&LoadState::Loading).into();
        assert!(loading.loading);

        let ok: Snapshot<u32> = (&LoadState::Success(7)).into();
        assert_eq!(ok.data, Some(7));
        assert!(!ok.loading);

        let failed: Snapshot<u32> = (&LoadState::Failure(ErrorInfo::new("boom"))).into();
        assert_eq!(failed.error, Some(ErrorInfo::new("boom")));
        assert_eq!(failed.data, None);
    }

    #[test]
    fn test_settled() {
        assert!(!LoadState::<u32>::Idle.is_settled());
        assert!(!LoadState::<u32>::Loading.is_settled());
        assert!(LoadState::Success(1).is_settled());
        assert!(LoadState::<u32>::Failure(ErrorInfo::new("x")).is_settled());
    }

    #[test]
    fn test_from_result() {
        assert_eq!(LoadState::from(Ok::<_, ErrorInfo>(3)), LoadState::Success(3));
        assert_eq!(
            LoadState::<u32>::from(Err(ErrorInfo::new("boom"))),
            LoadState::Failure(ErrorInfo::new("boom"))
        );
    }
}
