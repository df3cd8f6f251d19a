//! Text rendering of the load state.

use std::fmt;

/// What the caller shows while and after loading.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadView {
    Loading,
    Loaded(Vec<u32>),
    Failed,
}

impl LoadView {
    /// View for a finished load.
    pub fn settled<E>(result: Result<Vec<u32>, E>) -> Self {
        match result {
            Ok(data) => LoadView::Loaded(data),
            Err(_) => LoadView::Failed,
        }
    }
}

impl fmt::Display for LoadView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadView::Loading => write!(f, "Loading..."),
            LoadView::Loaded(data) => write!(f, "Data: {:?}", data),
            LoadView::Failed => write!(f, "Data: failed to load"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        assert_eq!(LoadView::Loading.to_string(), "Loading...");
        assert_eq!(
            LoadView::settled::<()>(Ok(vec![1, 2])).to_string(),
            "Data: [1, 2]"
        );
        assert_eq!(LoadView::settled(Err("x")).to_string(), "Data: failed to load");
    }
}
